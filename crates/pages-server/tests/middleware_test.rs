//! Tests de middleware.

mod helpers;

use helpers::{TestClient, TestSites};
use uuid::Uuid;

async fn client() -> TestClient {
    TestSites::wildcard(&[("index.html", "home")]).await.client()
}

// === Request ID ===

#[tokio::test]
async fn response_includes_request_id() {
    let response = client().await.get("/").await;

    response.assert_header_exists("x-request-id");
}

#[tokio::test]
async fn request_id_is_uuid_v4() {
    let response = client().await.get("/").await;

    let id = response.header("x-request-id").unwrap();
    let parsed = Uuid::parse_str(id).unwrap();

    assert_eq!(parsed.get_version_num(), 4);
}

#[tokio::test]
async fn propagates_incoming_request_id() {
    let custom_id = "my-custom-request-id-12345";

    let response = client()
        .await
        .get_with_headers("/", vec![("x-request-id", custom_id)])
        .await;

    response.assert_header("x-request-id", custom_id);
}

#[tokio::test]
async fn replaces_oversized_request_id() {
    let oversized = "x".repeat(200);

    let response = client()
        .await
        .get_with_headers("/", vec![("x-request-id", oversized.as_str())])
        .await;

    let id = response.header("x-request-id").unwrap();
    assert!(Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn generates_different_ids_for_each_request() {
    let client = client().await;
    let response1 = client.get("/").await;
    let response2 = client.get("/").await;

    let id1 = response1.header("x-request-id").unwrap();
    let id2 = response2.header("x-request-id").unwrap();

    assert_ne!(id1, id2);
}

// === Request ID on every response ===

#[tokio::test]
async fn request_id_present_on_errors() {
    let response = client().await.get("/missing.html").await;

    response.assert_header_exists("x-request-id");
}

#[tokio::test]
async fn request_id_present_on_admin_routes() {
    let response = client().await.get("/_admin/sites").await;

    response.assert_header_exists("x-request-id");
}

#[tokio::test]
async fn request_id_present_on_private_listener() {
    let sites = TestSites::wildcard(&[("index.html", "home")]).await;
    let response = sites.private_client().get("/health").await;

    response.assert_header_exists("x-request-id");
}
