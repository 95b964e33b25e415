//! Tests de los endpoints de administracion.

mod helpers;

use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use helpers::{ADMIN_PREFIX, TestSites, assert_error_body};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

fn sync_uri() -> String {
    format!("{}/sync", ADMIN_PREFIX)
}

fn sites_uri() -> String {
    format!("{}/sites", ADMIN_PREFIX)
}

// === On-demand sync ===

#[tokio::test]
async fn sync_serves_new_content() {
    let sites = TestSites::wildcard(&[("index.html", "v1")]).await;
    let client = sites.client();

    client.get("/").await.assert_body("v1");

    sites.remote("*").publish("index.html", "v2");
    let response = client.post(&sync_uri(), vec![]).await;

    response.assert_status(StatusCode::OK);
    let json: Value = response.json();
    assert_eq!(json["domain"], "*");
    assert_eq!(json["updated"], true);
    assert_eq!(json["commit"], sites.remote("*").head());

    client.get("/").await.assert_body("v2");
}

#[tokio::test]
async fn sync_without_changes_reports_unchanged() {
    let sites = TestSites::wildcard(&[("index.html", "v1")]).await;

    let response = sites.client().post(&sync_uri(), vec![]).await;

    response.assert_status(StatusCode::OK);
    let json: Value = response.json();
    assert_eq!(json["updated"], false);
}

#[tokio::test]
async fn sync_targets_the_requested_host() {
    let sites = TestSites::new(&[
        ("a.example", &[("index.html", "A1")]),
        ("b.example", &[("index.html", "B1")]),
    ])
    .await;
    let client = sites.client();

    sites.remote("a.example").publish("index.html", "A2");
    sites.remote("b.example").publish("index.html", "B2");

    let response = client.post(&sync_uri(), vec![("host", "b.example")]).await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json::<Value>()["domain"], "b.example");

    client.get_host("/", "a.example").await.assert_body("A1");
    client.get_host("/", "b.example").await.assert_body("B2");
}

#[tokio::test]
async fn failed_sync_keeps_serving_old_content() {
    let sites = TestSites::wildcard(&[("index.html", "v1")]).await;
    let client = sites.client();

    sites.remote("*").publish("index.html", "v2");
    sites.remote("*").fail_next_fetches(1);

    let response = client.post(&sync_uri(), vec![]).await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_error_body(&response, "Internal Server Error");

    client.get("/").await.assert_status(StatusCode::OK).assert_body("v1");

    client.post(&sync_uri(), vec![]).await.assert_status(StatusCode::OK);
    client.get("/").await.assert_body("v2");
}

#[tokio::test]
async fn concurrent_syncs_all_succeed() {
    let sites = TestSites::wildcard(&[("index.html", "v1")]).await;
    let client = sites.client();

    sites.remote("*").publish("index.html", "v2");

    let requests = (0..8).map(|_| {
        let client = client.clone();
        async move { client.post(&sync_uri(), vec![]).await }
    });
    let responses = futures::future::join_all(requests).await;

    let mut updated = 0;
    for response in &responses {
        response.assert_status(StatusCode::OK);
        if response.json::<Value>()["updated"] == true {
            updated += 1;
        }
    }

    assert_eq!(updated, 1);
    assert_eq!(sites.remote("*").clones(), 1);
    client.get("/").await.assert_body("v2");
}

#[tokio::test]
async fn pending_download_does_not_hold_up_sync() {
    let large = "x".repeat(2 * 1024 * 1024);
    let sites = TestSites::wildcard(&[("index.html", "v1"), ("large.bin", large.as_str())]).await;
    let client = sites.client();

    // Response received, body never read yet
    let pending = sites
        .router()
        .oneshot(Request::builder().uri("/large.bin").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(pending.status(), StatusCode::OK);

    sites.remote("*").publish("index.html", "v2");

    let synced = tokio::time::timeout(Duration::from_secs(2), client.post(&sync_uri(), vec![]))
        .await
        .expect("sync waited on the pending download");
    synced.assert_status(StatusCode::OK);
    assert_eq!(synced.json::<Value>()["updated"], true);

    let served = tokio::time::timeout(Duration::from_secs(2), client.get("/index.html"))
        .await
        .expect("request waited on the pending download");
    served.assert_status(StatusCode::MOVED_PERMANENTLY);
    client.get("/").await.assert_body("v2");

    // The old file stays readable after the swap
    let body = pending.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body.len(), large.len());
}

#[tokio::test]
async fn sync_route_rejects_get() {
    let sites = TestSites::wildcard(&[("index.html", "v1")]).await;

    sites
        .client()
        .get(&sync_uri())
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
}

// === Site status ===

#[tokio::test]
async fn sites_lists_every_site_sorted() {
    let sites = TestSites::new(&[
        ("b.example", &[("index.html", "B")]),
        ("a.example", &[("index.html", "A")]),
    ])
    .await;

    let response = sites.client().get_host(&sites_uri(), "a.example").await;

    response
        .assert_status(StatusCode::OK)
        .assert_content_type_contains("application/json");

    let json: Value = response.json();
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["domain"], "a.example");
    assert_eq!(list[1]["domain"], "b.example");
    assert_eq!(list[0]["url"], "https://git.example.com/1.git");
    assert_eq!(list[0]["sync_interval"], 0);
    assert_eq!(list[0]["commit"], sites.remote("a.example").head());
    assert_eq!(list[0]["failure_count"], 0);
    assert_eq!(list[0]["syncing"], false);
}

#[tokio::test]
async fn sites_reports_last_failure() {
    let sites = TestSites::wildcard(&[("index.html", "v1")]).await;
    let client = sites.client();

    sites.remote("*").fail_next_fetches(1);
    client.post(&sync_uri(), vec![]).await;

    let json: Value = client.get(&sites_uri()).await.json();
    assert_eq!(json[0]["failure_count"], 1);
    assert!(
        json[0]["last_error"]
            .as_str()
            .unwrap()
            .contains("fetch refused")
    );
}
