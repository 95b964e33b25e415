//! Custom assertions para tests.

use serde_json::Value;

use super::TestResponse;

/// Verifica que el body sea un error JSON `{error, message}` con el tipo esperado.
pub fn assert_error_body(response: &TestResponse, expected: &str) {
    let json: Value = response.json();
    let obj = json.as_object().expect("Error body should be a JSON object");

    assert!(obj.contains_key("message"), "Missing 'message' field");
    assert_eq!(
        obj.get("error").and_then(Value::as_str),
        Some(expected),
        "Unexpected error kind in {}",
        json
    );
}

/// Verifica que la respuesta sea un listado HTML con las entradas dadas.
pub fn assert_listing(response: &TestResponse, entries: &[&str]) {
    response.assert_content_type_contains("text/html");

    let html = response.text();
    for entry in entries {
        assert!(
            html.contains(&format!("href=\"{}\"", entry)),
            "Listing is missing {}: {}",
            entry,
            html
        );
    }
}
