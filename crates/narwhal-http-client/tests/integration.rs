//! Integration tests for narwhal-http-client using mockito

use std::sync::{Arc, Mutex};

use narwhal_http_client::{
    HttpClient, HttpError, Method, Progress, RequestBuilderExt, TransferControl,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct TestPayload {
    name: String,
    value: i32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct TestResponse {
    success: bool,
    data: String,
}

// === send_json ===

#[tokio::test]
async fn test_send_json_success() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/api/data")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": "hello"}"#)
        .create_async()
        .await;

    let client = HttpClient::new();
    let url = format!("{}/api/data", server.url());
    let response: TestResponse = client
        .get(&url)
        .send_json()
        .await
        .expect("Request should succeed");

    assert!(response.success);
    assert_eq!(response.data, "hello");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_send_json_error_status() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/api/error")
        .with_status(404)
        .with_body("Not Found")
        .create_async()
        .await;

    let client = HttpClient::new();
    let url = format!("{}/api/error", server.url());
    let result: Result<TestResponse, _> = client.get(&url).send_json().await;

    if let Err(HttpError::Status { status, message }) = result {
        assert_eq!(status, 404);
        assert_eq!(message, "Not Found");
    } else {
        panic!("Expected HttpError::Status");
    }

    mock.assert_async().await;
}

#[tokio::test]
async fn test_send_json_with_json_body() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/api/submit")
        .match_header("content-type", "application/json")
        .match_body(mockito::Matcher::Json(serde_json::json!({
            "name": "test",
            "value": 42
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": "received"}"#)
        .create_async()
        .await;

    let client = HttpClient::new();
    let url = format!("{}/api/submit", server.url());
    let payload = TestPayload {
        name: "test".to_string(),
        value: 42,
    };
    let response: TestResponse = client
        .post(&url)
        .json(&payload)
        .send_json()
        .await
        .expect("Request should succeed");

    assert!(response.success);
    assert_eq!(response.data, "received");

    mock.assert_async().await;
}

// === RawResponse tests ===

#[tokio::test]
async fn test_raw_response_status_classes() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/teapot")
        .with_status(418)
        .create_async()
        .await;

    let client = HttpClient::new();
    let response = client
        .get(&format!("{}/teapot", server.url()))
        .send()
        .await
        .expect("Request should succeed");

    assert_eq!(response.status(), 418);
    assert!(!response.is_success());
    assert!(response.is_client_error());
    assert!(!response.is_server_error());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_raw_response_exposes_request_and_metadata() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("DELETE", "/api/items/9")
        .match_header("x-request-id", "r-1")
        .with_status(202)
        .with_header("x-served-by", "mock")
        .create_async()
        .await;

    let client = HttpClient::new();
    let url = format!("{}/api/items/9", server.url());
    let response = client
        .request(Method::DELETE, &url)
        .header("x-request-id", "r-1")
        .send()
        .await
        .expect("Request should succeed");

    let request = response.request();
    assert_eq!(request.method, Method::DELETE);
    assert_eq!(request.url.path(), "/api/items/9");
    assert_eq!(
        request.headers.get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("r-1")
    );

    let metadata = response.metadata();
    assert_eq!(metadata.status.as_u16(), 202);
    assert_eq!(metadata.header("x-served-by"), Some("mock"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_raw_response_text() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/")
        .with_status(200)
        .with_body("Hello, World!")
        .create_async()
        .await;

    let client = HttpClient::new();
    let response = client
        .get(&server.url())
        .send()
        .await
        .expect("Request should succeed");
    let text = response
        .text()
        .await
        .expect("Text extraction should succeed");

    assert_eq!(text, "Hello, World!");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_read_body_reports_progress() {
    let mut server = mockito::Server::new_async().await;
    let body = "x".repeat(4096);

    let mock = server
        .mock("GET", "/download")
        .with_status(200)
        .with_body(&body)
        .create_async()
        .await;

    let control = TransferControl::new();
    let seen: Arc<Mutex<Vec<Progress>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    control.on_progress(move |progress| {
        seen_clone
            .lock()
            .expect("Progress log lock")
            .push(progress);
    });

    let client = HttpClient::new();
    let response = client
        .get(&format!("{}/download", server.url()))
        .send_with(control.clone())
        .await
        .expect("Request should succeed");
    let bytes = response
        .read_body(&control)
        .await
        .expect("Body should be read");

    assert_eq!(bytes.len(), 4096);

    let seen = seen.lock().expect("Progress log lock");
    let first = seen.first().expect("Initial progress is reported");
    let last = seen.last().expect("Final progress is reported");
    assert_eq!(first.completed, 0);
    assert_eq!(last.completed, 4096);
    assert!(seen.windows(2).all(|w| w[0].completed <= w[1].completed));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_send_with_cancelled_control() {
    let server = mockito::Server::new_async().await;

    let control = TransferControl::new();
    control.cancel();

    let client = HttpClient::new();
    let result = client
        .get(&format!("{}/never", server.url()))
        .send_with(control)
        .await;

    assert!(matches!(result, Err(HttpError::Cancelled)));
}

// === RequestBuilder tests ===

#[tokio::test]
async fn test_request_builder_with_headers() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/api/headers")
        .match_header("X-Custom-Header", "custom-value")
        .match_header("Authorization", "Bearer token123")
        .with_status(200)
        .with_body("headers received")
        .create_async()
        .await;

    let client = HttpClient::new();
    let url = format!("{}/api/headers", server.url());
    let response = client
        .get(&url)
        .header("X-Custom-Header", "custom-value")
        .header("Authorization", "Bearer token123")
        .send()
        .await
        .expect("Request should succeed");

    assert_eq!(response.status(), 200);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_request_builder_post_with_form() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/api/form")
        .match_header(
            "content-type",
            mockito::Matcher::Regex("application/x-www-form-urlencoded.*".to_string()),
        )
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": "form_received"}"#)
        .create_async()
        .await;

    let client = HttpClient::new();
    let url = format!("{}/api/form", server.url());
    let form_data = [("field1", "value1"), ("field2", "value2")];

    let response: TestResponse = client
        .post(&url)
        .form(&form_data)
        .send_json()
        .await
        .expect("Request should succeed");

    assert!(response.success);
    assert_eq!(response.data, "form_received");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_invalid_url_is_build_error() {
    let client = HttpClient::new();
    let result = client.get("not a url").send().await;

    assert!(matches!(result, Err(HttpError::Build(_))));
}

#[tokio::test]
async fn test_json_deserialization_error() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/api/invalid-json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("not valid json")
        .create_async()
        .await;

    let client = HttpClient::new();
    let url = format!("{}/api/invalid-json", server.url());
    let result: Result<TestResponse, _> = client.get(&url).send_json().await;

    let err = result.expect_err("Should be a deserialization error");
    let err_str = format!("{}", err);
    assert!(
        err_str.contains("expected") || err_str.contains("JSON") || err_str.contains("error"),
        "Error should mention parsing issue: {}",
        err_str
    );

    mock.assert_async().await;
}
