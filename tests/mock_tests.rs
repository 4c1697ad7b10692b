//! Mock service latency and response, on a paused clock.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use tokio::time::Instant;
use tower::ServiceExt;

use consult_relay::config::MockConfig;
use consult_relay::server::mock_api::{build_mock_router, MockState};

fn mock_router() -> Router {
    build_mock_router(Arc::new(MockState {
        config: MockConfig::default(),
    }))
}

async fn post_api(app: Router, body: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test(start_paused = true)]
async fn test_mock_returns_true_after_full_delay() {
    let start = Instant::now();
    let (status, body) = post_api(mock_router(), r#"{"text": "任意内容"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "true");
    assert!(start.elapsed() >= Duration::from_millis(15_500));
}

#[tokio::test(start_paused = true)]
async fn test_mock_requests_overlap() {
    let app = mock_router();
    let start = Instant::now();

    let (a, b) = tokio::join!(
        post_api(app.clone(), r#"{"text": "first"}"#),
        post_api(app, r#"{"text": "second"}"#),
    );

    assert_eq!(a.1, "true");
    assert_eq!(b.1, "true");
    // Cooperative waits: both finish within one latency window, not two.
    assert!(start.elapsed() < Duration::from_millis(31_000));
}

#[tokio::test(start_paused = true)]
async fn test_mock_liveness_is_immediate() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let start = Instant::now();

    let response = mock_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn test_mock_rejects_malformed_body() {
    let (status, body) = post_api(mock_router(), "not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(body["detail"].is_string());
}

#[test]
fn test_default_stage_durations() {
    let config = MockConfig::default();
    assert_eq!(
        config.send_stage() + config.resolve_stage(),
        Duration::from_millis(15_500)
    );
}
