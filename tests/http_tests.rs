// Integration tests for the HTTP control surface

mod support;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use live_caption::http::ErrorResponse;
use live_caption::{create_router, AppState, ConnectionState, SessionStatus};
use support::*;
use tower::ServiceExt;

fn app(inference: FakeInference, camera: Arc<CameraStats>) -> (axum::Router, Arc<live_caption::CaptionSession>) {
    let session = Arc::new(session_with(FakeCamera::new(camera), Arc::new(inference)));
    (create_router(AppState::new(Arc::clone(&session))), session)
}

async fn send(app: &axum::Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _session) = app(FakeInference::healthy(), Arc::new(CameraStats::default()));

    let (status, body) = send(&app, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_start_status_stop_cycle() {
    let camera = Arc::new(CameraStats::default());
    let (app, session) = app(FakeInference::healthy(), Arc::clone(&camera));

    let (status, body) = send(&app, "GET", "/session/status").await;
    assert_eq!(status, StatusCode::OK);
    let idle: SessionStatus = serde_json::from_slice(&body).unwrap();
    assert_eq!(idle.state, ConnectionState::Idle);
    assert_eq!(idle.session_id, "test-session");

    let (status, body) = send(&app, "POST", "/session/start").await;
    assert_eq!(status, StatusCode::OK);
    let started: SessionStatus = serde_json::from_slice(&body).unwrap();
    assert_eq!(started.state, ConnectionState::Connected);
    assert!(started.is_streaming);
    assert_eq!(camera.open(), 1);

    let (status, body) = send(&app, "POST", "/session/stop").await;
    assert_eq!(status, StatusCode::OK);
    let stopped: SessionStatus = serde_json::from_slice(&body).unwrap();
    assert_eq!(stopped.state, ConnectionState::Idle);
    assert_eq!(stopped.caption, "Camera stopped");
    assert_eq!(camera.open(), 0);

    session.shutdown().await;
}

#[tokio::test]
async fn test_start_with_backend_down_is_service_unavailable() {
    let camera = Arc::new(CameraStats::default());
    let (app, session) = app(FakeInference::unhealthy(), Arc::clone(&camera));

    let (status, body) = send(&app, "POST", "/session/start").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let error: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert!(error.error.contains("health check failed"));

    let status = session.status();
    assert_eq!(status.state, ConnectionState::Error);
    assert_eq!(camera.acquisitions(), 0);
}

#[tokio::test]
async fn test_toggle_endpoint() {
    let (app, session) = app(FakeInference::healthy(), Arc::new(CameraStats::default()));

    let (status, body) = send(&app, "POST", "/session/toggle").await;
    assert_eq!(status, StatusCode::OK);
    let on: SessionStatus = serde_json::from_slice(&body).unwrap();
    assert_eq!(on.state, ConnectionState::Connected);

    let (status, body) = send(&app, "POST", "/session/toggle").await;
    assert_eq!(status, StatusCode::OK);
    let off: SessionStatus = serde_json::from_slice(&body).unwrap();
    assert_eq!(off.state, ConnectionState::Idle);

    session.shutdown().await;
}

#[tokio::test]
async fn test_start_after_shutdown_is_gone() {
    let (app, session) = app(FakeInference::healthy(), Arc::new(CameraStats::default()));
    session.shutdown().await;

    let (status, _) = send(&app, "POST", "/session/start").await;
    assert_eq!(status, StatusCode::GONE);
}
