//! Health, readiness and metrics endpoint tests

use super::{body_string, build_test_router, get_json, send, TestAppState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_health() {
    let app = build_test_router(TestAppState::new());

    let (status, body): (StatusCode, Option<Value>) = get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_ready_reflects_store() {
    let state = TestAppState::new();
    let app = build_test_router(state.clone());

    let response = send(&app, Request::get("/ready").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");

    state.ready.store(false, Ordering::SeqCst);
    let response = send(&app, Request::get("/ready").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_string(response).await, "not_ready");
}

#[tokio::test]
async fn test_metrics_disabled_is_not_found() {
    let app = build_test_router(TestAppState::new());

    let response = send(&app, Request::get("/metrics").body(Body::empty()).unwrap()).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = build_test_router(TestAppState::new());

    let response = send(
        &app,
        Request::get("/health")
            .header("x-request-id", "trace-me")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.headers().get("x-request-id").unwrap(), "trace-me");
}

#[tokio::test]
async fn test_unknown_route_is_json_not_found() {
    let app = build_test_router(TestAppState::new());

    let (status, body): (StatusCode, Option<Value>) = get_json(&app, "/api/v1/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body.unwrap()["error"], "Route not found");
}
