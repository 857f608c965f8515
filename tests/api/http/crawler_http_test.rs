//! Crawler diversion tests against a wiremock render service

use super::{body_string, build_test_router, send, TestAppState};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GOOGLEBOT: &str = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";
const BROWSER: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/605.1.15 (KHTML, like Gecko) Safari/605.1.15";

fn storefront_request(method: Method, uri: &str, user_agent: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, "Store.Example.com")
        .header(header::USER_AGENT, user_agent)
        .body(Body::empty())
        .unwrap()
}

fn render_url(server: &MockServer) -> String {
    format!("{}/render", server.uri())
}

#[tokio::test]
async fn test_crawler_gets_rendered_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/render"))
        .and(query_param("host", "store.example.com"))
        .and(query_param("path", "/products/red-shoes?color=red"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string("<html><title>Red Shoes</title></html>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let app = build_test_router(TestAppState::with_render_service(&render_url(&server)));
    let response = send(
        &app,
        storefront_request(Method::GET, "/products/red-shoes?color=red", GOOGLEBOT),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/html; charset=utf-8"
    );
    assert_eq!(
        body_string(response).await,
        "<html><title>Red Shoes</title></html>"
    );
}

#[tokio::test]
async fn test_render_service_status_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/render"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such product"))
        .mount(&server)
        .await;

    let app = build_test_router(TestAppState::with_render_service(&render_url(&server)));
    let response = send(
        &app,
        storefront_request(Method::GET, "/products/missing", GOOGLEBOT),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(response).await, "no such product");
}

#[tokio::test]
async fn test_slow_render_service_falls_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/render"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html>late</html>")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let app = build_test_router(TestAppState::with_render_service(&render_url(&server)));
    let response = send(&app, storefront_request(Method::GET, "/", GOOGLEBOT)).await;

    // Normal serving: this service has no storefront route, so the JSON fallback answers
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_unreachable_render_service_falls_through() {
    let app = build_test_router(TestAppState::with_render_service(
        "http://127.0.0.1:1/render",
    ));

    let response = send(&app, storefront_request(Method::GET, "/about", GOOGLEBOT)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_browser_is_not_diverted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = build_test_router(TestAppState::with_render_service(&render_url(&server)));
    let response = send(&app, storefront_request(Method::GET, "/products", BROWSER)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_crawler_post_is_not_diverted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = build_test_router(TestAppState::with_render_service(&render_url(&server)));
    let response = send(&app, storefront_request(Method::POST, "/cart", GOOGLEBOT)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_crawler_on_service_endpoint_is_not_diverted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = build_test_router(TestAppState::with_render_service(&render_url(&server)));
    let response = send(&app, storefront_request(Method::GET, "/health", GOOGLEBOT)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_diversion_disabled_without_render_url() {
    let app = build_test_router(TestAppState::new());

    let response = send(&app, storefront_request(Method::GET, "/", GOOGLEBOT)).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
