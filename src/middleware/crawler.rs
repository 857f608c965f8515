//! Crawler diversion middleware
//!
//! Requests from crawlers and link previewers are answered with a
//! pre-rendered page fetched from the render service. Anything that goes
//! wrong on that path falls through to normal serving: a crawler never sees
//! an error caused by the render service.

use crate::config::CrawlerConfig;
use crate::domain::normalize_host;
use crate::service::crawler::{CrawlerAgentMatcher, CrawlerRenderClient, RenderedPage};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, Method},
    middleware::Next,
    response::Response,
};
use metrics::counter;
use tracing::{debug, warn};

/// Classifier plus render client, shared by every request
#[derive(Clone)]
pub struct CrawlerDiversion {
    matcher: CrawlerAgentMatcher,
    renderer: Option<CrawlerRenderClient>,
}

impl CrawlerDiversion {
    pub fn new(matcher: CrawlerAgentMatcher, renderer: Option<CrawlerRenderClient>) -> Self {
        Self { matcher, renderer }
    }

    pub fn from_config(config: &CrawlerConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            CrawlerAgentMatcher::new(&config.agent_patterns),
            CrawlerRenderClient::from_config(config)?,
        ))
    }

    /// Diversion with no render service: every request passes through
    pub fn disabled() -> Self {
        Self::new(CrawlerAgentMatcher::new(Vec::<String>::new()), None)
    }

    pub fn is_enabled(&self) -> bool {
        self.renderer.is_some()
    }

    /// Host and path to render when `request` comes from an automated
    /// client and diversion is on; `None` to serve it normally.
    pub fn classify(&self, request: &Request) -> Option<(String, String)> {
        self.renderer.as_ref()?;

        if !matches!(*request.method(), Method::GET | Method::HEAD) {
            return None;
        }
        if is_service_path(request.uri().path()) {
            return None;
        }

        let user_agent = request
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())?;
        if !self.matcher.is_automated(user_agent) {
            return None;
        }

        let host = request_host(request)?;
        let path_and_query = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
            .to_string();
        Some((host, path_and_query))
    }

    /// Fetch the pre-rendered page. `None` when the render service is off or failed.
    pub async fn render(&self, host: &str, path_and_query: &str) -> Option<Response> {
        let renderer = self.renderer.as_ref()?;

        // Dropping this future (client went away) cancels the render call
        match renderer.render(host, path_and_query).await {
            Ok(page) => {
                counter!("shopfront_crawler_requests_total", "result" => "rendered").increment(1);
                debug!(host = %host, path = %path_and_query, status = page.status.as_u16(), "Served pre-rendered page");
                Some(into_response(page))
            }
            Err(e) => {
                counter!("shopfront_crawler_requests_total", "result" => "render_failed")
                    .increment(1);
                warn!(
                    host = %host,
                    path = %path_and_query,
                    error = %e,
                    "Render service failed, serving normally"
                );
                None
            }
        }
    }
}

/// Axum middleware entry point, installed with `from_fn_with_state`
pub async fn crawler_diversion_middleware(
    State(crawler): State<CrawlerDiversion>,
    request: Request,
    next: Next,
) -> Response {
    if let Some((host, path_and_query)) = crawler.classify(&request) {
        if let Some(response) = crawler.render(&host, &path_and_query).await {
            return response;
        }
    }
    next.run(request).await
}

/// Service endpoints are never storefront pages
fn is_service_path(path: &str) -> bool {
    path.starts_with("/api/") || matches!(path, "/health" | "/ready" | "/metrics")
}

fn request_host(request: &Request) -> Option<String> {
    let raw = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| request.uri().authority().map(|a| a.as_str()))?;

    let host = normalize_host(raw);
    (!host.is_empty()).then_some(host)
}

fn into_response(page: RenderedPage) -> Response {
    let mut response = Response::new(Body::from(page.body));
    *response.status_mut() = page.status;
    *response.headers_mut() = page.headers;
    response
}
