//! Pre-rendered page fetching for automated clients

use crate::config::CrawlerConfig;
use anyhow::Context;
use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use std::time::Duration;
use url::Url;

/// Headers that describe the upstream connection rather than the page
const HOP_BY_HOP_HEADERS: [HeaderName; 3] = [
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    HeaderName::from_static("keep-alive"),
];

/// Recognizes crawler and link-preview user agents by substring
#[derive(Debug, Clone)]
pub struct CrawlerAgentMatcher {
    patterns: Vec<String>,
}

impl CrawlerAgentMatcher {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn is_automated(&self, user_agent: &str) -> bool {
        let agent = user_agent.to_lowercase();
        self.patterns.iter().any(|p| agent.contains(p.as_str()))
    }
}

/// A page as returned by the render service
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Client for the external pre-render service
#[derive(Clone)]
pub struct CrawlerRenderClient {
    client: reqwest::Client,
    render_url: Url,
}

impl CrawlerRenderClient {
    pub fn new(render_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let render_url = Url::parse(render_url)
            .with_context(|| format!("Invalid crawler render URL '{}'", render_url))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build crawler HTTP client")?;

        Ok(Self { client, render_url })
    }

    /// Build from config; `None` when no render service is configured
    pub fn from_config(config: &CrawlerConfig) -> anyhow::Result<Option<Self>> {
        config
            .render_url
            .as_deref()
            .map(|url| Self::new(url, Duration::from_millis(config.timeout_ms)))
            .transpose()
    }

    /// Render service URL for a page, carrying the original host and path
    pub fn url_for(&self, host: &str, path_and_query: &str) -> Url {
        let mut url = self.render_url.clone();
        url.query_pairs_mut()
            .append_pair("host", host)
            .append_pair("path", path_and_query);
        url
    }

    /// Fetch the rendered page. Any status the render service answers with is
    /// returned as-is; only transport failures are errors.
    pub async fn render(
        &self,
        host: &str,
        path_and_query: &str,
    ) -> std::result::Result<RenderedPage, reqwest::Error> {
        let response = self
            .client
            .get(self.url_for(host, path_and_query))
            .send()
            .await?;

        let status = response.status();
        let mut headers = response.headers().clone();
        for name in HOP_BY_HOP_HEADERS.iter() {
            headers.remove(name);
        }
        let body = response.bytes().await?;

        Ok(RenderedPage {
            status,
            headers,
            body,
        })
    }
}
