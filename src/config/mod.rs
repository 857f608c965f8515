//! Configuration management for Shopfront Core

use anyhow::{Context, Result};
use std::env;
use std::net::IpAddr;

/// Default ceiling for DNS propagation checks per domain purchase
pub const DEFAULT_MAX_DNS_CHECK_ATTEMPTS: i32 = 10;

/// User agent fragments that identify automated clients (crawlers, link previewers)
pub const DEFAULT_CRAWLER_AGENT_PATTERNS: &[&str] = &[
    "bot",
    "crawler",
    "spider",
    "crawling",
    "facebookexternalhit",
    "facebot",
    "twitterbot",
    "linkedinbot",
    "slackbot",
    "discordbot",
    "whatsapp",
    "telegrambot",
    "pinterest",
    "embedly",
    "quora link preview",
    "redditbot",
    "applebot",
    "skypeuripreview",
];

/// Headers accepted on cross-origin requests to the public endpoints
pub const DEFAULT_CORS_ALLOWED_HEADERS: &[&str] =
    &["authorization", "x-client-info", "apikey", "content-type"];

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Platform-wide settings
    pub platform: PlatformConfig,
    /// Domain provisioning settings
    pub provisioning: ProvisioningConfig,
    /// Crawler diversion settings
    pub crawler: CrawlerConfig,
    /// CORS settings for public endpoints
    pub cors: CorsConfig,
    /// Logging, metrics and tracing
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub run_migrations: bool,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Root domain that tenant subdomains hang off (e.g. `shopfront.app`)
    pub root_domain: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            root_domain: "shopfront.app".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProvisioningConfig {
    /// Domains with this many checks or more are no longer retried
    pub max_dns_check_attempts: i32,
    /// Addresses a provisioned domain must resolve to. Empty accepts any resolution.
    pub expected_targets: Vec<IpAddr>,
    /// Upper bound for a single DNS lookup
    pub dns_lookup_timeout_ms: u64,
    /// Period of the in-process retry driver; 0 leaves triggering to an external scheduler
    pub retry_interval_secs: u64,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            max_dns_check_attempts: DEFAULT_MAX_DNS_CHECK_ATTEMPTS,
            expected_targets: Vec::new(),
            dns_lookup_timeout_ms: 5000,
            retry_interval_secs: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Rendering endpoint for automated agents; diversion is off when unset
    pub render_url: Option<String>,
    /// Lowercase substrings matched against the User-Agent header
    pub agent_patterns: Vec<String>,
    /// Timeout for the downstream render call
    pub timeout_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            render_url: None,
            agent_patterns: DEFAULT_CRAWLER_AGENT_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_headers: DEFAULT_CORS_ALLOWED_HEADERS
                .iter()
                .map(|h| h.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// "json" or "pretty"
    pub log_format: String,
    pub metrics_enabled: bool,
    pub tracing_enabled: bool,
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            tracing_enabled: false,
            otlp_endpoint: None,
            service_name: "shopfront-core".to_string(),
        }
    }
}

/// Split a comma-separated env value into trimmed, non-empty items
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|s| s.to_lowercase() == "true")
        .unwrap_or(false)
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
                run_migrations: env_flag("DATABASE_RUN_MIGRATIONS"),
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET").context("JWT_SECRET is required")?,
                issuer: env::var("JWT_ISSUER")
                    .unwrap_or_else(|_| "https://auth.shopfront.app".to_string()),
                audience: env::var("JWT_AUDIENCE").unwrap_or_else(|_| "authenticated".to_string()),
            },
            platform: PlatformConfig {
                root_domain: env::var("PLATFORM_ROOT_DOMAIN")
                    .map(|d| d.trim().trim_start_matches('.').to_lowercase())
                    .unwrap_or_else(|_| PlatformConfig::default().root_domain),
            },
            provisioning: {
                let expected_targets = match env::var("DNS_EXPECTED_TARGETS") {
                    Ok(raw) => split_list(&raw)
                        .iter()
                        .map(|ip| {
                            ip.parse::<IpAddr>()
                                .with_context(|| format!("Invalid DNS_EXPECTED_TARGETS entry '{}'", ip))
                        })
                        .collect::<Result<Vec<_>>>()?,
                    Err(_) => Vec::new(),
                };

                ProvisioningConfig {
                    max_dns_check_attempts: env::var("DNS_MAX_CHECK_ATTEMPTS")
                        .unwrap_or_else(|_| DEFAULT_MAX_DNS_CHECK_ATTEMPTS.to_string())
                        .parse()
                        .context("Invalid DNS_MAX_CHECK_ATTEMPTS")?,
                    expected_targets,
                    dns_lookup_timeout_ms: env::var("DNS_LOOKUP_TIMEOUT_MS")
                        .unwrap_or_else(|_| "5000".to_string())
                        .parse()
                        .unwrap_or(5000),
                    retry_interval_secs: env::var("DNS_RETRY_INTERVAL_SECS")
                        .unwrap_or_else(|_| "0".to_string())
                        .parse()
                        .context("Invalid DNS_RETRY_INTERVAL_SECS")?,
                }
            },
            crawler: {
                let agent_patterns = env::var("CRAWLER_AGENT_PATTERNS")
                    .map(|raw| {
                        split_list(&raw)
                            .into_iter()
                            .map(|p| p.to_lowercase())
                            .collect()
                    })
                    .unwrap_or_else(|_| CrawlerConfig::default().agent_patterns);

                CrawlerConfig {
                    render_url: env::var("CRAWLER_RENDER_URL")
                        .ok()
                        .filter(|u| !u.trim().is_empty()),
                    agent_patterns,
                    timeout_ms: env::var("CRAWLER_TIMEOUT_MS")
                        .unwrap_or_else(|_| "10000".to_string())
                        .parse()
                        .unwrap_or(10_000),
                }
            },
            cors: CorsConfig {
                allowed_headers: env::var("CORS_ALLOWED_HEADERS")
                    .map(|raw| split_list(&raw))
                    .unwrap_or_else(|_| CorsConfig::default().allowed_headers),
            },
            telemetry: TelemetryConfig {
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
                metrics_enabled: env_flag("METRICS_ENABLED"),
                tracing_enabled: env_flag("OTEL_TRACING_ENABLED"),
                otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok(),
                service_name: env::var("OTEL_SERVICE_NAME")
                    .unwrap_or_else(|_| "shopfront-core".to_string()),
            },
        })
    }

    /// Get HTTP server address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Fully-qualified host for a tenant subdomain label
    pub fn subdomain_host(&self, label: &str) -> String {
        format!("{}.{}", label, self.platform.root_domain)
    }
}
