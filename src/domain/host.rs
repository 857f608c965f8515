//! Host registry domain model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Longest DNS label accepted as a subdomain
pub const MAX_SUBDOMAIN_LEN: usize = 63;

/// Hostnames a tenant's storefront answers on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HostMapping {
    pub tenant_id: Uuid,
    pub primary_host: String,
    pub extra_hosts: Vec<String>,
}

impl HostMapping {
    pub fn new(tenant_id: Uuid, primary_host: impl Into<String>) -> Self {
        Self {
            tenant_id,
            primary_host: primary_host.into(),
            extra_hosts: Vec::new(),
        }
    }

    pub fn serves(&self, host: &str) -> bool {
        self.primary_host == host || self.extra_hosts.iter().any(|h| h == host)
    }
}

/// Normalize a requested subdomain label.
///
/// Lowercases and trims, drops everything outside `[a-z0-9-]`, then strips
/// leading/trailing hyphens. `"My Shop!"` becomes `"myshop"`. Returns `None`
/// when nothing usable remains or the label is too long.
pub fn normalize_subdomain(candidate: &str) -> Option<String> {
    let cleaned: String = candidate
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect();
    let label = cleaned.trim_matches('-');

    if label.is_empty() || label.len() > MAX_SUBDOMAIN_LEN {
        return None;
    }
    Some(label.to_string())
}

/// Canonical form of a request host: lowercase, no port, no trailing dot.
pub fn normalize_host(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_port = if trimmed.starts_with('[') {
        // IPv6 literal, keep the brackets
        match trimmed.find(']') {
            Some(end) => &trimmed[..=end],
            None => trimmed,
        }
    } else {
        trimmed.split(':').next().unwrap_or(trimmed)
    };
    without_port.trim_end_matches('.').to_lowercase()
}

/// Availability check request body. The field is kept loose so a non-string
/// value is reported as a bad request instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityRequest {
    #[serde(default)]
    pub subdomain: Option<serde_json::Value>,
}

/// Availability check response. Exactly one field so taken names never reveal their owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub available: bool,
}
