//! Domain purchase domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Metadata key stamped on every scheduled retry
pub const META_LAST_RETRY_AT: &str = "last_retry_at";
/// Metadata key stamped when the final allowed check fails
pub const META_RETRIES_EXHAUSTED_AT: &str = "dns_retries_exhausted_at";
/// Metadata keys written by an explicit failure
pub const META_FAILED_AT: &str = "failed_at";
pub const META_FAILURE_REASON: &str = "failure_reason";

/// Lifecycle of a purchased domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DomainStatus {
    /// Purchase recorded, registration not yet confirmed
    #[default]
    Pending,
    /// Registered, waiting for DNS to propagate
    DnsPending,
    /// DNS verified and host registered
    Active,
    /// Abandoned by an explicit decision
    Failed,
}

impl DomainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainStatus::Pending => "pending",
            DomainStatus::DnsPending => "dns_pending",
            DomainStatus::Active => "active",
            DomainStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DomainStatus::Active | DomainStatus::Failed)
    }
}

impl std::str::FromStr for DomainStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(DomainStatus::Pending),
            "dns_pending" => Ok(DomainStatus::DnsPending),
            "active" => Ok(DomainStatus::Active),
            "failed" => Ok(DomainStatus::Failed),
            _ => Err(format!("Unknown domain status: {}", s)),
        }
    }
}

impl std::fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for DomainStatus {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl sqlx::Type<sqlx::Postgres> for DomainStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for DomainStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> std::result::Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// A custom domain acquired by or for a tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DomainPurchase {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub domain: String,
    pub status: DomainStatus,
    pub dns_check_attempts: i32,
    #[sqlx(json)]
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for DomainPurchase {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            domain: String::new(),
            status: DomainStatus::default(),
            dns_check_attempts: 0,
            metadata: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for recording a new domain purchase
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDomainPurchaseInput {
    pub tenant_id: Uuid,
    #[validate(length(min = 3, max = 253), custom(function = "validate_domain"))]
    pub domain: String,
}

/// Input for explicitly abandoning a domain purchase
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct FailDomainInput {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

/// Validate a fully-qualified domain (lowercase labels separated by dots)
fn validate_domain(domain: &str) -> Result<(), validator::ValidationError> {
    if DOMAIN_REGEX.is_match(domain) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_domain"))
    }
}

// Regex for domain validation
lazy_static::lazy_static! {
    pub static ref DOMAIN_REGEX: regex::Regex =
        regex::Regex::new(r"^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}$").unwrap();
}

/// Result of a completion attempt. `false` means "not yet", never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub success: bool,
}

impl CompletionOutcome {
    pub fn succeeded() -> Self {
        Self { success: true }
    }

    pub fn not_yet() -> Self {
        Self { success: false }
    }
}

/// Per-domain entry of a retry tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryResult {
    pub domain: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate result of a retry tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryReport {
    pub checked: usize,
    pub results: Vec<RetryResult>,
}
