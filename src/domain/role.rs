//! Role assignment domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Priority given to role kinds outside the ranked set
pub const UNRANKED_PRIORITY: u16 = 999;

/// Capability level a user holds with respect to a tenant (or the platform, for superadmins)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoleKind {
    Superadmin,
    TenantAdmin,
    TenantStaff,
    StoreManager,
    /// Any role kind this service does not rank
    Other(String),
}

impl RoleKind {
    pub fn as_str(&self) -> &str {
        match self {
            RoleKind::Superadmin => "superadmin",
            RoleKind::TenantAdmin => "tenant_admin",
            RoleKind::TenantStaff => "tenant_staff",
            RoleKind::StoreManager => "store_manager",
            RoleKind::Other(name) => name,
        }
    }

    pub fn is_superadmin(&self) -> bool {
        matches!(self, RoleKind::Superadmin)
    }

    /// Lower wins. `None` for superadmin, which sits outside the order.
    pub fn priority(&self) -> Option<u16> {
        match self {
            RoleKind::Superadmin => None,
            RoleKind::TenantAdmin => Some(1),
            RoleKind::TenantStaff => Some(2),
            RoleKind::StoreManager => Some(3),
            RoleKind::Other(_) => Some(UNRANKED_PRIORITY),
        }
    }
}

impl From<String> for RoleKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "superadmin" => RoleKind::Superadmin,
            "tenant_admin" => RoleKind::TenantAdmin,
            "tenant_staff" => RoleKind::TenantStaff,
            "store_manager" => RoleKind::StoreManager,
            _ => RoleKind::Other(value),
        }
    }
}

impl From<&str> for RoleKind {
    fn from(value: &str) -> Self {
        RoleKind::from(value.to_string())
    }
}

impl From<RoleKind> for String {
    fn from(value: RoleKind) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl sqlx::Type<sqlx::Postgres> for RoleKind {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for RoleKind {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::Postgres>::decode(value)?;
        Ok(RoleKind::from(s))
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for RoleKind {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> std::result::Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// A role a user holds, as stored in the role store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RoleAssignment {
    pub user_id: Uuid,
    /// Null for platform-wide assignments
    pub tenant_id: Option<Uuid>,
    pub role: RoleKind,
    pub granted_at: DateTime<Utc>,
}

impl Default for RoleAssignment {
    fn default() -> Self {
        Self {
            user_id: Uuid::new_v4(),
            tenant_id: Some(Uuid::new_v4()),
            role: RoleKind::TenantStaff,
            granted_at: Utc::now(),
        }
    }
}
