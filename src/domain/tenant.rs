//! Tenant context domain model

use super::role::RoleKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An authenticated user as seen by the tenant resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    /// Tenant id stored in the user's own profile metadata, used when roles are unavailable
    pub metadata_tenant_id: Option<Uuid>,
}

impl Identity {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            metadata_tenant_id: None,
        }
    }

    pub fn with_metadata_tenant(mut self, tenant_id: Uuid) -> Self {
        self.metadata_tenant_id = Some(tenant_id);
        self
    }
}

/// Where a resolved tenant id came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Picked from the user's role assignments
    Role,
    /// Degraded path: role store unavailable or empty
    ProfileMetadata,
    /// Superadmin; the caller selects the tenant
    Deferred,
    /// Nothing to go on
    Unresolved,
}

/// Tenant a request operates under. Recomputed per resolution, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    pub tenant_id: Option<Uuid>,
    pub source_role: Option<RoleKind>,
    pub is_superadmin: bool,
    pub source: ResolutionSource,
}

impl TenantContext {
    pub fn superadmin() -> Self {
        Self {
            tenant_id: None,
            source_role: Some(RoleKind::Superadmin),
            is_superadmin: true,
            source: ResolutionSource::Deferred,
        }
    }

    pub fn from_role(tenant_id: Uuid, role: RoleKind) -> Self {
        Self {
            tenant_id: Some(tenant_id),
            source_role: Some(role),
            is_superadmin: false,
            source: ResolutionSource::Role,
        }
    }

    pub fn from_metadata(tenant_id: Option<Uuid>) -> Self {
        Self {
            tenant_id,
            source_role: None,
            is_superadmin: false,
            source: if tenant_id.is_some() {
                ResolutionSource::ProfileMetadata
            } else {
                ResolutionSource::Unresolved
            },
        }
    }

    /// Combine with the tenant currently selected for the session.
    ///
    /// Only superadmins follow the session selection; everyone else stays on
    /// the tenant their roles resolved to.
    pub fn effective_tenant(&self, selected: Option<Uuid>) -> Option<Uuid> {
        if self.is_superadmin {
            selected
        } else {
            self.tenant_id
        }
    }
}
