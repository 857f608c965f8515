//! Tenant resolution for authenticated users

use crate::domain::{Identity, RoleAssignment, RoleKind, TenantContext, UNRANKED_PRIORITY};
use crate::repository::RoleRepository;
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maps an authenticated identity to the tenant its requests operate under.
///
/// Resolution never fails: when the role store is unreachable the user's
/// profile metadata is used instead, so a storefront never blocks on it.
pub struct TenantResolver<R: RoleRepository> {
    role_repo: Arc<R>,
}

impl<R: RoleRepository> TenantResolver<R> {
    pub fn new(role_repo: Arc<R>) -> Self {
        Self { role_repo }
    }

    pub async fn resolve(&self, identity: &Identity) -> TenantContext {
        match self.role_repo.find_by_user(identity.user_id).await {
            Ok(assignments) => select_tenant(identity, assignments),
            Err(e) => {
                warn!(
                    user_id = %identity.user_id,
                    error = %e,
                    "Role lookup failed, falling back to profile metadata"
                );
                counter!("shopfront_tenant_resolution_fallback_total", "reason" => "store_error")
                    .increment(1);
                TenantContext::from_metadata(identity.metadata_tenant_id)
            }
        }
    }
}

/// Pick the tenant from a user's assignments.
///
/// Any superadmin assignment wins outright and defers the tenant to the
/// caller's selection. Otherwise the lowest-priority role bound to a tenant
/// wins; ties go to the most recent grant, then to the smallest tenant id so
/// the answer is stable across calls.
pub fn select_tenant(identity: &Identity, assignments: Vec<RoleAssignment>) -> TenantContext {
    if assignments.iter().any(|a| a.role.is_superadmin()) {
        return TenantContext::superadmin();
    }

    let best = assignments
        .into_iter()
        .filter_map(|a| a.tenant_id.map(|tenant_id| (tenant_id, a)))
        .min_by(|(tenant_a, a), (tenant_b, b)| {
            priority_of(&a.role)
                .cmp(&priority_of(&b.role))
                .then_with(|| b.granted_at.cmp(&a.granted_at))
                .then_with(|| tenant_a.cmp(tenant_b))
        });

    match best {
        Some((tenant_id, assignment)) => {
            debug!(
                user_id = %identity.user_id,
                tenant_id = %tenant_id,
                role = %assignment.role,
                "Resolved tenant from role"
            );
            TenantContext::from_role(tenant_id, assignment.role)
        }
        None => {
            counter!("shopfront_tenant_resolution_fallback_total", "reason" => "no_roles")
                .increment(1);
            TenantContext::from_metadata(identity.metadata_tenant_id)
        }
    }
}

fn priority_of(role: &RoleKind) -> u16 {
    role.priority().unwrap_or(UNRANKED_PRIORITY)
}
