//! Current tenant resolution for the signed-in user

use crate::api::SuccessResponse;
use crate::domain::TenantContext;
use crate::middleware::auth::AuthUser;
use crate::state::HasServices;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct CurrentTenantQuery {
    /// Tenant the session has selected; only honoured for superadmins
    pub selected_tenant: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentTenantResponse {
    #[serde(flatten)]
    pub context: TenantContext,
    /// Tenant requests should actually be scoped to
    pub effective_tenant_id: Option<Uuid>,
}

/// GET /api/v1/me/tenant
pub async fn current<S: HasServices>(
    State(state): State<S>,
    auth: AuthUser,
    Query(query): Query<CurrentTenantQuery>,
) -> impl IntoResponse {
    let context = state.tenant_resolver().resolve(&auth.identity).await;
    let effective_tenant_id = context.effective_tenant(query.selected_tenant);

    Json(SuccessResponse::new(CurrentTenantResponse {
        context,
        effective_tenant_id,
    }))
}
