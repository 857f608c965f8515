//! Domain purchase lifecycle endpoints

use crate::api::SuccessResponse;
use crate::domain::{CreateDomainPurchaseInput, FailDomainInput};
use crate::error::Result;
use crate::state::HasServices;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

/// Record a new purchase
pub async fn create<S: HasServices>(
    State(state): State<S>,
    Json(input): Json<CreateDomainPurchaseInput>,
) -> Result<impl IntoResponse> {
    let purchase = state.provisioning_service().create(input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(purchase))))
}

pub async fn get<S: HasServices>(
    State(state): State<S>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let purchase = state.provisioning_service().get(id).await?;
    Ok(Json(SuccessResponse::new(purchase)))
}

/// Registrar confirmed the purchase
pub async fn mark_registered<S: HasServices>(
    State(state): State<S>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let purchase = state.provisioning_service().mark_registered(id).await?;
    Ok(Json(SuccessResponse::new(purchase)))
}

/// Manual completion attempt, answers `{"success": bool}`
pub async fn complete<S: HasServices>(
    State(state): State<S>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let outcome = state.provisioning_service().attempt_completion(id).await?;
    Ok(Json(outcome))
}

pub async fn mark_failed<S: HasServices>(
    State(state): State<S>,
    Path(id): Path<Uuid>,
    Json(input): Json<FailDomainInput>,
) -> Result<impl IntoResponse> {
    let purchase = state.provisioning_service().mark_failed(id, input).await?;
    Ok(Json(SuccessResponse::new(purchase)))
}

/// Run one DNS retry pass, answers `{"checked": n, "results": [...]}`
pub async fn retry_dns<S: HasServices>(State(state): State<S>) -> Result<impl IntoResponse> {
    let report = state.retry_scheduler().run_once().await?;
    Ok(Json(report))
}
