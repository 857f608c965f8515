//! Public subdomain availability endpoint

use crate::domain::AvailabilityRequest;
use crate::error::{AppError, Result};
use crate::state::HasServices;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use serde_json::Value;

/// POST /api/v1/subdomains/availability
///
/// Body `{"subdomain": "<candidate>"}`, answer `{"available": bool}`.
pub async fn check<S: HasServices>(
    State(state): State<S>,
    payload: std::result::Result<Json<AvailabilityRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(request) =
        payload.map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e.body_text())))?;

    let candidate = match request.subdomain {
        Some(Value::String(s)) => s,
        Some(_) => {
            return Err(AppError::BadRequest(
                "subdomain must be a string".to_string(),
            ))
        }
        None => return Err(AppError::BadRequest("subdomain is required".to_string())),
    };

    let response = state.availability_service().check(&candidate).await?;
    Ok(Json(response))
}
