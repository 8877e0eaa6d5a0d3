//! Fuel event API handler

use crate::api::{json_body, SuccessResponse};
use crate::domain::{CreateFuelEventInput, FuelEventCreated};
use crate::error::AppError;
use crate::middleware::RequestContext;
use crate::state::HasServices;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};

/// Record a fuel event; the response carries any anomaly and advisory warnings
pub async fn create<S: HasServices>(
    State(state): State<S>,
    ctx: RequestContext,
    payload: Result<Json<CreateFuelEventInput>, JsonRejection>,
) -> Result<(StatusCode, Json<SuccessResponse<FuelEventCreated>>), AppError> {
    let input = json_body(payload)?;
    let created = state.fuel_event_service().record(&ctx, input).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(created))))
}
