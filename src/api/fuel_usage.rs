//! Fuel usage API handler

use crate::api::{query_params, CardQuery, SuccessResponse};
use crate::domain::FuelUsage;
use crate::error::AppError;
use crate::middleware::RequestContext;
use crate::policy::{enforce, Action};
use crate::state::HasServices;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};

/// Day, week and month fuel spend in the caller's scope
pub async fn get<S: HasServices>(
    State(state): State<S>,
    ctx: RequestContext,
    query: Result<Query<CardQuery>, QueryRejection>,
) -> Result<Json<SuccessResponse<FuelUsage>>, AppError> {
    let query = query_params(query, "card_id")?;
    enforce(&ctx, Action::ViewFleetData)?;
    let usage = state
        .usage_aggregator()
        .usage(ctx.scope(), query.card_id)
        .await?;
    Ok(Json(SuccessResponse::new(usage)))
}
