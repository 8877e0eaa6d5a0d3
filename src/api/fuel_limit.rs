//! Fuel limit API handlers

use crate::api::{json_body, path_param, query_params, CardQuery, SuccessResponse};
use crate::domain::{EffectiveFuelLimits, FuelLimitPolicy, ReplaceFuelLimitsInput};
use crate::error::AppError;
use crate::middleware::RequestContext;
use crate::state::HasServices;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use uuid::Uuid;

/// Effective limits for the organization, or for one card with `?card_id=`
pub async fn get<S: HasServices>(
    State(state): State<S>,
    ctx: RequestContext,
    organization_id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<CardQuery>, QueryRejection>,
) -> Result<Json<SuccessResponse<EffectiveFuelLimits>>, AppError> {
    let organization_id = path_param(organization_id, "org_id")?;
    let query = query_params(query, "card_id")?;
    let limits = state
        .fuel_limit_service()
        .resolve(&ctx, organization_id, query.card_id)
        .await?;
    Ok(Json(SuccessResponse::new(limits)))
}

/// Replace the organization default, or a card policy with `?card_id=`
pub async fn replace<S: HasServices>(
    State(state): State<S>,
    ctx: RequestContext,
    organization_id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<CardQuery>, QueryRejection>,
    payload: Result<Json<ReplaceFuelLimitsInput>, JsonRejection>,
) -> Result<Json<SuccessResponse<FuelLimitPolicy>>, AppError> {
    let organization_id = path_param(organization_id, "org_id")?;
    let query = query_params(query, "card_id")?;
    let input = json_body(payload)?;
    let policy = state
        .fuel_limit_service()
        .replace(&ctx, organization_id, query.card_id, input)
        .await?;
    Ok(Json(SuccessResponse::new(policy)))
}

pub async fn remove<S: HasServices>(
    State(state): State<S>,
    ctx: RequestContext,
    organization_id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<CardQuery>, QueryRejection>,
) -> Result<StatusCode, AppError> {
    let organization_id = path_param(organization_id, "org_id")?;
    let query = query_params(query, "card_id")?;
    state
        .fuel_limit_service()
        .remove(&ctx, organization_id, query.card_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_policies<S: HasServices>(
    State(state): State<S>,
    ctx: RequestContext,
    organization_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SuccessResponse<Vec<FuelLimitPolicy>>>, AppError> {
    let organization_id = path_param(organization_id, "org_id")?;
    let policies = state
        .fuel_limit_service()
        .list(&ctx, organization_id)
        .await?;
    Ok(Json(SuccessResponse::new(policies)))
}
