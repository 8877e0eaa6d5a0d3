//! Fuel anomaly API handlers

use crate::api::{path_param, query_params, SuccessResponse};
use crate::domain::AnomalyRecord;
use crate::error::AppError;
use crate::middleware::RequestContext;
use crate::state::HasServices;
use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct AnomalyQuery {
    /// If true, only return anomalies nobody has checked yet
    #[serde(default)]
    pub unchecked: bool,
}

pub async fn list<S: HasServices>(
    State(state): State<S>,
    ctx: RequestContext,
    query: Result<Query<AnomalyQuery>, QueryRejection>,
) -> Result<Json<SuccessResponse<Vec<AnomalyRecord>>>, AppError> {
    let query = query_params(query, "unchecked")?;
    let anomalies = state
        .anomaly_service()
        .list(&ctx, query.unchecked)
        .await?;
    Ok(Json(SuccessResponse::new(anomalies)))
}

pub async fn get<S: HasServices>(
    State(state): State<S>,
    ctx: RequestContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SuccessResponse<AnomalyRecord>>, AppError> {
    let id = path_param(id, "id")?;
    let anomaly = state.anomaly_service().get(&ctx, id).await?;
    Ok(Json(SuccessResponse::new(anomaly)))
}

/// Check off an anomaly; repeated calls return the first check unchanged
pub async fn check<S: HasServices>(
    State(state): State<S>,
    ctx: RequestContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SuccessResponse<AnomalyRecord>>, AppError> {
    let id = path_param(id, "id")?;
    let anomaly = state.anomaly_service().mark_checked(&ctx, id).await?;
    Ok(Json(SuccessResponse::new(anomaly)))
}
