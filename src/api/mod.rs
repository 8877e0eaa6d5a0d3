//! REST API handlers and shared response types

pub mod anomaly;
pub mod fuel_event;
pub mod fuel_limit;
pub mod fuel_usage;
pub mod health;
pub mod metrics;
pub mod organization;

use crate::error::{AppError, Result};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Success response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Optional `?card_id=` selector
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardQuery {
    pub card_id: Option<Uuid>,
}

/// Unwrap a JSON body, reporting malformed payloads as validation failures
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::validation("body", rejection.body_text()))
}

/// Unwrap a path segment, reporting unparsable values against `field`
pub(crate) fn path_param<T>(
    path: std::result::Result<Path<T>, PathRejection>,
    field: &str,
) -> Result<T> {
    path.map(|Path(value)| value)
        .map_err(|rejection| AppError::validation(field, rejection.body_text()))
}

/// Unwrap a query string, reporting unparsable values against `field`
pub(crate) fn query_params<T>(
    query: std::result::Result<Query<T>, QueryRejection>,
    field: &str,
) -> Result<T> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| AppError::validation(field, rejection.body_text()))
}
