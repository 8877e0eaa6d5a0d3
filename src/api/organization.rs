//! Organization API handlers

use crate::api::SuccessResponse;
use crate::domain::Organization;
use crate::error::AppError;
use crate::middleware::RequestContext;
use crate::policy::{enforce, Action};
use crate::repository::OrganizationRepository;
use crate::state::HasServices;
use axum::{extract::State, Json};

/// Organizations visible in the caller's scope
pub async fn list<S: HasServices>(
    State(state): State<S>,
    ctx: RequestContext,
) -> Result<Json<SuccessResponse<Vec<Organization>>>, AppError> {
    enforce(&ctx, Action::ViewFleetData)?;
    let organizations = state.organization_repo().list(ctx.scope()).await?;
    Ok(Json(SuccessResponse::new(organizations)))
}
