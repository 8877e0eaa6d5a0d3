//! Fuel limit resolution and policy management

use crate::domain::{
    EffectiveFuelLimits, FuelLimitPolicy, FuelLimits, LimitSource, ReplaceFuelLimitsInput,
    UpsertFuelLimitPolicy,
};
use crate::error::{AppError, Result};
use crate::policy::{enforce, Action};
use crate::repository::FuelLimitRepository;
use crate::tenant::{AccessScope, TenantContext};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct FuelLimitService<R: FuelLimitRepository> {
    repo: Arc<R>,
}

impl<R: FuelLimitRepository> FuelLimitService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Effective limits for an organization and optional card
    pub async fn resolve(
        &self,
        ctx: &TenantContext,
        organization_id: Uuid,
        card_id: Option<Uuid>,
    ) -> Result<EffectiveFuelLimits> {
        enforce(ctx, Action::ViewFuelLimits)?;
        ctx.scope().authorize_organization(organization_id)?;
        self.resolve_in_scope(ctx.scope(), organization_id, card_id)
            .await
    }

    /// Card policy, then organization default, then the system default.
    ///
    /// The first tier that exists supplies all three caps.
    pub async fn resolve_in_scope(
        &self,
        scope: &AccessScope,
        organization_id: Uuid,
        card_id: Option<Uuid>,
    ) -> Result<EffectiveFuelLimits> {
        if let Some(card_id) = card_id {
            if let Some(policy) = self
                .repo
                .find(scope, organization_id, Some(card_id))
                .await?
            {
                return Ok(EffectiveFuelLimits::from_policy(&policy, LimitSource::Card));
            }
        }

        if let Some(policy) = self.repo.find(scope, organization_id, None).await? {
            return Ok(EffectiveFuelLimits::from_policy(
                &policy,
                LimitSource::Organization,
            ));
        }

        Ok(EffectiveFuelLimits::system_default(organization_id))
    }

    /// Replace the caps stored for one (organization, card) key
    pub async fn replace(
        &self,
        ctx: &TenantContext,
        organization_id: Uuid,
        card_id: Option<Uuid>,
        input: ReplaceFuelLimitsInput,
    ) -> Result<FuelLimitPolicy> {
        enforce(ctx, Action::ManageFuelLimits)?;
        input.validate()?;
        ctx.scope().authorize_organization(organization_id)?;

        let policy = self
            .repo
            .upsert(
                ctx.scope(),
                &UpsertFuelLimitPolicy {
                    organization_id,
                    card_id,
                    limits: FuelLimits {
                        daily: input.daily_cap,
                        weekly: input.weekly_cap,
                        monthly: input.monthly_cap,
                    },
                    updated_by: ctx.actor_id(),
                },
            )
            .await?;

        tracing::info!(
            organization_id = %organization_id,
            card_id = ?card_id,
            updated_by = %ctx.actor_id(),
            "Fuel limit policy replaced"
        );

        Ok(policy)
    }

    /// Remove one tier so resolution falls back to the next
    pub async fn remove(
        &self,
        ctx: &TenantContext,
        organization_id: Uuid,
        card_id: Option<Uuid>,
    ) -> Result<()> {
        enforce(ctx, Action::ManageFuelLimits)?;
        ctx.scope().authorize_organization(organization_id)?;

        if !self
            .repo
            .delete(ctx.scope(), organization_id, card_id)
            .await?
        {
            return Err(AppError::NotFound("Fuel limit policy not found".to_string()));
        }

        tracing::info!(
            organization_id = %organization_id,
            card_id = ?card_id,
            "Fuel limit policy removed"
        );
        Ok(())
    }

    pub async fn list(
        &self,
        ctx: &TenantContext,
        organization_id: Uuid,
    ) -> Result<Vec<FuelLimitPolicy>> {
        enforce(ctx, Action::ViewFuelLimits)?;
        ctx.scope().authorize_organization(organization_id)?;
        self.repo
            .list_for_organization(ctx.scope(), organization_id)
            .await
    }
}
