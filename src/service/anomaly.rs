//! Consumption anomaly detection and audit

use crate::domain::{AnomalyRecord, NewAnomalyRecord, NewFuelEvent, VehicleTypeProfile};
use crate::error::{AppError, Result};
use crate::policy::{enforce, Action};
use crate::repository::AnomalyRepository;
use crate::telemetry::metrics;
use crate::tenant::TenantContext;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Configuration for consumption anomaly detection
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Fraction above the expected consumption that is still tolerated
    pub tolerance: Decimal,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            tolerance: Decimal::new(15, 2),
        }
    }
}

/// Compares refuel volume with the distance-implied expectation
#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: DetectorConfig,
}

impl AnomalyDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Raise an anomaly when `liters > expected * (1 + tolerance)`.
    ///
    /// Returns `None` when no distance can be computed or the expectation is
    /// zero.
    pub fn evaluate(
        &self,
        event: &NewFuelEvent,
        previous_odometer: Option<i64>,
        profile: &VehicleTypeProfile,
    ) -> Option<NewAnomalyRecord> {
        let previous = previous_odometer?;
        if event.odometer_reading <= previous {
            return None;
        }

        let distance = event.odometer_reading - previous;
        let expected =
            Decimal::from(distance) / Decimal::ONE_HUNDRED * profile.expected_consumption_per_100km;
        let actual = event.liters;

        if expected.is_zero() {
            return None;
        }

        let threshold = expected * (Decimal::ONE + self.config.tolerance);
        if actual > threshold {
            Some(NewAnomalyRecord {
                fuel_event_id: event.id,
                organization_id: event.organization_id,
                expected_consumption: expected,
                actual_consumption: actual,
                distance_traveled: distance,
            })
        } else {
            None
        }
    }
}

pub struct AnomalyService<R: AnomalyRepository> {
    repo: Arc<R>,
}

impl<R: AnomalyRepository> AnomalyService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, ctx: &TenantContext, only_unchecked: bool) -> Result<Vec<AnomalyRecord>> {
        enforce(ctx, Action::ViewAnomalies)?;
        self.repo.list(ctx.scope(), only_unchecked).await
    }

    pub async fn get(&self, ctx: &TenantContext, id: Uuid) -> Result<AnomalyRecord> {
        enforce(ctx, Action::ViewAnomalies)?;
        self.find_visible(ctx, id).await
    }

    /// Record the audit of an anomaly.
    ///
    /// Checking an already-checked record returns it unchanged; the first
    /// checker and timestamp are kept.
    pub async fn mark_checked(&self, ctx: &TenantContext, id: Uuid) -> Result<AnomalyRecord> {
        enforce(ctx, Action::AuditAnomalies)?;

        let existing = self.find_visible(ctx, id).await?;
        if existing.is_checked() {
            return Ok(existing);
        }

        match self
            .repo
            .mark_checked(ctx.scope(), id, ctx.actor_id(), Utc::now())
            .await?
        {
            Some(record) => {
                metrics::record_anomaly_checked();
                tracing::info!(
                    anomaly_id = %id,
                    checked_by = %ctx.actor_id(),
                    "Fuel anomaly checked"
                );
                Ok(record)
            }
            // Lost a race with another checker
            None => self.find_visible(ctx, id).await,
        }
    }

    async fn find_visible(&self, ctx: &TenantContext, id: Uuid) -> Result<AnomalyRecord> {
        self.repo
            .find_by_id(ctx.scope(), id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Anomaly {} not found", id)))
    }
}
