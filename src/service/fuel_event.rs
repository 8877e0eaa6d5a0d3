//! Fuel event recording
//!
//! Inserting a fuel event also evaluates the consumption anomaly detector and
//! attaches advisory over-limit warnings. The event and its anomaly are stored
//! together; warnings never block the write.

use super::anomaly::AnomalyDetector;
use super::fuel_limit::FuelLimitService;
use super::usage::{exceeded_windows, limit_warnings, UsageAggregator};
use crate::domain::{CreateFuelEventInput, FuelEventCreated, NewFuelEvent, RecordedFuelEvent};
use crate::error::{AppError, Result};
use crate::policy::{enforce, Action};
use crate::repository::{FuelEventRepository, FuelLimitRepository, VehicleRepository};
use crate::telemetry::metrics;
use crate::tenant::{AccessScope, TenantContext};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct FuelEventService<E, V, L>
where
    E: FuelEventRepository,
    V: VehicleRepository,
    L: FuelLimitRepository,
{
    event_repo: Arc<E>,
    vehicle_repo: Arc<V>,
    limits: Arc<FuelLimitService<L>>,
    usage: Arc<UsageAggregator<E>>,
    detector: AnomalyDetector,
}

impl<E, V, L> FuelEventService<E, V, L>
where
    E: FuelEventRepository,
    V: VehicleRepository,
    L: FuelLimitRepository,
{
    pub fn new(
        event_repo: Arc<E>,
        vehicle_repo: Arc<V>,
        limits: Arc<FuelLimitService<L>>,
        usage: Arc<UsageAggregator<E>>,
        detector: AnomalyDetector,
    ) -> Self {
        Self {
            event_repo,
            vehicle_repo,
            limits,
            usage,
            detector,
        }
    }

    pub async fn record(
        &self,
        ctx: &TenantContext,
        input: CreateFuelEventInput,
    ) -> Result<FuelEventCreated> {
        enforce(ctx, Action::RecordFuelEvent)?;
        input.validate()?;

        let scope = ctx.scope();
        let organization_id = scope.resolve_target(input.organization_id)?;

        let vehicle = self
            .vehicle_repo
            .find_with_profile(scope, input.vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vehicle {} not found", input.vehicle_id)))?;
        if vehicle.organization_id != organization_id {
            return Err(AppError::validation(
                "vehicle_id",
                "Vehicle belongs to a different organization",
            ));
        }

        let occurred_on = input
            .occurred_on
            .unwrap_or_else(|| self.usage.today(Utc::now()));
        let previous_odometer = self
            .event_repo
            .latest_odometer(scope, vehicle.vehicle_id, occurred_on)
            .await?;

        let new_event = NewFuelEvent {
            id: Uuid::new_v4(),
            organization_id,
            vehicle_id: vehicle.vehicle_id,
            card_id: input.card_id,
            amount: input.amount,
            liters: input.liters,
            odometer_reading: input.odometer_reading,
            occurred_on,
            recorded_by: ctx.actor_id(),
        };
        let candidate = self
            .detector
            .evaluate(&new_event, previous_odometer, &vehicle.profile());

        let RecordedFuelEvent { event, anomaly } = self
            .event_repo
            .create(scope, &new_event, candidate)
            .await?;
        metrics::record_fuel_event();

        tracing::info!(
            fuel_event_id = %event.id,
            organization_id = %organization_id,
            vehicle_id = %event.vehicle_id,
            "Fuel event recorded"
        );
        if let Some(record) = &anomaly {
            metrics::record_anomaly_detected();
            tracing::info!(
                anomaly_id = %record.id,
                fuel_event_id = %event.id,
                expected = %record.expected_consumption,
                actual = %record.actual_consumption,
                "Fuel consumption anomaly raised"
            );
        }

        let mut warnings = Vec::new();
        if let Some(capacity) = vehicle.tank_capacity {
            if event.liters > capacity {
                warnings.push(format!(
                    "Refuel of {} l exceeds the tank capacity of {} l for {}",
                    event.liters.normalize(),
                    capacity.normalize(),
                    vehicle.license_plate
                ));
            }
        }
        match self.limit_warnings(organization_id, event.card_id).await {
            Ok(limit) => warnings.extend(limit),
            Err(e) => tracing::warn!(
                fuel_event_id = %event.id,
                error = %e,
                "Failed to compute fuel limit warnings"
            ),
        }

        Ok(FuelEventCreated {
            event,
            anomaly,
            warnings,
        })
    }

    async fn limit_warnings(
        &self,
        organization_id: Uuid,
        card_id: Option<Uuid>,
    ) -> Result<Vec<String>> {
        let scope = AccessScope::Organization(organization_id);
        let limits = self
            .limits
            .resolve_in_scope(&scope, organization_id, card_id)
            .await?
            .limits();
        let usage = self.usage.usage(&scope, card_id).await?;

        for (window, _, _) in exceeded_windows(&limits, &usage) {
            metrics::record_limit_warning(window.as_str());
        }
        Ok(limit_warnings(&limits, &usage))
    }
}
