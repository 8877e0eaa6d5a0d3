//! Fuel event repository
//!
//! Fuel events are rows of the `expenses` table with `category = 'fuel'`.
//! A raised anomaly is written in the same transaction as its event.

use super::begin_scoped;
use crate::domain::{AnomalyRecord, FuelEvent, NewAnomalyRecord, NewFuelEvent, RecordedFuelEvent};
use crate::error::Result;
use crate::tenant::{apply_scope, AccessScope, Comparison, LogicalQuery, SortOrder, TenantScoped};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub const FUEL_CATEGORY: &str = "fuel";

impl TenantScoped for FuelEvent {
    const TABLE: &'static str = "expenses";
}

fn fuel_events() -> LogicalQuery {
    LogicalQuery::of::<FuelEvent>().eq("category", FUEL_CATEGORY)
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FuelEventRepository: Send + Sync {
    /// Insert the event and, when given, its anomaly; both or neither are stored
    async fn create(
        &self,
        scope: &AccessScope,
        input: &NewFuelEvent,
        anomaly: Option<NewAnomalyRecord>,
    ) -> Result<RecordedFuelEvent>;

    /// Odometer of the latest fuel event of a vehicle on or before `on_or_before`
    async fn latest_odometer(
        &self,
        scope: &AccessScope,
        vehicle_id: Uuid,
        on_or_before: NaiveDate,
    ) -> Result<Option<i64>>;

    /// Sum of fuel spend with `from <= occurred_on <= to`; `card_id = None`
    /// sums every card in the scope
    async fn sum_amount(
        &self,
        scope: &AccessScope,
        card_id: Option<Uuid>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Decimal>;
}

pub struct FuelEventRepositoryImpl {
    pool: PgPool,
}

impl FuelEventRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FuelEventRepository for FuelEventRepositoryImpl {
    async fn create(
        &self,
        scope: &AccessScope,
        input: &NewFuelEvent,
        anomaly: Option<NewAnomalyRecord>,
    ) -> Result<RecordedFuelEvent> {
        scope.authorize_organization(input.organization_id)?;

        let mut tx = begin_scoped(&self.pool, scope).await?;
        let event = sqlx::query_as::<_, FuelEvent>(
            r#"
            INSERT INTO expenses (id, organization_id, vehicle_id, card_id, category, amount,
                                  liters, odometer_reading, occurred_on, recorded_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW())
            RETURNING id, organization_id, vehicle_id, card_id, amount, liters,
                      odometer_reading, occurred_on, recorded_by, created_at
            "#,
        )
        .bind(input.id)
        .bind(input.organization_id)
        .bind(input.vehicle_id)
        .bind(input.card_id)
        .bind(FUEL_CATEGORY)
        .bind(input.amount)
        .bind(input.liters)
        .bind(input.odometer_reading)
        .bind(input.occurred_on)
        .bind(input.recorded_by)
        .fetch_one(&mut *tx)
        .await?;

        let anomaly = match anomaly {
            Some(candidate) => Some(
                sqlx::query_as::<_, AnomalyRecord>(
                    r#"
                    INSERT INTO fuel_anomalies (id, fuel_event_id, organization_id,
                                                expected_consumption, actual_consumption,
                                                distance_traveled, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6, NOW())
                    RETURNING id, fuel_event_id, organization_id, expected_consumption,
                              actual_consumption, distance_traveled, checked_by, checked_at,
                              created_at
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(candidate.fuel_event_id)
                .bind(candidate.organization_id)
                .bind(candidate.expected_consumption)
                .bind(candidate.actual_consumption)
                .bind(candidate.distance_traveled)
                .fetch_one(&mut *tx)
                .await?,
            ),
            None => None,
        };
        tx.commit().await?;

        Ok(RecordedFuelEvent { event, anomaly })
    }

    async fn latest_odometer(
        &self,
        scope: &AccessScope,
        vehicle_id: Uuid,
        on_or_before: NaiveDate,
    ) -> Result<Option<i64>> {
        let query = apply_scope(
            fuel_events()
                .eq("vehicle_id", vehicle_id)
                .filter("occurred_on", Comparison::Lte, on_or_before)
                .order_by("occurred_on", SortOrder::Desc)
                .order_by("created_at", SortOrder::Desc)
                .limit(1),
            scope,
        );

        let mut tx = begin_scoped(&self.pool, scope).await?;
        let odometer = query
            .select("odometer_reading")
            .build_query_scalar::<i64>()
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(odometer)
    }

    async fn sum_amount(
        &self,
        scope: &AccessScope,
        card_id: Option<Uuid>,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Decimal> {
        let mut logical = fuel_events()
            .filter("occurred_on", Comparison::Gte, from)
            .filter("occurred_on", Comparison::Lte, to);
        if let Some(card_id) = card_id {
            logical = logical.eq("card_id", card_id);
        }
        let query = apply_scope(logical, scope);

        let mut tx = begin_scoped(&self.pool, scope).await?;
        let total = query
            .sum("amount")
            .build_query_scalar::<Decimal>()
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(total)
    }
}
