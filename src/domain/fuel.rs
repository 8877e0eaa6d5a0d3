//! Fuel limit policies and fuel events

use super::anomaly::AnomalyRecord;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Spend caps for the three usage windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelLimits {
    pub daily: Decimal,
    pub weekly: Decimal,
    pub monthly: Decimal,
}

impl FuelLimits {
    /// Caps applied when neither a card nor an organization policy exists
    pub fn system_default() -> Self {
        Self {
            daily: Decimal::from(400),
            weekly: Decimal::from(800),
            monthly: Decimal::from(1800),
        }
    }
}

/// Stored limit policy, keyed by (organization_id, card_id)
///
/// A `card_id` of `None` marks the organization default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FuelLimitPolicy {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub card_id: Option<Uuid>,
    pub daily_cap: Decimal,
    pub weekly_cap: Decimal,
    pub monthly_cap: Decimal,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FuelLimitPolicy {
    pub fn limits(&self) -> FuelLimits {
        FuelLimits {
            daily: self.daily_cap,
            weekly: self.weekly_cap,
            monthly: self.monthly_cap,
        }
    }
}

impl Default for FuelLimitPolicy {
    fn default() -> Self {
        let now = Utc::now();
        let limits = FuelLimits::system_default();
        Self {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            card_id: None,
            daily_cap: limits.daily,
            weekly_cap: limits.weekly,
            monthly_cap: limits.monthly,
            updated_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Which tier of the cascade supplied the effective limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitSource {
    Card,
    Organization,
    SystemDefault,
}

/// Result of resolving limits for an (organization, card) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveFuelLimits {
    pub organization_id: Uuid,
    pub card_id: Option<Uuid>,
    pub daily: Decimal,
    pub weekly: Decimal,
    pub monthly: Decimal,
    pub source: LimitSource,
}

impl EffectiveFuelLimits {
    pub fn from_policy(policy: &FuelLimitPolicy, source: LimitSource) -> Self {
        Self {
            organization_id: policy.organization_id,
            card_id: policy.card_id,
            daily: policy.daily_cap,
            weekly: policy.weekly_cap,
            monthly: policy.monthly_cap,
            source,
        }
    }

    pub fn system_default(organization_id: Uuid) -> Self {
        let limits = FuelLimits::system_default();
        Self {
            organization_id,
            card_id: None,
            daily: limits.daily,
            weekly: limits.weekly,
            monthly: limits.monthly,
            source: LimitSource::SystemDefault,
        }
    }

    pub fn limits(&self) -> FuelLimits {
        FuelLimits {
            daily: self.daily,
            weekly: self.weekly,
            monthly: self.monthly,
        }
    }
}

pub(crate) fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_positive() && !value.is_zero() {
        Ok(())
    } else {
        Err(ValidationError::new("positive").with_message(Cow::from("must be strictly positive")))
    }
}

/// Input for replacing the limits of one (organization, card) key
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReplaceFuelLimitsInput {
    #[validate(custom(function = "validate_positive"))]
    pub daily_cap: Decimal,
    #[validate(custom(function = "validate_positive"))]
    pub weekly_cap: Decimal,
    #[validate(custom(function = "validate_positive"))]
    pub monthly_cap: Decimal,
}

/// Row written by the limit repository
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertFuelLimitPolicy {
    pub organization_id: Uuid,
    pub card_id: Option<Uuid>,
    pub limits: FuelLimits,
    pub updated_by: Uuid,
}

/// A fuel-category expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FuelEvent {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub vehicle_id: Uuid,
    pub card_id: Option<Uuid>,
    pub amount: Decimal,
    pub liters: Decimal,
    pub odometer_reading: i64,
    pub occurred_on: NaiveDate,
    pub recorded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Default for FuelEvent {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            card_id: None,
            amount: Decimal::ZERO,
            liters: Decimal::ZERO,
            odometer_reading: 0,
            occurred_on: now.date_naive(),
            recorded_by: Uuid::new_v4(),
            created_at: now,
        }
    }
}

/// Input for recording a fuel event
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateFuelEventInput {
    /// Required only for callers that are not bound to an organization
    #[serde(default)]
    pub organization_id: Option<Uuid>,
    pub vehicle_id: Uuid,
    #[serde(default)]
    pub card_id: Option<Uuid>,
    #[validate(custom(function = "validate_positive"))]
    pub amount: Decimal,
    #[validate(custom(function = "validate_positive"))]
    pub liters: Decimal,
    #[validate(range(min = 0, message = "must not be negative"))]
    pub odometer_reading: i64,
    /// Defaults to today in the fleet time zone
    #[serde(default)]
    pub occurred_on: Option<NaiveDate>,
}

/// Row written by the fuel event repository
#[derive(Debug, Clone, PartialEq)]
pub struct NewFuelEvent {
    /// Assigned before insertion so a raised anomaly can reference the event
    pub id: Uuid,
    pub organization_id: Uuid,
    pub vehicle_id: Uuid,
    pub card_id: Option<Uuid>,
    pub amount: Decimal,
    pub liters: Decimal,
    pub odometer_reading: i64,
    pub occurred_on: NaiveDate,
    pub recorded_by: Uuid,
}

/// Event row and the anomaly stored in the same transaction
#[derive(Debug, Clone)]
pub struct RecordedFuelEvent {
    pub event: FuelEvent,
    pub anomaly: Option<AnomalyRecord>,
}

/// Fuel spend summed over the three windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FuelUsage {
    pub daily: Decimal,
    pub weekly: Decimal,
    pub monthly: Decimal,
}

/// Response for fuel event creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuelEventCreated {
    pub event: FuelEvent,
    pub anomaly: Option<AnomalyRecord>,
    pub warnings: Vec<String>,
}
