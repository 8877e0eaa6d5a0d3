//! Consumption anomaly audit records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Fuel event whose liters exceed the distance-implied expectation
///
/// Created once at fuel event insertion; moves from unchecked to checked
/// exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AnomalyRecord {
    pub id: Uuid,
    pub fuel_event_id: Uuid,
    pub organization_id: Uuid,
    pub expected_consumption: Decimal,
    pub actual_consumption: Decimal,
    pub distance_traveled: i64,
    pub checked_by: Option<Uuid>,
    pub checked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AnomalyRecord {
    pub fn is_checked(&self) -> bool {
        self.checked_at.is_some()
    }
}

impl Default for AnomalyRecord {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            fuel_event_id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            expected_consumption: Decimal::ZERO,
            actual_consumption: Decimal::ZERO,
            distance_traveled: 0,
            checked_by: None,
            checked_at: None,
            created_at: Utc::now(),
        }
    }
}

/// Detector output, stored together with its fuel event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnomalyRecord {
    pub fuel_event_id: Uuid,
    pub organization_id: Uuid,
    pub expected_consumption: Decimal,
    pub actual_consumption: Decimal,
    pub distance_traveled: i64,
}
