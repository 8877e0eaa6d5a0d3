//! Vehicles and vehicle type reference data

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Consumption reference data for a vehicle type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleTypeProfile {
    /// Liters per 100 km
    pub expected_consumption_per_100km: Decimal,
    /// Liters
    pub tank_capacity: Option<Decimal>,
}

/// Vehicle joined with its type profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct VehicleWithProfile {
    pub vehicle_id: Uuid,
    pub organization_id: Uuid,
    pub license_plate: String,
    pub expected_consumption_per_100km: Decimal,
    pub tank_capacity: Option<Decimal>,
}

impl VehicleWithProfile {
    pub fn profile(&self) -> VehicleTypeProfile {
        VehicleTypeProfile {
            expected_consumption_per_100km: self.expected_consumption_per_100km,
            tank_capacity: self.tank_capacity,
        }
    }
}
