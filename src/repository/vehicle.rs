//! Vehicle repository

use super::begin_scoped;
use crate::domain::VehicleWithProfile;
use crate::error::Result;
use crate::tenant::{apply_scope, AccessScope, LogicalQuery, TenantScoped};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

impl TenantScoped for VehicleWithProfile {
    const TABLE: &'static str =
        "vehicles JOIN vehicle_types ON vehicle_types.id = vehicles.vehicle_type_id";
    const ORGANIZATION_COLUMN: &'static str = "vehicles.organization_id";
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// Vehicle with its type's consumption profile
    async fn find_with_profile(
        &self,
        scope: &AccessScope,
        vehicle_id: Uuid,
    ) -> Result<Option<VehicleWithProfile>>;
}

pub struct VehicleRepositoryImpl {
    pool: PgPool,
}

impl VehicleRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleRepository for VehicleRepositoryImpl {
    async fn find_with_profile(
        &self,
        scope: &AccessScope,
        vehicle_id: Uuid,
    ) -> Result<Option<VehicleWithProfile>> {
        let query = apply_scope(
            LogicalQuery::of::<VehicleWithProfile>().eq("vehicles.id", vehicle_id),
            scope,
        );

        let mut tx = begin_scoped(&self.pool, scope).await?;
        let vehicle = query
            .select(
                "vehicles.id AS vehicle_id, vehicles.organization_id, vehicles.license_plate, \
                 vehicle_types.expected_consumption_per_100km, vehicle_types.tank_capacity",
            )
            .build_query_as::<VehicleWithProfile>()
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(vehicle)
    }
}
