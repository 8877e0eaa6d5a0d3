//! Application state traits for dependency injection
//!
//! Handlers are generic over [`HasServices`] so the same code runs against the
//! production `AppState` and the in-memory state used by integration tests.

use crate::jwt::JwtManager;
use crate::repository::{
    AnomalyRepository, FuelEventRepository, FuelLimitRepository, OrganizationRepository,
    VehicleRepository,
};
use crate::service::{AnomalyService, FuelEventService, FuelLimitService, UsageAggregator};

pub trait HasServices: Clone + Send + Sync + 'static {
    type OrganizationRepo: OrganizationRepository;
    type FuelLimitRepo: FuelLimitRepository;
    type FuelEventRepo: FuelEventRepository;
    type VehicleRepo: VehicleRepository;
    type AnomalyRepo: AnomalyRepository;

    fn jwt_manager(&self) -> &JwtManager;

    /// Organizations are read directly; there is no business logic around them
    fn organization_repo(&self) -> &Self::OrganizationRepo;

    fn fuel_limit_service(&self) -> &FuelLimitService<Self::FuelLimitRepo>;

    fn usage_aggregator(&self) -> &UsageAggregator<Self::FuelEventRepo>;

    fn fuel_event_service(
        &self,
    ) -> &FuelEventService<Self::FuelEventRepo, Self::VehicleRepo, Self::FuelLimitRepo>;

    fn anomaly_service(&self) -> &AnomalyService<Self::AnomalyRepo>;

    /// Check that the backing store is reachable
    fn check_ready(&self) -> impl std::future::Future<Output = bool> + Send;
}
