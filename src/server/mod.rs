//! Server initialization and routing

use crate::api;
use crate::config::Config;
use crate::jwt::JwtManager;
use crate::middleware::ObservabilityLayer;
use crate::repository::{
    anomaly::AnomalyRepositoryImpl, fuel_event::FuelEventRepositoryImpl,
    fuel_limit::FuelLimitRepositoryImpl, organization::OrganizationRepositoryImpl,
    vehicle::VehicleRepositoryImpl,
};
use crate::service::{
    AnomalyDetector, AnomalyService, DetectorConfig, FuelEventService, FuelLimitService,
    UsageAggregator,
};
use crate::state::HasServices;
use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

type ProductionFuelEventService =
    FuelEventService<FuelEventRepositoryImpl, VehicleRepositoryImpl, FuelLimitRepositoryImpl>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_manager: JwtManager,
    pub organization_repo: Arc<OrganizationRepositoryImpl>,
    pub fuel_limit_service: Arc<FuelLimitService<FuelLimitRepositoryImpl>>,
    pub usage_aggregator: Arc<UsageAggregator<FuelEventRepositoryImpl>>,
    pub fuel_event_service: Arc<ProductionFuelEventService>,
    pub anomaly_service: Arc<AnomalyService<AnomalyRepositoryImpl>>,
}

impl AppState {
    /// Wire repositories and services over one connection pool
    pub fn new(config: &Config, db_pool: PgPool) -> Self {
        let organization_repo = Arc::new(OrganizationRepositoryImpl::new(db_pool.clone()));
        let fuel_limit_repo = Arc::new(FuelLimitRepositoryImpl::new(db_pool.clone()));
        let fuel_event_repo = Arc::new(FuelEventRepositoryImpl::new(db_pool.clone()));
        let vehicle_repo = Arc::new(VehicleRepositoryImpl::new(db_pool.clone()));
        let anomaly_repo = Arc::new(AnomalyRepositoryImpl::new(db_pool.clone()));

        let fuel_limit_service = Arc::new(FuelLimitService::new(fuel_limit_repo));
        let usage_aggregator = Arc::new(UsageAggregator::new(
            fuel_event_repo.clone(),
            config.fuel.timezone,
        ));
        let fuel_event_service = Arc::new(FuelEventService::new(
            fuel_event_repo,
            vehicle_repo,
            fuel_limit_service.clone(),
            usage_aggregator.clone(),
            AnomalyDetector::new(DetectorConfig::default()),
        ));
        let anomaly_service = Arc::new(AnomalyService::new(anomaly_repo));

        let jwt_manager = JwtManager::new(config.jwt.clone());

        Self {
            db_pool,
            jwt_manager,
            organization_repo,
            fuel_limit_service,
            usage_aggregator,
            fuel_event_service,
            anomaly_service,
        }
    }
}

impl HasServices for AppState {
    type OrganizationRepo = OrganizationRepositoryImpl;
    type FuelLimitRepo = FuelLimitRepositoryImpl;
    type FuelEventRepo = FuelEventRepositoryImpl;
    type VehicleRepo = VehicleRepositoryImpl;
    type AnomalyRepo = AnomalyRepositoryImpl;

    fn jwt_manager(&self) -> &JwtManager {
        &self.jwt_manager
    }

    fn organization_repo(&self) -> &Self::OrganizationRepo {
        &self.organization_repo
    }

    fn fuel_limit_service(&self) -> &FuelLimitService<Self::FuelLimitRepo> {
        &self.fuel_limit_service
    }

    fn usage_aggregator(&self) -> &UsageAggregator<Self::FuelEventRepo> {
        &self.usage_aggregator
    }

    fn fuel_event_service(&self) -> &ProductionFuelEventService {
        &self.fuel_event_service
    }

    fn anomaly_service(&self) -> &AnomalyService<Self::AnomalyRepo> {
        &self.anomaly_service
    }

    async fn check_ready(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(&self.db_pool)
            .await
            .is_ok()
    }
}

/// Run the server
pub async fn run(config: Config, prometheus: Option<PrometheusHandle>) -> Result<()> {
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    info!("Connected to database");

    if config.database.run_migrations {
        crate::migration::run_migrations(&db_pool).await?;
    }

    let http_addr = config.http_addr();
    info!(timezone = %config.fuel.timezone, "Fuel windows anchored to fleet timezone");

    let state = AppState::new(&config, db_pool);
    let app = build_router(state, prometheus);

    let listener = TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("Failed to bind {}", http_addr))?;
    info!("HTTP server started on {}", http_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the HTTP router with generic state type
///
/// Generic over the state so integration tests drive the same routes against
/// in-memory repositories.
pub fn build_router<S: HasServices>(state: S, prometheus: Option<PrometheusHandle>) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(api::metrics::metrics_handler))
        .with_state(Arc::new(prometheus));

    Router::new()
        .route("/health", get(api::health::health))
        .route("/ready", get(api::health::ready::<S>))
        .route("/api/v1/organizations", get(api::organization::list::<S>))
        .route(
            "/api/v1/organizations/{org_id}/fuel-limits",
            get(api::fuel_limit::get::<S>)
                .put(api::fuel_limit::replace::<S>)
                .delete(api::fuel_limit::remove::<S>),
        )
        .route(
            "/api/v1/organizations/{org_id}/fuel-limits/policies",
            get(api::fuel_limit::list_policies::<S>),
        )
        .route("/api/v1/fuel-usage", get(api::fuel_usage::get::<S>))
        .route("/api/v1/fuel-events", post(api::fuel_event::create::<S>))
        .route("/api/v1/anomalies", get(api::anomaly::list::<S>))
        .route("/api/v1/anomalies/{id}", get(api::anomaly::get::<S>))
        .route(
            "/api/v1/anomalies/{id}/check",
            post(api::anomaly::check::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(TraceLayer::new_for_http())
        .layer(ObservabilityLayer)
}
