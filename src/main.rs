use anyhow::Result;
use fleetops_core::{config::Config, server, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    let prometheus = telemetry::init(&config.telemetry)?;

    info!(
        service = %config.telemetry.service_name,
        "Starting FleetOps Core Service"
    );
    info!("HTTP server listening on {}", config.http_addr());

    server::run(config, prometheus).await
}
