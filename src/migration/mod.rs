//! Database migrations
//!
//! The schema ships with the binary; `DATABASE_RUN_MIGRATIONS` decides whether
//! the server applies it on startup.

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    info!("Running database migrations...");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run migrations")?;

    info!("Database migrations completed");
    Ok(())
}
