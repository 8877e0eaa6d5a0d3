//! Data access layer (Repository pattern)
//!
//! Every repository method takes the caller's resolved [`AccessScope`].
//! Reads and conditional writes go through [`crate::tenant::apply_scope`];
//! each statement runs in a transaction that also publishes the scope to the
//! row-level security policies of the schema.

pub mod anomaly;
pub mod fuel_event;
pub mod fuel_limit;
pub mod organization;
pub mod vehicle;

pub use anomaly::AnomalyRepository;
pub use fuel_event::FuelEventRepository;
pub use fuel_limit::FuelLimitRepository;
pub use organization::OrganizationRepository;
pub use vehicle::VehicleRepository;

use crate::error::Result;
use crate::tenant::AccessScope;
use sqlx::{PgPool, Postgres, Transaction};

/// Open a transaction with `app.organization_id` / `app.all_organizations`
/// set for the row-level security backstop.
pub(crate) async fn begin_scoped(
    pool: &PgPool,
    scope: &AccessScope,
) -> Result<Transaction<'static, Postgres>> {
    let mut tx = pool.begin().await?;

    let (organization_id, all_organizations) = match scope {
        AccessScope::AllOrganizations => (String::new(), "on"),
        AccessScope::Organization(id) => (id.to_string(), "off"),
    };

    sqlx::query(
        "SELECT set_config('app.organization_id', $1, true), set_config('app.all_organizations', $2, true)",
    )
    .bind(organization_id)
    .bind(all_organizations)
    .execute(&mut *tx)
    .await?;

    Ok(tx)
}
