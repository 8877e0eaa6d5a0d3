//! Organization repository

use super::begin_scoped;
use crate::domain::Organization;
use crate::error::Result;
use crate::tenant::{apply_scope, AccessScope, LogicalQuery, SortOrder, TenantScoped};
use async_trait::async_trait;
use sqlx::PgPool;

const COLUMNS: &str = "id, name, subscription_state, created_at";

impl TenantScoped for Organization {
    const TABLE: &'static str = "organizations";
    const ORGANIZATION_COLUMN: &'static str = "id";
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn list(&self, scope: &AccessScope) -> Result<Vec<Organization>>;
}

pub struct OrganizationRepositoryImpl {
    pool: PgPool,
}

impl OrganizationRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationRepository for OrganizationRepositoryImpl {
    async fn list(&self, scope: &AccessScope) -> Result<Vec<Organization>> {
        let query = apply_scope(
            LogicalQuery::of::<Organization>().order_by("name", SortOrder::Asc),
            scope,
        );

        let mut tx = begin_scoped(&self.pool, scope).await?;
        let organizations = query
            .select(COLUMNS)
            .build_query_as::<Organization>()
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(organizations)
    }
}
