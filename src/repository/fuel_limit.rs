//! Fuel limit policy repository

use super::begin_scoped;
use crate::domain::{FuelLimitPolicy, UpsertFuelLimitPolicy};
use crate::error::Result;
use crate::tenant::{apply_scope, AccessScope, LogicalQuery, SortOrder, TenantScoped};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const COLUMNS: &str = "id, organization_id, card_id, daily_cap, weekly_cap, monthly_cap, \
                       updated_by, created_at, updated_at";

impl TenantScoped for FuelLimitPolicy {
    const TABLE: &'static str = "fuel_limit_policies";
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FuelLimitRepository: Send + Sync {
    /// Row for the exact key; `card_id = None` is the organization default
    async fn find(
        &self,
        scope: &AccessScope,
        organization_id: Uuid,
        card_id: Option<Uuid>,
    ) -> Result<Option<FuelLimitPolicy>>;
    async fn list_for_organization(
        &self,
        scope: &AccessScope,
        organization_id: Uuid,
    ) -> Result<Vec<FuelLimitPolicy>>;
    async fn upsert(
        &self,
        scope: &AccessScope,
        input: &UpsertFuelLimitPolicy,
    ) -> Result<FuelLimitPolicy>;
    /// Returns whether a row was removed
    async fn delete(
        &self,
        scope: &AccessScope,
        organization_id: Uuid,
        card_id: Option<Uuid>,
    ) -> Result<bool>;
}

pub struct FuelLimitRepositoryImpl {
    pool: PgPool,
}

impl FuelLimitRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn key_query(organization_id: Uuid, card_id: Option<Uuid>) -> LogicalQuery {
    LogicalQuery::of::<FuelLimitPolicy>()
        .eq("organization_id", organization_id)
        .eq_or_null("card_id", card_id)
}

#[async_trait]
impl FuelLimitRepository for FuelLimitRepositoryImpl {
    async fn find(
        &self,
        scope: &AccessScope,
        organization_id: Uuid,
        card_id: Option<Uuid>,
    ) -> Result<Option<FuelLimitPolicy>> {
        let query = apply_scope(key_query(organization_id, card_id), scope);

        let mut tx = begin_scoped(&self.pool, scope).await?;
        let policy = query
            .select(COLUMNS)
            .build_query_as::<FuelLimitPolicy>()
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(policy)
    }

    async fn list_for_organization(
        &self,
        scope: &AccessScope,
        organization_id: Uuid,
    ) -> Result<Vec<FuelLimitPolicy>> {
        let query = apply_scope(
            LogicalQuery::of::<FuelLimitPolicy>()
                .eq("organization_id", organization_id)
                .order_by("card_id", SortOrder::Asc),
            scope,
        );

        let mut tx = begin_scoped(&self.pool, scope).await?;
        let policies = query
            .select(COLUMNS)
            .build_query_as::<FuelLimitPolicy>()
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(policies)
    }

    async fn upsert(
        &self,
        scope: &AccessScope,
        input: &UpsertFuelLimitPolicy,
    ) -> Result<FuelLimitPolicy> {
        scope.authorize_organization(input.organization_id)?;

        let mut tx = begin_scoped(&self.pool, scope).await?;
        let policy = sqlx::query_as::<_, FuelLimitPolicy>(
            r#"
            INSERT INTO fuel_limit_policies (id, organization_id, card_id, daily_cap, weekly_cap,
                                             monthly_cap, updated_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
            ON CONFLICT (organization_id, card_id) DO UPDATE
            SET daily_cap = EXCLUDED.daily_cap,
                weekly_cap = EXCLUDED.weekly_cap,
                monthly_cap = EXCLUDED.monthly_cap,
                updated_by = EXCLUDED.updated_by,
                updated_at = NOW()
            RETURNING id, organization_id, card_id, daily_cap, weekly_cap, monthly_cap,
                      updated_by, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.organization_id)
        .bind(input.card_id)
        .bind(input.limits.daily)
        .bind(input.limits.weekly)
        .bind(input.limits.monthly)
        .bind(input.updated_by)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(policy)
    }

    async fn delete(
        &self,
        scope: &AccessScope,
        organization_id: Uuid,
        card_id: Option<Uuid>,
    ) -> Result<bool> {
        let query = apply_scope(key_query(organization_id, card_id), scope);

        let mut tx = begin_scoped(&self.pool, scope).await?;
        let result = query.delete().build().execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}
