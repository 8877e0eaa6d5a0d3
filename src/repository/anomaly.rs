//! Fuel anomaly repository

use super::begin_scoped;
use crate::domain::AnomalyRecord;
use crate::error::Result;
use crate::tenant::{apply_scope, AccessScope, LogicalQuery, SortOrder, SqlValue, TenantScoped};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const COLUMNS: &str = "id, fuel_event_id, organization_id, expected_consumption, \
                       actual_consumption, distance_traveled, checked_by, checked_at, created_at";

impl TenantScoped for AnomalyRecord {
    const TABLE: &'static str = "fuel_anomalies";
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnomalyRepository: Send + Sync {
    async fn find_by_id(&self, scope: &AccessScope, id: Uuid) -> Result<Option<AnomalyRecord>>;
    async fn list(&self, scope: &AccessScope, only_unchecked: bool) -> Result<Vec<AnomalyRecord>>;

    /// Set the checker on an unchecked record.
    ///
    /// Returns `None` when the record is already checked or not visible.
    async fn mark_checked(
        &self,
        scope: &AccessScope,
        id: Uuid,
        checked_by: Uuid,
        checked_at: DateTime<Utc>,
    ) -> Result<Option<AnomalyRecord>>;
}

pub struct AnomalyRepositoryImpl {
    pool: PgPool,
}

impl AnomalyRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnomalyRepository for AnomalyRepositoryImpl {
    async fn find_by_id(&self, scope: &AccessScope, id: Uuid) -> Result<Option<AnomalyRecord>> {
        let query = apply_scope(LogicalQuery::of::<AnomalyRecord>().eq("id", id), scope);

        let mut tx = begin_scoped(&self.pool, scope).await?;
        let record = query
            .select(COLUMNS)
            .build_query_as::<AnomalyRecord>()
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(record)
    }

    async fn list(&self, scope: &AccessScope, only_unchecked: bool) -> Result<Vec<AnomalyRecord>> {
        let mut logical = LogicalQuery::of::<AnomalyRecord>();
        if only_unchecked {
            logical = logical.is_null("checked_at");
        }
        let query = apply_scope(logical.order_by("created_at", SortOrder::Desc), scope);

        let mut tx = begin_scoped(&self.pool, scope).await?;
        let records = query
            .select(COLUMNS)
            .build_query_as::<AnomalyRecord>()
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(records)
    }

    async fn mark_checked(
        &self,
        scope: &AccessScope,
        id: Uuid,
        checked_by: Uuid,
        checked_at: DateTime<Utc>,
    ) -> Result<Option<AnomalyRecord>> {
        let query = apply_scope(
            LogicalQuery::of::<AnomalyRecord>()
                .eq("id", id)
                .is_null("checked_at"),
            scope,
        );

        let mut tx = begin_scoped(&self.pool, scope).await?;
        let record = query
            .update(
                &[
                    ("checked_by", SqlValue::Uuid(checked_by)),
                    ("checked_at", SqlValue::Timestamp(checked_at)),
                ],
                COLUMNS,
            )
            .build_query_as::<AnomalyRecord>()
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(record)
    }
}
