//! Query scope filter
//!
//! Repositories describe what they want as a [`LogicalQuery`]. Only a
//! [`ScopedQuery`], produced by [`apply_scope`], can be rendered to SQL, so a
//! query that skipped tenant scoping cannot reach the database.

use super::AccessScope;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

/// Entity stored in a table with an organization foreign key
pub trait TenantScoped {
    /// Table (or join) expression used in `FROM`
    const TABLE: &'static str;
    /// Organization foreign-key column
    const ORGANIZATION_COLUMN: &'static str = "organization_id";
}

/// Bound parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Uuid(Uuid),
    Text(String),
    Int(i64),
    Decimal(Decimal),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl From<Uuid> for SqlValue {
    fn from(value: Uuid) -> Self {
        SqlValue::Uuid(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<Decimal> for SqlValue {
    fn from(value: Decimal) -> Self {
        SqlValue::Decimal(value)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        SqlValue::Date(value)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl Comparison {
    fn as_sql(&self) -> &'static str {
        match self {
            Comparison::Eq => " = ",
            Comparison::Lt => " < ",
            Comparison::Lte => " <= ",
            Comparison::Gt => " > ",
            Comparison::Gte => " >= ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Compare {
        column: &'static str,
        op: Comparison,
        value: SqlValue,
    },
    IsNull(&'static str),
    IsNotNull(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Table plus predicates, not yet bound to an access scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalQuery {
    table: &'static str,
    organization_column: &'static str,
    predicates: Vec<Predicate>,
    order_by: Vec<(&'static str, SortOrder)>,
    limit: Option<i64>,
}

impl LogicalQuery {
    pub fn of<E: TenantScoped>() -> Self {
        Self {
            table: E::TABLE,
            organization_column: E::ORGANIZATION_COLUMN,
            predicates: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn filter(mut self, column: &'static str, op: Comparison, value: impl Into<SqlValue>) -> Self {
        self.predicates.push(Predicate::Compare {
            column,
            op,
            value: value.into(),
        });
        self
    }

    pub fn eq(self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.filter(column, Comparison::Eq, value)
    }

    pub fn is_null(mut self, column: &'static str) -> Self {
        self.predicates.push(Predicate::IsNull(column));
        self
    }

    pub fn is_not_null(mut self, column: &'static str) -> Self {
        self.predicates.push(Predicate::IsNotNull(column));
        self
    }

    /// `column = value` when a value is given, `column IS NULL` otherwise
    pub fn eq_or_null(self, column: &'static str, value: Option<impl Into<SqlValue>>) -> Self {
        match value {
            Some(value) => self.eq(column, value),
            None => self.is_null(column),
        }
    }

    pub fn order_by(mut self, column: &'static str, order: SortOrder) -> Self {
        self.order_by.push((column, order));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }
}

/// Attach the tenant predicate for `scope`.
///
/// `Organization(id)` adds `organization_column = id` unless that exact
/// predicate is already present; `AllOrganizations` leaves the query as is.
/// This is the only place tenant predicates are created.
pub fn apply_scope(mut query: LogicalQuery, scope: &AccessScope) -> ScopedQuery {
    if let AccessScope::Organization(organization_id) = scope {
        let tenant = Predicate::Compare {
            column: query.organization_column,
            op: Comparison::Eq,
            value: SqlValue::Uuid(*organization_id),
        };
        if !query.predicates.contains(&tenant) {
            query.predicates.push(tenant);
        }
    }
    ScopedQuery { query }
}

/// Query that has passed through [`apply_scope`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedQuery {
    query: LogicalQuery,
}

impl ScopedQuery {
    /// Re-apply a scope; idempotent for the same scope
    pub fn apply_scope(self, scope: &AccessScope) -> ScopedQuery {
        apply_scope(self.query, scope)
    }

    pub fn logical(&self) -> &LogicalQuery {
        &self.query
    }

    pub fn select(&self, columns: &str) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM {}", columns, self.query.table));
        self.push_where(&mut qb);
        self.push_tail(&mut qb);
        qb
    }

    /// `SELECT COALESCE(SUM(column), 0)` over the matching rows
    pub fn sum(&self, column: &str) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT COALESCE(SUM({}), 0) FROM {}",
            column, self.query.table
        ));
        self.push_where(&mut qb);
        qb
    }

    pub fn update(
        &self,
        assignments: &[(&'static str, SqlValue)],
        returning: &str,
    ) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", self.query.table));
        for (index, (column, value)) in assignments.iter().enumerate() {
            if index > 0 {
                qb.push(", ");
            }
            qb.push(*column).push(" = ");
            push_value(&mut qb, value);
        }
        self.push_where(&mut qb);
        if !returning.is_empty() {
            qb.push(" RETURNING ").push(returning);
        }
        qb
    }

    pub fn delete(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new(format!("DELETE FROM {}", self.query.table));
        self.push_where(&mut qb);
        qb
    }

    fn push_where(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        for (index, predicate) in self.query.predicates.iter().enumerate() {
            qb.push(if index == 0 { " WHERE " } else { " AND " });
            match predicate {
                Predicate::Compare { column, op, value } => {
                    qb.push(*column).push(op.as_sql());
                    push_value(qb, value);
                }
                Predicate::IsNull(column) => {
                    qb.push(*column).push(" IS NULL");
                }
                Predicate::IsNotNull(column) => {
                    qb.push(*column).push(" IS NOT NULL");
                }
            }
        }
    }

    fn push_tail(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        for (index, (column, order)) in self.query.order_by.iter().enumerate() {
            qb.push(if index == 0 { " ORDER BY " } else { ", " });
            qb.push(*column).push(match order {
                SortOrder::Asc => " ASC",
                SortOrder::Desc => " DESC",
            });
        }
        if let Some(limit) = self.query.limit {
            qb.push(" LIMIT ").push_bind(limit);
        }
    }
}

fn push_value(qb: &mut QueryBuilder<'static, Postgres>, value: &SqlValue) {
    match value {
        SqlValue::Uuid(v) => qb.push_bind(*v),
        SqlValue::Text(v) => qb.push_bind(v.clone()),
        SqlValue::Int(v) => qb.push_bind(*v),
        SqlValue::Decimal(v) => qb.push_bind(*v),
        SqlValue::Date(v) => qb.push_bind(*v),
        SqlValue::Timestamp(v) => qb.push_bind(*v),
    };
}
