//! Organization domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Subscription state of an organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    #[default]
    Trial,
    Active,
    PastDue,
    Cancelled,
}

impl std::str::FromStr for SubscriptionState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trial" => Ok(SubscriptionState::Trial),
            "active" => Ok(SubscriptionState::Active),
            "past_due" => Ok(SubscriptionState::PastDue),
            "cancelled" => Ok(SubscriptionState::Cancelled),
            _ => Err(format!("Unknown subscription state: {}", s)),
        }
    }
}

impl std::fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionState::Trial => write!(f, "trial"),
            SubscriptionState::Active => write!(f, "active"),
            SubscriptionState::PastDue => write!(f, "past_due"),
            SubscriptionState::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for SubscriptionState {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
        let s: String = sqlx::Decode::<'r, sqlx::Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl sqlx::Type<sqlx::Postgres> for SubscriptionState {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

/// Organization (tenant) entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub subscription_state: SubscriptionState,
    pub created_at: DateTime<Utc>,
}

impl Default for Organization {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            subscription_state: SubscriptionState::default(),
            created_at: Utc::now(),
        }
    }
}
