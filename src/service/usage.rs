//! Fuel usage aggregation over calendar windows

use crate::domain::{FuelLimits, FuelUsage};
use crate::error::Result;
use crate::repository::FuelEventRepository;
use crate::tenant::AccessScope;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

/// Inclusive range of calendar dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Day, ISO week and month containing a local date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageWindows {
    pub day: DateWindow,
    pub week: DateWindow,
    pub month: DateWindow,
}

impl UsageWindows {
    /// Windows around the calendar date of `now` in `timezone`
    pub fn anchored_at(now: DateTime<Utc>, timezone: Tz) -> Self {
        Self::containing(now.with_timezone(&timezone).date_naive())
    }

    pub fn containing(today: NaiveDate) -> Self {
        let week_start =
            today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        let month_start = today - Duration::days(i64::from(today.day0()));
        let month_end = month_start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX);

        Self {
            day: DateWindow {
                start: today,
                end: today,
            },
            week: DateWindow {
                start: week_start,
                end: week_start + Duration::days(6),
            },
            month: DateWindow {
                start: month_start,
                end: month_end,
            },
        }
    }
}

pub struct UsageAggregator<R: FuelEventRepository> {
    repo: Arc<R>,
    timezone: Tz,
}

impl<R: FuelEventRepository> UsageAggregator<R> {
    pub fn new(repo: Arc<R>, timezone: Tz) -> Self {
        Self { repo, timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Local calendar date of `now` in the fleet time zone
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }

    pub async fn usage(&self, scope: &AccessScope, card_id: Option<Uuid>) -> Result<FuelUsage> {
        self.usage_at(scope, card_id, Utc::now()).await
    }

    /// Fuel spend of the scope (and card, when given) in each window around `now`
    pub async fn usage_at(
        &self,
        scope: &AccessScope,
        card_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<FuelUsage> {
        let windows = UsageWindows::anchored_at(now, self.timezone);

        let daily = self.sum(scope, card_id, windows.day).await?;
        let weekly = self.sum(scope, card_id, windows.week).await?;
        let monthly = self.sum(scope, card_id, windows.month).await?;

        Ok(FuelUsage {
            daily,
            weekly,
            monthly,
        })
    }

    async fn sum(
        &self,
        scope: &AccessScope,
        card_id: Option<Uuid>,
        window: DateWindow,
    ) -> Result<Decimal> {
        self.repo
            .sum_amount(scope, card_id, window.start, window.end)
            .await
    }
}

/// Window whose usage exceeded its cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitWindow {
    Daily,
    Weekly,
    Monthly,
}

impl LimitWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitWindow::Daily => "daily",
            LimitWindow::Weekly => "weekly",
            LimitWindow::Monthly => "monthly",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            LimitWindow::Daily => "Daily",
            LimitWindow::Weekly => "Weekly",
            LimitWindow::Monthly => "Monthly",
        }
    }
}

/// Windows where usage strictly exceeds the cap, in day, week, month order
pub fn exceeded_windows(limits: &FuelLimits, usage: &FuelUsage) -> Vec<(LimitWindow, Decimal, Decimal)> {
    [
        (LimitWindow::Daily, limits.daily, usage.daily),
        (LimitWindow::Weekly, limits.weekly, usage.weekly),
        (LimitWindow::Monthly, limits.monthly, usage.monthly),
    ]
    .into_iter()
    .filter(|(_, cap, spent)| spent > cap)
    .collect()
}

/// Human-readable over-limit warnings; empty when every window is within its cap
pub fn limit_warnings(limits: &FuelLimits, usage: &FuelUsage) -> Vec<String> {
    exceeded_windows(limits, usage)
        .into_iter()
        .map(|(window, cap, spent)| {
            format!(
                "{} fuel limit of {} exceeded by {} (spent {})",
                window.label(),
                cap.normalize(),
                (spent - cap).normalize(),
                spent.normalize()
            )
        })
        .collect()
}
