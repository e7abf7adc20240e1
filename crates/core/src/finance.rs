//! Financial data accessor trait — read-only view of the user's ledger.
//!
//! The retrieval pipeline never owns financial records. It reads
//! aggregates through a `FinanceStore`, which may be backed by a database,
//! a remote API, or an in-memory snapshot. Every range query takes a
//! half-open `[start, end)` window in epoch milliseconds.

use async_trait::async_trait;
use chrono::{Datelike, FixedOffset, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::FinanceError;

/// A half-open `[start_ms, end_ms)` time window in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeRange {
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Whether `timestamp_ms` falls inside the window.
    pub fn contains(&self, timestamp_ms: i64) -> bool {
        timestamp_ms >= self.start_ms && timestamp_ms < self.end_ms
    }

    /// The calendar month `year-month` in the given UTC offset.
    pub fn month(year: i32, month: u32, offset: FixedOffset) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self::new(
            local_midnight_ms(first, offset)?,
            local_midnight_ms(next, offset)?,
        ))
    }

    /// The month containing `date`, shifted by `delta` months (negative = earlier).
    pub fn month_offset(date: NaiveDate, delta: i32, offset: FixedOffset) -> Option<Self> {
        let index = date.year() * 12 + date.month0() as i32 + delta;
        Self::month(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, offset)
    }

    /// All of the calendar days from `first` through `last`, inclusive.
    pub fn days(first: NaiveDate, last: NaiveDate, offset: FixedOffset) -> Option<Self> {
        let after_last = last.succ_opt()?;
        Some(Self::new(
            local_midnight_ms(first, offset)?,
            local_midnight_ms(after_last, offset)?,
        ))
    }
}

/// Epoch milliseconds of local midnight at the start of `date`.
pub fn local_midnight_ms(date: NaiveDate, offset: FixedOffset) -> Option<i64> {
    let midnight = date.and_hms_opt(0, 0, 0)?;
    offset
        .from_local_datetime(&midnight)
        .single()
        .map(|dt| dt.timestamp_millis())
}

/// A spending category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Total spend attributed to one category over some window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Expense,
    Income,
}

/// A single ledger transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub wallet_id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,

    pub amount: f64,
    pub kind: TransactionKind,

    /// Creation time in epoch milliseconds
    pub created_at_ms: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A budget together with the amount already spent in its period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetSnapshot {
    pub id: i64,
    pub name: String,

    /// `None` means the budget covers the whole account
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,

    pub amount: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    /// Spend recorded between `start_date` and `end_date`
    #[serde(default)]
    pub spent: f64,
}

/// The financial data accessor consumed by the context assembler.
///
/// Aggregates return `Option<f64>` where the underlying store may have no
/// rows at all; callers treat `None` as zero.
#[async_trait]
pub trait FinanceStore: Send + Sync {
    /// The accessor name (e.g., "in_memory", "sqlite").
    fn name(&self) -> &str;

    /// Current balance of a wallet/account.
    async fn wallet_balance(&self, account_id: i64) -> Result<Option<f64>, FinanceError>;

    /// Sum of a user's expenses in the window.
    async fn total_expense(&self, user_id: i64, range: TimeRange) -> Result<Option<f64>, FinanceError>;

    /// Sum of a user's income in the window.
    async fn total_income(&self, user_id: i64, range: TimeRange) -> Result<Option<f64>, FinanceError>;

    /// The `limit` largest expense categories in the window, largest first.
    async fn top_expense_categories(
        &self,
        user_id: i64,
        account_id: i64,
        range: TimeRange,
        limit: usize,
    ) -> Result<Vec<CategoryTotal>, FinanceError>;

    /// Expense totals for every category with spend in the window.
    async fn expenses_by_category(
        &self,
        user_id: i64,
        account_id: i64,
        range: TimeRange,
    ) -> Result<Vec<CategoryTotal>, FinanceError>;

    /// Budgets attached to an account, with their elapsed spend.
    async fn active_budgets(&self, account_id: i64) -> Result<Vec<BudgetSnapshot>, FinanceError>;

    async fn category_by_id(&self, category_id: i64) -> Result<Option<Category>, FinanceError>;

    /// Case-insensitive category lookup by display name.
    async fn category_by_name(&self, name: &str) -> Result<Option<Category>, FinanceError>;

    /// Most recent transactions in a category, newest first.
    async fn recent_transactions(
        &self,
        category_id: i64,
        limit: usize,
    ) -> Result<Vec<Transaction>, FinanceError>;

    /// A user's expense total for one category in the window.
    async fn category_expense(
        &self,
        user_id: i64,
        category_id: i64,
        range: TimeRange,
    ) -> Result<Option<f64>, FinanceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn range_is_half_open() {
        let range = TimeRange::new(100, 200);
        assert!(range.contains(100));
        assert!(range.contains(199));
        assert!(!range.contains(200));
        assert!(!range.contains(99));
    }

    #[test]
    fn month_range_spans_calendar_month() {
        let range = TimeRange::month(2025, 2, utc()).unwrap();
        let days = (range.end_ms - range.start_ms) / 86_400_000;
        assert_eq!(days, 28);
    }

    #[test]
    fn december_rolls_into_next_year() {
        let dec = TimeRange::month(2024, 12, utc()).unwrap();
        let jan = TimeRange::month(2025, 1, utc()).unwrap();
        assert_eq!(dec.end_ms, jan.start_ms);
    }

    #[test]
    fn month_offset_walks_backwards_across_years() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let prev = TimeRange::month_offset(date, -1, utc()).unwrap();
        assert_eq!(prev, TimeRange::month(2024, 12, utc()).unwrap());

        let two_back = TimeRange::month_offset(date, -2, utc()).unwrap();
        assert_eq!(two_back, TimeRange::month(2024, 11, utc()).unwrap());
    }

    #[test]
    fn offset_shifts_midnight() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let hanoi = FixedOffset::east_opt(7 * 3600).unwrap();
        let utc_ms = local_midnight_ms(date, utc()).unwrap();
        let hanoi_ms = local_midnight_ms(date, hanoi).unwrap();
        assert_eq!(utc_ms - hanoi_ms, 7 * 3_600_000);
    }

    #[test]
    fn days_range_includes_last_day() {
        let first = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        let range = TimeRange::days(first, last, utc()).unwrap();
        assert_eq!(range, TimeRange::month(2025, 3, utc()).unwrap());
    }
}
