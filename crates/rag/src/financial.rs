//! Financial context builder — renders the user's live ledger into text.
//!
//! Reads aggregates through a [`FinanceStore`] and produces independent
//! text blocks:
//!
//! 1. **Summary**: wallet balance, this month's expense/income, top categories
//! 2. **Budget status**: each non-expired budget with its health
//! 3. **Comparison**: this month vs. last month (only when last month > 0)
//! 4. **Trend**: 3 calendar months, skipped if any month is zero
//! 5. **Spending pattern**: average daily spend and the dominant category
//!
//! Blocks are fetched concurrently. An accessor failure omits that block
//! and is logged; it never aborts the others.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, Utc};
use moneyrag_core::error::FinanceError;
use moneyrag_core::finance::{CategoryTotal, FinanceStore, TimeRange, local_midnight_ms};
use moneyrag_core::knowledge::Language;
use moneyrag_knowledge::tokenizer::detect_language;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::context::RagContext;
use crate::format::{Labels, format_amount, format_money, labels};

/// Percent of a budget at which it counts as exceeded.
pub const EXCEEDED_PERCENT: f64 = 100.0;
/// Percent of a budget at which it counts as nearly used up.
pub const NEAR_LIMIT_PERCENT: f64 = 80.0;

// ── Classifications ───────────────────────────────────────────────────────

/// How much of a budget has been used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BudgetHealth {
    Exceeded,
    NearLimit,
    Healthy,
}

impl BudgetHealth {
    /// Classify a spent percentage: `>= 100` exceeded, `>= 80` near-limit.
    pub fn classify(percent_used: f64) -> Self {
        if percent_used >= EXCEEDED_PERCENT {
            Self::Exceeded
        } else if percent_used >= NEAR_LIMIT_PERCENT {
            Self::NearLimit
        } else {
            Self::Healthy
        }
    }

    /// Percent of `amount` used by `spent`; 0 for a non-positive budget.
    pub fn percent_used(spent: f64, amount: f64) -> f64 {
        if amount > 0.0 { spent / amount * 100.0 } else { 0.0 }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exceeded => "exceeded",
            Self::NearLimit => "near-limit",
            Self::Healthy => "healthy",
        }
    }

    fn label(&self, l: &Labels) -> &'static str {
        match self {
            Self::Exceeded => l.exceeded,
            Self::NearLimit => l.near_limit,
            Self::Healthy => l.healthy,
        }
    }
}

/// Direction of spending over three consecutive months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        }
    }

    fn render(&self, l: &Labels) -> (&'static str, &'static str) {
        match self {
            Self::Increasing => ("📈", l.trend_increasing),
            Self::Decreasing => ("📉", l.trend_decreasing),
            Self::Stable => ("↔️", l.trend_stable),
        }
    }
}

/// Classify monthly totals given oldest first.
///
/// Returns `None` when any month has no spending, since a partial history
/// would produce a false trend.
pub fn classify_trend(totals: [f64; 3]) -> Option<TrendDirection> {
    if totals.iter().any(|t| *t <= 0.0) {
        return None;
    }
    let [oldest, middle, latest] = totals;
    let direction = if latest > middle && middle > oldest {
        TrendDirection::Increasing
    } else if latest < middle && middle < oldest {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };
    Some(direction)
}

// ── Builder ───────────────────────────────────────────────────────────────

/// Builds the financial text blocks of a [`RagContext`].
pub struct FinancialContextBuilder {
    store: Arc<dyn FinanceStore>,
    language: Language,
    currency: String,
    top_categories: usize,
    recent_transactions: usize,
    offset: FixedOffset,
    reference_time: Option<DateTime<Utc>>,
}

impl FinancialContextBuilder {
    /// A builder rendering Vietnamese labels in VNĐ, in the local UTC offset.
    pub fn new(store: Arc<dyn FinanceStore>) -> Self {
        Self {
            store,
            language: Language::Vietnamese,
            currency: "VNĐ".into(),
            top_categories: 3,
            recent_transactions: 3,
            offset: *Local::now().offset(),
            reference_time: None,
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_top_categories(mut self, count: usize) -> Self {
        self.top_categories = count;
        self
    }

    pub fn with_recent_transactions(mut self, count: usize) -> Self {
        self.recent_transactions = count;
        self
    }

    /// UTC offset used for calendar-month boundaries and dates.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Pin "now" instead of reading the clock.
    pub fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.reference_time = Some(now);
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    fn now(&self) -> DateTime<FixedOffset> {
        self.reference_time
            .unwrap_or_else(Utc::now)
            .with_timezone(&self.offset)
    }

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    fn labels(&self) -> &'static Labels {
        labels(self.language)
    }

    fn money(&self, amount: f64) -> String {
        format_money(amount, &self.currency)
    }

    /// The calendar month `delta` months away from the current one.
    fn month(&self, delta: i32) -> Result<TimeRange, FinanceError> {
        TimeRange::month_offset(self.today(), delta, self.offset)
            .ok_or_else(|| FinanceError::QueryFailed(format!("month boundary out of range (offset {delta})")))
    }

    /// From the first of the current month up to now.
    fn month_to_date(&self) -> Result<TimeRange, FinanceError> {
        let now = self.now();
        let start = self
            .today()
            .with_day(1)
            .and_then(|first| local_midnight_ms(first, self.offset))
            .ok_or_else(|| FinanceError::QueryFailed("month start out of range".into()))?;
        Ok(TimeRange::new(start, now.timestamp_millis() + 1))
    }

    /// Build every block concurrently into a fresh context.
    pub async fn build(&self, user_id: i64, account_id: i64, query: &str) -> RagContext {
        let mut ctx = RagContext::new(query);
        ctx.language = detect_language(query);
        ctx.output_language = self.language;

        let (summary, budgets, comparison, trend, pattern) = tokio::join!(
            self.financial_summary(user_id, account_id),
            self.budget_status(account_id),
            self.comparison(user_id),
            self.trend(user_id),
            self.spending_pattern(user_id, account_id),
        );

        ctx.financial_summary = omit_on_error("financial summary", summary);
        ctx.budget_status = omit_on_error("budget status", budgets);
        ctx.comparison = omit_on_error("comparison", comparison);
        ctx.trend = omit_on_error("trend", trend);
        ctx.spending_pattern = omit_on_error("spending pattern", pattern);

        debug!(store = self.store.name(), context = %ctx.summary(), "Built financial context");
        ctx
    }

    /// Balance, this month's totals and the top expense categories.
    pub async fn financial_summary(&self, user_id: i64, account_id: i64) -> Result<String, FinanceError> {
        let l = self.labels();
        let month = self.month(0)?;
        let mut out = String::new();

        if let Some(balance) = self.store.wallet_balance(account_id).await? {
            let _ = writeln!(out, "💰 {}: {}", l.balance, self.money(balance));
        }

        let expense = self.store.total_expense(user_id, month).await?.unwrap_or(0.0);
        let income = self.store.total_income(user_id, month).await?.unwrap_or(0.0);
        let _ = writeln!(out, "📅 {}:", l.this_month);
        let _ = writeln!(out, "  • {}: {}", l.expense, self.money(expense));
        let _ = writeln!(out, "  • {}: {}", l.income, self.money(income));

        let top = self
            .store
            .top_expense_categories(user_id, account_id, month, self.top_categories)
            .await?;
        if !top.is_empty() {
            let _ = writeln!(out, "📊 {}:", l.top_spending);
            for CategoryTotal { category, total } in top.iter().take(self.top_categories) {
                let _ = writeln!(out, "  • {}: {}", category, self.money(*total));
            }
        }

        Ok(out)
    }

    /// One line per budget that has not yet ended.
    pub async fn budget_status(&self, account_id: i64) -> Result<String, FinanceError> {
        let l = self.labels();
        let today = self.today();
        let budgets = self.store.active_budgets(account_id).await?;

        let mut lines = String::new();
        for budget in budgets.iter().filter(|b| b.end_date >= today) {
            let name = match budget.category_id {
                None => l.whole_account.to_string(),
                Some(id) => match self.store.category_by_id(id).await {
                    Ok(Some(category)) => category.name,
                    Ok(None) => l.unnamed_category.to_string(),
                    Err(e) => {
                        warn!(budget = %budget.name, error = %e, "Category lookup failed");
                        l.unnamed_category.to_string()
                    }
                },
            };

            let percent = BudgetHealth::percent_used(budget.spent, budget.amount);
            let health = BudgetHealth::classify(percent);
            let _ = writeln!(
                lines,
                "  • {}: {}/{} ({:.0}%) {}",
                name,
                format_amount(budget.spent),
                self.money(budget.amount),
                percent,
                health.label(l)
            );
        }

        if lines.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("{}\n{}", l.budget_header, lines))
    }

    /// This month's expenses against last month's.
    pub async fn comparison(&self, user_id: i64) -> Result<String, FinanceError> {
        let l = self.labels();
        let (this_month, last_month) = (self.month(0)?, self.month(-1)?);
        let (current, previous) = tokio::join!(
            self.store.total_expense(user_id, this_month),
            self.store.total_expense(user_id, last_month),
        );
        let current = current?.unwrap_or(0.0);
        let previous = previous?.unwrap_or(0.0);

        if previous <= 0.0 {
            return Ok(String::new());
        }

        let change = (current - previous) / previous * 100.0;
        let (emoji, direction) = if change > 0.0 {
            ("📈", l.increased)
        } else if change < 0.0 {
            ("📉", l.decreased)
        } else {
            ("↔️", l.unchanged)
        };

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{emoji} {}: {} {} {:.1}%",
            l.vs_last_month,
            l.spending,
            direction,
            change.abs()
        );
        let _ = writeln!(out, "  • {}: {}", l.last_month, self.money(previous));
        let _ = writeln!(out, "  • {}: {}", l.this_month, self.money(current));
        Ok(out)
    }

    /// Expense totals of the last three calendar months, oldest first.
    pub async fn monthly_totals(&self, user_id: i64) -> Result<[f64; 3], FinanceError> {
        let months = [self.month(-2)?, self.month(-1)?, self.month(0)?];
        let (oldest, middle, latest) = tokio::join!(
            self.store.total_expense(user_id, months[0]),
            self.store.total_expense(user_id, months[1]),
            self.store.total_expense(user_id, months[2]),
        );
        Ok([
            oldest?.unwrap_or(0.0),
            middle?.unwrap_or(0.0),
            latest?.unwrap_or(0.0),
        ])
    }

    /// Three-month trend with the monthly average.
    pub async fn trend(&self, user_id: i64) -> Result<String, FinanceError> {
        let l = self.labels();
        let totals = self.monthly_totals(user_id).await?;

        let Some(direction) = classify_trend(totals) else {
            return Ok(String::new());
        };

        let (emoji, text) = direction.render(l);
        let average = totals.iter().sum::<f64>() / totals.len() as f64;

        let mut out = String::new();
        let _ = writeln!(out, "{emoji} {}: {}", l.trend, text);
        let _ = writeln!(
            out,
            "  • {}: {}/{}",
            l.three_month_average,
            self.money(average),
            l.per_month
        );
        Ok(out)
    }

    /// Average daily spending and the category with the largest share this month.
    pub async fn spending_pattern(&self, user_id: i64, account_id: i64) -> Result<String, FinanceError> {
        let l = self.labels();
        let daily = self.average_daily_spending(user_id).await?;
        if daily <= 0.0 {
            return Ok(String::new());
        }

        let mut out = String::new();
        let _ = writeln!(out, "{}", l.pattern_header);
        let _ = writeln!(out, "  • {}: {}", l.daily_average, self.money(daily));

        let by_category = self
            .store
            .expenses_by_category(user_id, account_id, self.month(0)?)
            .await?;
        let total: f64 = by_category.iter().map(|c| c.total).sum();
        let largest = by_category
            .iter()
            .fold(None::<&CategoryTotal>, |best, c| match best {
                Some(b) if b.total >= c.total => Some(b),
                _ => Some(c),
            });
        if let Some(largest) = largest.filter(|_| total > 0.0) {
            let _ = writeln!(
                out,
                "  • {}: {} ({:.0}%)",
                l.largest_share,
                largest.category,
                largest.total / total * 100.0
            );
        }

        Ok(out)
    }

    /// Month-to-date spend in one category plus its most recent transactions.
    ///
    /// Empty when the category is unknown to the store.
    pub async fn category_context(&self, user_id: i64, category_name: &str) -> Result<String, FinanceError> {
        let l = self.labels();
        let Some(category) = self.store.category_by_name(category_name).await? else {
            debug!(category = category_name, "Category not found in ledger");
            return Ok(String::new());
        };

        let spent = self
            .store
            .category_expense(user_id, category.id, self.month_to_date()?)
            .await?
            .unwrap_or(0.0);

        let mut out = String::new();
        let _ = writeln!(
            out,
            "📌 {} {} {}: {}",
            l.category_prefix,
            category.name,
            l.category_suffix,
            self.money(spent)
        );

        let recent = self
            .store
            .recent_transactions(category.id, self.recent_transactions)
            .await?;
        if !recent.is_empty() {
            let _ = writeln!(out, "{}:", l.recent_transactions);
            for txn in recent.iter().take(self.recent_transactions) {
                let _ = writeln!(
                    out,
                    "  • {}: {}",
                    self.format_date(txn.created_at_ms),
                    self.money(txn.amount)
                );
            }
        }

        Ok(out)
    }

    /// Expense total per category name in `range`.
    pub async fn category_spending(
        &self,
        user_id: i64,
        account_id: i64,
        range: TimeRange,
    ) -> Result<HashMap<String, f64>, FinanceError> {
        let totals = self.store.expenses_by_category(user_id, account_id, range).await?;
        let mut spending: HashMap<String, f64> = HashMap::new();
        for CategoryTotal { category, total } in totals {
            *spending.entry(category).or_insert(0.0) += total;
        }
        Ok(spending)
    }

    /// This month's expenses divided by the day of the month.
    pub async fn average_daily_spending(&self, user_id: i64) -> Result<f64, FinanceError> {
        let day = self.today().day();
        let total = self
            .store
            .total_expense(user_id, self.month_to_date()?)
            .await?
            .unwrap_or(0.0);
        if total <= 0.0 || day == 0 {
            return Ok(0.0);
        }
        Ok(total / f64::from(day))
    }

    fn format_date(&self, timestamp_ms: i64) -> String {
        DateTime::from_timestamp_millis(timestamp_ms)
            .map(|dt| dt.with_timezone(&self.offset).format("%d/%m/%Y").to_string())
            .unwrap_or_default()
    }
}

fn omit_on_error(block: &str, result: Result<String, FinanceError>) -> String {
    result.unwrap_or_else(|e| {
        warn!(block, error = %e, "Financial block omitted");
        String::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Budget, InMemoryLedger, Wallet};
    use chrono::TimeZone;
    use moneyrag_core::finance::{BudgetSnapshot, Category, Transaction, TransactionKind};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    /// 2025-03-15 12:00 UTC
    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap()
    }

    fn ms(y: i32, m: u32, d: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap().timestamp_millis()
    }

    fn expense(id: i64, category_id: i64, amount: f64, at: i64) -> Transaction {
        Transaction {
            id,
            user_id: 1,
            wallet_id: 10,
            category_id: Some(category_id),
            amount,
            kind: TransactionKind::Expense,
            created_at_ms: at,
            note: None,
        }
    }

    async fn ledger() -> InMemoryLedger {
        let ledger = InMemoryLedger::new();
        ledger
            .add_wallet(Wallet { id: 10, user_id: 1, name: "Cash".into(), balance: 5_000_000.0 })
            .await;
        ledger.add_category(Category { id: 1, name: "Ăn uống".into() }).await;
        ledger.add_category(Category { id: 2, name: "Di chuyển".into() }).await;
        ledger
    }

    fn builder(ledger: InMemoryLedger) -> FinancialContextBuilder {
        FinancialContextBuilder::new(Arc::new(ledger))
            .with_offset(utc())
            .with_reference_time(reference())
    }

    #[test]
    fn budget_health_thresholds() {
        assert_eq!(BudgetHealth::classify(100.0), BudgetHealth::Exceeded);
        assert_eq!(BudgetHealth::classify(130.0), BudgetHealth::Exceeded);
        assert_eq!(BudgetHealth::classify(80.0), BudgetHealth::NearLimit);
        assert_eq!(BudgetHealth::classify(99.9), BudgetHealth::NearLimit);
        assert_eq!(BudgetHealth::classify(79.9), BudgetHealth::Healthy);
        assert_eq!(BudgetHealth::classify(0.0), BudgetHealth::Healthy);
    }

    #[test]
    fn eighty_five_percent_is_near_limit() {
        let percent = BudgetHealth::percent_used(850_000.0, 1_000_000.0);
        assert!((percent - 85.0).abs() < 1e-9);
        let health = BudgetHealth::classify(percent);
        assert_eq!(health, BudgetHealth::NearLimit);
        assert_eq!(health.as_str(), "near-limit");
    }

    #[test]
    fn zero_budget_is_healthy() {
        assert_eq!(BudgetHealth::percent_used(500.0, 0.0), 0.0);
    }

    #[test]
    fn trend_classification() {
        assert_eq!(
            classify_trend([1_000_000.0, 1_200_000.0, 1_500_000.0]),
            Some(TrendDirection::Increasing)
        );
        assert_eq!(
            classify_trend([1_500_000.0, 1_200_000.0, 1_000_000.0]),
            Some(TrendDirection::Decreasing)
        );
        assert_eq!(
            classify_trend([1_000_000.0, 1_500_000.0, 1_200_000.0]),
            Some(TrendDirection::Stable)
        );
        assert_eq!(
            classify_trend([1_000_000.0, 1_000_000.0, 1_000_000.0]),
            Some(TrendDirection::Stable)
        );
        assert_eq!(classify_trend([1_000_000.0, 0.0, 1_500_000.0]), None);
    }

    #[test]
    fn trend_direction_serializes_lowercase() {
        let json = serde_json::to_string(&TrendDirection::Increasing).unwrap();
        assert_eq!(json, "\"increasing\"");
        let json = serde_json::to_string(&BudgetHealth::NearLimit).unwrap();
        assert_eq!(json, "\"near-limit\"");
    }

    #[tokio::test]
    async fn summary_lists_balance_totals_and_top_categories() {
        let ledger = ledger().await;
        ledger.add_transaction(expense(1, 1, 300_000.0, ms(2025, 3, 2))).await;
        ledger.add_transaction(expense(2, 2, 100_000.0, ms(2025, 3, 3))).await;
        ledger.add_transaction(expense(3, 1, 50_000.0, ms(2025, 2, 20))).await;

        let summary = builder(ledger).financial_summary(1, 10).await.unwrap();
        assert!(summary.contains("💰 Số dư ví hiện tại: 5,000,000 VNĐ"));
        assert!(summary.contains("  • Chi tiêu: 400,000 VNĐ"));
        assert!(summary.contains("  • Thu nhập: 0 VNĐ"));
        let food = summary.find("Ăn uống: 300,000").unwrap();
        let transport = summary.find("Di chuyển: 100,000").unwrap();
        assert!(food < transport);
    }

    #[tokio::test]
    async fn summary_in_english() {
        let ledger = ledger().await;
        let summary = builder(ledger)
            .with_language(Language::English)
            .with_currency("USD")
            .financial_summary(1, 10)
            .await
            .unwrap();
        assert!(summary.contains("Current wallet balance: 5,000,000 USD"));
        assert!(!summary.contains("📊"));
    }

    #[tokio::test]
    async fn budget_near_limit_is_rendered() {
        let ledger = ledger().await;
        ledger
            .add_budget(Budget {
                id: 1,
                name: "Food March".into(),
                wallet_id: 10,
                category_id: Some(1),
                amount: 1_000_000.0,
                start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            })
            .await;
        ledger.add_transaction(expense(1, 1, 850_000.0, ms(2025, 3, 5))).await;

        let block = builder(ledger).budget_status(10).await.unwrap();
        assert!(block.starts_with("[TÌNH TRẠNG NGÂN SÁCH]\n"));
        assert!(block.contains("  • Ăn uống: 850,000/1,000,000 VNĐ (85%) 🟡 SẮP HẾT"));
    }

    #[tokio::test]
    async fn unspent_budget_renders_zero_percent() {
        let ledger = ledger().await;
        ledger
            .add_budget(Budget {
                id: 1,
                name: "Food March".into(),
                wallet_id: 10,
                category_id: Some(1),
                amount: 100_000.0,
                start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            })
            .await;

        let block = builder(ledger).budget_status(10).await.unwrap();
        assert!(block.contains("  • Ăn uống: 0/100,000 VNĐ (0%) ✅ ỔN"), "{block}");
        assert!(!block.contains("-0"));
    }

    #[tokio::test]
    async fn budget_period_follows_ledger_offset() {
        let hanoi = FixedOffset::east_opt(7 * 3600).unwrap();
        let ledger = ledger().await.with_offset(hanoi);
        ledger
            .add_budget(Budget {
                id: 1,
                name: "Food March".into(),
                wallet_id: 10,
                category_id: Some(1),
                amount: 100_000.0,
                start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            })
            .await;
        // 00:30 on March 1st in Hanoi is still February 28th in UTC
        let just_after_midnight = hanoi
            .with_ymd_and_hms(2025, 3, 1, 0, 30, 0)
            .unwrap()
            .timestamp_millis();
        ledger.add_transaction(expense(1, 1, 90_000.0, just_after_midnight)).await;

        let b = FinancialContextBuilder::new(Arc::new(ledger))
            .with_offset(hanoi)
            .with_reference_time(reference());
        let summary = b.financial_summary(1, 10).await.unwrap();
        assert!(summary.contains("Ăn uống: 90,000 VNĐ"), "{summary}");

        let block = b.budget_status(10).await.unwrap();
        assert!(block.contains("  • Ăn uống: 90,000/100,000 VNĐ (90%) 🟡 SẮP HẾT"), "{block}");
    }

    #[tokio::test]
    async fn expired_budgets_are_skipped() {
        let ledger = ledger().await;
        ledger
            .add_budget(Budget {
                id: 1,
                name: "January".into(),
                wallet_id: 10,
                category_id: None,
                amount: 1_000_000.0,
                start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            })
            .await;

        let block = builder(ledger).budget_status(10).await.unwrap();
        assert!(block.is_empty());
    }

    #[tokio::test]
    async fn whole_account_budget_uses_total_label() {
        let ledger = ledger().await;
        ledger
            .add_budget(Budget {
                id: 1,
                name: "March".into(),
                wallet_id: 10,
                category_id: None,
                amount: 1_000_000.0,
                start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            })
            .await;
        ledger.add_transaction(expense(1, 1, 1_200_000.0, ms(2025, 3, 5))).await;

        let block = builder(ledger).budget_status(10).await.unwrap();
        assert!(block.contains("  • Tổng: 1,200,000/1,000,000 VNĐ (120%) ⚠️ VƯỢT"));
    }

    #[tokio::test]
    async fn comparison_requires_previous_month() {
        let ledger = ledger().await;
        ledger.add_transaction(expense(1, 1, 300_000.0, ms(2025, 3, 2))).await;
        let b = builder(ledger.clone());
        assert!(b.comparison(1).await.unwrap().is_empty());

        ledger.add_transaction(expense(2, 1, 200_000.0, ms(2025, 2, 10))).await;
        let block = b.comparison(1).await.unwrap();
        assert!(block.starts_with("📈 So với tháng trước: Chi tiêu tăng 50.0%"));
        assert!(block.contains("  • Tháng trước: 200,000 VNĐ"));
        assert!(block.contains("  • Tháng này: 300,000 VNĐ"));
    }

    #[tokio::test]
    async fn increasing_trend_block() {
        let ledger = ledger().await;
        ledger.add_transaction(expense(1, 1, 1_000_000.0, ms(2025, 1, 10))).await;
        ledger.add_transaction(expense(2, 1, 1_200_000.0, ms(2025, 2, 10))).await;
        ledger.add_transaction(expense(3, 1, 1_500_000.0, ms(2025, 3, 10))).await;

        let b = builder(ledger);
        assert_eq!(b.monthly_totals(1).await.unwrap(), [1_000_000.0, 1_200_000.0, 1_500_000.0]);
        let block = b.trend(1).await.unwrap();
        assert!(block.starts_with("📈 Xu hướng: Chi tiêu đang TĂNG liên tục 3 tháng"));
        assert!(block.contains("Trung bình 3 tháng: 1,233,333 VNĐ/tháng"));
    }

    #[tokio::test]
    async fn trend_is_empty_with_a_zero_month() {
        let ledger = ledger().await;
        ledger.add_transaction(expense(1, 1, 1_000_000.0, ms(2025, 1, 10))).await;
        ledger.add_transaction(expense(3, 1, 1_500_000.0, ms(2025, 3, 10))).await;

        let block = builder(ledger).trend(1).await.unwrap();
        assert!(block.is_empty());
    }

    #[tokio::test]
    async fn category_context_lists_recent_transactions() {
        let ledger = ledger().await;
        for (id, day) in [(1, 1), (2, 5), (3, 9), (4, 12)] {
            ledger.add_transaction(expense(id, 1, 50_000.0, ms(2025, 3, day))).await;
        }

        let block = builder(ledger).category_context(1, "ăn uống").await.unwrap();
        assert!(block.starts_with("📌 Chi tiêu Ăn uống tháng này: 200,000 VNĐ"));
        assert!(block.contains("Giao dịch gần đây:"));
        assert!(block.contains("12/03/2025"));
        assert!(!block.contains("01/03/2025"));
    }

    #[tokio::test]
    async fn unknown_category_context_is_empty() {
        let ledger = ledger().await;
        let block = builder(ledger).category_context(1, "Pets").await.unwrap();
        assert!(block.is_empty());
    }

    #[tokio::test]
    async fn average_daily_and_category_spending() {
        let ledger = ledger().await;
        ledger.add_transaction(expense(1, 1, 300_000.0, ms(2025, 3, 2))).await;
        ledger.add_transaction(expense(2, 2, 150_000.0, ms(2025, 3, 3))).await;

        let b = builder(ledger);
        let daily = b.average_daily_spending(1).await.unwrap();
        assert!((daily - 30_000.0).abs() < 1e-6);

        let range = TimeRange::month(2025, 3, utc()).unwrap();
        let spending = b.category_spending(1, 10, range).await.unwrap();
        assert_eq!(spending.get("Ăn uống"), Some(&300_000.0));
        assert_eq!(spending.get("Di chuyển"), Some(&150_000.0));

        let pattern = b.spending_pattern(1, 10).await.unwrap();
        assert!(pattern.contains("Trung bình mỗi ngày: 30,000 VNĐ"));
        assert!(pattern.contains("Chiếm nhiều nhất: Ăn uống (67%)"));
    }

    #[tokio::test]
    async fn build_fills_blocks_and_detects_language() {
        let ledger = ledger().await;
        ledger.add_transaction(expense(1, 1, 300_000.0, ms(2025, 3, 2))).await;

        let ctx = builder(ledger).build(1, 10, "Tôi chi tiêu bao nhiêu?").await;
        assert_eq!(ctx.language, Language::Vietnamese);
        assert!(ctx.has_financial_data());
        assert!(ctx.comparison.is_empty());
        assert!(ctx.trend.is_empty());
        assert!(!ctx.spending_pattern.is_empty());

        let ctx = builder(InMemoryLedger::new()).build(1, 10, "How much did I spend?").await;
        assert_eq!(ctx.language, Language::English);
    }

    struct FailingStore;

    #[async_trait::async_trait]
    impl FinanceStore for FailingStore {
        fn name(&self) -> &str {
            "failing"
        }
        async fn wallet_balance(&self, _: i64) -> Result<Option<f64>, FinanceError> {
            Err(FinanceError::Unavailable("db offline".into()))
        }
        async fn total_expense(&self, _: i64, _: TimeRange) -> Result<Option<f64>, FinanceError> {
            Err(FinanceError::Unavailable("db offline".into()))
        }
        async fn total_income(&self, _: i64, _: TimeRange) -> Result<Option<f64>, FinanceError> {
            Err(FinanceError::Unavailable("db offline".into()))
        }
        async fn top_expense_categories(
            &self,
            _: i64,
            _: i64,
            _: TimeRange,
            _: usize,
        ) -> Result<Vec<CategoryTotal>, FinanceError> {
            Err(FinanceError::Unavailable("db offline".into()))
        }
        async fn expenses_by_category(&self, _: i64, _: i64, _: TimeRange) -> Result<Vec<CategoryTotal>, FinanceError> {
            Err(FinanceError::Unavailable("db offline".into()))
        }
        async fn active_budgets(&self, _: i64) -> Result<Vec<BudgetSnapshot>, FinanceError> {
            Ok(vec![BudgetSnapshot {
                id: 1,
                name: "All".into(),
                category_id: None,
                amount: 100.0,
                start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
                spent: 10.0,
            }])
        }
        async fn category_by_id(&self, _: i64) -> Result<Option<Category>, FinanceError> {
            Ok(None)
        }
        async fn category_by_name(&self, _: &str) -> Result<Option<Category>, FinanceError> {
            Ok(None)
        }
        async fn recent_transactions(&self, _: i64, _: usize) -> Result<Vec<Transaction>, FinanceError> {
            Ok(vec![])
        }
        async fn category_expense(&self, _: i64, _: i64, _: TimeRange) -> Result<Option<f64>, FinanceError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn failing_blocks_are_omitted_independently() {
        let b = FinancialContextBuilder::new(Arc::new(FailingStore))
            .with_offset(utc())
            .with_reference_time(reference());
        let ctx = b.build(1, 10, "budget").await;
        assert!(ctx.financial_summary.is_empty());
        assert!(ctx.comparison.is_empty());
        assert!(ctx.trend.is_empty());
        assert!(ctx.budget_status.contains("(10%) ✅ ỔN"));
    }
}
