//! In-memory ledger — a `FinanceStore` over a JSON snapshot.
//!
//! Useful for tests, demos and the command-line front end, where there is
//! no database. Aggregates behave like SQL `SUM`: no matching rows yields
//! `None`, not zero.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use moneyrag_core::error::{FinanceError, Result};
use moneyrag_core::finance::{
    BudgetSnapshot, Category, CategoryTotal, FinanceStore, TimeRange, Transaction, TransactionKind,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Label for expenses without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub name: String,
    pub balance: f64,
}

/// A budget as stored, before its spend is computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub wallet_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    pub amount: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// The serialized ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerData {
    #[serde(default)]
    pub wallets: Vec<Wallet>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub budgets: Vec<Budget>,
}

impl LedgerData {
    fn category_name(&self, category_id: Option<i64>) -> String {
        category_id
            .and_then(|id| self.categories.iter().find(|c| c.id == id))
            .map(|c| c.name.clone())
            .unwrap_or_else(|| UNCATEGORIZED.to_string())
    }

    fn sum<'a>(transactions: impl Iterator<Item = &'a Transaction>) -> Option<f64> {
        transactions.fold(None, |acc, t| Some(acc.unwrap_or(0.0) + t.amount))
    }

    fn grouped_expenses(&self, user_id: i64, account_id: i64, range: TimeRange) -> Vec<CategoryTotal> {
        let mut totals: Vec<CategoryTotal> = Vec::new();
        for txn in self.transactions.iter().filter(|t| {
            t.user_id == user_id
                && t.wallet_id == account_id
                && t.kind == TransactionKind::Expense
                && range.contains(t.created_at_ms)
        }) {
            let name = self.category_name(txn.category_id);
            match totals.iter_mut().find(|c| c.category == name) {
                Some(entry) => entry.total += txn.amount,
                None => totals.push(CategoryTotal {
                    category: name,
                    total: txn.amount,
                }),
            }
        }
        totals.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));
        totals
    }
}

/// A `FinanceStore` holding the whole ledger in memory.
#[derive(Clone)]
pub struct InMemoryLedger {
    data: Arc<RwLock<LedgerData>>,
    /// Offset in which budget start/end dates are interpreted
    offset: FixedOffset,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::from_data(LedgerData::default())
    }

    pub fn from_data(data: LedgerData) -> Self {
        Self {
            data: Arc::new(RwLock::new(data)),
            offset: Utc.fix(),
        }
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Parse a ledger snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let data: LedgerData = serde_json::from_str(json)?;
        Ok(Self::from_data(data))
    }

    /// Read a ledger snapshot from a JSON file.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    pub async fn snapshot(&self) -> LedgerData {
        self.data.read().await.clone()
    }

    pub async fn add_wallet(&self, wallet: Wallet) {
        self.data.write().await.wallets.push(wallet);
    }

    pub async fn add_category(&self, category: Category) {
        self.data.write().await.categories.push(category);
    }

    pub async fn add_transaction(&self, transaction: Transaction) {
        self.data.write().await.transactions.push(transaction);
    }

    pub async fn add_budget(&self, budget: Budget) {
        self.data.write().await.budgets.push(budget);
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FinanceStore for InMemoryLedger {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn wallet_balance(&self, account_id: i64) -> std::result::Result<Option<f64>, FinanceError> {
        let data = self.data.read().await;
        Ok(data.wallets.iter().find(|w| w.id == account_id).map(|w| w.balance))
    }

    async fn total_expense(&self, user_id: i64, range: TimeRange) -> std::result::Result<Option<f64>, FinanceError> {
        let data = self.data.read().await;
        Ok(LedgerData::sum(data.transactions.iter().filter(|t| {
            t.user_id == user_id && t.kind == TransactionKind::Expense && range.contains(t.created_at_ms)
        })))
    }

    async fn total_income(&self, user_id: i64, range: TimeRange) -> std::result::Result<Option<f64>, FinanceError> {
        let data = self.data.read().await;
        Ok(LedgerData::sum(data.transactions.iter().filter(|t| {
            t.user_id == user_id && t.kind == TransactionKind::Income && range.contains(t.created_at_ms)
        })))
    }

    async fn top_expense_categories(
        &self,
        user_id: i64,
        account_id: i64,
        range: TimeRange,
        limit: usize,
    ) -> std::result::Result<Vec<CategoryTotal>, FinanceError> {
        let data = self.data.read().await;
        let mut totals = data.grouped_expenses(user_id, account_id, range);
        totals.truncate(limit);
        Ok(totals)
    }

    async fn expenses_by_category(
        &self,
        user_id: i64,
        account_id: i64,
        range: TimeRange,
    ) -> std::result::Result<Vec<CategoryTotal>, FinanceError> {
        let data = self.data.read().await;
        Ok(data.grouped_expenses(user_id, account_id, range))
    }

    async fn active_budgets(&self, account_id: i64) -> std::result::Result<Vec<BudgetSnapshot>, FinanceError> {
        let data = self.data.read().await;
        let mut snapshots = Vec::new();

        for budget in data.budgets.iter().filter(|b| b.wallet_id == account_id) {
            let Some(period) = TimeRange::days(budget.start_date, budget.end_date, self.offset) else {
                return Err(FinanceError::QueryFailed(format!(
                    "budget {} has an invalid period",
                    budget.id
                )));
            };

            let spent = data
                .transactions
                .iter()
                .filter(|t| {
                    t.wallet_id == account_id
                        && t.kind == TransactionKind::Expense
                        && period.contains(t.created_at_ms)
                        && (budget.category_id.is_none() || t.category_id == budget.category_id)
                })
                .fold(0.0, |acc, t| acc + t.amount);

            snapshots.push(BudgetSnapshot {
                id: budget.id,
                name: budget.name.clone(),
                category_id: budget.category_id,
                amount: budget.amount,
                start_date: budget.start_date,
                end_date: budget.end_date,
                spent,
            });
        }

        Ok(snapshots)
    }

    async fn category_by_id(&self, category_id: i64) -> std::result::Result<Option<Category>, FinanceError> {
        let data = self.data.read().await;
        Ok(data.categories.iter().find(|c| c.id == category_id).cloned())
    }

    async fn category_by_name(&self, name: &str) -> std::result::Result<Option<Category>, FinanceError> {
        let wanted = name.trim().to_lowercase();
        let data = self.data.read().await;
        Ok(data
            .categories
            .iter()
            .find(|c| c.name.trim().to_lowercase() == wanted)
            .cloned())
    }

    async fn recent_transactions(
        &self,
        category_id: i64,
        limit: usize,
    ) -> std::result::Result<Vec<Transaction>, FinanceError> {
        let data = self.data.read().await;
        let mut matching: Vec<Transaction> = data
            .transactions
            .iter()
            .filter(|t| t.category_id == Some(category_id))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn category_expense(
        &self,
        user_id: i64,
        category_id: i64,
        range: TimeRange,
    ) -> std::result::Result<Option<f64>, FinanceError> {
        let data = self.data.read().await;
        Ok(LedgerData::sum(data.transactions.iter().filter(|t| {
            t.user_id == user_id
                && t.kind == TransactionKind::Expense
                && t.category_id == Some(category_id)
                && range.contains(t.created_at_ms)
        })))
    }
}
