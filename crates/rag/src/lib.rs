//! Retrieval pipeline for the finance assistant.
//!
//! Combines knowledge retrieval with the user's live financial data and
//! renders the result into prompts for a downstream language model.

pub mod context;
pub mod financial;
pub mod format;
pub mod ledger;
pub mod prompt;
pub mod service;

pub use context::RagContext;
pub use financial::{BudgetHealth, FinancialContextBuilder, TrendDirection, classify_trend};
pub use ledger::{InMemoryLedger, LedgerData};
pub use prompt::{build_system_prompt, build_user_prompt, fallback_response};
pub use service::{CorpusSource, RagService, RagSettings, ServiceStats, configured_offset};
