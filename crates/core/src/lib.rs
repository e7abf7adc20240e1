//! # moneyrag Core
//!
//! Domain types, traits, and error definitions for the moneyrag retrieval
//! pipeline. This crate has **no framework dependencies**: it defines the
//! domain model that the knowledge store and the context assembler
//! implement against.
//!
//! ## Design Philosophy
//!
//! External collaborators (the ledger database in particular) are defined
//! as traits here. Implementations live in their respective crates, which
//! keeps the pipeline testable against in-memory stand-ins.

pub mod error;
pub mod finance;
pub mod intent;
pub mod knowledge;

// Re-export key types at crate root for ergonomics
pub use error::{Error, FinanceError, KnowledgeError, Result};
pub use finance::{
    BudgetSnapshot, Category, CategoryTotal, FinanceStore, TimeRange, Transaction, TransactionKind,
};
pub use intent::{QueryIntent, QueryType};
pub use knowledge::{KnowledgeDocument, Language, ScoredDocument, SourceDocument};
