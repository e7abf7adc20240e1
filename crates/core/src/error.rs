//! Error types for the moneyrag domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! Nothing in the retrieval path is user-fatal: callers degrade these
//! errors to "no results" or "zero score". They exist so the degradation
//! can be logged with a precise reason.

use std::path::PathBuf;

use thiserror::Error;

/// The top-level error type for all moneyrag operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Knowledge base errors ---
    #[error("Knowledge error: {0}")]
    Knowledge(#[from] KnowledgeError),

    // --- Financial data accessor errors ---
    #[error("Finance error: {0}")]
    Finance(#[from] FinanceError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- I/O ---
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// The store was queried before reaching `Ready`.
    #[error("Knowledge store is not initialized")]
    NotInitialized,

    /// The corpus (or one of its entries) could not be parsed.
    #[error("Failed to parse knowledge corpus from {source_name}: {reason}")]
    CorpusParse { source_name: String, reason: String },

    /// Vocabulary construction was attempted over zero documents.
    #[error("Knowledge corpus is empty")]
    EmptyCorpus,

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Failed to read knowledge corpus at {path}: {reason}")]
    Io { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum FinanceError {
    #[error("Financial data source unavailable: {0}")]
    Unavailable(String),

    #[error("Financial query failed: {0}")]
    QueryFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
