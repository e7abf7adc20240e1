//! Pre-classified query intent.
//!
//! An upstream query parser may classify a question before it reaches the
//! retrieval pipeline. The intent narrows knowledge retrieval to a category
//! and tags the context with a query type.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What kind of question the user asked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    /// "How much did I spend on..."
    Spending,
    /// "How much did I earn..."
    Income,
    /// "Compare spending in X vs Y"
    Comparison,
    /// "What's my average monthly spending..."
    Trend,
    /// "What did I spend on Food?"
    CategoryList,
    /// General advice questions
    #[default]
    General,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spending => "SPENDING",
            Self::Income => "INCOME",
            Self::Comparison => "COMPARISON",
            Self::Trend => "TREND",
            Self::CategoryList => "CATEGORY_LIST",
            Self::General => "GENERAL",
        }
    }

    /// Parse a query-type tag, case-insensitively. `-` and `_` are interchangeable.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_uppercase().replace('-', "_").as_str() {
            "SPENDING" => Some(Self::Spending),
            "INCOME" => Some(Self::Income),
            "COMPARISON" => Some(Self::Comparison),
            "TREND" => Some(Self::Trend),
            "CATEGORY_LIST" => Some(Self::CategoryList),
            "GENERAL" => Some(Self::General),
            _ => None,
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured intent extracted from a natural-language query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryIntent {
    /// Free-text category name, if the query targets one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default)]
    pub query_type: QueryType,
}

impl QueryIntent {
    pub fn new(query_type: QueryType) -> Self {
        Self {
            category: None,
            query_type,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// The category, if present and not blank.
    pub fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}
