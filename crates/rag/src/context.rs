//! Per-query retrieval result.
//!
//! A `RagContext` is created fresh for every question, filled by the
//! financial context builder and the knowledge store, rendered into
//! prompts, and dropped. It is never shared across queries or users.

use std::fmt::Write;

use moneyrag_core::knowledge::{Language, ScoredDocument, SourceDocument};

use crate::format::labels;

/// Default number of documents rendered into a prompt.
pub const DEFAULT_MAX_DOCUMENTS: usize = 5;

// ── Types ─────────────────────────────────────────────────────────────────

/// Everything retrieved for one user query.
#[derive(Debug, Clone)]
pub struct RagContext {
    /// Ranked knowledge documents, best first, every score > 0.
    pub documents: Vec<ScoredDocument>,

    // Financial text blocks; an empty string means "omitted"
    pub financial_summary: String,
    pub budget_status: String,
    pub comparison: String,
    pub trend: String,
    pub spending_pattern: String,

    /// The question as the user typed it.
    pub original_query: String,
    /// Language the question was written in.
    pub language: Language,
    pub detected_category: Option<String>,
    /// Upper-case query-type tag (e.g. `SPENDING`) from a pre-classified intent.
    pub query_type: Option<String>,

    /// Render the Vietnamese body of each document when available.
    pub prefer_secondary: bool,
    /// Cap on documents rendered into the combined prompt.
    pub max_documents: usize,
    /// Language for labels, headers and rules in rendered prompts.
    pub output_language: Language,
}

impl RagContext {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            documents: Vec::new(),
            financial_summary: String::new(),
            budget_status: String::new(),
            comparison: String::new(),
            trend: String::new(),
            spending_pattern: String::new(),
            original_query: query.into(),
            language: Language::default(),
            detected_category: None,
            query_type: None,
            prefer_secondary: true,
            max_documents: DEFAULT_MAX_DOCUMENTS,
            output_language: Language::default(),
        }
    }

    pub fn has_financial_data(&self) -> bool {
        !self.financial_summary.is_empty()
    }

    pub fn has_budget_status(&self) -> bool {
        !self.budget_status.is_empty()
    }

    /// Append a block to the financial summary, separated by a blank line.
    pub fn append_to_summary(&mut self, block: &str) {
        if block.is_empty() {
            return;
        }
        if self.financial_summary.is_empty() {
            self.financial_summary = block.to_string();
        } else {
            self.financial_summary.push('\n');
            self.financial_summary.push_str(block);
        }
    }

    /// Citation records for the retrieved documents, in rank order.
    pub fn sources(&self) -> Vec<SourceDocument> {
        self.documents.iter().map(|d| d.document.source()).collect()
    }

    /// One-line description for logs.
    pub fn summary(&self) -> String {
        format!(
            "RagContext: {} docs, has_financial={}, has_budget={}, lang={}",
            self.documents.len(),
            self.has_financial_data(),
            self.has_budget_status(),
            self.language
        )
    }

    /// A single prompt carrying knowledge, financial data and the question,
    /// for model APIs that take one message.
    pub fn enhanced_prompt(&self, user_query: &str) -> String {
        let l = labels(self.output_language);
        let mut prompt = String::new();

        if !self.documents.is_empty() {
            let _ = writeln!(prompt, "{}", l.related_knowledge_header);
            for scored in self.documents.iter().take(self.max_documents) {
                let doc = &scored.document;
                let _ = writeln!(prompt, "• {}: {}", doc.topic, doc.content(self.prefer_secondary));
            }
            prompt.push('\n');
        }

        if !self.financial_summary.is_empty() {
            let _ = write!(prompt, "{}\n{}\n\n", l.user_financial_data_header, self.financial_summary);
        }
        if !self.budget_status.is_empty() {
            let _ = writeln!(prompt, "{}", self.budget_status);
        }
        if !self.spending_pattern.is_empty() {
            let _ = writeln!(prompt, "{}", self.spending_pattern);
        }
        if !self.comparison.is_empty() {
            let _ = write!(prompt, "{}\n{}\n\n", l.comparison_header, self.comparison);
        }
        if !self.trend.is_empty() {
            let _ = write!(prompt, "{}\n{}\n\n", l.trend_header, self.trend);
        }

        let _ = write!(prompt, "{}\n{}", l.user_question_header, user_query);
        prompt
    }
}
