//! Vector similarity and hybrid scoring.
//!
//! Pure-Rust implementations of:
//! - Cosine similarity
//! - Keyword-phrase overlap scoring
//! - Hybrid (keyword + semantic) scoring and stable top-K ranking

use std::collections::HashSet;

use moneyrag_core::knowledge::ScoredDocument;
use serde::{Deserialize, Serialize};

use crate::embedding::Embedder;
use crate::tokenizer::tokenize;

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if the lengths differ, either vector is empty, or either
/// vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

/// Fraction of keyword phrases that share at least one term with the query.
///
/// Returns 0.0 for an empty keyword list.
pub fn keyword_match_score<S: AsRef<str>>(query: &str, keywords: &[S]) -> f32 {
    if keywords.is_empty() {
        return 0.0;
    }
    let query_terms = tokenize(&query.to_lowercase());
    keyword_match_with_terms(&query_terms, keywords)
}

/// `keyword_match_score` against an already tokenized query.
pub fn keyword_match_with_terms<S: AsRef<str>>(query_terms: &HashSet<String>, keywords: &[S]) -> f32 {
    if keywords.is_empty() {
        return 0.0;
    }
    let matched = keywords
        .iter()
        .filter(|keyword| {
            tokenize(&keyword.as_ref().to_lowercase())
                .iter()
                .any(|term| query_terms.contains(term))
        })
        .count();
    matched as f32 / keywords.len() as f32
}

/// Relative weights of the two hybrid score components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub keyword: f32,
    pub semantic: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            keyword: 0.6,
            semantic: 0.4,
        }
    }
}

impl ScoreWeights {
    pub fn new(keyword: f32, semantic: f32) -> Self {
        Self { keyword, semantic }
    }

    /// Combine a keyword score and a semantic score.
    pub fn combine(&self, keyword_score: f32, semantic_score: f32) -> f32 {
        self.keyword * keyword_score + self.semantic * semantic_score
    }
}

/// Weighted keyword overlap plus cosine similarity of the two embeddings.
pub fn hybrid_score<S: AsRef<str>>(
    embedder: &dyn Embedder,
    query: &str,
    document_text: &str,
    keywords: &[S],
    weights: ScoreWeights,
) -> f32 {
    let keyword_score = keyword_match_score(query, keywords);
    let semantic_score = cosine_similarity(&embedder.embed(query), &embedder.embed(document_text));
    weights.combine(keyword_score, semantic_score)
}

/// Rank scored documents for output.
///
/// Sorts by descending score with a stable sort (equal scores keep their
/// input order), drops entries that did not score above zero, and keeps
/// at most `top_k`.
pub fn rank(mut scored: Vec<ScoredDocument>, top_k: usize) -> Vec<ScoredDocument> {
    scored.retain(|entry| entry.score > 0.0);
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);
    scored
}
