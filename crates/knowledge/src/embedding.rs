//! TF-IDF embedder — pure Rust, no model files.
//!
//! Produces dense vectors over the vocabulary with log-scaled term
//! frequency × IDF weights, normalized to unit length so cosine similarity
//! reduces to a dot product.

use std::collections::HashMap;

use crate::tokenizer::{Vocabulary, terms};

/// Turns text into fixed-length vectors.
pub trait Embedder: Send + Sync {
    /// Embed `text`. An uninitialized embedder returns an empty vector.
    fn embed(&self, text: &str) -> Vec<f32>;

    /// Vector length (0 when uninitialized).
    fn dimensions(&self) -> usize;
}

/// Embedder over a fixed vocabulary.
///
/// `TfIdfEmbedder::default()` has no vocabulary and produces zero-length
/// vectors, which score 0 against anything.
#[derive(Debug, Clone, Default)]
pub struct TfIdfEmbedder {
    vocabulary: Vocabulary,
}

impl TfIdfEmbedder {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn is_initialized(&self) -> bool {
        !self.vocabulary.is_empty()
    }
}

impl Embedder for TfIdfEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        if self.vocabulary.is_empty() {
            return Vec::new();
        }

        let mut tf: HashMap<String, u32> = HashMap::new();
        for term in terms(text) {
            *tf.entry(term).or_insert(0) += 1;
        }

        let mut vector = vec![0.0f32; self.vocabulary.len()];
        for (term, count) in &tf {
            let Some(idx) = self.vocabulary.index_of(term) else {
                continue;
            };
            let idf = self.vocabulary.idf_at(idx).unwrap_or(0.0);
            vector[idx] = (1.0 + (*count as f32).ln()) * idf;
        }

        normalize(&mut vector);
        vector
    }

    fn dimensions(&self) -> usize {
        self.vocabulary.len()
    }
}

/// Scale `v` to unit length in place. An all-zero vector is left as is.
pub fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Euclidean length of `v`.
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
