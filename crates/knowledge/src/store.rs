//! Knowledge store — the loaded corpus plus its TF-IDF index.
//!
//! # Lifecycle
//!
//! `Unloaded → Loading → Ready`. The first `initialize` call claims the
//! `Loading` slot, builds the vocabulary and every document embedding
//! outside the lock, and publishes the finished index in one swap. Calls
//! that arrive while another caller is loading return immediately; any
//! retrieval before `Ready` yields an empty list.
//!
//! # Retrieval
//!
//! Scoring is a pure function of the query and the immutable index. Each
//! call returns its own `ScoredDocument` list and never writes to shared
//! documents, so concurrent retrievals need no coordination.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use moneyrag_core::error::KnowledgeError;
use moneyrag_core::knowledge::{KnowledgeDocument, ScoredDocument};
use tracing::{debug, info, warn};

use crate::category::normalize_category;
use crate::corpus::{builtin_corpus, load_corpus};
use crate::embedding::{Embedder, TfIdfEmbedder};
use crate::tokenizer::{Vocabulary, tokenize};
use crate::vector::{ScoreWeights, cosine_similarity, keyword_match_with_terms, rank};

/// Where the store is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreState {
    Unloaded,
    Loading,
    Ready,
}

impl std::fmt::Display for StoreState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Documents with embeddings, plus the embedder that produced them.
struct LoadedIndex {
    documents: Vec<Arc<KnowledgeDocument>>,
    embedder: TfIdfEmbedder,
}

impl LoadedIndex {
    fn build(documents: Vec<KnowledgeDocument>) -> Result<Self, KnowledgeError> {
        let contents: Vec<String> = documents.iter().map(KnowledgeDocument::combined_content).collect();
        let embedder = TfIdfEmbedder::new(Vocabulary::build(&contents)?);

        if !embedder.is_initialized() {
            warn!(documents = documents.len(), "Knowledge corpus produced an empty vocabulary");
        }

        let documents = documents
            .into_iter()
            .zip(contents.iter())
            .map(|(mut doc, content)| {
                doc.embedding = embedder.embed(content);
                Arc::new(doc)
            })
            .collect();

        Ok(Self { documents, embedder })
    }

    fn score<'a>(
        &self,
        query: &str,
        documents: impl Iterator<Item = &'a Arc<KnowledgeDocument>>,
        weights: ScoreWeights,
    ) -> Vec<ScoredDocument> {
        let query_terms = tokenize(&query.to_lowercase());
        let query_embedding = self.embedder.embed(query);

        documents
            .map(|doc| {
                let keyword_score = keyword_match_with_terms(&query_terms, &doc.keywords);
                let semantic_score = cosine_similarity(&query_embedding, &doc.embedding);
                ScoredDocument::new(Arc::clone(doc), weights.combine(keyword_score, semantic_score))
            })
            .collect()
    }
}

enum Slot {
    Unloaded,
    Loading,
    Ready(Arc<LoadedIndex>),
}

/// The financial knowledge base with hybrid (keyword + TF-IDF) retrieval.
pub struct KnowledgeStore {
    slot: RwLock<Slot>,
    weights: ScoreWeights,
}

impl KnowledgeStore {
    /// Create an unloaded store with the default 0.6 / 0.4 weights.
    pub fn new() -> Self {
        Self::with_weights(ScoreWeights::default())
    }

    pub fn with_weights(weights: ScoreWeights) -> Self {
        Self {
            slot: RwLock::new(Slot::Unloaded),
            weights,
        }
    }

    pub fn weights(&self) -> ScoreWeights {
        self.weights
    }

    /// Load `documents` and compute their embeddings.
    ///
    /// A no-op returning the current document count when the store is
    /// already `Ready`, and returning 0 when another caller is loading.
    /// An empty corpus leaves the store `Unloaded`.
    pub fn initialize(&self, documents: Vec<KnowledgeDocument>) -> Result<usize, KnowledgeError> {
        {
            let mut slot = self.write();
            match &*slot {
                Slot::Ready(index) => {
                    debug!("Knowledge store already initialized");
                    return Ok(index.documents.len());
                }
                Slot::Loading => {
                    debug!("Knowledge store initialization already in progress");
                    return Ok(0);
                }
                Slot::Unloaded => *slot = Slot::Loading,
            }
        }

        self.publish(documents)
    }

    /// Replace the loaded corpus, recomputing the vocabulary and all embeddings.
    ///
    /// Claims the `Loading` slot like `initialize`: retrieval returns nothing
    /// until the new index is published, and a reload that arrives while
    /// another caller is loading returns 0 without touching the store.
    pub fn reload(&self, documents: Vec<KnowledgeDocument>) -> Result<usize, KnowledgeError> {
        {
            let mut slot = self.write();
            if matches!(*slot, Slot::Loading) {
                debug!("Knowledge store initialization already in progress, reload skipped");
                return Ok(0);
            }
            *slot = Slot::Loading;
        }

        info!(documents = documents.len(), "Reloading knowledge store");
        self.publish(documents)
    }

    /// Drop the loaded corpus and return to `Unloaded`.
    pub fn reset(&self) {
        *self.write() = Slot::Unloaded;
    }

    /// Initialize from the knowledge base embedded in this crate.
    pub fn initialize_builtin(&self) -> Result<usize, KnowledgeError> {
        if self.is_ready() {
            return Ok(self.document_count());
        }
        self.initialize(builtin_corpus()?)
    }

    /// Initialize from a corpus file on disk.
    pub async fn initialize_from_path(&self, path: &Path) -> Result<usize, KnowledgeError> {
        if self.is_ready() {
            return Ok(self.document_count());
        }
        info!(path = %path.display(), "Loading knowledge base");
        self.initialize(load_corpus(path).await?)
    }

    fn publish(&self, documents: Vec<KnowledgeDocument>) -> Result<usize, KnowledgeError> {
        match LoadedIndex::build(documents) {
            Ok(index) => {
                let count = index.documents.len();
                let dimension = index.embedder.dimensions();
                *self.write() = Slot::Ready(Arc::new(index));
                info!(documents = count, dimension, "Knowledge store ready");
                Ok(count)
            }
            Err(e) => {
                *self.write() = Slot::Unloaded;
                warn!(error = %e, "Knowledge store initialization failed");
                Err(e)
            }
        }
    }

    /// Top `top_k` documents for `query` by hybrid score.
    ///
    /// Entries with a score of zero or below are never returned. Equal
    /// scores keep corpus load order.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Vec<ScoredDocument> {
        let Some(index) = self.ready_index() else {
            warn!("Knowledge store not initialized, returning no documents");
            return Vec::new();
        };

        let scored = index.score(query, index.documents.iter(), self.weights);
        let results = rank(scored, top_k);

        debug!(
            query = %truncate(query, 50),
            results = results.len(),
            "Retrieved relevant documents"
        );
        results
    }

    /// Like `retrieve`, restricted to documents of one category.
    ///
    /// `category` is free text ("Ăn uống", "Food & Drinks") and is mapped to
    /// a canonical key first. When no document carries that key the result
    /// is exactly `retrieve(query, top_k)`.
    pub fn retrieve_by_category(&self, query: &str, category: &str, top_k: usize) -> Vec<ScoredDocument> {
        let Some(index) = self.ready_index() else {
            warn!("Knowledge store not initialized, returning no documents");
            return Vec::new();
        };

        let key = normalize_category(category);
        if key.is_empty() {
            return self.retrieve(query, top_k);
        }

        let subset: Vec<&Arc<KnowledgeDocument>> = index
            .documents
            .iter()
            .filter(|doc| doc.category.to_lowercase().contains(&key))
            .collect();

        if subset.is_empty() {
            debug!(category, key = %key, "No documents in category, falling back to full search");
            return self.retrieve(query, top_k);
        }

        let scored = index.score(query, subset.into_iter(), self.weights);
        let results = rank(scored, top_k);

        debug!(
            category = %key,
            results = results.len(),
            "Retrieved category documents"
        );
        results
    }

    /// Embed arbitrary text with the store's vocabulary (empty if not ready).
    pub fn embed(&self, text: &str) -> Vec<f32> {
        self.ready_index()
            .map(|index| index.embedder.embed(text))
            .unwrap_or_default()
    }

    pub fn state(&self) -> StoreState {
        match &*self.read() {
            Slot::Unloaded => StoreState::Unloaded,
            Slot::Loading => StoreState::Loading,
            Slot::Ready(_) => StoreState::Ready,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == StoreState::Ready
    }

    pub fn document_count(&self) -> usize {
        self.ready_index().map_or(0, |index| index.documents.len())
    }

    /// Vocabulary size, i.e. the length of every document embedding.
    pub fn embedding_dimension(&self) -> usize {
        self.ready_index().map_or(0, |index| index.embedder.dimensions())
    }

    /// Distinct document categories in load order.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        if let Some(index) = self.ready_index() {
            for doc in &index.documents {
                if !categories.contains(&doc.category) {
                    categories.push(doc.category.clone());
                }
            }
        }
        categories
    }

    /// All loaded documents in load order.
    pub fn documents(&self) -> Vec<Arc<KnowledgeDocument>> {
        self.ready_index()
            .map(|index| index.documents.clone())
            .unwrap_or_default()
    }

    pub fn get(&self, id: &str) -> Option<Arc<KnowledgeDocument>> {
        self.ready_index()?
            .documents
            .iter()
            .find(|doc| doc.id == id)
            .cloned()
    }

    fn ready_index(&self) -> Option<Arc<LoadedIndex>> {
        match &*self.read() {
            Slot::Ready(index) => Some(Arc::clone(index)),
            _ => None,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Slot> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Slot> {
        self.slot.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for KnowledgeStore {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
