//! Financial knowledge base with hybrid keyword + TF-IDF retrieval.

pub mod category;
pub mod corpus;
pub mod embedding;
pub mod store;
pub mod tokenizer;
pub mod vector;

pub use category::normalize_category;
pub use corpus::{builtin_corpus, load_corpus, parse_corpus};
pub use embedding::{Embedder, TfIdfEmbedder};
pub use store::{KnowledgeStore, StoreState};
pub use tokenizer::{Vocabulary, detect_language, tokenize};
pub use vector::{ScoreWeights, cosine_similarity, hybrid_score, keyword_match_score, rank};
