//! Knowledge corpus loading.
//!
//! The corpus is a JSON object whose array-valued keys are category names:
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "budgeting": [
//!     { "id": "budget_001", "topic": "...", "content_en": "...",
//!       "content_vi": "...", "keywords": ["budget", "ngân sách"] }
//!   ]
//! }
//! ```
//!
//! Non-array keys are metadata and ignored. A malformed entry is skipped
//! with a warning; a malformed top level fails the whole source.

use std::collections::HashSet;
use std::path::Path;

use moneyrag_core::error::KnowledgeError;
use moneyrag_core::knowledge::KnowledgeDocument;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

const BUILTIN_CORPUS: &str = include_str!("../data/financial_knowledge_base.json");

/// Source name used in logs and errors for the embedded corpus.
pub const BUILTIN_SOURCE: &str = "builtin:financial_knowledge_base.json";

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    id: String,
    #[serde(default)]
    topic: String,
    #[serde(default)]
    content_en: String,
    #[serde(default)]
    content_vi: String,
    #[serde(default)]
    keywords: Vec<String>,
}

/// Parse a corpus document. `source_name` labels logs and errors.
///
/// Documents come back in file order: categories as they appear, entries
/// in array order. Entries without an `id` get `<category>_<position>`;
/// entries whose id was already seen are skipped.
pub fn parse_corpus(json: &str, source_name: &str) -> Result<Vec<KnowledgeDocument>, KnowledgeError> {
    let root: Value = serde_json::from_str(json).map_err(|e| KnowledgeError::CorpusParse {
        source_name: source_name.to_string(),
        reason: e.to_string(),
    })?;

    let Value::Object(categories) = root else {
        return Err(KnowledgeError::CorpusParse {
            source_name: source_name.to_string(),
            reason: "top level must be an object of categories".into(),
        });
    };

    let mut documents = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut skipped = 0usize;

    for (category, items) in categories {
        let Value::Array(items) = items else {
            continue;
        };

        for (position, item) in items.into_iter().enumerate() {
            let entry = match RawEntry::deserialize(item) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(category = %category, position, error = %e, "Skipping malformed knowledge entry");
                    skipped += 1;
                    continue;
                }
            };

            if entry.content_en.trim().is_empty() && entry.content_vi.trim().is_empty() {
                warn!(category = %category, position, "Skipping knowledge entry without content");
                skipped += 1;
                continue;
            }

            let id = if entry.id.trim().is_empty() {
                format!("{category}_{position}")
            } else {
                entry.id
            };

            if !seen_ids.insert(id.clone()) {
                warn!(id = %id, "Skipping duplicate knowledge entry");
                skipped += 1;
                continue;
            }

            documents.push(KnowledgeDocument::new(
                id,
                entry.topic,
                category.clone(),
                entry.content_en,
                entry.content_vi,
                entry.keywords,
            ));
        }
    }

    debug!(
        source = source_name,
        documents = documents.len(),
        skipped,
        "Parsed knowledge corpus"
    );
    Ok(documents)
}

/// Read and parse a corpus file.
pub async fn load_corpus(path: &Path) -> Result<Vec<KnowledgeDocument>, KnowledgeError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| KnowledgeError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    parse_corpus(&content, &path.display().to_string())
}

/// The bilingual knowledge base shipped with the crate.
pub fn builtin_corpus() -> Result<Vec<KnowledgeDocument>, KnowledgeError> {
    parse_corpus(BUILTIN_CORPUS, BUILTIN_SOURCE)
}
