//! Knowledge documents — bilingual financial advice entries.
//!
//! A document carries its advice text in two fixed languages (English as
//! the primary body, Vietnamese as the secondary one) plus a keyword list
//! used for fast literal matching. The embedding is derived once when a
//! knowledge store loads the corpus.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The two languages a document body can be written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[default]
    #[serde(rename = "vi")]
    Vietnamese,
}

impl Language {
    /// Short language tag (`en` / `vi`).
    pub fn tag(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Vietnamese => "vi",
        }
    }

    /// Parse a language tag. Accepts `en`/`english` and `vi`/`vietnamese`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "en" | "english" => Some(Self::English),
            "vi" | "vietnamese" => Some(Self::Vietnamese),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A single entry of the financial knowledge base.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    /// Unique ID within one knowledge store
    pub id: String,

    /// Short human-readable title
    pub topic: String,

    /// Coarse classification tag (e.g. "food", "budgeting")
    pub category: String,

    /// Advice text in English
    #[serde(default, rename = "content_en")]
    pub content_primary: String,

    /// Advice text in Vietnamese
    #[serde(default, rename = "content_vi")]
    pub content_secondary: String,

    /// Short phrases for literal matching
    #[serde(default)]
    pub keywords: Vec<String>,

    /// TF-IDF vector over the owning store's vocabulary
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

impl KnowledgeDocument {
    pub fn new(
        id: impl Into<String>,
        topic: impl Into<String>,
        category: impl Into<String>,
        content_primary: impl Into<String>,
        content_secondary: impl Into<String>,
        keywords: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            topic: topic.into(),
            category: category.into(),
            content_primary: content_primary.into(),
            content_secondary: content_secondary.into(),
            keywords,
            embedding: Vec::new(),
        }
    }

    /// Body text in the preferred language, falling back to the other one
    /// when the preferred body is empty.
    pub fn content(&self, prefer_secondary: bool) -> &str {
        let (preferred, other) = if prefer_secondary {
            (&self.content_secondary, &self.content_primary)
        } else {
            (&self.content_primary, &self.content_secondary)
        };
        if preferred.is_empty() { other } else { preferred }
    }

    /// Topic, both bodies and all keywords joined by single spaces.
    ///
    /// This is the unit of text embedded for semantic scoring.
    pub fn combined_content(&self) -> String {
        let parts = [
            self.topic.as_str(),
            self.content_primary.as_str(),
            self.content_secondary.as_str(),
        ];
        parts
            .into_iter()
            .chain(self.keywords.iter().map(String::as_str))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }

    /// Whether at least one language body is present.
    pub fn has_content(&self) -> bool {
        !self.content_primary.is_empty() || !self.content_secondary.is_empty()
    }

    /// Citation record for this document.
    pub fn source(&self) -> SourceDocument {
        SourceDocument {
            id: self.id.clone(),
            topic: self.topic.clone(),
            category: self.category.clone(),
        }
    }
}

/// A document paired with the score it received in one retrieval call.
///
/// Scores never live on the shared document; every call produces its own.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub document: Arc<KnowledgeDocument>,
    pub score: f32,
}

impl ScoredDocument {
    pub fn new(document: Arc<KnowledgeDocument>, score: f32) -> Self {
        Self { document, score }
    }

    pub fn id(&self) -> &str {
        &self.document.id
    }
}

/// A knowledge document cited by a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub id: String,
    pub topic: String,
    pub category: String,
}
