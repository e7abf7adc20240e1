//! Configuration loading, validation, and management for moneyrag.
//!
//! Loads configuration from `~/.moneyrag/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Env var overriding `knowledge.path`.
pub const ENV_KNOWLEDGE_PATH: &str = "MONEYRAG_KNOWLEDGE_PATH";
/// Env var overriding `rag.language`.
pub const ENV_LANGUAGE: &str = "MONEYRAG_LANGUAGE";

/// The root configuration structure.
///
/// Maps directly to `~/.moneyrag/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Knowledge base and scoring
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Context assembly and rendering
    #[serde(default)]
    pub rag: RagConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Corpus JSON file; the built-in knowledge base is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f32,

    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f32,

    /// Result count for knowledge-only searches
    #[serde(default = "default_search_top_k")]
    pub default_top_k: usize,
}

fn default_keyword_weight() -> f32 {
    0.6
}
fn default_semantic_weight() -> f32 {
    0.4
}
fn default_search_top_k() -> usize {
    5
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: None,
            keyword_weight: default_keyword_weight(),
            semantic_weight: default_semantic_weight(),
            default_top_k: default_search_top_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Documents retrieved per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Documents rendered into the combined prompt
    #[serde(default = "default_max_documents")]
    pub max_documents: usize,

    /// Render Vietnamese document bodies when available
    #[serde(default = "default_true")]
    pub prefer_vietnamese: bool,

    /// Label language for rendered blocks: "vi" or "en"
    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default = "default_top_categories")]
    pub top_categories: usize,

    #[serde(default = "default_recent_transactions")]
    pub recent_transactions: usize,

    /// Offset for month boundaries; the system's local offset when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
}

fn default_top_k() -> usize {
    3
}
fn default_max_documents() -> usize {
    5
}
fn default_true() -> bool {
    true
}
fn default_language() -> String {
    "vi".into()
}
fn default_currency() -> String {
    "VNĐ".into()
}
fn default_top_categories() -> usize {
    3
}
fn default_recent_transactions() -> usize {
    3
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_documents: default_max_documents(),
            prefer_vietnamese: true,
            language: default_language(),
            currency: default_currency(),
            top_categories: default_top_categories(),
            recent_transactions: default_recent_transactions(),
            utc_offset_minutes: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.moneyrag/config.toml).
    ///
    /// Environment overrides:
    /// - `MONEYRAG_KNOWLEDGE_PATH`: corpus file
    /// - `MONEYRAG_LANGUAGE`: output language
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENV_KNOWLEDGE_PATH).filter(|p| !p.trim().is_empty()) {
            self.knowledge.path = Some(PathBuf::from(path));
        }
        if let Some(language) = lookup(ENV_LANGUAGE).filter(|l| !l.trim().is_empty()) {
            self.rag.language = language.trim().to_lowercase();
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".moneyrag")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let k = &self.knowledge;
        if k.keyword_weight < 0.0 || k.semantic_weight < 0.0 {
            return Err(ConfigError::ValidationError(
                "keyword_weight and semantic_weight must be non-negative".into(),
            ));
        }

        if k.keyword_weight + k.semantic_weight <= 0.0 {
            return Err(ConfigError::ValidationError(
                "keyword_weight + semantic_weight must be > 0".into(),
            ));
        }

        if k.default_top_k == 0 || self.rag.top_k == 0 {
            return Err(ConfigError::ValidationError("top_k must be > 0".into()));
        }

        if !matches!(self.rag.language.as_str(), "en" | "vi") {
            return Err(ConfigError::ValidationError(format!(
                "language must be \"en\" or \"vi\", got \"{}\"",
                self.rag.language
            )));
        }

        if let Some(minutes) = self.rag.utc_offset_minutes {
            if minutes.abs() >= 24 * 60 {
                return Err(ConfigError::ValidationError(
                    "utc_offset_minutes must be within ±1439".into(),
                ));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for moneyrag_core::Error {
    fn from(e: ConfigError) -> Self {
        moneyrag_core::Error::Config { message: e.to_string() }
    }
}
