pub mod ask;
pub mod search;
pub mod stats;

use moneyrag_config::AppConfig;
use moneyrag_knowledge::{KnowledgeStore, ScoreWeights};

/// Open and initialize the knowledge store described by the configuration.
///
/// Unlike the service's lazy initialization, a broken corpus is an error here.
pub(crate) async fn open_store(config: &AppConfig) -> Result<KnowledgeStore, Box<dyn std::error::Error>> {
    let weights = ScoreWeights::new(config.knowledge.keyword_weight, config.knowledge.semantic_weight);
    let store = KnowledgeStore::with_weights(weights);
    match &config.knowledge.path {
        Some(path) => store.initialize_from_path(path).await?,
        None => store.initialize_builtin()?,
    };
    Ok(store)
}

pub(crate) fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}
