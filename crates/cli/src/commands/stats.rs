use moneyrag_config::AppConfig;
use tracing::debug;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let store = super::open_store(&config).await?;
    debug!(state = %store.state(), "Knowledge store opened");

    println!("💸 moneyrag Status");
    println!("==================");
    println!();
    println!("  Version:      {}", env!("CARGO_PKG_VERSION"));
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!(
        "  Corpus:       {}",
        config
            .knowledge
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in".into())
    );
    println!("  State:        {}", store.state());
    println!("  Documents:    {}", store.document_count());
    println!("  Vocabulary:   {} terms", store.embedding_dimension());
    println!(
        "  Weights:      keyword {:.2} / semantic {:.2}",
        config.knowledge.keyword_weight, config.knowledge.semantic_weight
    );
    println!("  Language:     {}", config.rag.language);
    println!("  Currency:     {}", config.rag.currency);
    println!("  Top-k:        {}", config.rag.top_k);
    println!();

    let categories = store.categories();
    println!("  Categories ({}):", categories.len());
    for category in categories {
        println!("    • {category}");
    }

    Ok(())
}
