//! `moneyrag search` — rank knowledge documents for a question.

use moneyrag_core::ScoredDocument;
use tracing::debug;

pub async fn run(
    query: String,
    top_k: Option<usize>,
    category: Option<String>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let store = super::open_store(&config).await?;
    let top_k = top_k.unwrap_or(config.knowledge.default_top_k);
    debug!(top_k, category = ?category, "Searching knowledge base");

    let results = match category.as_deref() {
        Some(category) => store.retrieve_by_category(&query, category, top_k),
        None => store.retrieve(&query, top_k),
    };

    if json {
        let rows: Vec<serde_json::Value> = results.iter().map(to_json).collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No matching knowledge for \"{query}\"");
        return Ok(());
    }

    println!("🔎 Knowledge for \"{query}\"");
    println!("===========================");
    for (i, scored) in results.iter().enumerate() {
        let doc = &scored.document;
        println!("{:>2}. [{:.3}] {} ({})", i + 1, scored.score, doc.topic, doc.category);
        println!("      {}", doc.content(config.rag.prefer_vietnamese));
    }

    Ok(())
}

fn to_json(scored: &ScoredDocument) -> serde_json::Value {
    serde_json::json!({
        "id": scored.document.id,
        "topic": scored.document.topic,
        "category": scored.document.category,
        "score": scored.score,
    })
}
