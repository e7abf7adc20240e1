//! `moneyrag ask` — build the retrieval context and the prompts for a
//! question against a ledger snapshot.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use moneyrag_config::AppConfig;
use moneyrag_core::{QueryIntent, QueryType};
use moneyrag_rag::{
    InMemoryLedger, RagService, build_system_prompt, build_user_prompt, configured_offset, fallback_response,
};
use tracing::{debug, info};

pub struct AskArgs {
    pub query: String,
    pub ledger: Option<PathBuf>,
    pub user: i64,
    pub account: i64,
    pub category: Option<String>,
    pub query_type: Option<String>,
    pub combined: bool,
    pub fallback: bool,
}

pub async fn run(args: AskArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    let ledger = open_ledger(&config, args.ledger.as_deref()).await?;

    let intent = intent_from_args(args.category.as_deref(), args.query_type.as_deref())?;

    let service = RagService::from_config(&config, Arc::new(ledger));
    if !service.ensure_ready().await {
        return Err("Knowledge base failed to load".into());
    }

    info!(user = args.user, account = args.account, "Building retrieval context");
    let ctx = service
        .retrieve_context(args.user, args.account, &args.query, intent.as_ref())
        .await;
    debug!(context = %ctx.summary(), documents = ctx.documents.len(), "Context ready");

    if args.combined {
        println!("{}", ctx.enhanced_prompt(&args.query));
    } else {
        println!("🧭 System prompt");
        println!("================");
        println!("{}", build_system_prompt(&ctx));
        println!("💬 User prompt");
        println!("==============");
        println!("{}", build_user_prompt(&ctx, &args.query));
    }

    println!();
    println!("📚 Sources");
    if ctx.documents.is_empty() {
        println!("  (none)");
    }
    for scored in &ctx.documents {
        let doc = &scored.document;
        println!("  {:<16} {:.3}  {}", doc.id, scored.score, doc.topic);
    }

    if args.fallback {
        println!();
        println!("🛟 Fallback answer");
        println!("==================");
        println!("{}", fallback_response(&ctx, &args.query));
    }

    Ok(())
}

/// Load the ledger snapshot in the same UTC offset the context builder uses.
async fn open_ledger(config: &AppConfig, path: Option<&Path>) -> Result<InMemoryLedger, Box<dyn std::error::Error>> {
    let ledger = match path {
        Some(path) => InMemoryLedger::load(path)
            .await
            .map_err(|e| format!("Failed to load ledger {}: {e}", path.display()))?,
        None => InMemoryLedger::new(),
    };
    let offset = configured_offset(config);
    debug!(%offset, "Ledger offset");
    Ok(ledger.with_offset(offset))
}

fn intent_from_args(
    category: Option<&str>,
    query_type: Option<&str>,
) -> Result<Option<QueryIntent>, Box<dyn std::error::Error>> {
    if category.is_none() && query_type.is_none() {
        return Ok(None);
    }

    let query_type = match query_type {
        Some(tag) => QueryType::parse(tag).ok_or_else(|| format!("Unknown query type: {tag}"))?,
        None => QueryType::General,
    };

    let mut intent = QueryIntent::new(query_type);
    if let Some(category) = category {
        intent = intent.with_category(category);
    }
    Ok(Some(intent))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_means_no_intent() {
        assert!(intent_from_args(None, None).unwrap().is_none());
    }

    #[test]
    fn category_alone_defaults_to_general() {
        let intent = intent_from_args(Some("Ăn uống"), None).unwrap().unwrap();
        assert_eq!(intent.query_type, QueryType::General);
        assert_eq!(intent.category(), Some("Ăn uống"));
    }

    #[test]
    fn unknown_query_type_is_rejected() {
        assert!(intent_from_args(None, Some("astrology")).is_err());
    }

    #[tokio::test]
    async fn ledger_uses_configured_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        std::fs::write(&path, r#"{"wallets": [{"id": 1, "user_id": 1, "balance": 0}]}"#).unwrap();

        let mut config = AppConfig::default();
        config.rag.utc_offset_minutes = Some(420);

        let ledger = open_ledger(&config, Some(&path)).await.unwrap();
        assert_eq!(ledger.offset(), chrono::FixedOffset::east_opt(7 * 3600).unwrap());

        let empty = open_ledger(&config, None).await.unwrap();
        assert_eq!(empty.offset(), configured_offset(&config));
    }

    #[tokio::test]
    async fn missing_ledger_file_is_an_error() {
        let err = open_ledger(&AppConfig::default(), Some(Path::new("/nonexistent/ledger.json")))
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("Failed to load ledger"));
    }
}
