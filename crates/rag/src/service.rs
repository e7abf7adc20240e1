//! RAG service — drives the knowledge store and the financial context
//! builder for one query and merges their output.
//!
//! # Flow
//!
//! 1. Make sure the knowledge store is ready (lazy initialization)
//! 2. Build the financial blocks from the user's ledger
//! 3. Tag the context with the pre-classified intent, if any
//! 4. Retrieve knowledge, by category when the intent names one
//! 5. Append the category drill-down to the financial summary

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{FixedOffset, Local};
use moneyrag_config::AppConfig;
use moneyrag_core::finance::FinanceStore;
use moneyrag_core::intent::QueryIntent;
use moneyrag_core::knowledge::{KnowledgeDocument, Language, ScoredDocument};
use moneyrag_knowledge::store::KnowledgeStore;
use moneyrag_knowledge::vector::ScoreWeights;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::context::{DEFAULT_MAX_DOCUMENTS, RagContext};
use crate::financial::FinancialContextBuilder;

/// Documents retrieved per query when no setting overrides it.
pub const DEFAULT_TOP_K: usize = 3;

/// Where the knowledge corpus comes from.
#[derive(Debug, Clone)]
pub enum CorpusSource {
    /// The knowledge base compiled into the binary.
    Builtin,
    /// A JSON corpus file on disk.
    File(PathBuf),
    /// Documents supplied by the caller.
    Documents(Vec<KnowledgeDocument>),
}

/// Per-query retrieval and rendering settings.
#[derive(Debug, Clone)]
pub struct RagSettings {
    pub top_k: usize,
    pub max_documents: usize,
    pub prefer_secondary: bool,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            max_documents: DEFAULT_MAX_DOCUMENTS,
            prefer_secondary: true,
        }
    }
}

/// Knowledge base status.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub initialized: bool,
    pub documents: usize,
    pub categories: usize,
    pub embedding_dimension: usize,
}

impl fmt::Display for ServiceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RagService: initialized={}, documents={}, categories={}",
            self.initialized, self.documents, self.categories
        )
    }
}

/// UTC offset for month boundaries and budget dates: `rag.utc_offset_minutes`
/// when set, otherwise the system's current local offset.
///
/// The ledger handed to [`RagService::from_config`] must use the same offset,
/// or budget periods and monthly totals disagree near midnight.
pub fn configured_offset(config: &AppConfig) -> FixedOffset {
    config
        .rag
        .utc_offset_minutes
        .and_then(|minutes| FixedOffset::east_opt(minutes * 60))
        .unwrap_or_else(|| *Local::now().offset())
}

/// The retrieval pipeline.
pub struct RagService {
    store: Arc<KnowledgeStore>,
    financial: FinancialContextBuilder,
    source: CorpusSource,
    settings: RagSettings,
}

impl RagService {
    pub fn new(store: Arc<KnowledgeStore>, financial: FinancialContextBuilder, source: CorpusSource) -> Self {
        Self {
            store,
            financial,
            source,
            settings: RagSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: RagSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Wire a service from configuration.
    pub fn from_config(config: &AppConfig, finance: Arc<dyn FinanceStore>) -> Self {
        let weights = ScoreWeights::new(config.knowledge.keyword_weight, config.knowledge.semantic_weight);
        let store = Arc::new(KnowledgeStore::with_weights(weights));

        let language = Language::from_tag(&config.rag.language).unwrap_or_default();
        let financial = FinancialContextBuilder::new(finance)
            .with_language(language)
            .with_currency(config.rag.currency.clone())
            .with_top_categories(config.rag.top_categories)
            .with_recent_transactions(config.rag.recent_transactions)
            .with_offset(configured_offset(config));

        let source = match &config.knowledge.path {
            Some(path) => CorpusSource::File(path.clone()),
            None => CorpusSource::Builtin,
        };

        Self::new(store, financial, source).with_settings(RagSettings {
            top_k: config.rag.top_k,
            max_documents: config.rag.max_documents,
            prefer_secondary: config.rag.prefer_vietnamese,
        })
    }

    pub fn store(&self) -> &Arc<KnowledgeStore> {
        &self.store
    }

    pub fn settings(&self) -> &RagSettings {
        &self.settings
    }

    /// Initialize the knowledge store if it is not ready yet.
    ///
    /// Failures are logged; the service keeps working with no knowledge.
    pub async fn ensure_ready(&self) -> bool {
        if self.store.is_ready() {
            return true;
        }

        debug!("Initializing knowledge store");
        let result = match &self.source {
            CorpusSource::Builtin => self.store.initialize_builtin(),
            CorpusSource::File(path) => self.store.initialize_from_path(path).await,
            CorpusSource::Documents(documents) => self.store.initialize(documents.clone()),
        };

        let ready = self.store.is_ready();
        match result {
            Ok(count) if ready => info!(documents = count, "RAG service initialized"),
            Ok(_) => debug!(state = %self.store.state(), "Knowledge store loading in another task"),
            Err(e) => warn!(error = %e, "Failed to initialize RAG service"),
        }
        ready
    }

    /// Build the full retrieval context for one question.
    pub async fn retrieve_context(
        &self,
        user_id: i64,
        account_id: i64,
        query: &str,
        intent: Option<&QueryIntent>,
    ) -> RagContext {
        if !self.store.is_ready() {
            warn!("RAG service not initialized, initializing now");
            self.ensure_ready().await;
        }

        let mut ctx = self.financial.build(user_id, account_id, query).await;
        ctx.prefer_secondary = self.settings.prefer_secondary;
        ctx.max_documents = self.settings.max_documents;

        if let Some(intent) = intent {
            ctx.query_type = Some(intent.query_type.as_str().to_string());
            ctx.detected_category = intent.category().map(str::to_string);
        }

        ctx.documents = match ctx.detected_category.as_deref() {
            Some(category) => {
                debug!(category, "Category-specific retrieval");
                self.store.retrieve_by_category(query, category, self.settings.top_k)
            }
            None => self.store.retrieve(query, self.settings.top_k),
        };

        if let Some(category) = ctx.detected_category.clone() {
            match self.financial.category_context(user_id, &category).await {
                Ok(block) => ctx.append_to_summary(&block),
                Err(e) => warn!(category = %category, error = %e, "Category context omitted"),
            }
        }

        debug!(context = %ctx.summary(), "RAG context built");
        ctx
    }

    /// Knowledge documents only, without any financial data.
    pub async fn retrieve_knowledge(&self, query: &str, top_k: usize) -> Vec<ScoredDocument> {
        self.ensure_ready().await;
        self.store.retrieve(query, top_k)
    }

    pub fn is_ready(&self) -> bool {
        self.store.is_ready()
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            initialized: self.store.is_ready(),
            documents: self.store.document_count(),
            categories: self.store.categories().len(),
            embedding_dimension: self.store.embedding_dimension(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{InMemoryLedger, Wallet};
    use crate::prompt::{build_system_prompt, build_user_prompt};
    use chrono::{TimeZone, Utc};
    use moneyrag_core::finance::{Category, Transaction, TransactionKind};
    use moneyrag_core::intent::QueryType;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    async fn ledger() -> InMemoryLedger {
        let ledger = InMemoryLedger::new();
        ledger
            .add_wallet(Wallet { id: 10, user_id: 1, name: "Cash".into(), balance: 2_000_000.0 })
            .await;
        ledger.add_category(Category { id: 1, name: "Ăn uống".into() }).await;
        ledger
            .add_transaction(Transaction {
                id: 1,
                user_id: 1,
                wallet_id: 10,
                category_id: Some(1),
                amount: 150_000.0,
                kind: TransactionKind::Expense,
                created_at_ms: Utc.with_ymd_and_hms(2025, 3, 3, 8, 0, 0).unwrap().timestamp_millis(),
                note: Some("Phở".into()),
            })
            .await;
        ledger
    }

    async fn service(source: CorpusSource) -> RagService {
        let financial = FinancialContextBuilder::new(Arc::new(ledger().await))
            .with_offset(utc())
            .with_reference_time(Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap());
        RagService::new(Arc::new(KnowledgeStore::new()), financial, source)
    }

    fn documents() -> Vec<KnowledgeDocument> {
        vec![
            KnowledgeDocument::new(
                "b1",
                "Budgeting 101",
                "budgeting",
                "Track your spending weekly",
                "",
                vec!["budget".into(), "track".into()],
            ),
            KnowledgeDocument::new(
                "f1",
                "Cook at home",
                "food",
                "Cooking is cheaper than eating out",
                "Nấu ăn rẻ hơn ăn ngoài",
                vec!["food".into(), "ăn uống".into()],
            ),
        ]
    }

    #[tokio::test]
    async fn lazily_initializes_on_first_query() {
        let svc = service(CorpusSource::Documents(documents())).await;
        assert!(!svc.is_ready());

        let ctx = svc.retrieve_context(1, 10, "how do I budget my spending", None).await;
        assert!(svc.is_ready());
        assert_eq!(ctx.documents[0].id(), "b1");
        assert!(ctx.documents.len() <= DEFAULT_TOP_K);
        assert!(ctx.query_type.is_none());
    }

    #[tokio::test]
    async fn intent_category_drives_retrieval_and_drill_down() {
        let svc = service(CorpusSource::Documents(documents())).await;
        let intent = QueryIntent::new(QueryType::Spending).with_category("Ăn uống");

        let ctx = svc
            .retrieve_context(1, 10, "Tôi tiêu bao nhiêu cho ăn uống?", Some(&intent))
            .await;
        assert_eq!(ctx.query_type.as_deref(), Some("SPENDING"));
        assert_eq!(ctx.detected_category.as_deref(), Some("Ăn uống"));
        assert!(ctx.documents.iter().all(|d| d.document.category == "food"));
        assert!(ctx.financial_summary.contains("📌 Chi tiêu Ăn uống tháng này: 150,000 VNĐ"));
        assert!(ctx.financial_summary.contains("03/03/2025"));
    }

    #[tokio::test]
    async fn blank_intent_category_uses_plain_retrieval() {
        let svc = service(CorpusSource::Documents(documents())).await;
        let intent = QueryIntent::new(QueryType::General).with_category("   ");

        let ctx = svc.retrieve_context(1, 10, "budget tracking", Some(&intent)).await;
        assert_eq!(ctx.query_type.as_deref(), Some("GENERAL"));
        assert!(ctx.detected_category.is_none());
        assert!(!ctx.financial_summary.contains("📌"));
    }

    #[tokio::test]
    async fn failed_initialization_degrades_to_no_documents() {
        let svc = service(CorpusSource::File("/nonexistent/kb.json".into())).await;
        let ctx = svc.retrieve_context(1, 10, "budget", None).await;
        assert!(!svc.is_ready());
        assert!(ctx.documents.is_empty());
        assert!(ctx.has_financial_data());

        let system = build_system_prompt(&ctx);
        assert!(!system.contains("[KIẾN THỨC TÀI CHÍNH]"));
        let user = build_user_prompt(&ctx, "budget");
        assert!(user.contains("[DỮ LIỆU TÀI CHÍNH]"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_ensure_ready_reports_actual_state() {
        let svc = Arc::new(service(CorpusSource::Builtin).await);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let svc = Arc::clone(&svc);
            handles.push(tokio::spawn(async move {
                let ready = svc.ensure_ready().await;
                // Only a caller that saw the published index may claim readiness
                (ready, svc.stats().documents)
            }));
        }

        let mut any_ready = false;
        for handle in handles {
            let (ready, documents) = handle.await.unwrap();
            if ready {
                any_ready = true;
                assert!(documents > 0);
            }
        }
        assert!(any_ready);
        assert!(svc.is_ready());
        assert!(svc.ensure_ready().await);
    }

    #[tokio::test]
    async fn builtin_corpus_and_stats() {
        let svc = service(CorpusSource::Builtin).await;
        assert!(!svc.stats().initialized);

        let docs = svc.retrieve_knowledge("emergency fund savings", 2).await;
        assert!(!docs.is_empty());
        assert!(docs.len() <= 2);

        let stats = svc.stats();
        assert!(stats.initialized);
        assert!(stats.documents >= 20);
        assert!(stats.categories >= 10);
        assert!(stats.to_string().starts_with("RagService: initialized=true"));
    }

    #[tokio::test]
    async fn settings_flow_into_context() {
        let svc = service(CorpusSource::Documents(documents()))
            .await
            .with_settings(RagSettings {
                top_k: 1,
                max_documents: 2,
                prefer_secondary: false,
            });
        let ctx = svc.retrieve_context(1, 10, "food budget", None).await;
        assert!(ctx.documents.len() <= 1);
        assert_eq!(ctx.max_documents, 2);
        assert!(!ctx.prefer_secondary);
    }

    #[test]
    fn configured_offset_prefers_config() {
        let mut config = AppConfig::default();
        config.rag.utc_offset_minutes = Some(420);
        assert_eq!(configured_offset(&config), FixedOffset::east_opt(7 * 3600).unwrap());

        config.rag.utc_offset_minutes = None;
        assert_eq!(configured_offset(&config), *Local::now().offset());
    }

    #[tokio::test]
    async fn from_config_uses_configured_language() {
        let mut config = AppConfig::default();
        config.rag.language = "en".into();
        config.rag.currency = "USD".into();
        config.rag.utc_offset_minutes = Some(0);

        let svc = RagService::from_config(&config, Arc::new(ledger().await));
        let ctx = svc.retrieve_context(1, 10, "How much did I spend?", None).await;
        assert_eq!(ctx.output_language, Language::English);
        assert!(ctx.financial_summary.contains("Current wallet balance: 2,000,000 USD"));
        assert!(svc.is_ready());
    }
}
