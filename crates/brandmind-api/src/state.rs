//! Application state wiring all services together.
//!
//! Services are generic over the collaborator traits in `brandmind-core`;
//! AppState pins them to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use brandmind_core::brand::BrandVoiceService;
use brandmind_core::cache::CacheRegistry;
use brandmind_core::embedding::EmbeddingService;
use brandmind_core::event::LearningEventBus;
use brandmind_core::learning::FeedbackLearner;
use brandmind_core::retrieval::RetrievalEngine;
use brandmind_core::storage::ContentStore;
use brandmind_infra::config::{embedding_api_key, load_config, resolve_data_dir};
use brandmind_infra::crypto::hash::Sha256Fingerprinter;
use brandmind_infra::embedding::OpenAiEmbeddingModel;
use brandmind_infra::sqlite::feedback::SqliteFeedbackRepository;
use brandmind_infra::sqlite::pool::{DatabasePool, database_url};
use brandmind_infra::sqlite::preference::SqlitePreferenceRepository;
use brandmind_infra::sqlite::profile::SqliteBrandProfileRepository;
use brandmind_infra::vector::content::LanceContentRepository;
use brandmind_infra::vector::lance::LanceVectorStore;
use brandmind_types::config::BrandmindConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteContentStore = ContentStore<OpenAiEmbeddingModel, LanceContentRepository>;

pub type ConcreteRetrievalEngine = RetrievalEngine<OpenAiEmbeddingModel, LanceContentRepository>;

pub type ConcreteFeedbackLearner = FeedbackLearner<
    OpenAiEmbeddingModel,
    LanceContentRepository,
    SqliteFeedbackRepository,
    SqlitePreferenceRepository,
>;

pub type ConcreteBrandVoiceService = BrandVoiceService<
    OpenAiEmbeddingModel,
    LanceContentRepository,
    LanceContentRepository,
    SqliteBrandProfileRepository,
>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub content: Arc<ConcreteContentStore>,
    pub retrieval: Arc<ConcreteRetrievalEngine>,
    pub learner: Arc<ConcreteFeedbackLearner>,
    pub brand: Arc<ConcreteBrandVoiceService>,
    pub caches: CacheRegistry,
    pub events: LearningEventBus,
    pub config: BrandmindConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: load config, connect to DB, wire services.
    pub async fn init(config: BrandmindConfig) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let db_pool = DatabasePool::new(&database_url(&data_dir))
            .await
            .context("failed to open the brandmind database")?;

        let model = OpenAiEmbeddingModel::new(&config.embedding, embedding_api_key())
            .context("failed to configure the embedding client")?;

        let caches = CacheRegistry::new(&config.cache);
        let events = LearningEventBus::default();
        let vectors = LanceVectorStore::in_data_dir(&data_dir)
            .await
            .context("failed to open the vector store")?;
        let rows = LanceContentRepository::new(Arc::new(vectors), config.embedding.dimension);

        let embeddings = Arc::new(EmbeddingService::new(
            model,
            Sha256Fingerprinter::new(),
            caches.embeddings(),
        ));
        let content = Arc::new(ContentStore::new(
            Arc::clone(&embeddings),
            rows.clone(),
            &config.storage,
        ));
        let retrieval = Arc::new(RetrievalEngine::new(embeddings, rows, caches.queries()));
        let learner = Arc::new(FeedbackLearner::new(
            SqliteFeedbackRepository::new(db_pool.clone()),
            SqlitePreferenceRepository::new(db_pool.clone()),
            Arc::clone(&content),
            events.clone(),
        ));
        let brand = Arc::new(BrandVoiceService::new(
            SqliteBrandProfileRepository::new(db_pool.clone()),
            caches.profiles(),
            Arc::clone(&content),
            Arc::clone(&retrieval),
            events.clone(),
        ));

        tracing::debug!(data_dir = %data_dir.display(), model = %config.embedding.model, "application state ready");

        Ok(Self {
            content,
            retrieval,
            learner,
            brand,
            caches,
            events,
            config,
            data_dir,
        })
    }
}

/// Load config from the resolved data directory.
pub async fn load_app_config() -> BrandmindConfig {
    load_config(&resolve_data_dir()).await
}
