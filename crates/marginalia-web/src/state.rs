//! Shared application state for the web server.

use std::sync::Arc;

use marginalia_common::Config;
use marginalia_ingestion::{Ingestor, UnstructuredClient};
use marginalia_llm::{backend::DEFAULT_CHAT_MODEL, LlmBackend, OpenAiBackend, StructuredGenerator};
use marginalia_qa::QaPipeline;
use marginalia_store::KnowledgeStore;

/// Shared state injected into every axum handler.
pub struct AppState {
    pub ingestor: Ingestor,
    pub qa: QaPipeline,
}

impl AppState {
    /// Wire the pipelines from validated configuration. One backend serves
    /// completions and embeddings; one store handle is shared by both
    /// pipelines (its tables are insert-only, so sharing is safe).
    pub async fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let backend: Arc<dyn LlmBackend> =
            Arc::new(OpenAiBackend::new(cfg.openai_api_key.clone(), DEFAULT_CHAT_MODEL));

        let store = Arc::new(
            KnowledgeStore::connect(&cfg.store_uri, cfg.store_api_key.as_deref(), backend.clone())
                .await?,
        );

        let ingestor = Ingestor::new(
            UnstructuredClient::new(cfg.unstructured_api_key.clone(), None),
            StructuredGenerator::new(backend.clone()),
            store.clone(),
        );
        let qa = QaPipeline::new(StructuredGenerator::new(backend), store);

        Ok(Self { ingestor, qa })
    }
}

pub type SharedState = Arc<AppState>;
