//! Wiring of the concrete stores and clients from settings.

use crate::chunking::ChunkingConfig;
use crate::config::{Prompts, Settings};
use crate::embedding::{EmbedderFactory, OpenAIEmbedderFactory};
use crate::error::Result;
use crate::llm::LlmClient;
use crate::orchestrator::Orchestrator;
use crate::rag::ContextBuilder;
use crate::script::ScriptService;
use crate::store::{LocalBlobStore, SqliteStore};
use std::sync::Arc;
use tracing::debug;

/// Fully wired services backed by SQLite and the local bucket.
pub struct App {
    pub settings: Settings,
    pub store: Arc<SqliteStore>,
    pub orchestrator: Arc<Orchestrator>,
    pub context: Arc<ContextBuilder>,
    pub scripts: Arc<ScriptService>,
}

impl App {
    /// Open the configured database and bucket and build every service.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let store = Arc::new(SqliteStore::new(&settings.sqlite_path())?);
        let blobs = Arc::new(LocalBlobStore::new(settings.bucket_dir()));
        let embedders: Arc<dyn EmbedderFactory> =
            Arc::new(OpenAIEmbedderFactory::new(settings.embedding.clone()));

        let orchestrator = Orchestrator::with_components(
            store.clone(),
            store.clone(),
            blobs,
            embedders.clone(),
        )
        .with_chunking(ChunkingConfig::from(&settings.chunking))?
        .with_stale_after_secs(settings.processing.stale_after_secs);

        let context = Arc::new(
            ContextBuilder::new(store.clone(), store.clone(), embedders)
                .with_threshold(settings.search.match_threshold),
        );

        let llm = Arc::new(LlmClient::new(settings.llm.clone())?);
        let scripts = ScriptService::new(store.clone(), store.clone(), context.clone(), llm)
            .with_prompts(prompts)
            .with_context_chunks(settings.search.generation_context_chunks);

        debug!("Services ready (database {:?})", settings.sqlite_path());

        Ok(Self {
            settings,
            store,
            orchestrator: Arc::new(orchestrator),
            context,
            scripts: Arc::new(scripts),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_app_builds_from_settings() {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.storage.sqlite_path = dir.path().join("db.sqlite").display().to_string();
        settings.storage.bucket_dir = dir.path().join("books").display().to_string();

        let app = App::new(settings).unwrap();
        assert!(dir.path().join("db.sqlite").exists());
        assert_eq!(app.settings.search.generation_context_chunks, 3);
    }

    #[test]
    fn test_invalid_chunking_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::default();
        settings.storage.sqlite_path = dir.path().join("db.sqlite").display().to_string();
        settings.chunking.chunk_overlap = settings.chunking.chunk_size;

        assert!(App::new(settings).is_err());
    }
}
