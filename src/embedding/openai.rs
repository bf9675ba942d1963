//! OpenAI embeddings implementation.

use super::{Embedder, EmbedderFactory};
use crate::config::EmbeddingSettings;
use crate::error::{Result, RoteiroError};
use crate::openai::create_client;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

/// OpenAI-based embedder bound to one API key.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbedder {
    /// Create an embedder for `api_key` with the configured model and endpoint.
    pub fn with_config(api_key: &str, settings: &EmbeddingSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(api_key, &settings.base_url)?,
            model: settings.model.clone(),
            dimensions: settings.dimensions as usize,
        })
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text), fields(chars = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::String(text.to_string()))
            .dimensions(self.dimensions as u32)
            .build()
            .map_err(|e| RoteiroError::Embedding(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| RoteiroError::Embedding(format!("OpenAI API error: {}", e)))?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or_else(|| RoteiroError::Embedding("Empty embedding response".to_string()))?;

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Builds [`OpenAIEmbedder`]s from per-user keys.
pub struct OpenAIEmbedderFactory {
    settings: EmbeddingSettings,
}

impl OpenAIEmbedderFactory {
    pub fn new(settings: EmbeddingSettings) -> Self {
        Self { settings }
    }
}

impl EmbedderFactory for OpenAIEmbedderFactory {
    fn for_api_key(&self, api_key: &str) -> Result<Arc<dyn Embedder>> {
        Ok(Arc::new(OpenAIEmbedder::with_config(api_key, &self.settings)?))
    }
}
