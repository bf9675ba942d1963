//! Embedding generation for semantic search and retrieval.

mod openai;

pub use openai::{OpenAIEmbedder, OpenAIEmbedderFactory};

use crate::chunking::TextChunk;
use crate::error::Result;
use crate::progress::ProgressReporter;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}

/// Creates embedders bound to a user's API key.
pub trait EmbedderFactory: Send + Sync {
    fn for_api_key(&self, api_key: &str) -> Result<Arc<dyn Embedder>>;
}

/// Attach embeddings to chunks, one request at a time.
///
/// Without an embedder every chunk is returned unembedded. A failure for one
/// chunk is logged and that chunk passes through without an embedding.
/// Progress is reported after each chunk in the 50-85% range.
#[instrument(skip_all, fields(chunks = chunks.len()))]
pub async fn embed_chunks(
    chunks: Vec<TextChunk>,
    embedder: Option<&dyn Embedder>,
    progress: &ProgressReporter,
) -> Vec<TextChunk> {
    let Some(embedder) = embedder else {
        warn!("No embedding API key available, storing chunks without embeddings");
        return chunks;
    };

    let total = chunks.len();
    let mut embedded = Vec::with_capacity(total);
    let mut failures = 0usize;

    for (i, mut chunk) in chunks.into_iter().enumerate() {
        match embedder.embed(&chunk.content).await {
            Ok(vector) => chunk.embedding = Some(vector),
            Err(e) => {
                failures += 1;
                warn!("Failed to embed chunk {}: {}", chunk.index, e);
            }
        }
        embedded.push(chunk);

        progress.report_step(
            &format!("Generating embedding {}/{}", i + 1, total),
            i + 1,
            total,
            50,
            85,
        );
    }

    if failures > 0 {
        warn!("{} of {} chunks stored without embeddings", failures, total);
    } else {
        info!("Embedded {} chunks", total);
    }

    embedded
}
