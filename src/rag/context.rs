//! Similarity search for generation context.

use super::RetrievedChunk;
use crate::embedding::EmbedderFactory;
use crate::store::{LibraryStore, SettingsStore};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Default minimum cosine similarity for a chunk to count as relevant.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.7;

/// Retrieves library chunks relevant to a query.
pub struct ContextBuilder {
    library: Arc<dyn LibraryStore>,
    settings: Arc<dyn SettingsStore>,
    embedders: Arc<dyn EmbedderFactory>,
    threshold: f32,
}

impl ContextBuilder {
    /// Create a new context builder.
    pub fn new(
        library: Arc<dyn LibraryStore>,
        settings: Arc<dyn SettingsStore>,
        embedders: Arc<dyn EmbedderFactory>,
    ) -> Self {
        Self {
            library,
            settings,
            embedders,
            threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }

    /// Set the minimum similarity threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Find up to `limit` chunks similar to `query`, best first.
    ///
    /// Retrieval is best-effort: a missing key, an embedding failure or a
    /// store failure all yield an empty result.
    #[instrument(skip(self), fields(query_chars = query.len()))]
    pub async fn search(&self, query: &str, user_id: &str, limit: usize) -> Vec<RetrievedChunk> {
        if limit == 0 || query.trim().is_empty() {
            return Vec::new();
        }

        let api_key = match self.settings.get_user_settings(user_id).await {
            Ok(Some(settings)) => match settings.embedding_api_key() {
                Some(key) => key.to_string(),
                None => {
                    debug!("User {} has no OpenAI key, skipping retrieval", user_id);
                    return Vec::new();
                }
            },
            Ok(None) => {
                debug!("User {} has no settings, skipping retrieval", user_id);
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to load settings for {}: {}", user_id, e);
                return Vec::new();
            }
        };

        let embedding = match self.embedders.for_api_key(&api_key) {
            Ok(embedder) => embedder.embed(query).await,
            Err(e) => Err(e),
        };
        let embedding = match embedding {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Failed to embed search query: {}", e);
                return Vec::new();
            }
        };

        let matches = match self.library.match_chunks(&embedding, self.threshold, limit).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!("Similarity search failed: {}", e);
                return Vec::new();
            }
        };

        let mut titles: HashMap<Uuid, (String, Option<String>)> = HashMap::new();
        let mut results = Vec::with_capacity(matches.len());

        for m in matches {
            let document_id = m.chunk.document_id;
            if !titles.contains_key(&document_id) {
                let meta = match self.library.get_document(document_id).await {
                    Ok(Some(doc)) => (doc.title, doc.author),
                    Ok(None) => ("Unknown".to_string(), None),
                    Err(e) => {
                        warn!("Failed to load document {}: {}", document_id, e);
                        ("Unknown".to_string(), None)
                    }
                };
                titles.insert(document_id, meta);
            }
            let (title, author) = titles.get(&document_id).cloned().unwrap_or_default();

            results.push(RetrievedChunk {
                document_id,
                document_title: title,
                document_author: author,
                chunk_index: m.chunk.chunk_index,
                content: m.chunk.content,
                similarity: m.similarity,
            });
        }

        debug!("Retrieved {} chunks", results.len());
        results
    }
}

/// Format retrieved chunks for inclusion in a prompt.
pub fn format_context_for_prompt(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format retrieved chunks for display to the user.
pub fn format_context_for_display(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let author = chunk
                .document_author
                .as_ref()
                .map(|a| format!(" ({})", a))
                .unwrap_or_default();
            format!(
                "[{}] {}{} #{} (score: {:.2})\n{}",
                i + 1,
                chunk.document_title,
                author,
                chunk.chunk_index,
                chunk.similarity,
                chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
