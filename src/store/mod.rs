//! Persistence for the book library, generated scripts, and user settings.
//!
//! The relational side is split into three traits so callers only depend on
//! what they touch. [`SqliteStore`] implements all of them for real use and
//! [`MemoryStore`] for tests. Uploaded files live in a [`BlobStore`].

mod blob;
mod memory;
mod sqlite;

pub use blob::{BlobStore, LocalBlobStore, MemoryBlobStore};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::chunking::TextChunk;
use crate::error::{Result, RoteiroError};
use crate::llm::LlmProvider;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Processing status of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Uploading,
    Processing,
    Ready,
    Error,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Uploading => "uploading",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Ready => "ready",
            DocumentStatus::Error => "error",
        }
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = RoteiroError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "uploading" => Ok(DocumentStatus::Uploading),
            "processing" => Ok(DocumentStatus::Processing),
            "ready" => Ok(DocumentStatus::Ready),
            "error" => Ok(DocumentStatus::Error),
            other => Err(RoteiroError::InvalidInput(format!("Unknown document status: {}", other))),
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub author: Option<String>,
    /// Object path inside the bucket.
    pub file_path: String,
    /// Declared file type (extension).
    pub file_type: String,
    pub file_size: u64,
    pub status: DocumentStatus,
    /// Id of the user who uploaded the document.
    pub uploaded_by: String,
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Create a new document record in the `uploading` state.
    pub fn new(
        title: String,
        author: Option<String>,
        file_path: String,
        file_type: String,
        file_size: u64,
        uploaded_by: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            author,
            file_path,
            file_type,
            file_size,
            status: DocumentStatus::Uploading,
            uploaded_by,
            created_at: Utc::now(),
        }
    }
}

/// Document with chunk statistics, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    #[serde(flatten)]
    pub document: Document,
    pub chunk_count: usize,
    pub embedded_chunks: usize,
}

/// A persisted chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChunk {
    pub id: Uuid,
    pub document_id: Uuid,
    pub chunk_index: usize,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl StoredChunk {
    pub fn from_text_chunk(document_id: Uuid, chunk: &TextChunk) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id,
            chunk_index: chunk.index,
            content: chunk.content.clone(),
            embedding: chunk.embedding.clone(),
        }
    }
}

/// A chunk returned by the similarity oracle.
#[derive(Debug, Clone)]
pub struct ChunkMatch {
    pub chunk: StoredChunk,
    /// Cosine similarity with the query (higher is better).
    pub similarity: f32,
}

/// Lifecycle status of a generated script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptStatus {
    Draft,
    Approved,
    Final,
}

impl ScriptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptStatus::Draft => "draft",
            ScriptStatus::Approved => "approved",
            ScriptStatus::Final => "final",
        }
    }
}

impl std::str::FromStr for ScriptStatus {
    type Err = RoteiroError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ScriptStatus::Draft),
            "approved" => Ok(ScriptStatus::Approved),
            "final" => Ok(ScriptStatus::Final),
            other => Err(RoteiroError::InvalidInput(format!("Unknown script status: {}", other))),
        }
    }
}

impl std::fmt::Display for ScriptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated YouTube script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub theme: String,
    pub duration_minutes: u32,
    pub language_style: String,
    pub environment: String,
    pub environment_description: Option<String>,
    pub target_language: String,
    /// Generated script body, always Brazilian Portuguese.
    pub content_portuguese: String,
    /// Translated body, set once the script is finalized.
    pub content_final: Option<String>,
    pub seo_title: String,
    pub seo_description: String,
    pub seo_tags: Vec<String>,
    pub thumbnail_prompt: String,
    pub status: ScriptStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-user LLM configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    pub user_id: String,
    pub llm_provider: LlmProvider,
    pub llm_model: String,
    pub openai_api_key: Option<String>,
    pub claude_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
}

impl UserSettings {
    /// Settings used for a user who never saved any.
    pub fn default_for(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            llm_provider: LlmProvider::OpenAI,
            llm_model: "gpt-4o-mini".to_string(),
            openai_api_key: None,
            claude_api_key: None,
            gemini_api_key: None,
        }
    }

    /// API key for `provider`, ignoring blank values.
    pub fn api_key_for(&self, provider: LlmProvider) -> Option<&str> {
        let key = match provider {
            LlmProvider::OpenAI => self.openai_api_key.as_deref(),
            LlmProvider::Claude => self.claude_api_key.as_deref(),
            LlmProvider::Gemini => self.gemini_api_key.as_deref(),
        };
        key.map(str::trim).filter(|k| !k.is_empty())
    }

    /// Key used for embeddings, which are always generated with OpenAI.
    pub fn embedding_api_key(&self) -> Option<&str> {
        self.api_key_for(LlmProvider::OpenAI)
    }

    /// Store `key` for `provider`; a blank key clears it.
    pub fn set_api_key(&mut self, provider: LlmProvider, key: Option<String>) {
        let key = key.filter(|k| !k.trim().is_empty());
        match provider {
            LlmProvider::OpenAI => self.openai_api_key = key,
            LlmProvider::Claude => self.claude_api_key = key,
            LlmProvider::Gemini => self.gemini_api_key = key,
        }
    }
}

/// Documents, their chunks, and the similarity oracle over chunk embeddings.
#[async_trait]
pub trait LibraryStore: Send + Sync {
    async fn insert_document(&self, doc: &Document) -> Result<()>;

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>>;

    /// All documents, newest first, with chunk counts.
    async fn list_documents(&self) -> Result<Vec<DocumentSummary>>;

    async fn update_document_status(&self, id: Uuid, status: DocumentStatus) -> Result<()>;

    /// Delete the document record. Returns whether a row was removed.
    async fn delete_document(&self, id: Uuid) -> Result<bool>;

    /// Documents in `status` created before `created_before`.
    async fn find_documents_by_status(
        &self,
        status: DocumentStatus,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Document>>;

    /// Atomically replace every chunk of a document with `chunks`.
    async fn replace_chunks(&self, document_id: Uuid, chunks: &[TextChunk]) -> Result<usize>;

    async fn delete_chunks(&self, document_id: Uuid) -> Result<usize>;

    /// Chunks of a document ordered by index.
    async fn get_chunks(&self, document_id: Uuid) -> Result<Vec<StoredChunk>>;

    /// Up to `limit` embedded chunks with similarity above `threshold`, best first.
    async fn match_chunks(
        &self,
        query_embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<ChunkMatch>>;
}

/// Generated scripts.
#[async_trait]
pub trait ScriptStore: Send + Sync {
    async fn insert_script(&self, script: &Script) -> Result<()>;

    async fn get_script(&self, id: Uuid) -> Result<Option<Script>>;

    /// Overwrite an existing script. Fails with `NotFound` if it is missing.
    async fn update_script(&self, script: &Script) -> Result<()>;

    /// Scripts owned by `user_id`, newest first.
    async fn list_scripts(&self, user_id: &str) -> Result<Vec<Script>>;
}

/// Per-user settings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_user_settings(&self, user_id: &str) -> Result<Option<UserSettings>>;

    async fn save_user_settings(&self, settings: &UserSettings) -> Result<()>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Rank embedded chunks against a query; shared by the store implementations.
pub(crate) fn rank_matches(
    chunks: impl IntoIterator<Item = StoredChunk>,
    query_embedding: &[f32],
    threshold: f32,
    limit: usize,
) -> Vec<ChunkMatch> {
    let mut matches: Vec<ChunkMatch> = chunks
        .into_iter()
        .filter_map(|chunk| {
            let similarity = cosine_similarity(query_embedding, chunk.embedding.as_deref()?);
            (similarity > threshold).then_some(ChunkMatch { chunk, similarity })
        })
        .collect();

    matches.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    matches.truncate(limit);
    matches
}

/// Fixed-width UTC timestamp so stored values sort lexicographically.
pub(crate) fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);

        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_rank_matches_skips_unembedded_and_applies_threshold() {
        let doc = Uuid::new_v4();
        let chunk = |i: usize, embedding: Option<Vec<f32>>| StoredChunk {
            id: Uuid::new_v4(),
            document_id: doc,
            chunk_index: i,
            content: format!("chunk {}", i),
            embedding,
        };

        let matches = rank_matches(
            vec![
                chunk(0, Some(vec![0.9, 0.1])),
                chunk(1, None),
                chunk(2, Some(vec![0.0, 1.0])),
                chunk(3, Some(vec![1.0, 0.0])),
            ],
            &[1.0, 0.0],
            0.7,
            5,
        );

        let order: Vec<usize> = matches.iter().map(|m| m.chunk.chunk_index).collect();
        assert_eq!(order, vec![3, 0]);
    }

    #[test]
    fn test_timestamps_sort_lexicographically() {
        let earlier = Utc::now();
        let later = earlier + chrono::Duration::milliseconds(1);
        assert!(format_timestamp(&earlier) < format_timestamp(&later));
        let parsed = parse_timestamp(&format_timestamp(&earlier));
        assert_eq!(parsed.timestamp_micros(), earlier.timestamp_micros());
    }

    #[test]
    fn test_user_settings_keys() {
        let mut settings = UserSettings::default_for("u1");
        assert!(settings.embedding_api_key().is_none());

        settings.set_api_key(LlmProvider::OpenAI, Some("  sk-123 ".to_string()));
        settings.set_api_key(LlmProvider::Claude, Some("   ".to_string()));

        assert_eq!(settings.api_key_for(LlmProvider::OpenAI), Some("sk-123"));
        assert_eq!(settings.api_key_for(LlmProvider::Claude), None);
    }
}
