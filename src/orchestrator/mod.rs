//! Document processing pipeline.
//!
//! Coordinates a book from upload to searchable chunks:
//! download → extract → chunk → embed → store, tracking the document's
//! status along the way.

mod in_flight;
mod upload;

pub use in_flight::{InFlightGuard, InFlightRegistry};
pub use upload::{sanitize_file_name, storage_path};

use crate::chunking::{chunk_text, ChunkingConfig};
use crate::embedding::{embed_chunks, Embedder, EmbedderFactory};
use crate::error::{Result, RoteiroError};
use crate::extraction::{extract_text, FileType};
use crate::progress::ProgressReporter;
use crate::store::{BlobStore, Document, DocumentStatus, LibraryStore, SettingsStore};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Largest accepted upload (50 MiB).
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Default age after which a document stuck in `processing` is retried.
pub const DEFAULT_STALE_AFTER_SECS: u64 = 300;

/// Result of a processing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProcessOutcome {
    /// Another run for the same document is in progress; nothing was done.
    AlreadyRunning,
    /// The document is `ready`.
    Completed { chunks: usize, embedded: usize },
}

/// Summary of a stale-document sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub found: usize,
    pub completed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Result of deleting a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeleteOutcome {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Runs the processing pipeline over library documents.
pub struct Orchestrator {
    library: Arc<dyn LibraryStore>,
    settings: Arc<dyn SettingsStore>,
    blobs: Arc<dyn BlobStore>,
    embedders: Arc<dyn EmbedderFactory>,
    chunking: ChunkingConfig,
    stale_after: chrono::Duration,
    in_flight: InFlightRegistry,
}

impl Orchestrator {
    /// Create an orchestrator from its collaborators with default tuning.
    pub fn with_components(
        library: Arc<dyn LibraryStore>,
        settings: Arc<dyn SettingsStore>,
        blobs: Arc<dyn BlobStore>,
        embedders: Arc<dyn EmbedderFactory>,
    ) -> Self {
        Self {
            library,
            settings,
            blobs,
            embedders,
            chunking: ChunkingConfig::default(),
            stale_after: chrono::Duration::seconds(DEFAULT_STALE_AFTER_SECS as i64),
            in_flight: InFlightRegistry::new(),
        }
    }

    /// Set the chunking configuration.
    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Result<Self> {
        chunking.validate()?;
        self.chunking = chunking;
        Ok(self)
    }

    /// Set the staleness threshold for [`Self::process_stale_documents`].
    pub fn with_stale_after_secs(mut self, secs: u64) -> Self {
        self.stale_after = chrono::Duration::seconds(secs as i64);
        self
    }

    /// Get a reference to the library store.
    pub fn library(&self) -> Arc<dyn LibraryStore> {
        self.library.clone()
    }

    /// Whether a processing run for `id` is in progress.
    pub fn is_processing(&self, id: Uuid) -> bool {
        self.in_flight.contains(id)
    }

    /// Store an uploaded file and register it as an `uploading` document.
    #[instrument(skip(self, bytes), fields(file = %file_name, size = bytes.len()))]
    pub async fn upload_document(
        &self,
        user_id: &str,
        title: &str,
        author: Option<&str>,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<Document> {
        let title = title.trim();
        if title.is_empty() {
            return Err(RoteiroError::InvalidInput("Title must not be empty".to_string()));
        }
        let file_type = FileType::from_file_name(file_name)?;
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(RoteiroError::InvalidInput(format!(
                "File is too large ({} bytes, limit {} MB)",
                bytes.len(),
                MAX_UPLOAD_BYTES / (1024 * 1024)
            )));
        }

        let mut doc = Document::new(
            title.to_string(),
            author.map(str::trim).filter(|a| !a.is_empty()).map(str::to_string),
            String::new(),
            file_type.as_str().to_string(),
            bytes.len() as u64,
            user_id.to_string(),
        );
        doc.file_path = storage_path(file_name, doc.id, doc.created_at);
        self.blobs.put(&doc.file_path, bytes).await?;

        if let Err(e) = self.library.insert_document(&doc).await {
            if let Err(cleanup) = self.blobs.remove(&doc.file_path).await {
                warn!("Failed to remove orphaned upload {}: {}", doc.file_path, cleanup);
            }
            return Err(e);
        }

        info!("Uploaded document {} ({})", doc.id, doc.file_path);
        Ok(doc)
    }

    /// Process a document into stored chunks.
    ///
    /// Concurrent calls for the same document return
    /// [`ProcessOutcome::AlreadyRunning`] without touching anything. Any
    /// failure after the document is loaded leaves it in `error`.
    #[instrument(skip(self, progress))]
    pub async fn process_document(
        &self,
        id: Uuid,
        progress: &ProgressReporter,
    ) -> Result<ProcessOutcome> {
        let Some(_guard) = self.in_flight.try_acquire(id) else {
            info!("Document {} is already being processed, skipping", id);
            return Ok(ProcessOutcome::AlreadyRunning);
        };

        progress.report("Starting processing", 0);

        progress.report("Loading document", 5);
        let doc = self
            .library
            .get_document(id)
            .await?
            .ok_or_else(|| RoteiroError::NotFound(format!("Document {}", id)))?;

        match self.run_pipeline(&doc, progress).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!("Processing document {} failed: {}", id, e);
                if let Err(status_err) = self
                    .library
                    .update_document_status(id, DocumentStatus::Error)
                    .await
                {
                    warn!("Failed to mark document {} as errored: {}", id, status_err);
                }
                progress.report("Processing failed", 0);
                Err(e)
            }
        }
    }

    async fn run_pipeline(&self, doc: &Document, progress: &ProgressReporter) -> Result<ProcessOutcome> {
        self.library
            .update_document_status(doc.id, DocumentStatus::Processing)
            .await?;
        progress.report("Status updated", 10);

        let bytes = self.blobs.get(&doc.file_path).await?;
        progress.report("File downloaded", 15);

        let text = extract_text(&bytes, &doc.file_type)?;
        info!("Extracted {} characters from {}", text.chars().count(), doc.title);
        progress.report("Text extracted", 25);

        let chunks = chunk_text(&text, &self.chunking);
        info!("Created {} chunks", chunks.len());
        progress.report(&format!("Created {} chunks", chunks.len()), 35);

        progress.report("Generating embeddings", 50);
        let embedder = self.embedder_for(&doc.uploaded_by).await;
        let chunks = embed_chunks(chunks, embedder.as_deref(), progress).await;
        let embedded = chunks.iter().filter(|c| c.is_embedded()).count();

        progress.report("Saving chunks", 90);
        let stored = self.library.replace_chunks(doc.id, &chunks).await?;

        progress.report("Finalizing", 95);
        self.library
            .update_document_status(doc.id, DocumentStatus::Ready)
            .await?;

        progress.report("Processing complete", 100);
        info!(
            "Document {} ready: {} chunks, {} with embeddings",
            doc.id, stored, embedded
        );

        Ok(ProcessOutcome::Completed {
            chunks: stored,
            embedded,
        })
    }

    /// Embedder for the owner's OpenAI key, if one is configured.
    async fn embedder_for(&self, user_id: &str) -> Option<Arc<dyn Embedder>> {
        let settings = match self.settings.get_user_settings(user_id).await {
            Ok(settings) => settings?,
            Err(e) => {
                warn!("Failed to load settings for {}: {}", user_id, e);
                return None;
            }
        };
        let key = settings.embedding_api_key()?;

        match self.embedders.for_api_key(key) {
            Ok(embedder) => Some(embedder),
            Err(e) => {
                warn!("Failed to create embedder: {}", e);
                None
            }
        }
    }

    /// Re-run processing for documents stuck in `processing`.
    #[instrument(skip(self))]
    pub async fn process_stale_documents(&self) -> SweepReport {
        let cutoff = Utc::now() - self.stale_after;
        let stale = match self
            .library
            .find_documents_by_status(DocumentStatus::Processing, cutoff)
            .await
        {
            Ok(stale) => stale,
            Err(e) => {
                error!("Failed to look up stale documents: {}", e);
                return SweepReport::default();
            }
        };

        let mut report = SweepReport {
            found: stale.len(),
            ..SweepReport::default()
        };
        if !stale.is_empty() {
            info!("Found {} stale documents", stale.len());
        }

        for doc in stale {
            match self.process_document(doc.id, &ProgressReporter::silent()).await {
                Ok(ProcessOutcome::Completed { .. }) => report.completed += 1,
                Ok(ProcessOutcome::AlreadyRunning) => report.skipped += 1,
                Err(e) => {
                    warn!("Reprocessing {} failed: {}", doc.id, e);
                    report.failed += 1;
                }
            }
        }

        debug!(?report, "Stale sweep finished");
        report
    }

    /// Delete a document: chunks, then the record, then the stored file.
    #[instrument(skip(self))]
    pub async fn delete_document(&self, id: Uuid) -> DeleteOutcome {
        let doc = match self.library.get_document(id).await {
            Ok(Some(doc)) => doc,
            Ok(None) => return DeleteOutcome::failed(format!("Document {} not found", id)),
            Err(e) => return DeleteOutcome::failed(format!("Failed to load document: {}", e)),
        };

        match self.library.delete_chunks(id).await {
            Ok(count) => debug!("Deleted {} chunks", count),
            Err(e) => warn!("Failed to delete chunks for {}: {}", id, e),
        }

        if let Err(e) = self.library.delete_document(id).await {
            error!("Failed to delete document record {}: {}", id, e);
            return DeleteOutcome::failed(format!("Failed to delete document: {}", e));
        }

        if let Err(e) = self.blobs.remove(&doc.file_path).await {
            warn!("Document {} removed but its file was not: {}", id, e);
            return DeleteOutcome::failed(format!(
                "Database cleanup succeeded, but storage deletion failed: {}",
                e
            ));
        }

        info!("Deleted document {}", id);
        DeleteOutcome::ok()
    }
}
