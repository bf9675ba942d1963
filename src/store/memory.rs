//! In-memory store implementation.
//!
//! Useful for testing. Write failures can be injected to exercise the
//! error paths of the processing pipeline.

use super::{
    rank_matches, ChunkMatch, Document, DocumentStatus, DocumentSummary, LibraryStore, Script,
    ScriptStore, SettingsStore, StoredChunk, UserSettings,
};
use crate::chunking::TextChunk;
use crate::error::{Result, RoteiroError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// In-memory store.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<Uuid, Document>>,
    chunks: RwLock<HashMap<Uuid, Vec<StoredChunk>>>,
    scripts: RwLock<HashMap<Uuid, Script>>,
    settings: RwLock<HashMap<String, UserSettings>>,
    fail_chunk_writes: AtomicBool,
    fail_document_deletes: AtomicBool,
    fail_matches: AtomicBool,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|e| RoteiroError::Persistence(format!("Failed to acquire lock: {}", e)))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|e| RoteiroError::Persistence(format!("Failed to acquire lock: {}", e)))
}

fn injected(flag: &AtomicBool, what: &str) -> Result<()> {
    if flag.load(Ordering::SeqCst) {
        return Err(RoteiroError::Persistence(format!("{} rejected", what)));
    }
    Ok(())
}

impl MemoryStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make chunk inserts and deletes fail.
    pub fn fail_chunk_writes(&self, fail: bool) {
        self.fail_chunk_writes.store(fail, Ordering::SeqCst);
    }

    /// Make document record deletion fail.
    pub fn fail_document_deletes(&self, fail: bool) {
        self.fail_document_deletes.store(fail, Ordering::SeqCst);
    }

    /// Make the similarity oracle fail.
    pub fn fail_matches(&self, fail: bool) {
        self.fail_matches.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl LibraryStore for MemoryStore {
    async fn insert_document(&self, doc: &Document) -> Result<()> {
        write(&self.documents)?.insert(doc.id, doc.clone());
        Ok(())
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        Ok(read(&self.documents)?.get(&id).cloned())
    }

    async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let docs = read(&self.documents)?;
        let chunks = read(&self.chunks)?;

        let mut result: Vec<DocumentSummary> = docs
            .values()
            .map(|doc| {
                let stored = chunks.get(&doc.id).map(Vec::as_slice).unwrap_or_default();
                DocumentSummary {
                    document: doc.clone(),
                    chunk_count: stored.len(),
                    embedded_chunks: stored.iter().filter(|c| c.embedding.is_some()).count(),
                }
            })
            .collect();

        result.sort_by(|a, b| b.document.created_at.cmp(&a.document.created_at));
        Ok(result)
    }

    async fn update_document_status(&self, id: Uuid, status: DocumentStatus) -> Result<()> {
        let mut docs = write(&self.documents)?;
        let doc = docs
            .get_mut(&id)
            .ok_or_else(|| RoteiroError::NotFound(format!("Document {}", id)))?;
        doc.status = status;
        Ok(())
    }

    async fn delete_document(&self, id: Uuid) -> Result<bool> {
        injected(&self.fail_document_deletes, "Document delete")?;
        Ok(write(&self.documents)?.remove(&id).is_some())
    }

    async fn find_documents_by_status(
        &self,
        status: DocumentStatus,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Document>> {
        let docs = read(&self.documents)?;
        let mut result: Vec<Document> = docs
            .values()
            .filter(|d| d.status == status && d.created_at < created_before)
            .cloned()
            .collect();
        result.sort_by_key(|d| d.created_at);
        Ok(result)
    }

    async fn replace_chunks(&self, document_id: Uuid, chunks: &[TextChunk]) -> Result<usize> {
        injected(&self.fail_chunk_writes, "Chunk insert")?;

        let stored = chunks
            .iter()
            .map(|c| StoredChunk::from_text_chunk(document_id, c))
            .collect();
        write(&self.chunks)?.insert(document_id, stored);
        Ok(chunks.len())
    }

    async fn delete_chunks(&self, document_id: Uuid) -> Result<usize> {
        injected(&self.fail_chunk_writes, "Chunk delete")?;
        Ok(write(&self.chunks)?
            .remove(&document_id)
            .map(|c| c.len())
            .unwrap_or(0))
    }

    async fn get_chunks(&self, document_id: Uuid) -> Result<Vec<StoredChunk>> {
        let mut chunks = read(&self.chunks)?
            .get(&document_id)
            .cloned()
            .unwrap_or_default();
        chunks.sort_by_key(|c| c.chunk_index);
        Ok(chunks)
    }

    async fn match_chunks(
        &self,
        query_embedding: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<ChunkMatch>> {
        injected(&self.fail_matches, "Similarity search")?;

        let chunks = read(&self.chunks)?;
        let all = chunks.values().flatten().cloned();
        Ok(rank_matches(all, query_embedding, threshold, limit))
    }
}

#[async_trait]
impl ScriptStore for MemoryStore {
    async fn insert_script(&self, script: &Script) -> Result<()> {
        write(&self.scripts)?.insert(script.id, script.clone());
        Ok(())
    }

    async fn get_script(&self, id: Uuid) -> Result<Option<Script>> {
        Ok(read(&self.scripts)?.get(&id).cloned())
    }

    async fn update_script(&self, script: &Script) -> Result<()> {
        let mut scripts = write(&self.scripts)?;
        match scripts.get_mut(&script.id) {
            Some(existing) => {
                *existing = script.clone();
                Ok(())
            }
            None => Err(RoteiroError::NotFound(format!("Script {}", script.id))),
        }
    }

    async fn list_scripts(&self, user_id: &str) -> Result<Vec<Script>> {
        let scripts = read(&self.scripts)?;
        let mut result: Vec<Script> = scripts
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get_user_settings(&self, user_id: &str) -> Result<Option<UserSettings>> {
        Ok(read(&self.settings)?.get(user_id).cloned())
    }

    async fn save_user_settings(&self, settings: &UserSettings) -> Result<()> {
        write(&self.settings)?.insert(settings.user_id.clone(), settings.clone());
        Ok(())
    }
}
