//! Retrieval over the book library.
//!
//! Embeds a query with the requesting user's key and asks the store's
//! similarity oracle for the closest chunks.

pub mod context;

pub use context::{format_context_for_display, format_context_for_prompt, ContextBuilder};

use serde::Serialize;
use uuid::Uuid;

/// A chunk retrieved for a query, enriched with its document's metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub document_id: Uuid,
    pub document_title: String,
    pub document_author: Option<String>,
    pub chunk_index: usize,
    pub content: String,
    /// Cosine similarity with the query.
    pub similarity: f32,
}
