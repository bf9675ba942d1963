//! Roteiro - YouTube scripts grounded in a book library
//!
//! Books are uploaded into a library, split into overlapping chunks, and
//! embedded so that passages relevant to a video theme can be retrieved.
//! Scripts are generated in Portuguese from those passages by the user's
//! chosen LLM provider, then approved and translated.
//!
//! # Architecture
//!
//! - `config` - Configuration and prompt templates
//! - `extraction` - Text extraction from uploaded files
//! - `chunking` - Character-window chunking with overlap
//! - `embedding` - Embedding generation
//! - `store` - Documents, chunks, scripts, user settings, and stored files
//! - `rag` - Similarity search and context formatting
//! - `llm` - Chat completion across OpenAI, Claude, and Gemini
//! - `script` - Prompt building, output parsing, and the script lifecycle
//! - `orchestrator` - Upload, processing, sweep, and deletion of documents
//! - `app` - Wiring from settings
//!
//! # Example
//!
//! ```rust,no_run
//! use roteiro::app::App;
//! use roteiro::config::Settings;
//! use roteiro::progress::ProgressReporter;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::new(Settings::load()?)?;
//!
//!     let bytes = std::fs::read("pai-rico.txt")?;
//!     let doc = app
//!         .orchestrator
//!         .upload_document("local", "Pai Rico, Pai Pobre", None, "pai-rico.txt", &bytes)
//!         .await?;
//!     app.orchestrator
//!         .process_document(doc.id, &ProgressReporter::silent())
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extraction;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod progress;
pub mod rag;
pub mod script;
pub mod store;

#[cfg(test)]
mod testing;

pub use error::{Result, RoteiroError};
