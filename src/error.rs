//! Error types for Roteiro.

use thiserror::Error;

/// Library-level error type for Roteiro operations.
#[derive(Error, Debug)]
pub enum RoteiroError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported file type: {0}. Only PDF, DOC, DOCX, and TXT are supported.")]
    UnsupportedFormat(String),

    #[error("Text extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("{0} API key not configured")]
    MissingCredential(String),

    #[error("{provider} API error ({status}): {message}")]
    Provider {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("No content received from {0}")]
    EmptyResponse(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
}

impl From<reqwest::Error> for RoteiroError {
    /// Request URLs can carry credentials, so they are dropped.
    fn from(err: reqwest::Error) -> Self {
        RoteiroError::Http(err.without_url())
    }
}

impl From<rusqlite::Error> for RoteiroError {
    fn from(err: rusqlite::Error) -> Self {
        RoteiroError::Persistence(err.to_string())
    }
}

/// Result type alias for Roteiro operations.
pub type Result<T> = std::result::Result<T, RoteiroError>;
