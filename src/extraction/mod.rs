//! Plain-text extraction from uploaded book files.
//!
//! Plain text is passed through. PDF and Word files get a best-effort
//! cleanup of the raw bytes (decode, drop non-printable characters, collapse
//! whitespace) rather than real format parsing, so scanned or heavily
//! compressed files usually fail the minimum-length check.

use crate::error::{Result, RoteiroError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Extracted text shorter than this is treated as an empty or unreadable file.
pub const MIN_EXTRACTED_CHARS: usize = 50;

/// Declared type of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Txt,
    Doc,
    Docx,
}

impl FileType {
    /// Extension as stored on the document record.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Txt => "txt",
            FileType::Doc => "doc",
            FileType::Docx => "docx",
        }
    }

    /// Infer the type from a file name's extension.
    pub fn from_file_name(name: &str) -> Result<Self> {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or("unknown");
        ext.parse()
    }
}

impl std::str::FromStr for FileType {
    type Err = RoteiroError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(FileType::Pdf),
            "txt" => Ok(FileType::Txt),
            "doc" => Ok(FileType::Doc),
            "docx" => Ok(FileType::Docx),
            other => Err(RoteiroError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extract text from raw file bytes according to the declared file type.
pub fn extract_text(bytes: &[u8], declared_type: &str) -> Result<String> {
    let file_type: FileType = declared_type.parse()?;

    let text = match file_type {
        FileType::Txt => String::from_utf8_lossy(bytes).trim().to_string(),
        FileType::Pdf | FileType::Doc | FileType::Docx => clean_binary_text(bytes),
    };

    debug!("Extracted {} characters from {} file", text.chars().count(), file_type);

    if text.chars().count() < MIN_EXTRACTED_CHARS {
        let reason = match file_type {
            FileType::Pdf => {
                "PDF appears to be empty, corrupted, or contains only images. Please use a PDF with selectable text."
            }
            FileType::Doc | FileType::Docx => {
                "DOC/DOCX file appears to be empty or corrupted. Please try converting it to TXT format."
            }
            FileType::Txt => "Text file is empty or too short to be indexed.",
        };
        return Err(RoteiroError::ExtractionFailed(reason.to_string()));
    }

    Ok(text)
}

/// Keep printable ASCII and line breaks, then collapse whitespace.
fn clean_binary_text(bytes: &[u8]) -> String {
    let decoded = String::from_utf8_lossy(bytes);
    let printable: String = decoded
        .chars()
        .map(|c| match c {
            ' '..='~' | '\n' | '\r' => c,
            _ => ' ',
        })
        .collect();

    printable.split_whitespace().collect::<Vec<_>>().join(" ")
}
