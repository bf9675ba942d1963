//! Text chunking for embedding and retrieval.
//!
//! Splits extracted book text into overlapping fixed-size windows that prefer
//! to end on a sentence or line boundary.

use crate::config::ChunkingSettings;
use crate::error::{Result, RoteiroError};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A chunk of text from a document, before or after embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Position of this chunk in the document (0-based, contiguous).
    pub index: usize,
    /// Trimmed text content.
    pub content: String,
    /// Embedding vector, absent when generation was skipped or failed.
    pub embedding: Option<Vec<f32>>,
}

impl TextChunk {
    /// Create a new chunk without an embedding.
    pub fn new(index: usize, content: String) -> Self {
        Self {
            index,
            content,
            embedding: None,
        }
    }

    /// Whether an embedding is attached.
    pub fn is_embedded(&self) -> bool {
        self.embedding.is_some()
    }
}

/// Configuration for chunking, in characters.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    /// Nominal chunk length.
    pub chunk_size: usize,
    /// Characters shared with the previous chunk.
    pub overlap: usize,
}

impl ChunkingConfig {
    /// Reject configurations that could not make progress.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RoteiroError::InvalidInput(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(RoteiroError::InvalidInput(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

impl From<&ChunkingSettings> for ChunkingConfig {
    fn from(settings: &ChunkingSettings) -> Self {
        Self {
            chunk_size: settings.chunk_size,
            overlap: settings.chunk_overlap,
        }
    }
}

fn is_boundary(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '\n')
}

/// Compute the untrimmed character windows the text is cut into.
fn chunk_spans(chars: &[char], config: &ChunkingConfig) -> Vec<Range<usize>> {
    let len = chars.len();
    let half = config.chunk_size / 2;
    let mut spans = Vec::new();
    let mut start = 0;

    while start < len {
        let mut end = start + config.chunk_size;

        if end < len {
            // Only accept a boundary that keeps at least half the nominal length.
            let earliest = start + half + 1;
            if let Some(pos) = (earliest..=end).rev().find(|&i| is_boundary(chars[i])) {
                end = pos + 1;
            }
        } else {
            end = len;
        }

        spans.push(start..end);

        if end >= len {
            break;
        }
        start = end.saturating_sub(config.overlap).max(start + 1);
    }

    spans
}

/// Split text into overlapping chunks.
///
/// Chunks that are empty after trimming are dropped; the remaining chunks are
/// numbered contiguously from 0.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<TextChunk> {
    let chars: Vec<char> = text.chars().collect();

    chunk_spans(&chars, config)
        .into_iter()
        .filter_map(|span| {
            let content: String = chars[span].iter().collect();
            let trimmed = content.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .enumerate()
        .map(|(index, content)| TextChunk::new(index, content))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_text(sentences: usize) -> String {
        (0..sentences)
            .map(|i| format!("Frase numero {} sobre investimentos e disciplina financeira. ", i))
            .collect()
    }

    #[test]
    fn test_spans_cover_text_without_gaps() {
        let text = sample_text(80);
        let chars: Vec<char> = text.chars().collect();
        let config = ChunkingConfig::default();

        let spans = chunk_spans(&chars, &config);
        assert!(spans.len() > 1);
        assert_eq!(spans.first().unwrap().start, 0);
        assert_eq!(spans.last().unwrap().end, chars.len());

        for pair in spans.windows(2) {
            assert!(pair[1].start < pair[0].end, "gap between {:?} and {:?}", pair[0], pair[1]);
            assert!(pair[1].start > pair[0].start);
        }
        for span in &spans {
            assert!(span.len() <= config.chunk_size + 1);
        }
    }

    #[test]
    fn test_prefers_sentence_boundary() {
        let text = sample_text(80);
        let chunks = chunk_text(&text, &ChunkingConfig::default());

        // Every chunk but the last ends on a full stop.
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(chunk.content.ends_with('.'), "chunk ended with {:?}", chunk.content);
        }
    }

    #[test]
    fn test_hard_cut_when_no_boundary() {
        let text = "a".repeat(2500);
        let config = ChunkingConfig {
            chunk_size: 1000,
            overlap: 200,
        };

        let chunks = chunk_text(&text, &config);
        let lens: Vec<usize> = chunks.iter().map(|c| c.content.len()).collect();
        assert_eq!(lens, vec![1000, 1000, 900]);
    }

    #[test]
    fn test_boundary_too_early_is_ignored() {
        // Only boundary sits at 10% of the window.
        let mut text = "b".repeat(100);
        text.push('.');
        text.push_str(&"c".repeat(1500));

        let chunks = chunk_text(&text, &ChunkingConfig::default());
        assert_eq!(chunks[0].content.chars().count(), 1000);
    }

    #[test]
    fn test_ordinals_are_contiguous_after_dropping_blank_chunks() {
        let mut text = "x".repeat(30);
        text.push_str(&" ".repeat(60));
        text.push_str(&"y".repeat(30));
        let config = ChunkingConfig {
            chunk_size: 20,
            overlap: 5,
        };

        let chunks = chunk_text(&text, &config);
        assert!(chunks.iter().all(|c| !c.content.is_empty()));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
        // windows fully inside the whitespace run were dropped
        let spans = chunk_spans(&text.chars().collect::<Vec<_>>(), &config);
        assert!(spans.len() > chunks.len());
    }

    #[test]
    fn test_short_text_yields_single_chunk() {
        let chunks = chunk_text("  Um texto curto.  ", &ChunkingConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Um texto curto.");
        assert!(chunk_text("", &ChunkingConfig::default()).is_empty());
    }

    #[test]
    fn test_multibyte_text_is_not_split_inside_characters() {
        let text = "ção ".repeat(700);
        let chunks = chunk_text(&text, &ChunkingConfig::default());
        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|c| c.content.starts_with(['ç', 'ã', 'o'])));
    }

    #[test]
    fn test_overlap_is_shared_between_neighbours() {
        let text = "z".repeat(1800);
        let chunks = chunk_text(&text, &ChunkingConfig::default());
        assert_eq!(chunks.len(), 2);
        // second window starts 200 characters before the first one ended
        assert_eq!(chunks[1].content.len(), 1000);
    }

    #[test]
    fn test_validate_rejects_overlap_not_smaller_than_size() {
        let config = ChunkingConfig {
            chunk_size: 100,
            overlap: 100,
        };
        assert!(config.validate().is_err());
        assert!(ChunkingConfig { chunk_size: 0, overlap: 0 }.validate().is_err());
        assert!(ChunkingConfig::default().validate().is_ok());
    }
}
