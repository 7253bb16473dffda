//! Core data types and error definitions for the content reduction pipeline.

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors produced while splitting normalized text into chunks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkingError {
    /// Caller configured an impossible size budget.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

/// Bounded-size, ordered slice of a normalized document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk body; a whitespace-trimmed run of whole sections or paragraphs.
    pub text: String,
    /// Zero-based position in the source document.
    pub ordinal: usize,
}

/// A chunk paired with its relevance heuristic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredChunk {
    /// The scored chunk.
    pub chunk: Chunk,
    /// Additive keyword score; higher means more informative. May be negative.
    pub score: i32,
}

/// Terminal output of one pipeline invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryResult {
    /// Concatenated normalized text from every source that produced content.
    pub full_text: String,
    /// Summary text; never longer than `full_text`.
    pub summary: String,
    /// Up to ten unique key phrases, most frequent first.
    pub key_phrases: Vec<String>,
}

impl SummaryResult {
    /// Result returned when no source produced text.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the pipeline found any text at all.
    pub fn is_empty(&self) -> bool {
        self.full_text.is_empty()
    }

    /// Hex-encoded SHA-256 of `full_text`, used by persistence layers to deduplicate documents.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.full_text.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_is_stable_and_content_sensitive() {
        let first = SummaryResult {
            full_text: "Budget hearing".into(),
            ..SummaryResult::default()
        };
        let second = SummaryResult {
            full_text: "Budget hearing".into(),
            summary: "different summary".into(),
            key_phrases: vec!["budget".into()],
        };
        assert_eq!(first.content_hash(), second.content_hash());
        assert_eq!(first.content_hash().len(), 64);
        assert_ne!(first.content_hash(), SummaryResult::empty().content_hash());
    }

    #[test]
    fn empty_result_has_no_content() {
        let result = SummaryResult::empty();
        assert!(result.is_empty());
        assert!(result.summary.is_empty());
        assert!(result.key_phrases.is_empty());
    }
}
