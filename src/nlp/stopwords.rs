//! Stop-word vocabularies.
//!
//! The full English list backs the rule toolkit; the short list mirrors the handful of
//! function words the keyword fallback filters. Both are plain data so tests can inject their own.

use std::collections::HashSet;

use stop_words::{LANGUAGE, get};

const BASIC_STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "as", "is", "was", "are", "be", "been", "this", "that", "these", "those", "will",
    "would", "should", "could",
];

/// Case-insensitive set of words ignored by frequency statistics.
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    /// Full English stop-word list.
    pub fn english() -> Self {
        Self {
            words: get(LANGUAGE::English)
                .iter()
                .map(|word| word.to_lowercase())
                .collect(),
        }
    }

    /// Short list of English function words.
    pub fn basic() -> Self {
        Self::from_list(BASIC_STOP_WORDS)
    }

    /// Build a set from a custom list.
    pub fn from_list(words: &[&str]) -> Self {
        Self {
            words: words.iter().map(|word| word.to_lowercase()).collect(),
        }
    }

    /// Whether `word` is a stop word, ignoring case.
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    /// Number of words in the set.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
