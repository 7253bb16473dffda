//! Key phrase extraction for topic labels.
//!
//! With a toolkit, candidates are noun phrases plus named entities from the categories that make
//! good civic topics. Without one, frequent long words stand in. Either way the result is a
//! lowercase, deduplicated list ordered by descending frequency (first appearance breaks ties).

use indexmap::IndexMap;
use regex::Regex;
use std::sync::{Arc, LazyLock};

use super::{EntityKind, LanguageToolkit, StopWords};
use crate::processing::normalize::truncate_at_word_boundary;

/// Maximum words in a key phrase.
pub const MAX_PHRASE_WORDS: usize = 3;
/// Default cap on characters analysed per document.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 10_000;

const MIN_PHRASE_CHARS: usize = 4;
const TOPIC_ENTITY_KINDS: &[EntityKind] = &[
    EntityKind::Organization,
    EntityKind::Place,
    EntityKind::Person,
    EntityKind::Event,
    EntityKind::Law,
];

static LONG_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-z]{4,}\b").expect("valid keyword pattern"));

/// Extracts representative short phrases from a document.
#[derive(Clone)]
pub struct KeyPhraseExtractor {
    toolkit: Option<Arc<dyn LanguageToolkit>>,
    fallback_stop_words: StopWords,
    max_input_chars: usize,
}

impl KeyPhraseExtractor {
    /// Extractor that prefers `toolkit` when present.
    pub fn new(toolkit: Option<Arc<dyn LanguageToolkit>>) -> Self {
        Self {
            toolkit,
            fallback_stop_words: StopWords::basic(),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    /// Override the input character cap.
    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    /// Return up to `top_n` key phrases for `text`.
    pub fn extract(&self, text: &str, top_n: usize) -> Vec<String> {
        if text.trim().is_empty() || top_n == 0 {
            return Vec::new();
        }
        let capped = truncate_at_word_boundary(text, self.max_input_chars);

        if let Some(toolkit) = &self.toolkit {
            let phrases = self.extract_with_toolkit(toolkit.as_ref(), &capped, top_n);
            if !phrases.is_empty() {
                return phrases;
            }
            tracing::debug!("Toolkit produced no key phrases; using keyword fallback");
        }
        self.extract_keywords(&capped, top_n)
    }

    fn extract_with_toolkit(
        &self,
        toolkit: &dyn LanguageToolkit,
        text: &str,
        top_n: usize,
    ) -> Vec<String> {
        let entities = toolkit
            .entities(text)
            .into_iter()
            .filter(|entity| TOPIC_ENTITY_KINDS.contains(&entity.kind))
            .map(|entity| entity.text);
        let candidates = toolkit
            .noun_phrases(text)
            .into_iter()
            .chain(entities)
            .map(|phrase| phrase.trim().to_lowercase())
            .filter(|phrase| {
                phrase.chars().count() >= MIN_PHRASE_CHARS
                    && phrase.split_whitespace().count() <= MAX_PHRASE_WORDS
            });
        rank_by_frequency(candidates, top_n)
    }

    fn extract_keywords(&self, text: &str, top_n: usize) -> Vec<String> {
        let lowered = text.to_lowercase();
        let words = LONG_WORD
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|word| !self.fallback_stop_words.contains(word))
            .map(str::to_string);
        rank_by_frequency(words, top_n)
    }
}

fn rank_by_frequency(candidates: impl Iterator<Item = String>, top_n: usize) -> Vec<String> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for candidate in candidates {
        *counts.entry(candidate).or_insert(0) += 1;
    }
    // IndexMap keeps first-appearance order and the sort is stable, so ties stay in that order.
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|left, right| right.1.cmp(&left.1));
    ranked
        .into_iter()
        .take(top_n)
        .map(|(phrase, _)| phrase)
        .collect()
}
