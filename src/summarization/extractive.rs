//! Extractive summaries that select sentences verbatim.
//!
//! Tier 1 takes the leading sentences and needs nothing but punctuation. Tier 2 scores every
//! sentence by the normalized frequency of its content words and favours the opening lines,
//! where civic documents tend to state their purpose.

use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use super::ExtractiveError;
use crate::nlp::LanguageToolkit;
use crate::processing::normalize::truncate_at_word_boundary;

/// Default hard cap on weighted summary length.
pub const DEFAULT_MAX_SUMMARY_CHARS: usize = 2_000;
/// Default cap on characters analysed by the weighted tier.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 50_000;

const LEAD_SENTENCES: usize = 3;
const LEAD_BONUS: f64 = 1.5;

static SENTENCE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("valid sentence break pattern"));

/// Tier 1: the first `num_sentences` sentences joined with `". "` and closed with a period.
///
/// Splitting is purely on runs of `.`, `!`, and `?`, so decimals and abbreviations break early.
pub fn summarize_basic(text: &str, num_sentences: usize) -> String {
    let sentences: Vec<&str> = SENTENCE_BREAK
        .split(text)
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .take(num_sentences)
        .collect();
    if sentences.is_empty() {
        return String::new();
    }
    let mut summary = sentences.join(". ");
    summary.push('.');
    summary
}

/// Tier 2: frequency-weighted sentence selection.
#[derive(Clone)]
pub struct WeightedSummarizer {
    toolkit: Option<Arc<dyn LanguageToolkit>>,
    max_summary_chars: usize,
    max_input_chars: usize,
}

impl WeightedSummarizer {
    /// Summarizer using `toolkit` for sentences and stop words.
    pub fn new(toolkit: Option<Arc<dyn LanguageToolkit>>) -> Self {
        Self {
            toolkit,
            max_summary_chars: DEFAULT_MAX_SUMMARY_CHARS,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    /// Override the output character cap.
    pub fn with_max_summary_chars(mut self, max_summary_chars: usize) -> Self {
        self.max_summary_chars = max_summary_chars;
        self
    }

    /// Override the input character cap.
    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.max_input_chars = max_input_chars;
        self
    }

    /// Weighted summary, degrading to [`summarize_basic`] when weighting is impossible.
    pub fn summarize(&self, text: &str, num_sentences: usize) -> String {
        match self.summarize_weighted(text, num_sentences) {
            Ok(summary) => summary,
            Err(error) => {
                tracing::debug!(error = %error, "Weighted summary unavailable; using leading sentences");
                truncate_at_word_boundary(
                    &summarize_basic(text, num_sentences),
                    self.max_summary_chars,
                )
            }
        }
    }

    /// Select the `num_sentences` best sentences and restore document order.
    ///
    /// A sentence scores the mean normalized frequency of its content words; the first three
    /// sentences get a 1.5x bonus. Ties keep the earlier sentence.
    pub fn summarize_weighted(
        &self,
        text: &str,
        num_sentences: usize,
    ) -> Result<String, ExtractiveError> {
        let toolkit = self
            .toolkit
            .as_deref()
            .ok_or(ExtractiveError::ToolkitUnavailable)?;
        if text.trim().is_empty() || num_sentences == 0 {
            return Ok(String::new());
        }

        let capped = truncate_at_word_boundary(text, self.max_input_chars);
        let sentences = toolkit.sentences(&capped);
        if sentences.is_empty() {
            return Err(ExtractiveError::NoSentences);
        }

        let content_words: Vec<Vec<String>> = sentences
            .iter()
            .map(|sentence| {
                toolkit
                    .words(sentence)
                    .into_iter()
                    .filter(|word| !toolkit.is_stop_word(word))
                    .map(str::to_lowercase)
                    .collect()
            })
            .collect();

        let mut frequencies: HashMap<&str, f64> = HashMap::new();
        for word in content_words.iter().flatten() {
            *frequencies.entry(word.as_str()).or_insert(0.0) += 1.0;
        }
        let peak = frequencies.values().copied().fold(0.0_f64, f64::max);
        if peak == 0.0 {
            return Err(ExtractiveError::NothingScorable);
        }

        let mut scored: Vec<(usize, f64)> = content_words
            .iter()
            .enumerate()
            .map(|(index, words)| {
                let mut score = if words.is_empty() {
                    0.0
                } else {
                    let total: f64 = words
                        .iter()
                        .map(|word| frequencies.get(word.as_str()).copied().unwrap_or(0.0) / peak)
                        .sum();
                    total / words.len() as f64
                };
                if index < LEAD_SENTENCES {
                    score *= LEAD_BONUS;
                }
                (index, score)
            })
            .collect();

        scored.sort_by(|left, right| right.1.total_cmp(&left.1));
        let mut selected: Vec<usize> = scored
            .into_iter()
            .take(num_sentences)
            .map(|(index, _)| index)
            .collect();
        selected.sort_unstable();

        let summary = selected
            .into_iter()
            .map(|index| sentences[index])
            .collect::<Vec<_>>()
            .join(" ");
        Ok(truncate_at_word_boundary(&summary, self.max_summary_chars))
    }
}
