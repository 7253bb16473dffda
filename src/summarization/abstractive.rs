//! Hierarchical abstractive summarization.
//!
//! Long input is first narrowed to its most relevant sections, then chunked, summarized chunk by
//! chunk, and recombined. A combined summary that still exceeds its budget gets one more pass.

use super::{ModelHandle, SummarizeError};
use crate::processing::chunking::{CHARS_PER_TOKEN, chunk_text};
use crate::processing::normalize::truncate_at_word_boundary;
use crate::processing::relevance::RelevanceScorer;

/// Tunables for [`AbstractiveSummarizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbstractiveSettings {
    /// Inputs longer than this many characters go through the relevance filter first.
    pub prefilter_threshold_chars: usize,
    /// Sections kept by the relevance filter.
    pub prefilter_top_n: usize,
    /// Chunk size in tokens.
    pub chunk_max_tokens: usize,
    /// Chunks summarized per document; later chunks are dropped.
    pub max_chunks: usize,
}

impl Default for AbstractiveSettings {
    fn default() -> Self {
        Self {
            prefilter_threshold_chars: 10_000,
            prefilter_top_n: 5,
            chunk_max_tokens: 1024,
            max_chunks: 10,
        }
    }
}

/// Result of a successful abstractive run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbstractiveOutcome {
    /// Final summary text.
    pub summary: String,
    /// Chunks sent to the model.
    pub chunks_attempted: usize,
    /// Chunks whose model call failed and were skipped.
    pub chunks_failed: usize,
}

/// Chunk, summarize, and recombine with a caller-owned model.
pub struct AbstractiveSummarizer<'a> {
    model: &'a ModelHandle,
    scorer: &'a RelevanceScorer,
    settings: AbstractiveSettings,
}

impl<'a> AbstractiveSummarizer<'a> {
    /// Summarizer borrowing the shared model and relevance scorer.
    pub fn new(
        model: &'a ModelHandle,
        scorer: &'a RelevanceScorer,
        settings: AbstractiveSettings,
    ) -> Self {
        Self {
            model,
            scorer,
            settings,
        }
    }

    /// Summarize `text` within `max_tokens`, asking for at least `min_tokens`.
    ///
    /// Individual chunk failures are skipped and counted. The call fails only when the model is
    /// unavailable, the input is empty, or no chunk produced a summary; a failed second pass
    /// keeps the combined chunk summaries cut to the length budget.
    pub async fn summarize(
        &self,
        text: &str,
        max_tokens: usize,
        min_tokens: usize,
    ) -> Result<AbstractiveOutcome, SummarizeError> {
        if !self.model.is_available() {
            return Err(SummarizeError::ModelUnavailable);
        }
        if text.trim().is_empty() {
            return Err(SummarizeError::EmptyInput);
        }
        let max_tokens = max_tokens.max(1);

        let filtered;
        let input = if text.chars().count() > self.settings.prefilter_threshold_chars {
            filtered = self.scorer.extract_interesting_sections(
                text,
                self.settings.prefilter_top_n,
                self.settings.chunk_max_tokens,
            );
            tracing::debug!(
                original_chars = text.len(),
                filtered_chars = filtered.len(),
                "Pre-filtered long document"
            );
            filtered.as_str()
        } else {
            text
        };

        let chunks = chunk_text(input, self.settings.chunk_max_tokens)?;
        if chunks.is_empty() {
            return Err(SummarizeError::EmptyInput);
        }
        if chunks.len() > self.settings.max_chunks {
            tracing::debug!(
                total = chunks.len(),
                kept = self.settings.max_chunks,
                "Dropping trailing chunks"
            );
        }
        let selected: Vec<_> = chunks.into_iter().take(self.settings.max_chunks).collect();
        let attempted = selected.len();

        let per_chunk_max = (max_tokens / attempted).max(1);
        let per_chunk_min = min_tokens.min(per_chunk_max.saturating_sub(10));

        let mut summaries = Vec::with_capacity(attempted);
        let mut failed = 0usize;
        for chunk in &selected {
            match self
                .model
                .summarize(&chunk.text, per_chunk_max, per_chunk_min)
                .await
            {
                Ok(summary) if !summary.trim().is_empty() => {
                    summaries.push(summary.trim().to_string());
                }
                Ok(_) => {
                    tracing::warn!(ordinal = chunk.ordinal, "Model returned an empty chunk summary");
                    failed += 1;
                }
                Err(error) => {
                    tracing::warn!(ordinal = chunk.ordinal, error = %error, "Chunk summary failed");
                    failed += 1;
                }
            }
        }

        if summaries.is_empty() {
            return Err(SummarizeError::NoChunkSucceeded { attempted });
        }

        let combined = summaries.join(" ");
        let budget_chars = max_tokens.saturating_mul(CHARS_PER_TOKEN);
        let summary = if combined.chars().count() > budget_chars {
            match self.model.summarize(&combined, max_tokens, min_tokens).await {
                Ok(condensed) if !condensed.trim().is_empty() => condensed.trim().to_string(),
                Ok(_) => truncate_at_word_boundary(&combined, budget_chars),
                Err(error) => {
                    tracing::warn!(error = %error, "Second summary pass failed; truncating");
                    truncate_at_word_boundary(&combined, budget_chars)
                }
            }
        } else {
            combined
        };

        tracing::info!(
            chunks = attempted,
            failed,
            summary_chars = summary.len(),
            "Abstractive summary complete"
        );
        Ok(AbstractiveOutcome {
            summary,
            chunks_attempted: attempted,
            chunks_failed: failed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarization::{ModelError, ModelRequest, SummarizationModel};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Returns the first word of each request, failing on requests containing `fail_on`.
    struct ScriptedModel {
        fail_on: Option<&'static str>,
        requests: Mutex<Vec<ModelRequest>>,
    }

    impl ScriptedModel {
        fn new(fail_on: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                fail_on,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SummarizationModel for ScriptedModel {
        async fn summarize(&self, request: ModelRequest) -> Result<String, ModelError> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(marker) = self.fail_on {
                if request.text.contains(marker) {
                    return Err(ModelError::GenerationFailed("scripted".into()));
                }
            }
            Ok(request
                .text
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string())
        }
    }

    fn settings(chunk_max_tokens: usize) -> AbstractiveSettings {
        AbstractiveSettings {
            chunk_max_tokens,
            ..AbstractiveSettings::default()
        }
    }

    const THREE_PARAGRAPHS: &str = "Housing vouchers expanded citywide.\n\n\
        Transit fares frozen for seniors.\n\n\
        Zoning variance denied downtown.";

    #[tokio::test]
    async fn unavailable_model_is_reported() {
        let handle = ModelHandle::unavailable();
        let scorer = RelevanceScorer::default();
        let summarizer = AbstractiveSummarizer::new(&handle, &scorer, settings(10));
        assert!(matches!(
            summarizer.summarize(THREE_PARAGRAPHS, 100, 10).await,
            Err(SummarizeError::ModelUnavailable)
        ));
    }

    #[tokio::test]
    async fn chunk_summaries_are_joined_in_order() {
        let model = ScriptedModel::new(None);
        let handle = ModelHandle::new(model.clone());
        let scorer = RelevanceScorer::default();
        let summarizer = AbstractiveSummarizer::new(&handle, &scorer, settings(10));

        let outcome = summarizer
            .summarize(THREE_PARAGRAPHS, 90, 50)
            .await
            .expect("summary");
        assert_eq!(outcome.summary, "Housing Transit Zoning");
        assert_eq!(outcome.chunks_attempted, 3);
        assert_eq!(outcome.chunks_failed, 0);

        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|r| r.max_tokens == 30 && r.min_tokens == 20));
    }

    #[tokio::test]
    async fn failed_chunks_are_skipped_and_counted() {
        let model = ScriptedModel::new(Some("Transit"));
        let handle = ModelHandle::new(model);
        let scorer = RelevanceScorer::default();
        let summarizer = AbstractiveSummarizer::new(&handle, &scorer, settings(10));

        let outcome = summarizer
            .summarize(THREE_PARAGRAPHS, 90, 10)
            .await
            .expect("partial summary");
        assert_eq!(outcome.summary, "Housing Zoning");
        assert_eq!(outcome.chunks_failed, 1);
    }

    #[tokio::test]
    async fn all_chunks_failing_is_an_error() {
        let model = ScriptedModel::new(Some(" "));
        let handle = ModelHandle::new(model);
        let scorer = RelevanceScorer::default();
        let summarizer = AbstractiveSummarizer::new(&handle, &scorer, settings(10));

        assert!(matches!(
            summarizer.summarize(THREE_PARAGRAPHS, 90, 10).await,
            Err(SummarizeError::NoChunkSucceeded { attempted: 3 })
        ));
    }

    #[tokio::test]
    async fn oversized_combination_gets_a_second_pass() {
        let model = ScriptedModel::new(None);
        let handle = ModelHandle::new(model.clone());
        let scorer = RelevanceScorer::default();
        let summarizer = AbstractiveSummarizer::new(&handle, &scorer, settings(10));

        // Budget of one token is four characters; "Housing Transit Zoning" exceeds it.
        let outcome = summarizer
            .summarize(THREE_PARAGRAPHS, 1, 0)
            .await
            .expect("summary");
        assert_eq!(outcome.summary, "Housing");
        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[3].text, "Housing Transit Zoning");
    }

    #[tokio::test]
    async fn at_most_ten_chunks_are_summarized() {
        let model = ScriptedModel::new(None);
        let handle = ModelHandle::new(model.clone());
        let scorer = RelevanceScorer::default();
        let summarizer = AbstractiveSummarizer::new(&handle, &scorer, settings(5));

        let text = (0..12)
            .map(|index| format!("Item {index} discussed today."))
            .collect::<Vec<_>>()
            .join("\n\n");
        let outcome = summarizer.summarize(&text, 1000, 10).await.expect("summary");

        assert_eq!(outcome.chunks_attempted, 10);
        let requests = model.requests.lock().unwrap();
        assert_eq!(requests.len(), 10);
        assert_eq!(requests[9].text, "Item 9 discussed today.");
    }

    #[tokio::test]
    async fn long_input_is_narrowed_to_top_sections_in_score_order() {
        let model = ScriptedModel::new(None);
        let handle = ModelHandle::new(model.clone());
        let scorer = RelevanceScorer::default();
        let summarizer = AbstractiveSummarizer::new(&handle, &scorer, settings(100));

        let filler = "Residents discussed routine matters at length. ".repeat(13);
        let text = (0..20)
            .map(|index| {
                if index == 15 {
                    format!("Moneyitem council approved $3 million. {filler}")
                } else {
                    format!("Paragraph {index}. {filler}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        assert!(text.chars().count() > 10_000);

        let outcome = summarizer.summarize(&text, 1000, 10).await.expect("summary");

        assert_eq!(outcome.chunks_attempted, 5);
        let requests = model.requests.lock().unwrap();
        let openings: Vec<&str> = requests
            .iter()
            .map(|request| request.text.split('.').next().unwrap_or_default())
            .collect();
        assert_eq!(
            openings,
            vec![
                "Moneyitem council approved $3 million",
                "Paragraph 0",
                "Paragraph 1",
                "Paragraph 2",
                "Paragraph 3"
            ]
        );
    }

    #[tokio::test]
    async fn empty_input_is_rejected() {
        let handle = ModelHandle::new(ScriptedModel::new(None));
        let scorer = RelevanceScorer::default();
        let summarizer = AbstractiveSummarizer::new(&handle, &scorer, settings(10));
        assert!(matches!(
            summarizer.summarize("  \n ", 100, 10).await,
            Err(SummarizeError::EmptyInput)
        ));
    }
}
