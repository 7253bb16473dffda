//! Orchestrator tying readers, summarizers, and extractors into one call.
//!
//! This is the only layer that turns component errors into degraded output. Every public
//! operation returns a plain value: fetch failures become empty text, model failures fall back
//! to the weighted extractive tier, and empty input short-circuits to an empty result.

use serde::Serialize;
use std::sync::Arc;

use crate::agenda::AgendaSynthesizer;
use crate::config::{Config, SummaryMethod};
use crate::extraction::{FetchError, PdfSource, SourceReader};
use crate::metrics::{MetricsSnapshot, PipelineMetrics};
use crate::nlp::topics::{GENERAL_TOPIC, detect_topics};
use crate::nlp::{KeyPhraseExtractor, LanguageToolkit, build_toolkit};
use crate::processing::normalize::{normalize_text, truncate_at_word_boundary};
use crate::processing::relevance::RelevanceScorer;
use crate::processing::types::SummaryResult;
use crate::summarization::{
    AbstractiveSettings, AbstractiveSummarizer, ModelHandle, WeightedSummarizer, summarize_basic,
};

/// Key phrases returned with every result.
pub const KEY_PHRASE_COUNT: usize = 10;
/// Topic labels kept for a meeting summary.
pub const MAX_MEETING_TOPICS: usize = 8;
/// Sentences requested from the weighted tier when the abstractive tier fails.
pub const ABSTRACTIVE_FALLBACK_SENTENCES: usize = 5;
/// Summary length used for meeting documents.
pub const MEETING_SUMMARY_LENGTH: usize = 6;

const DEFAULT_ABSTRACTIVE_TOKENS: usize = 500;
const MIN_ABSTRACTIVE_TOKENS: usize = 100;
const TOKENS_PER_REQUESTED_UNIT: usize = 30;
const MAX_ABSTRACTIVE_TOKENS: usize = 8_192;

/// Settings the pipeline reads instead of global configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Summarizer used when a request does not choose one.
    pub summary_method: SummaryMethod,
    /// Summary length used when a request does not set one.
    pub summary_length: usize,
    /// Hard character cap for extractive summaries.
    pub summary_max_chars: usize,
    /// Chunk size in tokens for relevance filtering and model input.
    pub chunk_max_tokens: usize,
    /// Chunks kept by the relevance pre-filter.
    pub relevance_top_n: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            summary_method: config.summary_method,
            summary_length: config.summary_length,
            summary_max_chars: config.summary_max_chars,
            chunk_max_tokens: config.chunk_max_tokens,
            relevance_top_n: config.relevance_top_n,
        }
    }
}

/// One document to summarize. Unset fields fall back to [`PipelineSettings`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryRequest {
    /// PDF to read.
    pub pdf: Option<PdfSource>,
    /// Web page to read.
    pub web_url: Option<String>,
    /// Sentence count for extractive tiers; token budget hint for the abstractive tier.
    pub summary_length: Option<usize>,
    /// Summarizer override.
    pub method: Option<SummaryMethod>,
}

/// Summary of one meeting's documents, with topic labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeetingSummary {
    /// Agenda narrative or generic summary.
    pub summary: String,
    /// Text of the document that produced the summary; empty when none did.
    pub full_text: String,
    /// Up to eight topic labels.
    pub topics: Vec<String>,
    /// Document that produced the summary.
    pub source: Option<String>,
}

/// Content reduction pipeline for civic documents.
pub struct DocumentPipeline {
    reader: SourceReader,
    model: Arc<ModelHandle>,
    scorer: RelevanceScorer,
    weighted: WeightedSummarizer,
    key_phrases: KeyPhraseExtractor,
    agenda: AgendaSynthesizer,
    settings: PipelineSettings,
    metrics: PipelineMetrics,
}

impl DocumentPipeline {
    /// Pipeline over an already loaded model handle and optional language toolkit.
    pub fn new(
        reader: SourceReader,
        model: Arc<ModelHandle>,
        toolkit: Option<Arc<dyn LanguageToolkit>>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            reader,
            model,
            scorer: RelevanceScorer::default(),
            weighted: WeightedSummarizer::new(toolkit.clone())
                .with_max_summary_chars(settings.summary_max_chars),
            key_phrases: KeyPhraseExtractor::new(toolkit),
            agenda: AgendaSynthesizer::default(),
            settings,
            metrics: PipelineMetrics::new(),
        }
    }

    /// Pipeline wired from configuration around a caller-owned model handle.
    pub fn from_config(config: &Config, model: Arc<ModelHandle>) -> Result<Self, FetchError> {
        let reader = SourceReader::from_config(config)?;
        Ok(Self::new(
            reader,
            model,
            build_toolkit(config.nlp_toolkit),
            PipelineSettings::from(config),
        ))
    }

    /// Replace the relevance scorer.
    pub fn with_scorer(mut self, scorer: RelevanceScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Replace the agenda synthesizer.
    pub fn with_agenda_synthesizer(mut self, agenda: AgendaSynthesizer) -> Self {
        self.agenda = agenda;
        self
    }

    /// Counters accumulated since construction.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Read every source in `request`, then summarize the combined text.
    pub async fn extract_and_summarize(&self, request: &SummaryRequest) -> SummaryResult {
        let mut parts = Vec::new();
        if let Some(pdf) = &request.pdf {
            parts.push(self.read_pdf(pdf).await);
        }
        if let Some(url) = &request.web_url {
            match self.reader.try_read_web_page(url).await {
                Ok(text) => parts.push(text),
                Err(error) => {
                    tracing::warn!(url = %url, error = %error, "Web source unavailable");
                    self.metrics.record_fetch_failure();
                }
            }
        }
        let combined = parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        self.summarize_text(
            &combined,
            request.summary_length.unwrap_or(self.settings.summary_length),
            request.method.unwrap_or(self.settings.summary_method),
        )
        .await
    }

    /// Summarize already extracted text with the chosen method.
    pub async fn summarize_text(
        &self,
        text: &str,
        summary_length: usize,
        method: SummaryMethod,
    ) -> SummaryResult {
        let full_text = normalize_text(text);
        if full_text.is_empty() {
            tracing::info!("No text to summarize");
            self.metrics.record_empty_input();
            return SummaryResult::empty();
        }

        let summary = match method {
            SummaryMethod::ExtractiveBasic => truncate_at_word_boundary(
                &summarize_basic(&full_text, summary_length),
                self.settings.summary_max_chars,
            ),
            SummaryMethod::ExtractiveWeighted => {
                self.weighted.summarize(&full_text, summary_length)
            }
            SummaryMethod::Abstractive => {
                self.summarize_abstractive(&full_text, summary_length).await
            }
        };
        let summary = bounded_by_source(summary, &full_text);
        let key_phrases = self.key_phrases.extract(&full_text, KEY_PHRASE_COUNT);

        self.metrics.record_document();
        tracing::info!(
            method = ?method,
            full_chars = full_text.len(),
            summary_chars = summary.len(),
            key_phrases = key_phrases.len(),
            "Summarized document"
        );
        SummaryResult {
            full_text,
            summary,
            key_phrases,
        }
    }

    /// Summarize a meeting from its candidate documents, agenda narrative first.
    ///
    /// Sources are tried in order until one yields a summary. Topics come from the agenda
    /// narrative, else the document's key phrases, else keyword topic detection, with
    /// `fallback_topics` replacing a bare `General` label.
    pub async fn summarize_meeting(
        &self,
        sources: &[PdfSource],
        date_label: &str,
        fallback_topics: &[String],
    ) -> MeetingSummary {
        for source in sources {
            let text = normalize_text(&self.read_pdf(source).await);
            if text.is_empty() {
                continue;
            }

            if let Some(agenda) = self.agenda.synthesize(&text, date_label) {
                tracing::info!(source = %source, items = agenda.item_count, "Using agenda narrative");
                let topics = if agenda.topics.is_empty() {
                    meeting_topics(&text, &[], fallback_topics)
                } else {
                    agenda.topics
                };
                self.metrics.record_document();
                return MeetingSummary {
                    summary: agenda.summary,
                    full_text: text,
                    topics,
                    source: Some(source.to_string()),
                };
            }

            let result = self
                .summarize_text(&text, MEETING_SUMMARY_LENGTH, SummaryMethod::Abstractive)
                .await;
            if !result.summary.is_empty() {
                let topics =
                    meeting_topics(&result.full_text, &result.key_phrases, fallback_topics);
                return MeetingSummary {
                    summary: result.summary,
                    full_text: result.full_text,
                    topics,
                    source: Some(source.to_string()),
                };
            }
        }

        tracing::warn!(date = date_label, "No meeting document produced a summary");
        let summary = format!(
            "Meeting held on {date_label}. Agenda documents are available for review."
        );
        let topics = meeting_topics(&summary, &[], fallback_topics);
        MeetingSummary {
            summary,
            full_text: String::new(),
            topics,
            source: sources.first().map(ToString::to_string),
        }
    }

    async fn read_pdf(&self, source: &PdfSource) -> String {
        match self.reader.try_read_pdf(source).await {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!(source = %source, error = %error, "PDF source unavailable");
                self.metrics.record_fetch_failure();
                String::new()
            }
        }
    }

    async fn summarize_abstractive(&self, text: &str, summary_length: usize) -> String {
        let max_tokens = if summary_length > 10 {
            summary_length
                .saturating_mul(TOKENS_PER_REQUESTED_UNIT)
                .min(MAX_ABSTRACTIVE_TOKENS)
        } else {
            DEFAULT_ABSTRACTIVE_TOKENS
        };
        let min_tokens = MIN_ABSTRACTIVE_TOKENS.min(max_tokens);
        let settings = AbstractiveSettings {
            prefilter_top_n: self.settings.relevance_top_n,
            chunk_max_tokens: self.settings.chunk_max_tokens,
            ..AbstractiveSettings::default()
        };

        let summarizer = AbstractiveSummarizer::new(&self.model, &self.scorer, settings);
        match summarizer.summarize(text, max_tokens, min_tokens).await {
            Ok(outcome) => {
                self.metrics.record_failed_chunks(outcome.chunks_failed as u64);
                outcome.summary
            }
            Err(error) => {
                tracing::warn!(error = %error, "Abstractive summary failed; using weighted extractive tier");
                self.metrics.record_model_fallback();
                self.weighted.summarize(text, ABSTRACTIVE_FALLBACK_SENTENCES)
            }
        }
    }
}

/// Key phrases, else detected topics, with `fallback` replacing a bare `General` label.
fn meeting_topics(text: &str, key_phrases: &[String], fallback: &[String]) -> Vec<String> {
    let mut topics = if !key_phrases.is_empty() {
        key_phrases.to_vec()
    } else {
        let detected = detect_topics(text);
        let only_general = detected.len() == 1 && detected[0] == GENERAL_TOPIC;
        if only_general && !fallback.is_empty() {
            fallback.to_vec()
        } else {
            detected
        }
    };
    topics.truncate(MAX_MEETING_TOPICS);
    topics
}

/// A summary never outgrows its source; when it would, the source is its own summary.
fn bounded_by_source(summary: String, full_text: &str) -> String {
    if summary.len() > full_text.len() || summary.chars().count() > full_text.chars().count() {
        full_text.to_string()
    } else {
        summary
    }
}
