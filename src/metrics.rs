use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing pipeline activity.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_summarized: AtomicU64,
    empty_inputs: AtomicU64,
    fetch_failures: AtomicU64,
    model_fallbacks: AtomicU64,
    failed_chunks: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a document that produced a summary result.
    pub fn record_document(&self) {
        self.documents_summarized.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request whose sources yielded no text.
    pub fn record_empty_input(&self) {
        self.empty_inputs.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a source that could not be fetched or decoded.
    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a fallback from the abstractive summarizer to the extractive tier.
    pub fn record_model_fallback(&self) {
        self.model_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record chunks whose model invocation failed and were dropped.
    pub fn record_failed_chunks(&self, count: u64) {
        self.failed_chunks.fetch_add(count, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_summarized: self.documents_summarized.load(Ordering::Relaxed),
            empty_inputs: self.empty_inputs.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            model_fallbacks: self.model_fallbacks.load(Ordering::Relaxed),
            failed_chunks: self.failed_chunks.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Documents that produced a summary result since startup.
    pub documents_summarized: u64,
    /// Requests whose sources produced no text.
    pub empty_inputs: u64,
    /// Sources that failed to fetch or decode.
    pub fetch_failures: u64,
    /// Abstractive requests that fell back to extractive summaries.
    pub model_fallbacks: u64,
    /// Chunk summaries dropped after a model error.
    pub failed_chunks: u64,
}
