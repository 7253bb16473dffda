#![deny(missing_docs)]

//! Core library for Civic Digest, a content reduction pipeline for government documents.

/// Structured agenda synthesis.
pub mod agenda;
/// Environment-driven configuration management.
pub mod config;
/// PDF and web page readers.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Pipeline activity counters.
pub mod metrics;
/// Language toolkit, key phrases, and topic detection.
pub mod nlp;
/// End-to-end orchestration.
pub mod pipeline;
/// Normalization, chunking, and relevance scoring.
pub mod processing;
/// Extractive and abstractive summarizers.
pub mod summarization;

pub use pipeline::{DocumentPipeline, MeetingSummary, PipelineSettings, SummaryRequest};
pub use processing::types::SummaryResult;
