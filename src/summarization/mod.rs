//! Summarization tiers and the sequence model behind the abstractive one.
//!
//! The abstractive tier talks to a pretrained model through [`SummarizationModel`]. Callers
//! construct one [`ModelHandle`] at process start and pass it by reference into the pipeline;
//! the handle serializes model calls and reports itself unavailable when loading failed, in
//! which case the pipeline falls back to the weighted extractive tier. The Ollama-backed client
//! issues HTTP requests directly to the runtime.

pub mod abstractive;
pub mod extractive;

pub use abstractive::{AbstractiveOutcome, AbstractiveSettings, AbstractiveSummarizer};
pub use extractive::{WeightedSummarizer, summarize_basic};

use crate::config::{Config, SummarizationProvider};
use crate::processing::chunking::CHARS_PER_TOKEN;
use crate::processing::normalize::truncate_at_word_boundary;
use crate::processing::types::ChunkingError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Default maximum model input, in tokens.
pub const DEFAULT_MAX_INPUT_TOKENS: usize = 1024;

/// Errors surfaced by a summarization model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Model never loaded, was disabled, or the runtime was unreachable.
    #[error("Summarization model unavailable: {0}")]
    ProviderUnavailable(String),
    /// Runtime returned an error response.
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Runtime response could not be parsed.
    #[error("Malformed model response: {0}")]
    InvalidResponse(String),
}

/// Errors from the abstractive tier; the pipeline maps each to the extractive fallback.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// The model handle holds no loaded model.
    #[error("summarization model is not loaded")]
    ModelUnavailable,
    /// Every attempted chunk failed.
    #[error("no chunk summaries succeeded ({attempted} attempted)")]
    NoChunkSucceeded {
        /// Chunks sent to the model.
        attempted: usize,
    },
    /// Input had no text to summarize.
    #[error("nothing to summarize")]
    EmptyInput,
    /// Input could not be chunked.
    #[error("failed to chunk input: {0}")]
    Chunking(#[from] ChunkingError),
}

/// Errors from the weighted extractive tier; the caller falls back to the basic tier.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractiveError {
    /// No language toolkit is configured.
    #[error("language toolkit unavailable")]
    ToolkitUnavailable,
    /// The toolkit found no sentences.
    #[error("no sentences found")]
    NoSentences,
    /// Every word was a stop word or punctuation.
    #[error("no content words to score")]
    NothingScorable,
}

/// One model invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    /// Text to summarize, already capped to the model's input window.
    pub text: String,
    /// Upper bound on generated tokens.
    pub max_tokens: usize,
    /// Lower bound on generated tokens.
    pub min_tokens: usize,
}

/// Interface implemented by abstractive summarization backends.
#[async_trait]
pub trait SummarizationModel: Send + Sync {
    /// Produce a summary of `request.text` within the token budget.
    async fn summarize(&self, request: ModelRequest) -> Result<String, ModelError>;
}

/// Caller-owned handle to the summarization model.
///
/// Built once per process and shared by reference. Model calls are serialized through an
/// internal lock because inference backends are not assumed to tolerate concurrent use.
pub struct ModelHandle {
    model: Option<Arc<dyn SummarizationModel>>,
    gate: Mutex<()>,
    max_input_chars: usize,
}

impl ModelHandle {
    /// Handle wrapping an already constructed model.
    pub fn new(model: Arc<dyn SummarizationModel>) -> Self {
        Self {
            model: Some(model),
            gate: Mutex::new(()),
            max_input_chars: DEFAULT_MAX_INPUT_TOKENS * CHARS_PER_TOKEN,
        }
    }

    /// Handle whose every call fails with [`ModelError::ProviderUnavailable`].
    pub fn unavailable() -> Self {
        Self {
            model: None,
            gate: Mutex::new(()),
            max_input_chars: DEFAULT_MAX_INPUT_TOKENS * CHARS_PER_TOKEN,
        }
    }

    /// Override the model input window, in tokens.
    pub fn with_max_input_tokens(mut self, tokens: usize) -> Self {
        self.max_input_chars = tokens.max(1).saturating_mul(CHARS_PER_TOKEN);
        self
    }

    /// Load the configured provider, probing that the model is actually served.
    ///
    /// Load failures are logged and produce an unavailable handle rather than an error.
    pub async fn load(config: &Config) -> Self {
        let handle = match config.summarization_provider {
            SummarizationProvider::None => {
                tracing::info!("Abstractive summarization disabled");
                Self::unavailable()
            }
            SummarizationProvider::Ollama => {
                let client = OllamaSummarizationModel::new(
                    config.ollama_url.clone(),
                    config.summarization_model.clone(),
                );
                match client.probe().await {
                    Ok(()) => {
                        tracing::info!(
                            model = %config.summarization_model,
                            url = %config.ollama_url,
                            "Summarization model loaded"
                        );
                        Self::new(Arc::new(client))
                    }
                    Err(error) => {
                        tracing::warn!(
                            error = %error,
                            model = %config.summarization_model,
                            "Summarization model failed to load; extractive fallback only"
                        );
                        Self::unavailable()
                    }
                }
            }
        };
        handle.with_max_input_tokens(config.chunk_max_tokens)
    }

    /// Whether a model is loaded.
    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    /// Summarize `text`, truncating it to the model window first.
    pub async fn summarize(
        &self,
        text: &str,
        max_tokens: usize,
        min_tokens: usize,
    ) -> Result<String, ModelError> {
        let Some(model) = &self.model else {
            return Err(ModelError::ProviderUnavailable(
                "no summarization model loaded".into(),
            ));
        };
        let request = ModelRequest {
            text: truncate_at_word_boundary(text, self.max_input_chars),
            max_tokens: max_tokens.max(1),
            min_tokens: min_tokens.min(max_tokens),
        };
        let _guard = self.gate.lock().await;
        model.summarize(request).await
    }
}

/// Ollama runtime serving a general-purpose model prompted to summarize.
pub struct OllamaSummarizationModel {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaSummarizationModel {
    /// Client for `model` served at `base_url`.
    pub fn new(base_url: String, model: String) -> Self {
        let http = Client::builder()
            .user_agent("civic-digest/summary")
            .build()
            .unwrap_or_else(|error| {
                tracing::warn!(error = %error, "Falling back to default reqwest client");
                Client::new()
            });
        Self {
            http,
            base_url,
            model,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// Confirm the runtime is reachable and serves the configured model.
    pub async fn probe(&self) -> Result<(), ModelError> {
        let response = self
            .http
            .get(self.endpoint("/api/tags"))
            .send()
            .await
            .map_err(|error| {
                ModelError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;
        if !response.status().is_success() {
            return Err(ModelError::ProviderUnavailable(format!(
                "Ollama returned {} while listing models",
                response.status()
            )));
        }
        let tags: OllamaTags = response.json().await.map_err(|error| {
            ModelError::InvalidResponse(format!("failed to decode Ollama model list: {error}"))
        })?;
        let served = tags.models.iter().any(|entry| {
            entry.name == self.model || entry.name.starts_with(&format!("{}:", self.model))
        });
        if served {
            Ok(())
        } else {
            Err(ModelError::ProviderUnavailable(format!(
                "model '{}' is not available in Ollama",
                self.model
            )))
        }
    }
}

fn build_prompt(text: &str, max_tokens: usize, min_tokens: usize) -> String {
    let max_words = (max_tokens.saturating_mul(3) / 4).max(1);
    let min_words = min_tokens.saturating_mul(3) / 4;
    format!(
        "System: You summarize government documents for a public civic index. Be factual and \
         neutral, keep names, dollar amounts, and decisions, and avoid speculation. Write one \
         paragraph of {min_words} to {max_words} words.\n\nDocument:\n{text}\n\nSummary:"
    )
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    done: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<OllamaTag>,
}

#[derive(Debug, Deserialize)]
struct OllamaTag {
    name: String,
}

#[async_trait]
impl SummarizationModel for OllamaSummarizationModel {
    async fn summarize(&self, request: ModelRequest) -> Result<String, ModelError> {
        let payload = json!({
            "model": self.model,
            "prompt": build_prompt(&request.text, request.max_tokens, request.min_tokens),
            "stream": false,
            "options": {
                // Near-greedy decoding keeps summaries reproducible.
                "temperature": 0.1,
                "num_predict": request.max_tokens,
            }
        });

        let response = self
            .http
            .post(self.endpoint("/api/generate"))
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                ModelError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ModelError::ProviderUnavailable(format!(
                "Ollama endpoint {} returned 404",
                self.endpoint("/api/generate")
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaResponse = response.json().await.map_err(|error| {
            ModelError::InvalidResponse(format!("failed to decode Ollama response: {error}"))
        })?;

        if !body.done {
            return Err(ModelError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        let summary = body.response.trim().to_string();
        if summary.is_empty() {
            return Err(ModelError::InvalidResponse("empty summary".into()));
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{
        Method::{GET, POST},
        MockServer,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoModel {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SummarizationModel for EchoModel {
        async fn summarize(&self, request: ModelRequest) -> Result<String, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(request.text)
        }
    }

    #[tokio::test]
    async fn ollama_client_handles_successful_response() {
        let server = MockServer::start_async().await;
        let client = OllamaSummarizationModel::new(server.base_url(), "llama".into());

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/generate")
                    .body_contains("\"num_predict\":120");
                then.status(200).json_body(json!({
                    "response": "  Summary text ",
                    "done": true
                }));
            })
            .await;

        let summary = client
            .summarize(ModelRequest {
                text: "Long agenda".into(),
                max_tokens: 120,
                min_tokens: 40,
            })
            .await
            .expect("summary");

        mock.assert_async().await;
        assert_eq!(summary, "Summary text");
    }

    #[tokio::test]
    async fn ollama_client_handles_error_status() {
        let server = MockServer::start_async().await;
        let client = OllamaSummarizationModel::new(server.base_url(), "llama".into());

        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(500).body("boom");
            })
            .await;

        let error = client
            .summarize(ModelRequest {
                text: "Agenda".into(),
                max_tokens: 100,
                min_tokens: 10,
            })
            .await
            .expect_err("error response");

        assert!(
            matches!(error, ModelError::GenerationFailed(ref message) if message.contains("500"))
        );
    }

    #[tokio::test]
    async fn probe_accepts_tagged_model_names() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tags");
                then.status(200).json_body(json!({
                    "models": [{ "name": "llama3.2:latest" }]
                }));
            })
            .await;

        let present = OllamaSummarizationModel::new(server.base_url(), "llama3.2".into());
        assert!(present.probe().await.is_ok());
        let missing = OllamaSummarizationModel::new(server.base_url(), "mistral".into());
        assert!(matches!(
            missing.probe().await,
            Err(ModelError::ProviderUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn load_with_unreachable_runtime_yields_unavailable_handle() {
        let config = Config {
            ollama_url: "http://127.0.0.1:9".into(),
            ..Config::default()
        };
        let handle = ModelHandle::load(&config).await;
        assert!(!handle.is_available());
        assert!(matches!(
            handle.summarize("text", 10, 1).await,
            Err(ModelError::ProviderUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn handle_truncates_input_to_model_window() {
        let model = Arc::new(EchoModel {
            calls: AtomicUsize::new(0),
        });
        let handle = ModelHandle::new(model.clone()).with_max_input_tokens(3);
        let echoed = handle
            .summarize("alpha beta gamma delta epsilon", 50, 5)
            .await
            .expect("echo");
        assert_eq!(echoed, "alpha beta...");
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn prompt_states_word_budget() {
        let prompt = build_prompt("Agenda text", 100, 40);
        assert!(prompt.contains("30 to 75 words"));
        assert!(prompt.contains("Agenda text"));
    }
}
