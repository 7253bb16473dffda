use std::env;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_SUMMARIZATION_MODEL: &str = "llama3.2";

/// Runtime configuration for the Civic Digest pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of PDF pages decoded per document.
    pub pdf_max_pages: usize,
    /// Character cap applied to extracted PDF text.
    pub pdf_max_chars: usize,
    /// Character cap applied to extracted web page text.
    pub web_max_chars: usize,
    /// Summarizer selected by default.
    pub summary_method: SummaryMethod,
    /// Target summary length (sentences for extractive tiers).
    pub summary_length: usize,
    /// Hard character budget for extractive summaries.
    pub summary_max_chars: usize,
    /// Maximum chunk size in approximate model tokens.
    pub chunk_max_tokens: usize,
    /// Number of chunks kept by the relevance pre-filter.
    pub relevance_top_n: usize,
    /// Per-request network timeout in seconds.
    pub fetch_timeout_secs: u64,
    /// Number of documents processed concurrently by batch callers.
    pub fetch_concurrency: usize,
    /// Backend used for abstractive summaries.
    pub summarization_provider: SummarizationProvider,
    /// Base URL of the Ollama runtime.
    pub ollama_url: String,
    /// Model identifier passed to the summarization provider.
    pub summarization_model: String,
    /// Language toolkit used by the weighted extractive tier and key phrase extraction.
    pub nlp_toolkit: ToolkitKind,
}

/// Summarizer choices exposed to callers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SummaryMethod {
    /// Hierarchical model summarization with extractive fallback.
    #[default]
    Abstractive,
    /// Frequency-weighted sentence extraction.
    ExtractiveWeighted,
    /// First-N sentence extraction.
    ExtractiveBasic,
}

/// Supported abstractive summarization backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummarizationProvider {
    /// Abstractive summaries disabled; the model handle is always unavailable.
    None,
    /// Local Ollama runtime.
    Ollama,
}

/// Language toolkit selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolkitKind {
    /// Built-in rule-based toolkit.
    Rules,
    /// No toolkit; fallback tiers only.
    None,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pdf_max_pages: 1000,
            pdf_max_chars: 500_000,
            web_max_chars: 8000,
            summary_method: SummaryMethod::Abstractive,
            summary_length: 5,
            summary_max_chars: 2000,
            chunk_max_tokens: 1024,
            relevance_top_n: 5,
            fetch_timeout_secs: 30,
            fetch_concurrency: 4,
            summarization_provider: SummarizationProvider::Ollama,
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            summarization_model: DEFAULT_SUMMARIZATION_MODEL.to_string(),
            nlp_toolkit: ToolkitKind::Rules,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    ///
    /// Every variable is optional; unset or blank values keep the defaults from
    /// [`Config::default`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            pdf_max_pages: parse_env_or("PDF_MAX_PAGES", defaults.pdf_max_pages)?,
            pdf_max_chars: parse_env_or("PDF_MAX_CHARS", defaults.pdf_max_chars)?,
            web_max_chars: parse_env_or("WEB_MAX_CHARS", defaults.web_max_chars)?,
            summary_method: parse_env_or("SUMMARY_METHOD", defaults.summary_method)?,
            summary_length: parse_env_or("SUMMARY_LENGTH", defaults.summary_length)?,
            summary_max_chars: parse_env_or("SUMMARY_MAX_CHARS", defaults.summary_max_chars)?,
            chunk_max_tokens: parse_env_or("CHUNK_MAX_TOKENS", defaults.chunk_max_tokens)?,
            relevance_top_n: parse_env_or("RELEVANCE_TOP_N", defaults.relevance_top_n)?,
            fetch_timeout_secs: parse_env_or("FETCH_TIMEOUT_SECS", defaults.fetch_timeout_secs)?,
            fetch_concurrency: parse_env_or("FETCH_CONCURRENCY", defaults.fetch_concurrency)?,
            summarization_provider: parse_env_or(
                "SUMMARIZATION_PROVIDER",
                defaults.summarization_provider,
            )?,
            ollama_url: load_env_optional("OLLAMA_URL").unwrap_or(defaults.ollama_url),
            summarization_model: load_env_optional("SUMMARIZATION_MODEL")
                .unwrap_or(defaults.summarization_model),
            nlp_toolkit: parse_env_or("NLP_TOOLKIT", defaults.nlp_toolkit)?,
        })
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match load_env_optional(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

impl FromStr for SummaryMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abstractive" | "huggingface" => Ok(Self::Abstractive),
            "extractive-weighted" | "weighted" | "smart" => Ok(Self::ExtractiveWeighted),
            "extractive-basic" | "basic" | "simple" => Ok(Self::ExtractiveBasic),
            _ => Err(()),
        }
    }
}

impl FromStr for SummarizationProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "ollama" => Ok(Self::Ollama),
            _ => Err(()),
        }
    }
}

impl FromStr for ToolkitKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rules" => Ok(Self::Rules),
            "none" | "off" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    Ok(CONFIG.get_or_init(|| config))
}
