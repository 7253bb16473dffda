//! Source Reader: fetch PDF and web documents and reduce them to normalized plain text.
//!
//! Each public `read_*` method swallows failures: the cause is logged and an empty string comes
//! back, so a bad document never aborts the caller's loop. The `try_read_*` variants expose the
//! underlying [`FetchError`] for callers that want to count or report failures.

mod pdf;
mod web;

use crate::config::Config;
use reqwest::{Client, StatusCode};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; CivicDigest/0.1)";

/// Errors raised while fetching or decoding a source document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    /// Request failed before a response arrived (DNS, connect, timeout, body read).
    #[error("request to {url} failed: {source}")]
    Request {
        /// Requested address.
        url: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },
    /// Server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested address.
        url: String,
        /// Response status.
        status: StatusCode,
    },
    /// Local file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// Bytes are not a readable PDF.
    #[error("malformed PDF: {0}")]
    Pdf(#[from] lopdf::Error),
    /// Blocking PDF decode task panicked or was cancelled.
    #[error("PDF extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Where a PDF lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfSource {
    /// HTTP(S) address.
    Url(String),
    /// Local filesystem path.
    Path(PathBuf),
}

impl PdfSource {
    /// Interpret `reference` as a URL when it has an HTTP(S) scheme, else as a path.
    pub fn parse(reference: &str) -> Self {
        let lowered = reference.to_ascii_lowercase();
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            Self::Url(reference.to_string())
        } else {
            Self::Path(PathBuf::from(reference))
        }
    }
}

impl fmt::Display for PdfSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Raw bytes of one fetched document, alive only for a single extraction call.
#[derive(Debug)]
pub struct RawDocument {
    /// Where the bytes came from.
    pub source: String,
    /// Undecoded content.
    pub bytes: Vec<u8>,
}

/// Page and character caps applied during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderLimits {
    /// Pages decoded per PDF.
    pub pdf_max_pages: usize,
    /// Characters kept per PDF.
    pub pdf_max_chars: usize,
    /// Characters kept per web page.
    pub web_max_chars: usize,
}

impl Default for ReaderLimits {
    fn default() -> Self {
        Self {
            pdf_max_pages: 1_000,
            pdf_max_chars: 500_000,
            web_max_chars: 8_000,
        }
    }
}

impl From<&Config> for ReaderLimits {
    fn from(config: &Config) -> Self {
        Self {
            pdf_max_pages: config.pdf_max_pages,
            pdf_max_chars: config.pdf_max_chars,
            web_max_chars: config.web_max_chars,
        }
    }
}

/// Fetches documents over HTTP or from disk and extracts their text.
#[derive(Clone)]
pub struct SourceReader {
    http: Client,
    limits: ReaderLimits,
}

impl SourceReader {
    /// Reader with a fixed per-request timeout.
    pub fn new(limits: ReaderLimits, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { http, limits })
    }

    /// Reader using the caps and timeout from configuration.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(
            ReaderLimits::from(config),
            Duration::from_secs(config.fetch_timeout_secs),
        )
    }

    /// Extract PDF text, returning an empty string on any failure.
    pub async fn read_pdf(&self, source: &PdfSource) -> String {
        match self.try_read_pdf(source).await {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!(source = %source, error = %error, "PDF extraction failed");
                String::new()
            }
        }
    }

    /// Extract PDF text page by page within the page and character caps.
    pub async fn try_read_pdf(&self, source: &PdfSource) -> Result<String, FetchError> {
        tracing::info!(source = %source, "Reading PDF");
        let raw = match source {
            PdfSource::Url(url) => self.fetch(url).await?,
            PdfSource::Path(path) => RawDocument {
                source: path.display().to_string(),
                bytes: tokio::fs::read(path).await.map_err(|source| FetchError::Io {
                    path: path.clone(),
                    source,
                })?,
            },
        };

        let limits = self.limits;
        let RawDocument { source, bytes } = raw;
        let extracted = tokio::task::spawn_blocking(move || {
            pdf::extract_pdf_text(&bytes, limits.pdf_max_pages, limits.pdf_max_chars)
        })
        .await??;

        tracing::info!(
            source = %source,
            pages = extracted.pages_read,
            total_pages = extracted.total_pages,
            chars = extracted.text.len(),
            "Extracted PDF text"
        );
        Ok(extracted.text)
    }

    /// Extract visible web page text, returning an empty string on any failure.
    pub async fn read_web_page(&self, url: &str) -> String {
        match self.try_read_web_page(url).await {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!(url, error = %error, "Web extraction failed");
                String::new()
            }
        }
    }

    /// Fetch markup and extract visible text within the web character cap.
    pub async fn try_read_web_page(&self, url: &str) -> Result<String, FetchError> {
        tracing::info!(url, "Reading web page");
        let raw = self.fetch(url).await?;
        let markup = String::from_utf8_lossy(&raw.bytes);
        let text = web::visible_text(&markup, self.limits.web_max_chars);
        tracing::info!(url, chars = text.len(), "Extracted web text");
        Ok(text)
    }

    async fn fetch(&self, url: &str) -> Result<RawDocument, FetchError> {
        let request_error = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };
        let response = self.http.get(url).send().await.map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }
        let bytes = response.bytes().await.map_err(request_error)?;
        tracing::debug!(url, bytes = bytes.len(), "Fetched document");
        Ok(RawDocument {
            source: url.to_string(),
            bytes: bytes.to_vec(),
        })
    }
}
