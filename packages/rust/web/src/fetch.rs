//! Page fetching: the [`PageFetcher`] capability and its reqwest implementation.
//!
//! Timeouts and retries belong here, not to the scraper that calls it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderValue};
use tracing::{debug, warn};
use url::Url;

use ragscraper_shared::{RagScraperError, Result, ScraperConfig};

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Maximum response size we accept (10 MB).
const MAX_RESPONSE_SIZE: u64 = 10 * 1024 * 1024;

/// Failure reported by a [`PageFetcher`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("failed to read body: {0}")]
    Body(String),
}

impl FetchError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Connection(err.to_string())
        }
    }

    /// Transport failures, rate limiting and server errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Connection(_) => true,
            Self::HttpStatus(code) => *code == 429 || *code >= 500,
            Self::Body(_) => false,
        }
    }
}

/// Fetches the raw body of a URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> std::result::Result<String, FetchError>;
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

/// reqwest-backed fetcher with browser-like headers and linear backoff retries.
pub struct HttpFetcher {
    client: Client,
    attempts: u32,
    backoff: Duration,
    max_body: u64,
}

impl HttpFetcher {
    /// Build a fetcher from the `[scraper]` config section.
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RagScraperError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            attempts: config.retries.max(1),
            backoff: Duration::from_millis(config.backoff_ms),
            max_body: MAX_RESPONSE_SIZE,
        })
    }

    async fn fetch_once(&self, url: &Url) -> std::result::Result<String, FetchError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        self.read_body(response).await
    }

    /// Read the body chunk by chunk, giving up once it passes `max_body`.
    async fn read_body(
        &self,
        mut response: reqwest::Response,
    ) -> std::result::Result<String, FetchError> {
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?
        {
            if (body.len() + chunk.len()) as u64 > self.max_body {
                return Err(FetchError::Body(format!(
                    "response too large (max {} bytes)",
                    self.max_body
                )));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> std::result::Result<String, FetchError> {
        let mut attempt = 1;
        loop {
            debug!(%url, attempt, "fetching page");
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < self.attempts => {
                    warn!(%url, attempt, error = %e, "fetch attempt failed, retrying");
                    tokio::time::sleep(self.backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
