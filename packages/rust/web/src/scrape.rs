//! Single-URL fetch-and-extract pipeline.
//!
//! [`Scraper::scrape`] never returns an error: every outcome, including
//! invalid input and upstream failure, is a [`ScrapeResult`].

use tracing::{debug, info, instrument, warn};
use url::Url;

use ragscraper_shared::{
    DEFAULT_PREVIEW_CHARS, FailureKind, RagScraperError, Result, ScrapeResult, ScraperConfig,
};

use crate::fetch::{HttpFetcher, PageFetcher};
use crate::parse::{DomParser, HtmlParser};

/// Scraper over an injected fetcher and parser.
pub struct Scraper<F = HttpFetcher, P = DomParser> {
    fetcher: F,
    parser: P,
    preview_chars: usize,
}

impl Scraper<HttpFetcher, DomParser> {
    /// Build the default reqwest + html5ever scraper from config.
    pub fn from_config(config: &ScraperConfig) -> Result<Self> {
        Ok(Self::new(HttpFetcher::new(config)?, DomParser)
            .with_preview_chars(config.preview_chars))
    }
}

impl<F: PageFetcher, P: HtmlParser> Scraper<F, P> {
    pub fn new(fetcher: F, parser: P) -> Self {
        Self {
            fetcher,
            parser,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }

    /// Set the size of the raw preview returned for `partial` results.
    pub fn with_preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars.max(1);
        self
    }

    /// Fetch `url`, extract its title and visible text, and classify the outcome.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn scrape(&self, url: &str) -> ScrapeResult {
        let target = match validate_url(url) {
            Ok(target) => target,
            Err(e) => {
                warn!(error = %e, "rejected scrape target");
                return ScrapeResult::failed(url, FailureKind::InvalidInput, e.to_string());
            }
        };

        let raw = match self.fetcher.fetch(&target).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "fetch failed");
                let err = RagScraperError::upstream(e);
                return ScrapeResult::failed(url, FailureKind::UpstreamUnavailable, err.to_string());
            }
        };

        if raw.trim().is_empty() {
            let err = RagScraperError::parse("empty response body");
            return ScrapeResult::failed(url, FailureKind::ParseFailure, err.to_string());
        }

        let page = match self.parser.parse(&raw) {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, "parse failed");
                let err = RagScraperError::parse(e.to_string());
                return ScrapeResult::failed(url, FailureKind::ParseFailure, err.to_string());
            }
        };

        let title = page
            .title
            .map(|t| collapse_whitespace(&t))
            .filter(|t| !t.is_empty());
        let text = collapse_whitespace(&page.text_nodes.join(" "));

        if text.is_empty() {
            info!(raw_len = raw.len(), "no visible text, returning raw preview");
            return ScrapeResult::partial(url, title, preview(&raw, self.preview_chars));
        }

        debug!(text_len = text.len(), has_title = title.is_some(), "scrape succeeded");
        ScrapeResult::success(url, title, text)
    }
}

/// Parse `raw` as an absolute URL with a non-empty host.
pub fn validate_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| RagScraperError::invalid_input(format!("invalid URL '{raw}': {e}")))?;

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(RagScraperError::invalid_input(format!(
            "URL has no host: {raw}"
        ))),
    }
}

/// Collapse every whitespace run to a single space and trim both ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whitespace-collapsed prefix of `raw`, cut on a word boundary, with `...` when cut.
fn preview(raw: &str, max_chars: usize) -> String {
    let text = collapse_whitespace(raw);
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text;
    };

    let head = &text[..cut];
    match head.rfind(' ') {
        Some(space) if space > 0 => format!("{}...", &head[..space]),
        _ => format!("{head}..."),
    }
}
