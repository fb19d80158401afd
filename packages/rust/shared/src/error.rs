//! Error types for ragscraper.
//!
//! Library crates use [`RagScraperError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Boxed cause carried by [`RagScraperError::UpstreamUnavailable`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all ragscraper operations.
#[derive(Debug, thiserror::Error)]
pub enum RagScraperError {
    /// Malformed URL or a parameter that cannot be clamped into range.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// A fetch or catalog capability failed; the cause is kept as the source.
    #[error("upstream unavailable: {message}")]
    UpstreamUnavailable {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// HTML parsing or content extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Network/HTTP client setup error.
    #[error("network error: {0}")]
    Network(String),

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, RagScraperError>;

impl RagScraperError {
    /// Create an invalid-input error from any displayable message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }

    /// Wrap a capability failure, keeping it as the error source.
    pub fn upstream<E>(cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::UpstreamUnavailable {
            message: cause.to_string(),
            source: Some(Box::new(cause)),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the upstream could not be reached or refused us.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("401 from catalog")]
    struct Denied;

    #[test]
    fn error_display_formatting() {
        let err = RagScraperError::invalid_input("URL has no host");
        assert_eq!(err.to_string(), "invalid input: URL has no host");

        let err = RagScraperError::config("bad toml");
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn upstream_keeps_cause() {
        let err = RagScraperError::upstream(Denied);
        assert!(err.is_upstream());
        assert_eq!(err.to_string(), "upstream unavailable: 401 from catalog");
        let source = err.source().expect("source kept");
        assert_eq!(source.to_string(), "401 from catalog");
    }
}
