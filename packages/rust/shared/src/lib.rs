//! Shared types, error model, and configuration for ragscraper.
//!
//! This crate is the foundation depended on by all other ragscraper crates.
//! It provides:
//! - [`RagScraperError`]: the unified error type
//! - Domain types ([`ScrapeResult`], [`ModelRecord`], [`ContextSummary`])
//! - Configuration ([`AppConfig`], named defaults, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CatalogConfig, ContextConfig, DEFAULT_LIMIT, DEFAULT_PREVIEW_CHARS, DEFAULT_TOP_N,
    DEFAULT_USER_AGENT, MAX_LIMIT, MIN_LIMIT, ScraperConfig, catalog_token, clamp_limit,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{BoxError, RagScraperError, Result};
pub use types::{
    ContextSummary, FailureKind, ModelDetails, ModelRecord, ScrapeResult, ScrapeStatus,
};
