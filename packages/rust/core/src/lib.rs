//! Model context pipeline for ragscraper.
//!
//! Turns a catalog snapshot into a [`ContextSummary`]: topic filtering,
//! limit truncation, ranking, and aggregation.
//!
//! [`ContextSummary`]: ragscraper_shared::ContextSummary

pub mod context;

pub use context::{ContextOptions, DEFAULT_ENRICH, ModelContextBuilder, rank_models};
