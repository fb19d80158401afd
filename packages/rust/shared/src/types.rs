//! Core domain types shared by the scrape and context pipelines.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ScrapeResult
// ---------------------------------------------------------------------------

/// Outcome class of a single scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeStatus {
    /// Extracted text is non-empty.
    Success,
    /// Fetch succeeded but extraction was empty; `text` holds a raw preview.
    Partial,
    /// Nothing usable was retrieved; `error` explains why.
    Failed,
}

/// Classification of a failed scrape, for mapping to transport-level signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidInput,
    UpstreamUnavailable,
    ParseFailure,
}

/// Normalized result of fetching and extracting one URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResult {
    /// The URL as requested.
    pub url: String,
    /// Page title, if the document had one.
    #[serde(default)]
    pub title: Option<String>,
    /// Extracted text (or raw preview for `partial`, empty for `failed`).
    pub text: String,
    pub status: ScrapeStatus,
    /// Human-readable failure message, present only when `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Failure classification, present only when `failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl ScrapeResult {
    /// A successful scrape. `text` must be non-empty.
    pub fn success(url: impl Into<String>, title: Option<String>, text: String) -> Self {
        debug_assert!(!text.is_empty(), "success requires non-empty text");
        Self {
            url: url.into(),
            title,
            text,
            status: ScrapeStatus::Success,
            error: None,
            failure: None,
        }
    }

    /// A reachable page with no extractable text; `preview` stands in for it.
    pub fn partial(url: impl Into<String>, title: Option<String>, preview: String) -> Self {
        Self {
            url: url.into(),
            title,
            text: preview,
            status: ScrapeStatus::Partial,
            error: None,
            failure: None,
        }
    }

    /// A failed scrape. Text is always empty.
    pub fn failed(url: impl Into<String>, kind: FailureKind, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            text: String::new(),
            status: ScrapeStatus::Failed,
            error: Some(error.into()),
            failure: Some(kind),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == ScrapeStatus::Failed
    }

    /// Text-only projection for plain output.
    pub fn to_text(&self) -> &str {
        &self.text
    }
}

// ---------------------------------------------------------------------------
// ModelRecord
// ---------------------------------------------------------------------------

/// A single model listing from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    /// Catalog identifier, unique within one fetch (e.g. `org/name`).
    pub id: String,
    /// Display name.
    pub name: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub pipeline_tag: Option<String>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub downloads: u64,
    /// Extended fields, only populated by an enriched fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ModelDetails>,
}

impl ModelRecord {
    /// Build a minimal record with no tags and no enrichment.
    pub fn new(id: impl Into<String>, likes: u64, downloads: u64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            tags: BTreeSet::new(),
            pipeline_tag: None,
            likes,
            downloads,
            details: None,
        }
    }
}

/// Per-model fields that only an enriched catalog fetch fills in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// ContextSummary
// ---------------------------------------------------------------------------

/// Aggregated, filtered and ranked view over one catalog snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSummary {
    /// Topic filter that was applied, if any.
    pub topic: Option<String>,
    /// Always `models.len()`.
    pub total_models: usize,
    pub total_likes: u64,
    pub total_downloads: u64,
    /// `total_likes / total_models`, or 0.0 for an empty summary.
    pub average_likes: f64,
    /// `total_downloads / total_models`, or 0.0 for an empty summary.
    pub average_downloads: f64,
    /// Highest ranked entries of `models`.
    pub top_models: Vec<ModelRecord>,
    /// Union of `pipeline_tag` over `models`.
    pub pipeline_tags: BTreeSet<String>,
    /// The filtered, limited set in fetch order.
    pub models: Vec<ModelRecord>,
}

impl ContextSummary {
    /// A summary with no matching models. A valid result, not an error.
    pub fn empty(topic: Option<String>) -> Self {
        Self {
            topic,
            total_models: 0,
            total_likes: 0,
            total_downloads: 0,
            average_likes: 0.0,
            average_downloads: 0.0,
            top_models: Vec::new(),
            pipeline_tags: BTreeSet::new(),
            models: Vec::new(),
        }
    }
}
