//! Model context pipeline: catalog snapshot → filtered, ranked, aggregated summary.
//!
//! Order of operations for [`ModelContextBuilder::build`]:
//! 1. Fetch candidates from the injected [`CatalogSource`]
//! 2. Keep records matching the topic (case-insensitive substring of name, tags, pipeline tag)
//! 3. Truncate to `limit`, preserving fetch order; this is `models`
//! 4. Rank `models` for `top_models` and aggregate totals over `models`

use std::cmp::Ordering;
use std::collections::BTreeSet;

use tracing::{debug, info, instrument, warn};

use ragscraper_catalog::CatalogSource;
use ragscraper_shared::{
    ContextConfig, ContextSummary, DEFAULT_LIMIT, DEFAULT_TOP_N, MAX_LIMIT, ModelRecord,
    RagScraperError, Result, clamp_limit,
};

/// Whether catalog fetches are enriched when the caller does not say.
pub const DEFAULT_ENRICH: bool = true;

/// Tunables for [`ModelContextBuilder`].
#[derive(Debug, Clone)]
pub struct ContextOptions {
    /// Limit used when the caller passes none.
    pub default_limit: usize,
    /// Size of `top_models`.
    pub top_n: usize,
    /// Candidates requested from the catalog when a topic filter is present.
    pub topic_pool: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            top_n: DEFAULT_TOP_N,
            topic_pool: MAX_LIMIT,
        }
    }
}

impl From<&ContextConfig> for ContextOptions {
    fn from(config: &ContextConfig) -> Self {
        Self {
            default_limit: config.default_limit,
            top_n: config.top_n,
            topic_pool: config.topic_pool,
        }
    }
}

/// Builds [`ContextSummary`] values over an injected catalog.
pub struct ModelContextBuilder<C> {
    catalog: C,
    options: ContextOptions,
}

impl<C: CatalogSource> ModelContextBuilder<C> {
    pub fn new(catalog: C) -> Self {
        Self::with_options(catalog, ContextOptions::default())
    }

    pub fn with_options(catalog: C, options: ContextOptions) -> Self {
        Self { catalog, options }
    }

    /// Build a summary over the models matching `topic`, at most `limit` of them.
    ///
    /// Zero matches is an empty summary, not an error. A catalog failure is
    /// [`RagScraperError::UpstreamUnavailable`] and no summary is produced.
    #[instrument(skip(self))]
    pub async fn build(
        &self,
        topic: Option<&str>,
        limit: Option<usize>,
        enrich: Option<bool>,
    ) -> Result<ContextSummary> {
        let limit = clamp_limit(limit, self.options.default_limit);
        let enrich = enrich.unwrap_or(DEFAULT_ENRICH);
        let topic = normalize_topic(topic);

        let request = match topic {
            Some(_) => limit.max(self.options.topic_pool),
            None => limit,
        };

        let candidates = self.fetch(request, enrich).await?;
        let fetched = candidates.len();

        let needle = topic.as_deref().map(str::to_lowercase);
        let models: Vec<ModelRecord> = candidates
            .into_iter()
            .filter(|m| needle.as_deref().is_none_or(|t| matches_topic(m, t)))
            .take(limit)
            .collect();

        if models.is_empty() {
            info!(fetched, "no models matched");
            return Ok(ContextSummary::empty(topic));
        }

        let summary = summarize(topic, models, self.options.top_n);
        info!(
            fetched,
            total_models = summary.total_models,
            total_likes = summary.total_likes,
            "context built"
        );
        Ok(summary)
    }

    /// Fetch up to `limit` models with no filtering or aggregation.
    #[instrument(skip(self))]
    pub async fn list_models(
        &self,
        limit: Option<usize>,
        enrich: Option<bool>,
    ) -> Result<Vec<ModelRecord>> {
        let limit = clamp_limit(limit, self.options.default_limit);
        let mut models = self.fetch(limit, enrich.unwrap_or(DEFAULT_ENRICH)).await?;
        models.truncate(limit);
        Ok(models)
    }

    async fn fetch(&self, limit: usize, enrich: bool) -> Result<Vec<ModelRecord>> {
        debug!(limit, enrich, "fetching catalog");
        self.catalog.fetch_catalog(limit, enrich).await.map_err(|e| {
            warn!(error = %e, "catalog fetch failed");
            RagScraperError::upstream(e)
        })
    }
}

/// Trimmed topic, or `None` when absent or blank.
fn normalize_topic(topic: Option<&str>) -> Option<String> {
    topic
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

/// `needle` must already be lowercase.
fn matches_topic(model: &ModelRecord, needle: &str) -> bool {
    model.name.to_lowercase().contains(needle)
        || model.tags.iter().any(|t| t.to_lowercase().contains(needle))
        || model
            .pipeline_tag
            .as_deref()
            .is_some_and(|p| p.to_lowercase().contains(needle))
}

/// Likes descending, then downloads descending, then id ascending.
fn rank_order(a: &ModelRecord, b: &ModelRecord) -> Ordering {
    b.likes
        .cmp(&a.likes)
        .then_with(|| b.downloads.cmp(&a.downloads))
        .then_with(|| a.id.cmp(&b.id))
}

/// The `n` best-ranked records of `models`.
pub fn rank_models(models: &[ModelRecord], n: usize) -> Vec<ModelRecord> {
    let mut ranked = models.to_vec();
    ranked.sort_by(rank_order);
    ranked.truncate(n);
    ranked
}

/// Aggregate a non-empty, already filtered and limited model list.
fn summarize(topic: Option<String>, models: Vec<ModelRecord>, top_n: usize) -> ContextSummary {
    let total_models = models.len();
    let total_likes: u64 = models.iter().map(|m| m.likes).sum();
    let total_downloads: u64 = models.iter().map(|m| m.downloads).sum();
    let pipeline_tags: BTreeSet<String> =
        models.iter().filter_map(|m| m.pipeline_tag.clone()).collect();

    ContextSummary {
        topic,
        total_models,
        total_likes,
        total_downloads,
        average_likes: average(total_likes, total_models),
        average_downloads: average(total_downloads, total_models),
        top_models: rank_models(&models, top_n),
        pipeline_tags,
        models,
    }
}

fn average(total: u64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}
