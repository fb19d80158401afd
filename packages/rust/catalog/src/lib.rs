//! Model catalog access.
//!
//! The context pipeline only sees the [`CatalogSource`] capability; [`HubCatalog`]
//! is the Hugging Face implementation, and [`listing`] harvests model IDs
//! from the public listing page.

mod hub;
pub mod listing;

use async_trait::async_trait;
use ragscraper_shared::ModelRecord;

pub use hub::HubCatalog;
pub use listing::parse_model_ids;

/// Failure reported by a [`CatalogSource`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// The catalog refused our credentials (HTTP 401/403).
    #[error("catalog unauthorized: {0}")]
    Unauthorized(String),

    /// The catalog could not be reached or returned an unusable response.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Supplies model listings, most-liked first.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch up to `limit` records. With `enrich`, records carry [`ModelRecord::details`].
    async fn fetch_catalog(
        &self,
        limit: usize,
        enrich: bool,
    ) -> Result<Vec<ModelRecord>, CatalogError>;
}
