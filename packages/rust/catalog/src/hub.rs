//! Hugging Face Hub catalog client.
//!
//! Minimal fetches use the model list API directly. Enriched fetches harvest
//! IDs from the public listing page (falling back to the list API), then
//! resolve each ID against the per-model endpoint.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use ragscraper_shared::{
    CatalogConfig, ModelDetails, ModelRecord, RagScraperError, Result, catalog_token,
};

use crate::listing::parse_model_ids;
use crate::{CatalogError, CatalogSource};

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// One model as returned by the list and detail endpoints.
#[derive(Debug, Deserialize)]
struct HubModel {
    id: String,
    #[serde(default, rename = "modelId")]
    model_id: Option<String>,
    #[serde(default)]
    likes: Option<u64>,
    #[serde(default)]
    downloads: Option<u64>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    pipeline_tag: Option<String>,
    #[serde(default)]
    library_name: Option<String>,
    #[serde(default)]
    license: Option<serde_json::Value>,
    #[serde(default, rename = "cardData")]
    card_data: Option<CardData>,
    #[serde(default, rename = "createdAt")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "lastModified")]
    last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct CardData {
    #[serde(default)]
    license: Option<serde_json::Value>,
}

impl HubModel {
    fn into_record(self, enriched: bool) -> ModelRecord {
        let details = enriched.then(|| ModelDetails {
            license: self
                .card_data
                .as_ref()
                .and_then(|card| license_name(card.license.as_ref()))
                .or_else(|| license_name(self.license.as_ref())),
            library_name: self.library_name.clone(),
            created_at: self.created_at,
            last_modified: self.last_modified,
        });

        ModelRecord {
            name: self.model_id.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            tags: self.tags.into_iter().collect::<BTreeSet<_>>(),
            pipeline_tag: self.pipeline_tag.filter(|t| !t.is_empty()),
            likes: self.likes.unwrap_or(0),
            downloads: self.downloads.unwrap_or(0),
            details,
        }
    }
}

/// License fields are a string, or occasionally a list of strings.
fn license_name(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => items.iter().find_map(|v| v.as_str().map(String::from)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// HubCatalog
// ---------------------------------------------------------------------------

/// Catalog backed by the Hugging Face Hub HTTP API.
pub struct HubCatalog {
    client: Client,
    api_base: String,
    listing_url: String,
    token: Option<String>,
    attempts: u32,
    backoff: Duration,
}

impl HubCatalog {
    /// Build a client from the `[catalog]` config section, reading the token env var.
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RagScraperError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            listing_url: config.listing_url.clone(),
            token: catalog_token(config),
            attempts: config.retries.max(1),
            backoff: Duration::from_millis(config.backoff_ms),
        })
    }

    /// Override the access token.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request built by `make`, retrying transport failures, 429 and 5xx.
    async fn send_with_retry<F>(
        &self,
        what: &str,
        make: F,
    ) -> std::result::Result<reqwest::Response, CatalogError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 1;
        loop {
            let (error, retryable) = match self.authorized(make()).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => classify_status(what, response.status()),
                Err(e) => (CatalogError::Unavailable(format!("{what}: {e}")), true),
            };

            if !retryable || attempt >= self.attempts {
                return Err(error);
            }
            warn!(attempt, error = %error, "catalog request failed, retrying");
            tokio::time::sleep(self.backoff * attempt).await;
            attempt += 1;
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        what: &str,
        make: impl Fn() -> RequestBuilder,
    ) -> std::result::Result<T, CatalogError> {
        self.send_with_retry(what, make)
            .await?
            .json::<T>()
            .await
            .map_err(|e| CatalogError::Unavailable(format!("{what}: invalid response: {e}")))
    }

    /// Top models by likes from the list endpoint.
    async fn list_via_api(&self, limit: usize) -> std::result::Result<Vec<HubModel>, CatalogError> {
        let limit_param = limit.to_string();
        let mut models: Vec<HubModel> = self
            .get_json("model list", || {
                self.client.get(&self.api_base).query(&[
                    ("sort", "likes"),
                    ("direction", "-1"),
                    ("limit", limit_param.as_str()),
                ])
            })
            .await?;
        models.truncate(limit);
        Ok(models)
    }

    /// Model IDs from the public listing page; empty on any failure.
    async fn ids_from_listing(&self, limit: usize) -> Vec<String> {
        let response = match self
            .send_with_retry("listing page", || self.client.get(&self.listing_url))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "listing page unavailable");
                return Vec::new();
            }
        };

        match response.text().await {
            Ok(html) => parse_model_ids(&html, limit),
            Err(e) => {
                debug!(error = %e, "listing page body unreadable");
                Vec::new()
            }
        }
    }

    async fn model_info(&self, id: &str) -> std::result::Result<HubModel, CatalogError> {
        let url = format!("{}/{id}", self.api_base);
        self.get_json(id, || self.client.get(&url)).await
    }
}

#[async_trait]
impl CatalogSource for HubCatalog {
    #[instrument(skip(self))]
    async fn fetch_catalog(
        &self,
        limit: usize,
        enrich: bool,
    ) -> std::result::Result<Vec<ModelRecord>, CatalogError> {
        if !enrich {
            let models = self.list_via_api(limit).await?;
            debug!(count = models.len(), "fetched minimal catalog");
            return Ok(models.into_iter().map(|m| m.into_record(false)).collect());
        }

        let mut ids = self.ids_from_listing(limit).await;
        if ids.is_empty() {
            info!("listing page yielded no models, falling back to list API");
            ids = self
                .list_via_api(limit)
                .await?
                .into_iter()
                .map(|m| m.id)
                .collect();
        }

        // Private or removed repos answer 401 per model; only the list endpoint's auth is fatal.
        let mut records = Vec::with_capacity(ids.len());
        let mut unauthorized = 0;
        for id in &ids {
            match self.model_info(id).await {
                Ok(model) => records.push(model.into_record(true)),
                Err(e) => {
                    if matches!(e, CatalogError::Unauthorized(_)) {
                        unauthorized += 1;
                    }
                    warn!(%id, error = %e, "skipping model, details unavailable");
                }
            }
        }

        if records.is_empty() && !ids.is_empty() {
            let message = format!("details unavailable for all {} models", ids.len());
            return Err(if unauthorized == ids.len() {
                CatalogError::Unauthorized(message)
            } else {
                CatalogError::Unavailable(message)
            });
        }

        info!(requested = ids.len(), enriched = records.len(), "fetched enriched catalog");
        Ok(records)
    }
}

/// Map a non-success status to a catalog error and whether it is worth retrying.
fn classify_status(what: &str, status: StatusCode) -> (CatalogError, bool) {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => (
            CatalogError::Unauthorized(format!("{what}: HTTP {status}")),
            false,
        ),
        _ => (
            CatalogError::Unavailable(format!("{what}: HTTP {status}")),
            status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fixture(name: &str) -> String {
        let path = format!("../../../fixtures/{name}");
        std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    fn catalog_for(server: &MockServer) -> HubCatalog {
        let config = CatalogConfig {
            api_base: format!("{}/api/models", server.uri()),
            listing_url: format!("{}/models", server.uri()),
            timeout_secs: 5,
            retries: 1,
            backoff_ms: 0,
            ..CatalogConfig::default()
        };
        HubCatalog::new(&config).unwrap().with_token(None)
    }

    #[test]
    fn card_license_prefers_card_data() {
        let json = r#"{"id": "a/b", "license": "apache-2.0", "cardData": {"license": ["mit", "other"]}}"#;
        let model: HubModel = serde_json::from_str(json).unwrap();
        let record = model.into_record(true);
        assert_eq!(record.details.unwrap().license.as_deref(), Some("mit"));
    }

    #[test]
    fn minimal_record_has_no_details() {
        let json = r#"{"id": "a/b", "likes": 3, "pipeline_tag": ""}"#;
        let model: HubModel = serde_json::from_str(json).unwrap();
        let record = model.into_record(false);
        assert_eq!(record.name, "a/b");
        assert_eq!(record.likes, 3);
        assert_eq!(record.downloads, 0);
        assert!(record.pipeline_tag.is_none());
        assert!(record.details.is_none());
    }

    #[tokio::test]
    async fn minimal_fetch_uses_list_api() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/models"))
            .and(query_param("sort", "likes"))
            .and(query_param("direction", "-1"))
            .and(query_param("limit", "3"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(fixture("json/models_list.json"), "application/json"),
            )
            .mount(&server)
            .await;

        let records = catalog_for(&server).fetch_catalog(3, false).await.unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, "deepseek-ai/DeepSeek-R1");
        assert_eq!(records[0].likes, 12000);
        assert!(records[0].tags.contains("text-generation"));
        assert_eq!(records[1].pipeline_tag.as_deref(), Some("text-to-image"));
        // no modelId in the payload: name falls back to id
        assert_eq!(records[2].name, "meta-llama/Meta-Llama-3-8B");
        assert!(records.iter().all(|r| r.details.is_none()));
    }

    #[tokio::test]
    async fn unauthorized_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(path("/api/models"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let mut catalog = catalog_for(&server);
        catalog.attempts = 3;
        let err = catalog.fetch_catalog(5, false).await.unwrap_err();
        assert!(matches!(err, CatalogError::Unauthorized(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(path("/api/models"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = catalog_for(&server).fetch_catalog(5, false).await.unwrap_err();
        assert!(matches!(err, CatalogError::Unavailable(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn enriched_fetch_resolves_listing_ids() {
        let server = MockServer::start().await;
        Mock::given(path("/models"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(fixture("html/models_listing.html")),
            )
            .mount(&server)
            .await;
        Mock::given(path("/api/models/deepseek-ai/DeepSeek-R1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(fixture("json/model_detail.json"), "application/json"),
            )
            .mount(&server)
            .await;
        Mock::given(path("/api/models/black-forest-labs/FLUX.1-dev"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let records = catalog_for(&server).fetch_catalog(2, true).await.unwrap();

        // FLUX detail lookup 404s and is skipped
        assert_eq!(records.len(), 1);
        let details = records[0].details.as_ref().expect("enriched");
        assert_eq!(details.license.as_deref(), Some("mit"));
        assert_eq!(details.library_name.as_deref(), Some("transformers"));
        assert!(details.last_modified.is_some());
    }

    #[tokio::test]
    async fn enriched_fetch_falls_back_to_list_api() {
        let server = MockServer::start().await;
        Mock::given(path("/models"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(path("/api/models"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(fixture("json/models_list.json"), "application/json"),
            )
            .mount(&server)
            .await;
        Mock::given(path("/api/models/deepseek-ai/DeepSeek-R1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(fixture("json/model_detail.json"), "application/json"),
            )
            .mount(&server)
            .await;

        let records = catalog_for(&server).fetch_catalog(1, true).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "deepseek-ai/DeepSeek-R1");
        assert!(records[0].details.is_some());
    }

    #[tokio::test]
    async fn enriched_fetch_fails_when_no_details_resolve() {
        let server = MockServer::start().await;
        Mock::given(path("/models"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(fixture("html/models_listing.html")),
            )
            .mount(&server)
            .await;

        // every detail lookup falls through to wiremock's default 404
        let err = catalog_for(&server).fetch_catalog(2, true).await.unwrap_err();
        assert!(matches!(err, CatalogError::Unavailable(_)));
    }

    #[test]
    fn only_rate_limits_and_server_errors_are_retried() {
        let retryable = |code: u16| classify_status("x", StatusCode::from_u16(code).unwrap()).1;
        assert!(retryable(429));
        assert!(retryable(500));
        assert!(retryable(503));
        assert!(!retryable(401));
        assert!(!retryable(404));
        assert!(!retryable(410));
    }

    #[tokio::test]
    async fn missing_model_detail_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<a href="/org/gone"></a><a href="/deepseek-ai/DeepSeek-R1"></a>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(path("/api/models/org/gone"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/api/models/deepseek-ai/DeepSeek-R1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(fixture("json/model_detail.json"), "application/json"),
            )
            .mount(&server)
            .await;

        let mut catalog = catalog_for(&server);
        catalog.attempts = 3;
        let records = catalog.fetch_catalog(2, true).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "deepseek-ai/DeepSeek-R1");
    }

    #[tokio::test]
    async fn server_error_detail_is_retried() {
        let server = MockServer::start().await;
        Mock::given(path("/models"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"<a href="/deepseek-ai/DeepSeek-R1"></a>"#),
            )
            .mount(&server)
            .await;
        Mock::given(path("/api/models/deepseek-ai/DeepSeek-R1"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(path("/api/models/deepseek-ai/DeepSeek-R1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(fixture("json/model_detail.json"), "application/json"),
            )
            .mount(&server)
            .await;

        let mut catalog = catalog_for(&server);
        catalog.attempts = 2;
        let records = catalog.fetch_catalog(1, true).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn unauthorized_detail_skips_only_that_model() {
        let server = MockServer::start().await;
        Mock::given(path("/models"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<a href="/org/removed"></a><a href="/deepseek-ai/DeepSeek-R1"></a>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(path("/api/models/org/removed"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/api/models/deepseek-ai/DeepSeek-R1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(fixture("json/model_detail.json"), "application/json"),
            )
            .mount(&server)
            .await;

        let records = catalog_for(&server).fetch_catalog(2, true).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "deepseek-ai/DeepSeek-R1");
    }

    #[tokio::test]
    async fn all_details_unauthorized_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(path("/models"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<a href="/org/private-a"></a><a href="/org/private-b"></a>"#),
            )
            .mount(&server)
            .await;
        Mock::given(path("/api/models/org/private-a"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(path("/api/models/org/private-b"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = catalog_for(&server).fetch_catalog(2, true).await.unwrap_err();
        assert!(matches!(err, CatalogError::Unauthorized(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn token_is_sent_as_bearer() {
        let server = MockServer::start().await;
        Mock::given(path("/api/models"))
            .and(header("authorization", "Bearer hf_secret"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
            .mount(&server)
            .await;

        let catalog = catalog_for(&server).with_token(Some("hf_secret".into()));
        let records = catalog.fetch_catalog(5, false).await.unwrap();
        assert!(records.is_empty());
    }
}
