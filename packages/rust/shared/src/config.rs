//! Application configuration for ragscraper.
//!
//! User config lives at `~/.ragscraper/ragscraper.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{RagScraperError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "ragscraper.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".ragscraper";

/// Number of models returned when the caller gives no limit.
pub const DEFAULT_LIMIT: usize = 20;
/// Smallest accepted limit; lower requests clamp up to it.
pub const MIN_LIMIT: usize = 1;
/// Largest accepted limit; higher requests clamp down to it.
pub const MAX_LIMIT: usize = 100;
/// Size of `top_models` in a context summary.
pub const DEFAULT_TOP_N: usize = 5;
/// Length of the raw preview returned for `partial` scrapes.
pub const DEFAULT_PREVIEW_CHARS: usize = 500;

/// Browser-like User-Agent; some sites refuse obvious bots.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; arm64 Mac OS X 14_5) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125 Safari/537.36";

// ---------------------------------------------------------------------------
// Config structs (matching ragscraper.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Web page fetching.
    #[serde(default)]
    pub scraper: ScraperConfig,

    /// Model catalog access.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Context summary defaults.
    #[serde(default)]
    pub context: ContextConfig,
}

/// `[scraper]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total attempts per fetch.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Base delay between attempts; attempt `n` waits `n * backoff_ms`.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Size of the raw preview used when extraction comes back empty.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            backoff_ms: default_backoff_ms(),
            user_agent: default_user_agent(),
            preview_chars: default_preview_chars(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    20
}
fn default_retries() -> u32 {
    3
}
fn default_backoff_ms() -> u64 {
    2000
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}
fn default_preview_chars() -> usize {
    DEFAULT_PREVIEW_CHARS
}

/// `[catalog]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Base of the model API (`{api_base}` lists, `{api_base}/{id}` details).
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Public listing page harvested for model IDs on enriched fetches.
    #[serde(default = "default_listing_url")]
    pub listing_url: String,

    /// Name of the env var holding an access token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            listing_url: default_listing_url(),
            token_env: default_token_env(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            backoff_ms: default_backoff_ms(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_api_base() -> String {
    "https://huggingface.co/api/models".into()
}
fn default_listing_url() -> String {
    "https://huggingface.co/models?sort=likes".into()
}
fn default_token_env() -> String {
    "HUGGINGFACE_HUB_TOKEN".into()
}

/// `[context]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Limit used when the caller passes none.
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Number of entries in `top_models`.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Candidates requested from the catalog when a topic filter is present.
    #[serde(default = "default_topic_pool")]
    pub topic_pool: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            top_n: default_top_n(),
            topic_pool: default_topic_pool(),
        }
    }
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}
fn default_top_n() -> usize {
    DEFAULT_TOP_N
}
fn default_topic_pool() -> usize {
    MAX_LIMIT
}

/// Clamp a requested limit into `[MIN_LIMIT, MAX_LIMIT]`, using `default` when absent.
pub fn clamp_limit(requested: Option<usize>, default: usize) -> usize {
    requested.unwrap_or(default).clamp(MIN_LIMIT, MAX_LIMIT)
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.ragscraper/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| RagScraperError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.ragscraper/ragscraper.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| RagScraperError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        RagScraperError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| RagScraperError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| RagScraperError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| RagScraperError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the catalog access token from the configured env var, if set and non-empty.
pub fn catalog_token(config: &CatalogConfig) -> Option<String> {
    match std::env::var(&config.token_env) {
        Ok(val) if !val.trim().is_empty() => Some(val.trim().to_string()),
        _ => {
            tracing::debug!(env = %config.token_env, "no catalog token set, using anonymous access");
            None
        }
    }
}
