//! CLI command definitions, routing, and tracing setup.

use std::future::Future;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use ragscraper_catalog::HubCatalog;
use ragscraper_core::{ContextOptions, ModelContextBuilder};
use ragscraper_shared::{AppConfig, init_config, load_config};
use ragscraper_web::Scraper;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ragscraper: clean page text and model catalog context for RAG pipelines.
#[derive(Parser)]
#[command(
    name = "ragscraper",
    version,
    about = "Scrape web pages into clean text and summarize model catalogs.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// How a scrape result is printed.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// The full result record.
    Json,
    /// Only the extracted text.
    Text,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch a URL and extract its title and text.
    Scrape {
        /// Absolute URL to scrape.
        url: String,

        /// Output format.
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Summarize catalog models, optionally filtered by topic.
    Context {
        /// Case-insensitive substring matched against name, tags and pipeline tag.
        #[arg(short, long)]
        topic: Option<String>,

        /// Maximum number of models to include (clamped to 1..=100).
        #[arg(short, long)]
        limit: Option<usize>,

        /// Skip per-model detail lookups.
        #[arg(long)]
        no_enrich: bool,
    },

    /// List catalog models without aggregation.
    Models {
        /// Maximum number of models to return (clamped to 1..=100).
        #[arg(short, long)]
        limit: Option<usize>,

        /// Skip per-model detail lookups.
        #[arg(long)]
        no_enrich: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr so stdout stays parseable.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "ragscraper=info",
        1 => "ragscraper=debug",
        _ => "ragscraper=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Scrape { url, format } => cmd_scrape(&url, format).await,
        Command::Context {
            topic,
            limit,
            no_enrich,
        } => cmd_context(topic.as_deref(), limit, !no_enrich).await,
        Command::Models { limit, no_enrich } => cmd_models(limit, !no_enrich).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_scrape(url: &str, format: OutputFormat) -> Result<()> {
    let config = load_config()?;
    let scraper = Scraper::from_config(&config.scraper)?;

    info!(url, "scraping");
    let result = with_spinner(format!("Fetching {url}"), scraper.scrape(url)).await;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => println!("{}", result.to_text()),
    }

    if result.is_failed() {
        return Err(eyre!(
            "failed to scrape {url}: {}",
            result.error.as_deref().unwrap_or("unknown error")
        ));
    }
    Ok(())
}

async fn cmd_context(topic: Option<&str>, limit: Option<usize>, enrich: bool) -> Result<()> {
    let builder = context_builder()?;

    info!(topic = topic.unwrap_or("all"), ?limit, enrich, "building context");
    let summary =
        with_spinner("Fetching model catalog", builder.build(topic, limit, Some(enrich))).await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn cmd_models(limit: Option<usize>, enrich: bool) -> Result<()> {
    let builder = context_builder()?;

    info!(?limit, enrich, "listing models");
    let models =
        with_spinner("Fetching model catalog", builder.list_models(limit, Some(enrich))).await?;

    let output = serde_json::json!({
        "count": models.len(),
        "models": models,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn context_builder() -> Result<ModelContextBuilder<HubCatalog>> {
    let config = load_config()?;
    let catalog = HubCatalog::new(&config.catalog)?;
    Ok(ModelContextBuilder::with_options(
        catalog,
        ContextOptions::from(&config.context),
    ))
}

// ---------------------------------------------------------------------------
// Progress spinner
// ---------------------------------------------------------------------------

/// Show a stderr spinner while `fut` runs.
async fn with_spinner<T>(message: impl Into<String>, fut: impl Future<Output = T>) -> T {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let output = fut.await;
    spinner.finish_and_clear();
    output
}
