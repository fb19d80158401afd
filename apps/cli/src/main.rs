//! ragscraper CLI: scrape web pages and summarize model catalogs.
//!
//! A thin boundary over the scrape and context pipelines: parses flags,
//! loads config, and prints results as JSON or plain text.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
