//! Doctree CLI Binary
//!
//! Command-line interface for the local project document tree cache.

use anyhow::Context;
use clap::Parser;
use doctree::logging::init_logging;
use doctree::tooling::cli::{load_config, Cli, CliContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logging(Some(&cli.logging_config(&config.logging)))
        .context("Failed to initialize logging")?;

    let context = CliContext::new(&config)
        .await
        .context("Failed to open the node cache")?;
    let output = context.execute(&cli.command).await?;
    println!("{}", output);
    Ok(())
}
