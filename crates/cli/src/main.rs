//! `crosspost` binary
//!
//! Logs go to stderr so `config show` and `doctor --json` keep stdout clean.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod args;
mod commands;
mod config;

use args::{Cli, Commands};

const DEFAULT_LOG_LEVEL: &str = "info";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL))?;

    let config_path = cli.config;
    match cli.command {
        Commands::Run(args) => commands::run::execute(args, config_path).await,
        Commands::Config(args) => commands::config::execute(args, config_path).await,
        Commands::Doctor(args) => commands::doctor::execute(args, config_path).await,
    }
}

/// `RUST_LOG` wins over `--log-level`
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();

    Ok(())
}
