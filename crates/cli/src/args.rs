//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use crosspost_domain::Platform;
use std::path::PathBuf;

/// crosspost: publish newly committed blog articles to other platforms
#[derive(Parser, Debug)]
#[command(name = "crosspost")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cross-post changed documents to every pending platform
    Run(RunArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Documents to process, relative to the repository root. When omitted,
    /// the files changed by the latest commit are used.
    pub documents: Vec<String>,

    /// Log what would be published without calling any platform
    #[arg(long)]
    pub dry_run: bool,

    /// Consider every file changed since this revision instead of only HEAD
    #[arg(long, conflicts_with = "documents")]
    pub since: Option<String>,

    /// Only publish to these platforms (repeatable)
    #[arg(long = "platform", value_name = "PLATFORM")]
    pub platforms: Vec<Platform>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./crosspost.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration after file and environment layering
    Show,
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
