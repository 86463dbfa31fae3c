//! Config command - configuration management

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::args::{ConfigArgs, ConfigCommands};
use crate::config::AppConfig;

pub async fn execute(args: ConfigArgs, config_path: Option<PathBuf>) -> Result<()> {
    match args.command {
        ConfigCommands::Init { path, force } => init_config(path, force).await,
        ConfigCommands::Show => show_config(config_path),
    }
}

async fn init_config(path: PathBuf, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            path.display()
        );
    }

    let content = AppConfig::example_toml();

    // Create parent directories if needed
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    fs::write(&path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;

    println!("Created config file: {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set your site URL and account names in the config file");
    println!("  2. Export the API keys named by the *_env settings");
    println!("  3. Run 'crosspost doctor' to validate your setup");
    println!("  4. Run 'crosspost run --dry-run' to test");

    Ok(())
}

fn show_config(config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    print!("{}", config.to_toml()?);
    Ok(())
}
