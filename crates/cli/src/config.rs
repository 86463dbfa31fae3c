//! Configuration loading and management

use anyhow::{Context, Result};
use crosspost_domain::{Platform, SiteConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub site: SiteSection,

    #[serde(default)]
    pub live: LiveConfig,

    #[serde(default)]
    pub dev_to: DevToConfig,

    #[serde(default)]
    pub hacker_news: HackerNewsConfig,

    #[serde(default)]
    pub twitter: TwitterConfig,

    #[serde(default)]
    pub mailchimp: MailchimpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Repository root; document ids are paths relative to it
    #[serde(default = "default_repo_dir")]
    pub repo_dir: PathBuf,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default = "default_document_delay")]
    pub document_delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_collection_dir")]
    pub collection_dir: String,

    #[serde(default = "default_document_suffix")]
    pub document_suffix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    #[serde(default = "default_live_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_live_backoff")]
    pub backoff_secs: u64,

    #[serde(default = "default_live_max_backoff")]
    pub max_backoff_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevToConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_dev_to_api_key_env")]
    pub api_key_env: String,

    #[serde(default)]
    pub series: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HackerNewsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub username: String,

    #[serde(default = "default_hn_password_env")]
    pub password_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwitterConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_x_user_token_env")]
    pub user_token_env: String,

    /// Account handle used to build status URLs
    #[serde(default)]
    pub handle: Option<String>,

    #[serde(default = "default_x_max_chars")]
    pub max_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailchimpConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_mailchimp_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_mailchimp_list_id")]
    pub list_id: String,

    #[serde(default)]
    pub from_name: String,

    #[serde(default)]
    pub reply_to: String,
}

// Default value functions
fn default_repo_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_document_delay() -> u64 {
    10
}

fn default_base_url() -> String {
    "https://example.org/".to_string()
}

fn default_collection_dir() -> String {
    "_articles".to_string()
}

fn default_document_suffix() -> String {
    ".md".to_string()
}

fn default_live_max_attempts() -> u32 {
    10
}

fn default_live_backoff() -> u64 {
    1
}

fn default_live_max_backoff() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

fn default_dev_to_api_key_env() -> String {
    "DEV_TO_API_KEY".to_string()
}

fn default_hn_password_env() -> String {
    "HN_PASSWORD".to_string()
}

fn default_x_user_token_env() -> String {
    "X_USER_TOKEN".to_string()
}

fn default_x_max_chars() -> usize {
    280
}

fn default_mailchimp_api_key_env() -> String {
    "MAILCHIMP_API_KEY".to_string()
}

fn default_mailchimp_list_id() -> String {
    "8853044bbe".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            repo_dir: default_repo_dir(),
            dry_run: false,
            document_delay_secs: default_document_delay(),
        }
    }
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            collection_dir: default_collection_dir(),
            document_suffix: default_document_suffix(),
        }
    }
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_live_max_attempts(),
            backoff_secs: default_live_backoff(),
            max_backoff_secs: default_live_max_backoff(),
        }
    }
}

impl Default for DevToConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key_env: default_dev_to_api_key_env(),
            series: None,
        }
    }
}

impl Default for HackerNewsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            username: String::new(),
            password_env: default_hn_password_env(),
        }
    }
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            user_token_env: default_x_user_token_env(),
            handle: None,
            max_chars: default_x_max_chars(),
        }
    }
}

impl Default for MailchimpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key_env: default_mailchimp_api_key_env(),
            list_id: default_mailchimp_list_id(),
            from_name: String::new(),
            reply_to: String::new(),
        }
    }
}

impl SiteSection {
    pub fn to_site_config(&self) -> SiteConfig {
        SiteConfig {
            base_url: self.base_url.clone(),
            collection_dir: self.collection_dir.clone(),
            document_suffix: self.document_suffix.clone(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./crosspost.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("CROSSPOST")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Whether a platform is switched on in its section
    pub fn is_enabled(&self, platform: Platform) -> bool {
        match platform {
            Platform::DevTo => self.dev_to.enabled,
            Platform::HackerNews => self.hacker_news.enabled,
            Platform::Twitter => self.twitter.enabled,
            Platform::Mailchimp => self.mailchimp.enabled,
        }
    }

    /// Platforms to publish to: the explicit selection when given, else every
    /// enabled platform. Always in publishing order without duplicates.
    pub fn selected_platforms(&self, requested: &[Platform]) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = if requested.is_empty() {
            Platform::ALL
                .into_iter()
                .filter(|p| self.is_enabled(*p))
                .collect()
        } else {
            requested.to_vec()
        };
        platforms.sort();
        platforms.dedup();
        platforms
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# crosspost configuration

[general]
# Repository root; documents are addressed relative to it
repo_dir = "."
dry_run = false
# Pause between documents
document_delay_secs = 10

[site]
base_url = "https://example.org/"
collection_dir = "_articles"
document_suffix = ".md"

[live]
# Retries only while the page returns 404
max_attempts = 10
backoff_secs = 1
max_backoff_secs = 120

[dev_to]
enabled = true
api_key_env = "DEV_TO_API_KEY"
# series = "example.org"

[hacker_news]
enabled = true
username = "your-username"
password_env = "HN_PASSWORD"

[twitter]
enabled = true
user_token_env = "X_USER_TOKEN"
# handle = "your_handle"
max_chars = 280

[mailchimp]
enabled = true
api_key_env = "MAILCHIMP_API_KEY"
list_id = "8853044bbe"
from_name = "Your Name"
reply_to = "blog@example.org"
"#
        .to_string()
    }
}
