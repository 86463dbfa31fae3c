//! Domain models and value objects

use serde_yaml::{Mapping, Value};
use std::fmt;
use std::str::FromStr;

/// Front-matter key holding the per-platform results
pub const CROSS_POSTS_KEY: &str = "cross_posts";

/// Front-matter fields a document needs before it is cross-posted
pub const REQUIRED_FIELDS: [&str; 3] = ["date", "title", "description"];

/// A target platform.
///
/// Variant order is the publishing order: the newsletter goes last because a
/// sent campaign cannot be taken back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Platform {
    /// dev.to article repost
    DevTo,
    /// Hacker News link submission
    HackerNews,
    /// X (Twitter) thread
    Twitter,
    /// Mailchimp newsletter campaign
    Mailchimp,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::DevTo,
        Platform::HackerNews,
        Platform::Twitter,
        Platform::Mailchimp,
    ];

    /// Key used inside the `cross_posts` mapping
    pub fn key(self) -> &'static str {
        match self {
            Platform::DevTo => "dev_to",
            Platform::HackerNews => "hacker_news",
            Platform::Twitter => "twitter",
            Platform::Mailchimp => "mailchimp",
        }
    }

    /// Top-level key written by older tooling before `cross_posts` existed
    pub fn legacy_key(self) -> &'static str {
        match self {
            Platform::DevTo => "dev_to_url",
            Platform::HackerNews => "hn_url",
            Platform::Twitter => "tweet_url",
            Platform::Mailchimp => "email_campaign_id",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Platform::DevTo => "dev.to",
            Platform::HackerNews => "Hacker News",
            Platform::Twitter => "X",
            Platform::Mailchimp => "Mailchimp",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown platform '{0}' (expected one of: dev_to, hacker_news, twitter, mailchimp)")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "dev_to" | "devto" => Ok(Platform::DevTo),
            "hacker_news" | "hn" => Ok(Platform::HackerNews),
            "twitter" | "x" => Ok(Platform::Twitter),
            "mailchimp" | "email" => Ok(Platform::Mailchimp),
            other => Err(UnknownPlatform(other.to_string())),
        }
    }
}

/// Opaque token returned by a platform after a successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishToken {
    /// Public URL of the created post
    Url(String),
    /// Identifier of a sent newsletter campaign
    CampaignId(String),
}

impl PublishToken {
    pub fn as_str(&self) -> &str {
        match self {
            PublishToken::Url(s) | PublishToken::CampaignId(s) => s,
        }
    }
}

impl fmt::Display for PublishToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A platform's recorded success
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    pub platform: Platform,
    pub token: PublishToken,
}

/// Whether a platform still needs publishing for a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformStatus {
    /// Recorded as complete, with the stored token
    Posted(String),
    Pending,
}

impl PlatformStatus {
    pub fn is_posted(&self) -> bool {
        matches!(self, PlatformStatus::Posted(_))
    }
}

/// A content file: front-matter mapping plus body
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Repository-relative path, e.g. `_articles/2020/my-post.md`
    pub id: String,
    /// Front-matter in file order
    pub metadata: Mapping,
    /// Everything after the closing front-matter delimiter, untouched
    pub body: String,
}

impl Document {
    pub fn new(id: impl Into<String>, metadata: Mapping, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata,
            body: body.into(),
        }
    }

    /// Get a string-valued front-matter field
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.str_field("title")
    }

    pub fn description(&self) -> Option<&str> {
        self.str_field("description")
    }

    /// Required fields that are absent or not strings
    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|key| self.str_field(key).is_none())
            .collect()
    }

    pub fn is_eligible(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Tags from front-matter; non-string entries are ignored
    pub fn tags(&self) -> Vec<String> {
        match self.metadata.get("tags") {
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect(),
            Some(Value::String(single)) => single
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
            _ => vec![],
        }
    }

    /// Look up a platform's status in `cross_posts`, falling back to the
    /// legacy top-level key
    pub fn platform_status(&self, platform: Platform) -> PlatformStatus {
        let recorded = self
            .metadata
            .get(CROSS_POSTS_KEY)
            .and_then(Value::as_mapping)
            .and_then(|posts| posts.get(platform.key()))
            .or_else(|| self.metadata.get(platform.legacy_key()));

        match recorded {
            None | Some(Value::Null) => PlatformStatus::Pending,
            Some(value) => PlatformStatus::Posted(scalar_to_string(value)),
        }
    }

    /// Write a result into `cross_posts`, creating the mapping if needed
    pub fn record(&mut self, result: &PublishResult) {
        let key = Value::String(CROSS_POSTS_KEY.to_string());
        if !matches!(self.metadata.get(&key), Some(Value::Mapping(_))) {
            self.metadata.insert(key.clone(), Value::Mapping(Mapping::new()));
        }

        if let Some(Value::Mapping(posts)) = self.metadata.get_mut(&key) {
            posts.insert(
                Value::String(result.platform.key().to_string()),
                Value::String(result.token.as_str().to_string()),
            );
        }
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

/// Site layout used to map document paths to public URLs
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Public base URL, e.g. `https://example.org/`
    pub base_url: String,
    /// Directory holding managed documents, e.g. `_articles`
    pub collection_dir: String,
    /// Document file suffix, e.g. `.md`
    pub document_suffix: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://example.org/".to_string(),
            collection_dir: "_articles".to_string(),
            document_suffix: ".md".to_string(),
        }
    }
}

impl SiteConfig {
    fn collection_prefix(&self) -> String {
        format!("{}/", self.collection_dir.trim_end_matches('/'))
    }

    /// Whether a repository path is a managed, publishable document.
    ///
    /// Files whose name starts with `_` are drafts or partials.
    pub fn is_managed(&self, path: &str) -> bool {
        let Some(rest) = path.strip_prefix(&self.collection_prefix()) else {
            return false;
        };
        if !rest.ends_with(&self.document_suffix) {
            return false;
        }
        let file_name = rest.rsplit('/').next().unwrap_or(rest);
        !file_name.is_empty() && !file_name.starts_with('_')
    }

    /// Canonical public URL for a document identifier
    pub fn canonical_url(&self, id: &str) -> Option<String> {
        let rest = id.strip_prefix(&self.collection_prefix())?;
        let slug = rest.strip_suffix(&self.document_suffix).unwrap_or(rest);
        if slug.is_empty() {
            return None;
        }
        Some(format!("{}/{}", self.base_url.trim_end_matches('/'), slug))
    }
}

/// The rendered article region of a live page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveArticle {
    /// Inner HTML of the article element
    pub html: String,
    /// Plain text, paragraphs separated by blank lines
    pub text: String,
    /// Absolute outbound links in document order
    pub links: Vec<String>,
}

/// Everything an adapter may need to publish one document
#[derive(Debug, Clone, Copy)]
pub struct PublishContext<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub canonical_url: &'a str,
    pub article: &'a LiveArticle,
    pub document: &'a Document,
}

/// What happened to one platform for one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformStep {
    /// Already recorded before this run
    AlreadyPosted(String),
    /// Published and persisted in this run
    Posted(PublishToken),
    /// Dry run: would have been published
    WouldPublish,
    /// Adapter or persistence failure; stays pending
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformOutcome {
    pub platform: Platform,
    pub step: PlatformStep,
}

/// Processing result for a single document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    /// Missing required front-matter; nothing was attempted
    Ineligible { missing: Vec<&'static str> },
    /// Document-level failure (load, live fetch, persistence)
    Failed {
        error: String,
        platforms: Vec<PlatformOutcome>,
    },
    /// Every platform was visited
    Processed { platforms: Vec<PlatformOutcome> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    pub id: String,
    pub outcome: DocumentOutcome,
}

impl DocumentReport {
    pub fn platforms(&self) -> &[PlatformOutcome] {
        match &self.outcome {
            DocumentOutcome::Ineligible { .. } => &[],
            DocumentOutcome::Failed { platforms, .. } | DocumentOutcome::Processed { platforms } => {
                platforms
            }
        }
    }
}

/// Counts across a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub documents: usize,
    pub ineligible: usize,
    pub failed_documents: usize,
    pub posted: usize,
    pub already_posted: usize,
    pub failed_platforms: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub documents: Vec<DocumentReport>,
}

impl RunReport {
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            documents: self.documents.len(),
            ..Default::default()
        };

        for report in &self.documents {
            match report.outcome {
                DocumentOutcome::Ineligible { .. } => summary.ineligible += 1,
                DocumentOutcome::Failed { .. } => summary.failed_documents += 1,
                DocumentOutcome::Processed { .. } => {}
            }
            for outcome in report.platforms() {
                match outcome.step {
                    PlatformStep::Posted(_) => summary.posted += 1,
                    PlatformStep::AlreadyPosted(_) => summary.already_posted += 1,
                    PlatformStep::Failed(_) => summary.failed_platforms += 1,
                    PlatformStep::WouldPublish => {}
                }
            }
        }

        summary
    }
}
