//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Document, LiveArticle, Platform, PublishContext, PublishToken};

/// Error type for publisher operations
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Protocol error: {0}")]
    Protocol(String),
    #[error("Content too long: {len} > {max}")]
    ContentTooLong { len: usize, max: usize },
}

/// A publish failure attributed to its platform
#[derive(Debug, Error)]
#[error("{platform}: {source}")]
pub struct PlatformError {
    pub platform: Platform,
    #[source]
    pub source: PublishError,
}

/// Port for publishing a document to one platform
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish the document, returning the platform's token for it
    async fn publish(&self, context: &PublishContext<'_>) -> Result<PublishToken, PublishError>;

    /// The platform this publisher targets
    fn platform(&self) -> Platform;
}

/// Error type for document store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid front-matter in {path}: {message}")]
    Parse { path: String, message: String },
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for loading and saving documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<Document, StoreError>;

    async fn save(&self, document: &Document) -> Result<(), StoreError>;
}

/// Error type for live content fetching
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url} still not found after {attempts} attempts")]
    NotFound { url: String, attempts: u32 },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Network error: {0}")]
    Network(String),
    #[error("No article element on {0}")]
    MissingArticle(String),
}

/// Port for fetching the rendered, published version of a document
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Wait until `url` is live and return its article region
    async fn fetch_live(&self, url: &str) -> Result<LiveArticle, FetchError>;
}

/// Error type for change detection
#[derive(Debug, Error)]
pub enum ChangeError {
    #[error("Failed to run {command}: {message}")]
    Command { command: String, message: String },
    #[error("Invalid output: {0}")]
    InvalidOutput(String),
}

/// Port for listing files touched by the most recent change-set
#[async_trait]
pub trait ChangeDetector: Send + Sync {
    async fn changed_paths(&self) -> Result<Vec<String>, ChangeError>;
}
