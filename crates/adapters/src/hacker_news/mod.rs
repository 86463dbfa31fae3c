//! Hacker News submission adapter

mod session;

pub use session::{
    Authenticated, HackerNewsCredentials, SessionError, Submitted, TokenAcquired, Unauthenticated,
};

use async_trait::async_trait;
use crosspost_domain::{Platform, PublishContext, PublishError, PublishToken, Publisher};
use std::time::Duration;

use crate::http::{build_client, client_error};

/// Waits between protocol steps; submitting too quickly after login is
/// rejected as automated
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub before_token: Duration,
    pub before_submit: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            before_token: Duration::from_secs(1),
            before_submit: Duration::from_secs(2),
        }
    }
}

/// Submits the canonical URL as a story
pub struct HackerNewsPublisher {
    credentials: HackerNewsCredentials,
    base_url: String,
    pacing: Pacing,
}

impl HackerNewsPublisher {
    pub fn new(credentials: HackerNewsCredentials) -> Self {
        Self::with_base_url(
            credentials,
            "https://news.ycombinator.com".to_string(),
            Pacing::default(),
        )
    }

    pub fn with_base_url(
        credentials: HackerNewsCredentials,
        base_url: String,
        pacing: Pacing,
    ) -> Self {
        Self {
            credentials,
            base_url,
            pacing,
        }
    }
}

#[async_trait]
impl Publisher for HackerNewsPublisher {
    async fn publish(&self, context: &PublishContext<'_>) -> Result<PublishToken, PublishError> {
        // A new client per submission so every run starts from a clean cookie jar
        let client = build_client(true).map_err(client_error)?;

        let session = Unauthenticated::new(client, self.base_url.as_str())
            .login(&self.credentials)
            .await?;

        tokio::time::sleep(self.pacing.before_token).await;
        let session = session.acquire_token().await?;

        tokio::time::sleep(self.pacing.before_submit).await;
        let submitted = session
            .submit(context.title, context.canonical_url)
            .await?;

        tracing::info!(item_id = %submitted.item_id(), "Submitted to Hacker News");
        Ok(PublishToken::Url(submitted.item_url()))
    }

    fn platform(&self) -> Platform {
        Platform::HackerNews
    }
}
