//! Placeholder publisher for dry runs without credentials

use async_trait::async_trait;
use crosspost_domain::{Platform, PublishContext, PublishError, PublishToken, Publisher};

/// Stands in for a platform whose credentials were not loaded. The
/// orchestrator never calls it in dry-run mode; a real call is an error.
pub struct DisabledPublisher {
    platform: Platform,
}

impl DisabledPublisher {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl Publisher for DisabledPublisher {
    async fn publish(&self, _context: &PublishContext<'_>) -> Result<PublishToken, PublishError> {
        Err(PublishError::Protocol(format!(
            "{} publisher is disabled",
            self.platform.display_name()
        )))
    }

    fn platform(&self) -> Platform {
        self.platform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosspost_domain::{Document, LiveArticle};
    use serde_yaml::Mapping;

    #[tokio::test]
    async fn test_disabled_publisher_refuses() {
        let publisher = DisabledPublisher::new(Platform::Mailchimp);
        let document = Document::new("_articles/a.md", Mapping::new(), "");
        let article = LiveArticle::default();
        let context = PublishContext {
            title: "A",
            description: "B",
            canonical_url: "https://example.org/a",
            article: &article,
            document: &document,
        };

        assert_eq!(publisher.platform(), Platform::Mailchimp);
        assert!(matches!(
            publisher.publish(&context).await,
            Err(PublishError::Protocol(_))
        ));
    }
}
