//! dev.to article repost adapter

use async_trait::async_trait;
use crosspost_domain::{Platform, PublishContext, PublishError, PublishToken, Publisher};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::http::{build_client, check_status, client_error};

/// dev.to accepts at most four tags per article
const MAX_TAGS: usize = 4;

pub struct DevToCredentials {
    pub api_key: SecretString,
}

/// Publishes the full article body to dev.to with a canonical link back
pub struct DevToPublisher {
    client: Client,
    credentials: DevToCredentials,
    base_url: String,
    series: Option<String>,
}

impl DevToPublisher {
    pub fn new(credentials: DevToCredentials, series: Option<String>) -> Result<Self, PublishError> {
        Self::with_base_url(credentials, "https://dev.to".to_string(), series)
    }

    pub fn with_base_url(
        credentials: DevToCredentials,
        base_url: String,
        series: Option<String>,
    ) -> Result<Self, PublishError> {
        let client = build_client(false).map_err(client_error)?;

        Ok(Self {
            client,
            credentials,
            base_url: base_url.trim_end_matches('/').to_string(),
            series,
        })
    }
}

#[derive(Serialize)]
struct CreateArticleRequest<'a> {
    article: ArticleBody<'a>,
}

#[derive(Serialize)]
struct ArticleBody<'a> {
    title: &'a str,
    tags: Vec<String>,
    published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    series: Option<&'a str>,
    canonical_url: &'a str,
    body_markdown: String,
}

#[derive(Deserialize)]
struct CreateArticleResponse {
    url: String,
}

/// Attribution line placed above the reposted body
pub fn attribution(canonical_url: &str) -> String {
    format!(
        "<p><em><small>Originally published <a href=\"{}\">on my blog</a>.</small></em></p>",
        canonical_url
    )
}

#[async_trait]
impl Publisher for DevToPublisher {
    async fn publish(&self, context: &PublishContext<'_>) -> Result<PublishToken, PublishError> {
        let mut tags = context.document.tags();
        tags.truncate(MAX_TAGS);

        let request = CreateArticleRequest {
            article: ArticleBody {
                title: context.title,
                tags,
                published: true,
                series: self.series.as_deref(),
                canonical_url: context.canonical_url,
                body_markdown: format!(
                    "{}\n\n{}",
                    attribution(context.canonical_url),
                    context.document.body.trim_start()
                ),
            },
        };

        let response = self
            .client
            .post(format!("{}/api/articles", self.base_url))
            .header("api-key", self.credentials.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| PublishError::Network(e.to_string()))?;

        let response = check_status(response, "Failed to create dev.to article").await?;

        let created: CreateArticleResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Protocol(e.to_string()))?;

        Ok(PublishToken::Url(created.url))
    }

    fn platform(&self) -> Platform {
        Platform::DevTo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosspost_domain::{Document, LiveArticle};
    use serde_yaml::Mapping;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_document() -> Document {
        let metadata: Mapping = serde_yaml::from_str(
            "title: My Post\ndescription: Things\ndate: 2020-01-01\ntags: [rust, web, cli, async, extra]\n",
        )
        .unwrap();
        Document::new("_articles/2020/my-post.md", metadata, "\nHello *world*.\n")
    }

    fn publisher(base_url: String) -> DevToPublisher {
        DevToPublisher::with_base_url(
            DevToCredentials {
                api_key: SecretString::new("test-key".into()),
            },
            base_url,
            Some("example.org".to_string()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_publish_success() {
        let mock_server = MockServer::start().await;
        let document = sample_document();
        let article = LiveArticle::default();
        let url = "https://example.org/2020/my-post";

        Mock::given(method("POST"))
            .and(path("/api/articles"))
            .and(header("api-key", "test-key"))
            .and(body_json(serde_json::json!({
                "article": {
                    "title": "My Post",
                    "tags": ["rust", "web", "cli", "async"],
                    "published": true,
                    "series": "example.org",
                    "canonical_url": url,
                    "body_markdown": format!("{}\n\nHello *world*.\n", attribution(url)),
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": 42,
                "url": "https://dev.to/me/my-post-1a2b"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let context = PublishContext {
            title: "My Post",
            description: "Things",
            canonical_url: url,
            article: &article,
            document: &document,
        };

        let token = publisher(mock_server.uri()).publish(&context).await.unwrap();

        assert_eq!(
            token,
            PublishToken::Url("https://dev.to/me/my-post-1a2b".to_string())
        );
    }

    #[tokio::test]
    async fn test_publish_unauthorized() {
        let mock_server = MockServer::start().await;
        let document = sample_document();
        let article = LiveArticle::default();

        Mock::given(method("POST"))
            .and(path("/api/articles"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&mock_server)
            .await;

        let context = PublishContext {
            title: "My Post",
            description: "Things",
            canonical_url: "https://example.org/2020/my-post",
            article: &article,
            document: &document,
        };

        let result = publisher(mock_server.uri()).publish(&context).await;
        assert!(matches!(result, Err(PublishError::Auth(_))));
    }

    #[tokio::test]
    async fn test_publish_unprocessable() {
        let mock_server = MockServer::start().await;
        let document = sample_document();
        let article = LiveArticle::default();

        Mock::given(method("POST"))
            .and(path("/api/articles"))
            .respond_with(ResponseTemplate::new(422).set_body_string("Title has already been used"))
            .mount(&mock_server)
            .await;

        let context = PublishContext {
            title: "My Post",
            description: "Things",
            canonical_url: "https://example.org/2020/my-post",
            article: &article,
            document: &document,
        };

        let result = publisher(mock_server.uri()).publish(&context).await;
        match result {
            Err(PublishError::Http { status, message }) => {
                assert_eq!(status, 422);
                assert!(message.contains("already been used"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
