//! X API write adapter for publishing article threads

use async_trait::async_trait;
use crosspost_domain::usecases::thread::{article_thread, intro_post};
use crosspost_domain::{Platform, PublishContext, PublishError, PublishToken, Publisher};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::http::{build_client, check_status, client_error};

pub struct XCredentials {
    /// OAuth 2.0 user-context token with `tweet.write`
    pub user_token: SecretString,
}

/// Posts an announcement and threads the article text under it
pub struct XThreadPublisher {
    client: Client,
    credentials: XCredentials,
    base_url: String,
    handle: Option<String>,
    max_chars: usize,
}

impl XThreadPublisher {
    pub fn new(
        credentials: XCredentials,
        handle: Option<String>,
        max_chars: usize,
    ) -> Result<Self, PublishError> {
        Self::with_base_url(
            credentials,
            "https://api.twitter.com".to_string(),
            handle,
            max_chars,
        )
    }

    pub fn with_base_url(
        credentials: XCredentials,
        base_url: String,
        handle: Option<String>,
        max_chars: usize,
    ) -> Result<Self, PublishError> {
        let client = build_client(false).map_err(client_error)?;

        Ok(Self {
            client,
            credentials,
            base_url: base_url.trim_end_matches('/').to_string(),
            handle: handle.filter(|h| !h.trim().is_empty()),
            max_chars,
        })
    }

    fn status_url(&self, id: &str) -> String {
        match &self.handle {
            Some(handle) => format!("https://x.com/{}/status/{}", handle.trim_start_matches('@'), id),
            None => format!("https://x.com/i/status/{}", id),
        }
    }

    /// Create one post, optionally as a reply; returns the new post's ID
    async fn create_post(&self, text: &str, reply_to: Option<&str>) -> Result<String, PublishError> {
        let len = text.chars().count();
        if len > self.max_chars {
            return Err(PublishError::ContentTooLong {
                len,
                max: self.max_chars,
            });
        }

        let request = CreateTweetRequest {
            text,
            reply: reply_to.map(|id| ReplySettings {
                in_reply_to_tweet_id: id,
            }),
        };

        let response = self
            .client
            .post(format!("{}/2/tweets", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.credentials.user_token.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| PublishError::Network(e.to_string()))?;

        let response = check_status(response, "Failed to create post").await?;

        let created: CreateTweetResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Protocol(e.to_string()))?;

        Ok(created.data.id)
    }
}

#[derive(Serialize)]
struct CreateTweetRequest<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<ReplySettings<'a>>,
}

#[derive(Serialize)]
struct ReplySettings<'a> {
    in_reply_to_tweet_id: &'a str,
}

#[derive(Deserialize)]
struct CreateTweetResponse {
    data: TweetData,
}

#[derive(Deserialize)]
struct TweetData {
    id: String,
}

#[async_trait]
impl Publisher for XThreadPublisher {
    async fn publish(&self, context: &PublishContext<'_>) -> Result<PublishToken, PublishError> {
        let intro = intro_post(
            context.title,
            context.description,
            context.canonical_url,
            self.max_chars,
        );
        let root_id = self.create_post(&intro, None).await?;
        let root_url = self.status_url(&root_id);

        // The root post is what gets recorded. A failed reply ends the thread
        // early instead of failing the platform, since a retry would post a
        // duplicate root.
        let thread = article_thread(context.article, self.max_chars);
        let total = thread.len();
        let mut previous = root_id;
        for (index, text) in thread.iter().enumerate() {
            match self.create_post(text, Some(&previous)).await {
                Ok(id) => previous = id,
                Err(e) => {
                    tracing::warn!(
                        root = %root_url,
                        posted = index,
                        total = total,
                        error = %e,
                        "Thread incomplete"
                    );
                    break;
                }
            }
        }

        Ok(PublishToken::Url(root_url))
    }

    fn platform(&self) -> Platform {
        Platform::Twitter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosspost_domain::{Document, LiveArticle};
    use serde_yaml::Mapping;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn publisher(base_url: String, handle: Option<&str>) -> XThreadPublisher {
        XThreadPublisher::with_base_url(
            XCredentials {
                user_token: SecretString::new("test-token".into()),
            },
            base_url,
            handle.map(String::from),
            280,
        )
        .unwrap()
    }

    fn created(id: &str) -> ResponseTemplate {
        ResponseTemplate::new(201).set_body_json(serde_json::json!({ "data": { "id": id } }))
    }

    #[tokio::test]
    async fn test_publish_thread_chains_replies() {
        let mock_server = MockServer::start().await;
        let url = "https://example.org/2020/my-post";

        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(header("Authorization", "Bearer test-token"))
            .and(body_json(serde_json::json!({
                "text": format!("New article: My Post\n\n(Things)\n\n{}", url),
            })))
            .respond_with(created("100"))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(body_json(serde_json::json!({
                "text": "Hello world. [1/2]",
                "reply": { "in_reply_to_tweet_id": "100" }
            })))
            .respond_with(created("101"))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(body_json(serde_json::json!({
                "text": "References:\n\n1: https://rust-lang.org/ [2/2]",
                "reply": { "in_reply_to_tweet_id": "101" }
            })))
            .respond_with(created("102"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let document = Document::new("_articles/2020/my-post.md", Mapping::new(), "");
        let article = LiveArticle {
            html: String::new(),
            text: "Hello world.".to_string(),
            links: vec!["https://rust-lang.org/".to_string()],
        };
        let context = PublishContext {
            title: "My Post",
            description: "Things",
            canonical_url: url,
            article: &article,
            document: &document,
        };

        let token = publisher(mock_server.uri(), Some("@me"))
            .publish(&context)
            .await
            .unwrap();

        assert_eq!(
            token,
            PublishToken::Url("https://x.com/me/status/100".to_string())
        );
    }

    #[tokio::test]
    async fn test_reply_failure_still_returns_root() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(body_json(serde_json::json!({
                "text": "New article: T\n\n(D)\n\nhttps://example.org/t",
            })))
            .respond_with(created("200"))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&mock_server)
            .await;

        let document = Document::new("_articles/t.md", Mapping::new(), "");
        let article = LiveArticle {
            html: String::new(),
            text: "First.\n\nSecond.".to_string(),
            links: vec![],
        };
        let context = PublishContext {
            title: "T",
            description: "D",
            canonical_url: "https://example.org/t",
            article: &article,
            document: &document,
        };

        let token = publisher(mock_server.uri(), None)
            .publish(&context)
            .await
            .unwrap();

        assert_eq!(token, PublishToken::Url("https://x.com/i/status/200".to_string()));
    }

    #[tokio::test]
    async fn test_root_failure_is_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let document = Document::new("_articles/t.md", Mapping::new(), "");
        let article = LiveArticle::default();
        let context = PublishContext {
            title: "T",
            description: "D",
            canonical_url: "https://example.org/t",
            article: &article,
            document: &document,
        };

        let result = publisher(mock_server.uri(), None).publish(&context).await;
        assert!(matches!(result, Err(PublishError::RateLimited)));
    }
}
