//! Live article fetcher
//!
//! Documents are often committed before the site rebuild has published them,
//! so a 404 is read as "not live yet" and retried with backoff. Any other
//! failure status is final.

use async_trait::async_trait;
use crosspost_domain::{ContentFetcher, FetchError, LiveArticle};
use reqwest::{Client, StatusCode, Url};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

use crate::http::build_client;

/// Retry policy for live fetches
#[derive(Debug, Clone)]
pub struct LiveFetchConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Base backoff; retry `n` waits `backoff * 2^(n-1)`
    pub backoff: Duration,
    /// Upper bound for a single wait
    pub max_backoff: Duration,
}

impl Default for LiveFetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(120),
        }
    }
}

/// HTTP fetcher for published articles
pub struct HttpContentFetcher {
    client: Client,
    config: LiveFetchConfig,
}

impl HttpContentFetcher {
    pub fn new(config: LiveFetchConfig) -> Result<Self, FetchError> {
        let client = build_client(false)
            .map_err(|e| FetchError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.config
            .backoff
            .saturating_mul(factor)
            .min(self.config.max_backoff)
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    async fn fetch_live(&self, url: &str) -> Result<LiveArticle, FetchError> {
        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                if attempt < max_attempts {
                    let wait = self.backoff_for(attempt);
                    tracing::info!(
                        url = %url,
                        attempt = attempt,
                        wait_secs = wait.as_secs_f64(),
                        "Article not live yet, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
                continue;
            }

            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            let page_url = response.url().clone();
            let body = response
                .text()
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?;

            return extract_article(&body, &page_url)
                .ok_or_else(|| FetchError::MissingArticle(url.to_string()));
        }

        Err(FetchError::NotFound {
            url: url.to_string(),
            attempts: max_attempts,
        })
    }
}

/// Pull the `<article>` region out of a page
pub fn extract_article(page: &str, page_url: &Url) -> Option<LiveArticle> {
    let document = Html::parse_document(page);
    let article_selector = Selector::parse("article").ok()?;
    let link_selector = Selector::parse("a[href]").ok()?;

    let article = document.select(&article_selector).next()?;

    let links = article
        .select(&link_selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| resolve_link(href, page_url))
        .collect();

    Some(LiveArticle {
        html: article.inner_html(),
        text: article_text(article),
        links,
    })
}

fn article_text(article: ElementRef<'_>) -> String {
    let raw: String = article.text().collect();
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn resolve_link(href: &str, page_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let resolved = page_url.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r##"<html><body>
<nav><a href="/about">About</a></nav>
<article>
  <h1>My Post</h1>
  <p>Read <a href="https://rust-lang.org/">the docs</a> first.</p>
  <p>Then see <a href="/2019/older-post">my older post</a> and <a href="#notes">notes</a>.</p>
  <p>Mail <a href="mailto:me@example.org">me</a>.</p>
</article>
</body></html>"##;

    fn fast_config(max_attempts: u32) -> LiveFetchConfig {
        LiveFetchConfig {
            max_attempts,
            backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_extract_article() {
        let url = Url::parse("https://example.org/2020/my-post").unwrap();
        let article = extract_article(PAGE, &url).unwrap();

        assert_eq!(
            article.links,
            vec![
                "https://rust-lang.org/".to_string(),
                "https://example.org/2019/older-post".to_string(),
            ]
        );
        assert!(article.text.starts_with("My Post\n\nRead the docs first."));
        assert!(!article.text.contains("About"));
        assert!(article.html.contains("<h1>My Post</h1>"));
    }

    #[test]
    fn test_extract_article_missing() {
        let url = Url::parse("https://example.org/").unwrap();
        assert!(extract_article("<html><body><p>Hi</p></body></html>", &url).is_none());
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let fetcher = HttpContentFetcher::new(LiveFetchConfig::default()).unwrap();
        assert_eq!(fetcher.backoff_for(1), Duration::from_secs(1));
        assert_eq!(fetcher.backoff_for(2), Duration::from_secs(2));
        assert_eq!(fetcher.backoff_for(4), Duration::from_secs(8));
        assert_eq!(fetcher.backoff_for(20), Duration::from_secs(120));
    }

    #[tokio::test]
    async fn test_fetch_live_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/2020/my-post"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&mock_server)
            .await;

        let fetcher = HttpContentFetcher::new(fast_config(3)).unwrap();
        let article = fetcher
            .fetch_live(&format!("{}/2020/my-post", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(article.links.len(), 2);
        assert!(article.links[1].ends_with("/2019/older-post"));
    }

    #[tokio::test]
    async fn test_fetch_live_retries_not_found_then_succeeds() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/2020/my-post"))
            .respond_with(ResponseTemplate::new(404))
            .up_to_n_times(2)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/2020/my-post"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&mock_server)
            .await;

        let fetcher = HttpContentFetcher::new(fast_config(5)).unwrap();
        let result = fetcher
            .fetch_live(&format!("{}/2020/my-post", mock_server.uri()))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_live_gives_up_after_max_attempts() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/2020/my-post"))
            .respond_with(ResponseTemplate::new(404))
            .expect(4)
            .mount(&mock_server)
            .await;

        let fetcher = HttpContentFetcher::new(fast_config(4)).unwrap();
        let result = fetcher
            .fetch_live(&format!("{}/2020/my-post", mock_server.uri()))
            .await;

        assert!(matches!(
            result,
            Err(FetchError::NotFound { attempts: 4, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_live_fails_fast_on_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = HttpContentFetcher::new(fast_config(10)).unwrap();
        let result = fetcher
            .fetch_live(&format!("{}/2020/my-post", mock_server.uri()))
            .await;

        assert!(matches!(result, Err(FetchError::Status { status: 500, .. })));
    }
}
