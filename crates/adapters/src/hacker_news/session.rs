//! Hacker News submission session
//!
//! Submitting is a cookie-session form protocol. Each step is a separate
//! state type so a later step can only be reached through the earlier ones:
//! `Unauthenticated -> Authenticated -> TokenAcquired -> Submitted`.

use reqwest::{Client, Response};
use scraper::{Html, Selector};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crosspost_domain::PublishError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Bad login for user {0}")]
    BadLogin(String),
    #[error("{step} request failed: {message}")]
    Network { step: &'static str, message: String },
    #[error("{step} returned HTTP {status}")]
    Status { step: &'static str, status: u16 },
    #[error("No fnid token in the submit form")]
    TokenMissing,
    #[error("Could not find the submitted item in the response page")]
    ItemNotFound,
}

impl From<SessionError> for PublishError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::BadLogin(_) => PublishError::Auth(error.to_string()),
            SessionError::Network { .. } => PublishError::Network(error.to_string()),
            SessionError::Status { status, .. } => PublishError::Http {
                status,
                message: error.to_string(),
            },
            SessionError::TokenMissing | SessionError::ItemNotFound => {
                PublishError::Protocol(error.to_string())
            }
        }
    }
}

pub struct HackerNewsCredentials {
    pub username: String,
    pub password: SecretString,
}

/// Fresh session with an empty cookie jar
pub struct Unauthenticated {
    client: Client,
    base_url: String,
}

/// Logged in; the client holds the session cookie
pub struct Authenticated {
    client: Client,
    base_url: String,
}

/// Holds the one-time `fnid` token from the submit form
pub struct TokenAcquired {
    client: Client,
    base_url: String,
    fnid: String,
}

/// The story was accepted
pub struct Submitted {
    base_url: String,
    item_id: String,
}

impl Unauthenticated {
    /// `client` must have a cookie store enabled
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn login(
        self,
        credentials: &HackerNewsCredentials,
    ) -> Result<Authenticated, SessionError> {
        let step = "login";
        let response = self
            .client
            .post(format!("{}/login", self.base_url))
            .form(&[
                ("acct", credentials.username.as_str()),
                ("pw", credentials.password.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| network(step, e))?;

        let page = page_text(response, step).await?;
        if page.contains("Bad login.") {
            return Err(SessionError::BadLogin(credentials.username.clone()));
        }

        tracing::debug!(user = %credentials.username, "Logged in to Hacker News");
        Ok(Authenticated {
            client: self.client,
            base_url: self.base_url,
        })
    }
}

impl Authenticated {
    pub async fn acquire_token(self) -> Result<TokenAcquired, SessionError> {
        let step = "submit form";
        let response = self
            .client
            .get(format!("{}/submit", self.base_url))
            .send()
            .await
            .map_err(|e| network(step, e))?;

        let page = page_text(response, step).await?;
        let fnid = extract_fnid(&page).ok_or(SessionError::TokenMissing)?;

        tracing::debug!("Extracted fnid from submit form");
        Ok(TokenAcquired {
            client: self.client,
            base_url: self.base_url,
            fnid,
        })
    }
}

impl TokenAcquired {
    pub fn fnid(&self) -> &str {
        &self.fnid
    }

    pub async fn submit(self, title: &str, url: &str) -> Result<Submitted, SessionError> {
        let step = "submission";
        let response = self
            .client
            .post(format!("{}/r", self.base_url))
            .form(&[("title", title), ("url", url), ("fnid", self.fnid.as_str())])
            .send()
            .await
            .map_err(|e| network(step, e))?;

        let page = page_text(response, step).await?;
        let item_id = extract_item_id(&page).ok_or(SessionError::ItemNotFound)?;

        Ok(Submitted {
            base_url: self.base_url,
            item_id,
        })
    }
}

impl Submitted {
    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn item_url(&self) -> String {
        format!("{}/item?id={}", self.base_url, self.item_id)
    }
}

fn network(step: &'static str, error: reqwest::Error) -> SessionError {
    SessionError::Network {
        step,
        message: error.to_string(),
    }
}

async fn page_text(response: Response, step: &'static str) -> Result<String, SessionError> {
    let status = response.status();
    if !status.is_success() {
        return Err(SessionError::Status {
            step,
            status: status.as_u16(),
        });
    }
    response.text().await.map_err(|e| network(step, e))
}

fn extract_fnid(page: &str) -> Option<String> {
    let document = Html::parse_document(page);
    let selector = Selector::parse(r#"input[name="fnid"]"#).ok()?;
    document
        .select(&selector)
        .find_map(|input| input.value().attr("value"))
        .filter(|value| !value.is_empty())
        .map(String::from)
}

/// Find the id of the newest item on the page the submission redirects to.
///
/// This depends on the listing markup: the first `discuss` link in a
/// `td.subtext` cell belongs to the story just submitted.
fn extract_item_id(page: &str) -> Option<String> {
    let document = Html::parse_document(page);
    let selector = Selector::parse("td.subtext a[href]").ok()?;
    document
        .select(&selector)
        .filter(|anchor| anchor.text().collect::<String>().contains("discuss"))
        .find_map(|anchor| anchor.value().attr("href"))
        .and_then(|href| href.strip_prefix("item?id="))
        .map(String::from)
}
