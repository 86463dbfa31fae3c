//! Shared HTTP client construction

use reqwest::{Client, Response};
use std::time::Duration;

use crosspost_domain::PublishError;

pub(crate) const USER_AGENT: &str = concat!("crosspost/", env!("CARGO_PKG_VERSION"));

pub(crate) fn build_client(cookie_store: bool) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(USER_AGENT)
        .cookie_store(cookie_store)
        .build()
}

pub(crate) fn client_error(error: reqwest::Error) -> PublishError {
    PublishError::Network(format!("Failed to build HTTP client: {}", error))
}

/// Map the common failure statuses of a JSON API response
pub(crate) async fn check_status(response: Response, action: &str) -> Result<Response, PublishError> {
    let status = response.status();

    if status == 401 || status == 403 {
        let body = response.text().await.unwrap_or_default();
        return Err(PublishError::Auth(format!("{}: {}", action, body)));
    }

    if status == 429 {
        return Err(PublishError::RateLimited);
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PublishError::Http {
            status: status.as_u16(),
            message: format!("{}: {}", action, body),
        });
    }

    Ok(response)
}
