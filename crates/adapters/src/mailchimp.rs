//! Mailchimp newsletter adapter
//!
//! Sending is three calls: create a template holding the email HTML, create
//! a campaign for the list that uses it, then trigger the send.

use async_trait::async_trait;
use crosspost_domain::{Platform, PublishContext, PublishError, PublishToken, Publisher};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::http::{build_client, check_status, client_error};

pub const DEFAULT_LIST_ID: &str = "8853044bbe";

pub struct MailchimpCredentials {
    /// API key in `<key>-<datacenter>` form
    pub api_key: SecretString,
}

#[derive(Debug, Clone)]
pub struct MailchimpSettings {
    pub list_id: String,
    pub from_name: String,
    pub reply_to: String,
    pub template_name: String,
}

impl Default for MailchimpSettings {
    fn default() -> Self {
        Self {
            list_id: DEFAULT_LIST_ID.to_string(),
            from_name: String::new(),
            reply_to: String::new(),
            template_name: "Today's template".to_string(),
        }
    }
}

/// Emails an announcement of the article to a mailing list
pub struct MailchimpPublisher {
    client: Client,
    credentials: MailchimpCredentials,
    base_url: String,
    settings: MailchimpSettings,
}

impl MailchimpPublisher {
    /// The API host is taken from the datacenter suffix of the key
    pub fn new(
        credentials: MailchimpCredentials,
        settings: MailchimpSettings,
    ) -> Result<Self, PublishError> {
        let datacenter = datacenter(credentials.api_key.expose_secret()).ok_or_else(|| {
            PublishError::Auth("Mailchimp API key has no datacenter suffix".to_string())
        })?;
        let base_url = format!("https://{}.api.mailchimp.com/3.0", datacenter);
        Self::with_base_url(credentials, base_url, settings)
    }

    pub fn with_base_url(
        credentials: MailchimpCredentials,
        base_url: String,
        settings: MailchimpSettings,
    ) -> Result<Self, PublishError> {
        let client = build_client(false).map_err(client_error)?;

        Ok(Self {
            client,
            credentials,
            base_url: base_url.trim_end_matches('/').to_string(),
            settings,
        })
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        action: &str,
    ) -> Result<reqwest::Response, PublishError> {
        let mut request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .basic_auth("crosspost", Some(self.credentials.api_key.expose_secret()));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PublishError::Network(e.to_string()))?;

        check_status(response, action).await
    }
}

fn datacenter(api_key: &str) -> Option<&str> {
    api_key
        .rsplit_once('-')
        .map(|(_, dc)| dc)
        .filter(|dc| !dc.is_empty())
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// HTML body of the announcement email
pub fn render_email(title: &str, description: &str, url: &str) -> String {
    let link_text = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);

    format!(
        concat!(
            "<big style=\"font-family: 'dejavu Sans light', sans-serif\">",
            "<p>I wrote a new post:</p>",
            "<blockquote style=\"margin-left: 0; padding-left: 1em; border-left: 1px solid lightgrey; font-style: italic; font-size: 1.3em\">",
            "<p><strong>{title}</strong></p>",
            "<p>{description}</p>",
            "</blockquote>",
            "<p>Read it at <a href=\"{url}\">{link}</a></p>",
            "</big>"
        ),
        title = escape_html(title),
        description = escape_html(description),
        url = escape_html(url),
        link = escape_html(link_text),
    )
}

#[derive(Serialize)]
struct TemplateRequest<'a> {
    name: &'a str,
    html: String,
}

#[derive(Deserialize)]
struct TemplateResponse {
    id: u64,
}

#[derive(Serialize)]
struct CampaignRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    recipients: Recipients<'a>,
    settings: CampaignSettings<'a>,
}

#[derive(Serialize)]
struct Recipients<'a> {
    list_id: &'a str,
}

#[derive(Serialize)]
struct CampaignSettings<'a> {
    subject_line: &'a str,
    preview_text: &'a str,
    title: &'a str,
    from_name: &'a str,
    reply_to: &'a str,
    auto_footer: bool,
    template_id: u64,
}

#[derive(Deserialize)]
struct CampaignResponse {
    id: String,
}

#[async_trait]
impl Publisher for MailchimpPublisher {
    async fn publish(&self, context: &PublishContext<'_>) -> Result<PublishToken, PublishError> {
        let template = TemplateRequest {
            name: &self.settings.template_name,
            html: render_email(context.title, context.description, context.canonical_url),
        };
        let template: TemplateResponse = self
            .post("/templates", Some(&template), "Failed to create template")
            .await?
            .json()
            .await
            .map_err(|e| PublishError::Protocol(e.to_string()))?;

        let campaign = CampaignRequest {
            kind: "regular",
            recipients: Recipients {
                list_id: &self.settings.list_id,
            },
            settings: CampaignSettings {
                subject_line: context.title,
                preview_text: context.description,
                title: context.title,
                from_name: &self.settings.from_name,
                reply_to: &self.settings.reply_to,
                auto_footer: false,
                template_id: template.id,
            },
        };
        let campaign: CampaignResponse = self
            .post("/campaigns", Some(&campaign), "Failed to create campaign")
            .await?
            .json()
            .await
            .map_err(|e| PublishError::Protocol(e.to_string()))?;

        self.post::<()>(
            &format!("/campaigns/{}/actions/send", campaign.id),
            None,
            "Failed to send campaign",
        )
        .await?;

        tracing::info!(campaign_id = %campaign.id, list_id = %self.settings.list_id, "Sent campaign");
        Ok(PublishToken::CampaignId(campaign.id))
    }

    fn platform(&self) -> Platform {
        Platform::Mailchimp
    }
}
