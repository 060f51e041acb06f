//! Discord webhook `Notifier`.
//!
//! Posts to the webhook's Slack-compatible endpoint, which accepts the
//! `username` / `text` / `attachments` shape and understands named colours
//! such as `danger`.

use std::time::Duration;

use async_trait::async_trait;
use domains::{DomainError, Notification, Notifier, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use url::Url;

const DISCORD_WEBHOOK_BASE: &str = "https://discord.com/api/webhooks";

pub struct DiscordNotifier {
    client: Client,
    // Contains the webhook token; never log it.
    endpoint: Url,
    rich_attachments: bool,
}

#[derive(Debug, Serialize)]
struct SlackMessage<'a> {
    username: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<SlackAttachment<'a>>,
}

#[derive(Debug, Serialize)]
struct SlackAttachment<'a> {
    color: &'a str,
    title: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumb_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<&'a str>,
}

impl DiscordNotifier {
    pub fn new(
        webhook_id: &str,
        webhook_token: &SecretString,
        rich_attachments: bool,
        timeout: Duration,
    ) -> Result<Self> {
        let endpoint = Url::parse(&format!(
            "{DISCORD_WEBHOOK_BASE}/{webhook_id}/{}/slack",
            webhook_token.expose_secret()
        ))
        .map_err(|_| DomainError::validation("discord webhook id or token is not URL-safe"))?;
        Self::with_endpoint(endpoint, rich_attachments, timeout)
    }

    /// Posts to an arbitrary Slack-compatible endpoint.
    pub fn with_endpoint(endpoint: Url, rich_attachments: bool, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::infrastructure(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            rich_attachments,
        })
    }

    fn message<'a>(&self, notification: &'a Notification) -> SlackMessage<'a> {
        let attachments = if self.rich_attachments {
            vec![SlackAttachment {
                color: notification.colour.as_str(),
                title: &notification.title,
                text: &notification.subtitle,
                thumb_url: notification.thumb_url.as_deref(),
                footer: notification.footer.as_deref(),
            }]
        } else {
            Vec::new()
        };

        SlackMessage {
            username: &notification.username,
            text: &notification.text,
            attachments,
        }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&self.message(notification))
            .send()
            .await
            .map_err(|e| DomainError::Delivery(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::Delivery(format!("webhook responded with {status}")));
        }
        Ok(())
    }
}
