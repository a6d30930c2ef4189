//! Mailgun email provider implementation.

use super::{mailbox, EmailProvider, OutboundEmail, SentEmail};
use crate::error::{CourierError, CourierResult};
use crate::platform::Platform;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info};

/// Mailgun API base URL, used when only a sending domain is configured.
pub const MAILGUN_API_URL: &str = "https://api.mailgun.net/v3";

/// Mailgun API configuration.
#[derive(Debug, Clone)]
pub struct MailgunConfig {
    pub api_key: String,
    /// Domain-scoped API base, e.g. `https://api.mailgun.net/v3/mg.example.com`,
    /// or just the sending domain (`mg.example.com`) for the US region.
    pub base_url: String,
}

impl MailgunConfig {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

/// Mailgun email provider.
pub struct MailgunProvider {
    config: MailgunConfig,
    client: Client,
}

impl MailgunProvider {
    pub fn new(config: MailgunConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: MailgunConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn messages_url(&self) -> String {
        let base = self.config.base_url.trim().trim_end_matches('/');
        if base.contains("://") {
            format!("{}/messages", base)
        } else {
            format!("{}/{}/messages", MAILGUN_API_URL, base)
        }
    }
}

#[derive(Debug, Deserialize)]
struct MailgunResponse {
    id: Option<String>,
}

fn build_form(email: &OutboundEmail) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("from", mailbox(&email.from_name, &email.from_email)),
        ("to", mailbox(&email.to_name, &email.to_email)),
        ("subject", email.subject.clone()),
        ("text", email.text_body.clone()),
    ];

    if let Some(html) = email.html_body.as_ref().filter(|html| !html.is_empty()) {
        form.push(("html", html.clone()));
    }

    form
}

#[async_trait]
impl EmailProvider for MailgunProvider {
    async fn send(&self, email: &OutboundEmail) -> CourierResult<SentEmail> {
        email.require_sender(Platform::Mailgun)?;
        let form = build_form(email);

        debug!(
            to = %email.to_email,
            subject = %email.subject,
            has_html = email.html_body.is_some(),
            "Sending email via Mailgun"
        );

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth("api", Some(&self.config.api_key))
            .form(&form)
            .send()
            .await
            .map_err(|source| CourierError::ProviderTransport {
                platform: Platform::Mailgun,
                source,
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            error!(
                to = %email.to_email,
                status = %status,
                error = %body,
                "Mailgun API error"
            );
            return Err(CourierError::ProviderRejected {
                platform: Platform::Mailgun,
                status: status.as_u16(),
                message_id: None,
                body,
            });
        }

        let message_id = serde_json::from_str::<MailgunResponse>(&body)
            .ok()
            .and_then(|parsed| parsed.id);

        info!(
            to = %email.to_email,
            message_id = ?message_id,
            "Email sent successfully via Mailgun"
        );

        Ok(SentEmail {
            message_id,
            status: status.as_u16(),
            accepted: true,
        })
    }

    fn name(&self) -> &'static str {
        "mailgun"
    }
}
