//! SendGrid email provider implementation.

use super::{non_empty, EmailProvider, OutboundEmail, SentEmail};
use crate::error::{CourierError, CourierResult};
use crate::platform::Platform;
use crate::sanitize::sanitize_html;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// SendGrid API base URL.
pub const SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3";

/// SendGrid API configuration.
#[derive(Debug, Clone)]
pub struct SendGridConfig {
    /// SendGrid API key.
    pub api_key: String,
    /// SendGrid API base URL (defaults to production).
    pub api_url: String,
}

impl SendGridConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: SENDGRID_API_URL.to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

/// SendGrid email provider.
pub struct SendGridProvider {
    config: SendGridConfig,
    client: Client,
}

impl SendGridProvider {
    pub fn new(config: SendGridConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: SendGridConfig, client: Client) -> Self {
        Self { config, client }
    }
}

// SendGrid API request structures

#[derive(Debug, Serialize)]
struct SendGridRequest {
    personalizations: Vec<Personalization>,
    from: EmailAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<EmailAddress>,
    subject: String,
    content: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Personalization {
    to: Vec<EmailAddress>,
}

#[derive(Debug, Serialize)]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(rename = "type")]
    content_type: String,
    value: String,
}

/// Text rendering used when the email has no HTML body.
///
/// The text is sanitized like any other HTML sent out. Plain text without
/// markup comes through unchanged.
fn fallback_html(text: &str) -> String {
    format!("<html><pre>{}</pre></html>", sanitize_html(text))
}

fn build_request(email: &OutboundEmail) -> SendGridRequest {
    let html = email
        .html_body
        .clone()
        .filter(|html| !html.is_empty())
        .unwrap_or_else(|| fallback_html(&email.text_body));

    SendGridRequest {
        personalizations: vec![Personalization {
            to: vec![EmailAddress {
                email: email.to_email.clone(),
                name: non_empty(&email.to_name),
            }],
        }],
        from: EmailAddress {
            email: email.from_email.clone(),
            name: non_empty(&email.from_name),
        },
        reply_to: non_empty(&email.reply_to_email).map(|addr| EmailAddress {
            email: addr,
            name: non_empty(&email.reply_to_name),
        }),
        subject: email.subject.clone(),
        content: vec![
            Content {
                content_type: "text/plain".to_string(),
                value: email.text_body.clone(),
            },
            Content {
                content_type: "text/html".to_string(),
                value: html,
            },
        ],
    }
}

#[async_trait]
impl EmailProvider for SendGridProvider {
    async fn send(&self, email: &OutboundEmail) -> CourierResult<SentEmail> {
        email.require_sender(Platform::SendGrid)?;
        let request = build_request(email);

        debug!(
            to = %email.to_email,
            subject = %email.subject,
            has_html = email.html_body.is_some(),
            "Sending email via SendGrid"
        );

        let response = self
            .client
            .post(format!("{}/mail/send", self.config.api_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|source| CourierError::ProviderTransport {
                platform: Platform::SendGrid,
                source,
            })?;

        let status = response.status();
        let message_id = response
            .headers()
            .get("x-message-id")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if status == StatusCode::ACCEPTED {
            info!(
                to = %email.to_email,
                message_id = ?message_id,
                "Email was accepted by SendGrid"
            );
            Ok(SentEmail {
                message_id,
                status: status.as_u16(),
                accepted: true,
            })
        } else if status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                to = %email.to_email,
                status = %status,
                body = %body,
                "Email was accepted by SendGrid with an unexpected status"
            );
            Ok(SentEmail {
                message_id,
                status: status.as_u16(),
                accepted: false,
            })
        } else {
            let body = response.text().await.unwrap_or_default();
            error!(
                to = %email.to_email,
                status = %status,
                error = %body,
                "SendGrid API error"
            );
            Err(CourierError::ProviderRejected {
                platform: Platform::SendGrid,
                status: status.as_u16(),
                message_id,
                body,
            })
        }
    }

    fn name(&self) -> &'static str {
        "sendgrid"
    }
}
