//! SendinBlue transactional email provider.
//!
//! Only the text body is transmitted; HTML is left out of this provider's
//! payload entirely.

use super::{non_empty, EmailProvider, OutboundEmail, SentEmail};
use crate::error::{CourierError, CourierResult};
use crate::platform::Platform;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// SendinBlue API base URL.
pub const SENDINBLUE_API_URL: &str = "https://api.sendinblue.com/v3";

/// SendinBlue API configuration.
#[derive(Debug, Clone)]
pub struct SendinBlueConfig {
    pub api_key: String,
    pub api_url: String,
}

impl SendinBlueConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: SENDINBLUE_API_URL.to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

/// SendinBlue email provider.
pub struct SendinBlueProvider {
    config: SendinBlueConfig,
    client: Client,
}

impl SendinBlueProvider {
    pub fn new(config: SendinBlueConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: SendinBlueConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Open the account-scoped session by fetching the account.
    ///
    /// Returns false when the account could not be verified; callers log and
    /// carry on with the send.
    pub async fn verify_account(&self) -> bool {
        let result = self
            .client
            .get(format!("{}/account", self.config.api_url))
            .header("api-key", &self.config.api_key)
            .header("partner-key", &self.config.api_key)
            .send()
            .await;

        match result {
            Ok(response) if response.status() == StatusCode::OK => true,
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                error!(status = %status, body = %body, "SendinBlue account lookup failed");
                false
            }
            Err(e) => {
                error!(error = %e, "SendinBlue account lookup failed");
                false
            }
        }
    }
}

// SendinBlue API request/response structures

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendSmtpEmail {
    sender: Contact,
    to: Vec<Contact>,
    subject: String,
    text_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<Contact>,
}

#[derive(Debug, Serialize)]
struct Contact {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSmtpEmail {
    message_id: Option<String>,
}

fn build_request(email: &OutboundEmail) -> SendSmtpEmail {
    SendSmtpEmail {
        sender: Contact {
            email: email.from_email.clone(),
            name: non_empty(&email.from_name),
        },
        to: vec![Contact {
            email: email.to_email.clone(),
            name: non_empty(&email.to_name),
        }],
        subject: email.subject.clone(),
        text_content: email.text_body.clone(),
        reply_to: non_empty(&email.reply_to_email).map(|addr| Contact {
            email: addr,
            name: non_empty(&email.reply_to_name),
        }),
    }
}

#[async_trait]
impl EmailProvider for SendinBlueProvider {
    async fn send(&self, email: &OutboundEmail) -> CourierResult<SentEmail> {
        email.require_sender(Platform::SendinBlue)?;

        self.verify_account().await;

        let request = build_request(email);

        debug!(
            to = %email.to_email,
            subject = %email.subject,
            has_reply_to = request.reply_to.is_some(),
            "Sending email via SendinBlue"
        );

        let response = self
            .client
            .post(format!("{}/smtp/email", self.config.api_url))
            .header("api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|source| CourierError::ProviderTransport {
                platform: Platform::SendinBlue,
                source,
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message_id = serde_json::from_str::<CreateSmtpEmail>(&body)
            .ok()
            .and_then(|created| created.message_id);

        if status == StatusCode::CREATED {
            info!(
                to = %email.to_email,
                message_id = ?message_id,
                "Email sent successfully via SendinBlue"
            );
            return Ok(SentEmail {
                message_id,
                status: status.as_u16(),
                accepted: true,
            });
        }

        error!(
            to = %email.to_email,
            status = %status,
            message_id = ?message_id,
            error = %body,
            "SendinBlue did not accept the email"
        );
        Err(CourierError::ProviderRejected {
            platform: Platform::SendinBlue,
            status: status.as_u16(),
            message_id,
            body,
        })
    }

    fn name(&self) -> &'static str {
        "sendinblue"
    }
}
