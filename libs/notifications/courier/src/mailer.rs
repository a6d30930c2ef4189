//! Dispatches an [`Envelope`] to the provider its credentials belong to.
//!
//! One attempt, one provider. Whatever the adapter returns is handed back
//! unchanged; there is no retry and no fallback to another provider.

use crate::credentials::{CredentialRole, CredentialSet, ProviderEntry, ProviderTable};
use crate::envelope::Envelope;
use crate::error::{CourierError, CourierResult};
use crate::platform::Platform;
use crate::provider::{
    EmailProvider, MailgunConfig, MailgunProvider, OutboundEmail, Provider, SendGridConfig,
    SendGridProvider, SendinBlueConfig, SendinBlueProvider, SentEmail, SENDGRID_API_URL,
    SENDINBLUE_API_URL,
};
use crate::sanitize::sanitize_html;
use core_config::{env_or_default, ConfigError, FromEnv};
use reqwest::Client;
use tracing::{error, info, instrument};

/// API base URLs for providers whose endpoint is not part of the credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEndpoints {
    pub sendgrid: String,
    pub sendinblue: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            sendgrid: SENDGRID_API_URL.to_string(),
            sendinblue: SENDINBLUE_API_URL.to_string(),
        }
    }
}

/// Everything the dispatcher needs besides the envelope itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourierConfig {
    pub table: ProviderTable,
    pub endpoints: ProviderEndpoints,
}

impl CourierConfig {
    pub fn new(table: ProviderTable, endpoints: ProviderEndpoints) -> Self {
        Self { table, endpoints }
    }
}

impl FromEnv for CourierConfig {
    /// Standard table; endpoints may be overridden with `SENDGRID_API_URL`
    /// and `SENDINBLUE_API_URL`.
    fn from_env() -> Result<Self, ConfigError> {
        let endpoints = ProviderEndpoints {
            sendgrid: env_or_default("SENDGRID_API_URL", SENDGRID_API_URL),
            sendinblue: env_or_default("SENDINBLUE_API_URL", SENDINBLUE_API_URL),
        };
        Ok(Self::new(ProviderTable::standard(), endpoints))
    }
}

/// Sends envelopes through the matching provider adapter.
#[derive(Debug, Clone, Default)]
pub struct Mailer {
    config: CourierConfig,
    client: Client,
}

impl Mailer {
    pub fn new(config: CourierConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: CourierConfig, client: Client) -> Self {
        Self { config, client }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(CourierConfig::from_env()?))
    }

    pub fn config(&self) -> &CourierConfig {
        &self.config
    }

    /// Send `envelope` with its attached credentials.
    ///
    /// Credential values are read through the provider entry attached to the
    /// envelope; the mailer's own table only decides which platforms may be
    /// dispatched.
    ///
    /// # Errors
    ///
    /// - `NoCredentialsSet` when nothing (or an empty set) is attached
    /// - `UnresolvedPlatform` when the platform is missing from the table
    /// - `MissingCredential` when the set lacks a value the provider needs
    /// - any adapter error, unchanged
    #[instrument(skip_all, fields(platform, to = %envelope.to_addr))]
    pub async fn send(&self, envelope: &Envelope) -> CourierResult<SentEmail> {
        let (entry, credentials) = envelope
            .attached()
            .filter(|(_, credentials)| !credentials.is_empty())
            .ok_or(CourierError::NoCredentialsSet)?;
        let platform = entry.platform;
        tracing::Span::current().record("platform", platform.as_ref());

        if self.config.table.entry(platform).is_none() {
            return Err(CourierError::UnresolvedPlatform(platform.to_string()));
        }

        let email = outbound(envelope, entry, credentials);
        let provider = self.provider(entry, credentials).inspect_err(|e| {
            error!(error = %e, "Envelope credentials are incomplete");
        })?;

        match provider.send(&email).await {
            Ok(sent) => {
                info!(
                    provider = provider.name(),
                    message_id = ?sent.message_id,
                    status = sent.status,
                    "Envelope dispatched"
                );
                Ok(sent)
            }
            Err(e) => {
                error!(provider = provider.name(), error = %e, "Send attempt failed");
                Err(e)
            }
        }
    }

    fn provider(
        &self,
        entry: &ProviderEntry,
        credentials: &CredentialSet,
    ) -> CourierResult<Provider> {
        let value = |role| {
            credentials
                .lookup(entry, role)
                .filter(|value| !value.trim().is_empty())
                .map(str::to_string)
                .ok_or(CourierError::MissingCredential {
                    platform: entry.platform,
                    role,
                })
        };
        let api_key = value(CredentialRole::ApiKey)?;

        Ok(match entry.platform {
            Platform::SendGrid => Provider::SendGrid(SendGridProvider::with_client(
                SendGridConfig::new(api_key).with_api_url(&self.config.endpoints.sendgrid),
                self.client.clone(),
            )),
            Platform::SendinBlue => Provider::SendinBlue(SendinBlueProvider::with_client(
                SendinBlueConfig::new(api_key).with_api_url(&self.config.endpoints.sendinblue),
                self.client.clone(),
            )),
            Platform::Mailgun => Provider::Mailgun(MailgunProvider::with_client(
                MailgunConfig::new(api_key, value(CredentialRole::BaseUrl)?),
                self.client.clone(),
            )),
        })
    }
}

/// Normalise the envelope for an adapter: sanitized HTML and a resolved sender.
fn outbound(
    envelope: &Envelope,
    entry: &ProviderEntry,
    credentials: &CredentialSet,
) -> OutboundEmail {
    let from_email = if envelope.from_addr.trim().is_empty() {
        credentials
            .lookup(entry, CredentialRole::Sender)
            .unwrap_or_default()
            .to_string()
    } else {
        envelope.from_addr.clone()
    };

    let html = sanitize_html(&envelope.html_body);

    OutboundEmail {
        to_email: envelope.to_addr.clone(),
        to_name: envelope.to_name.clone(),
        from_email,
        from_name: envelope.from_name.clone(),
        reply_to_email: envelope.reply_to_addr.clone(),
        reply_to_name: envelope.reply_to_name.clone(),
        subject: envelope.subject.clone(),
        text_body: envelope.text_body.clone(),
        html_body: (!html.trim().is_empty()).then_some(html),
    }
}
