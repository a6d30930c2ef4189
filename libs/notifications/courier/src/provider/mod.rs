//! Email provider implementations.
//!
//! Each adapter maps an [`OutboundEmail`] onto one vendor's HTTP API.
//! [`Provider`] is the closed set of adapters the dispatcher chooses from.

mod mailgun;
mod sendgrid;
mod sendinblue;

pub use mailgun::{MailgunConfig, MailgunProvider, MAILGUN_API_URL};
pub use sendgrid::{SendGridConfig, SendGridProvider, SENDGRID_API_URL};
pub use sendinblue::{SendinBlueConfig, SendinBlueProvider, SENDINBLUE_API_URL};

use crate::error::{CourierError, CourierResult};
use crate::platform::Platform;
use async_trait::async_trait;

/// Outcome of a send the provider accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    /// Provider-specific message ID for tracking.
    pub message_id: Option<String>,
    /// HTTP status the provider answered with.
    pub status: u16,
    /// False when the provider took the message but signalled a warning.
    pub accepted: bool,
}

/// A single-recipient message ready for a provider.
///
/// The HTML body has already been sanitized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to_email: String,
    pub to_name: String,
    pub from_email: String,
    pub from_name: String,
    pub reply_to_email: String,
    pub reply_to_name: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
}

impl OutboundEmail {
    pub(crate) fn require_sender(&self, platform: Platform) -> CourierResult<()> {
        if self.from_email.trim().is_empty() {
            return Err(CourierError::MissingSender(platform));
        }
        Ok(())
    }
}

/// Trait for email sending providers.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Send one email. Exactly one delivery request is made.
    async fn send(&self, email: &OutboundEmail) -> CourierResult<SentEmail>;

    /// Get the provider name for logging.
    fn name(&self) -> &'static str;
}

/// One adapter per supported platform.
pub enum Provider {
    SendGrid(SendGridProvider),
    SendinBlue(SendinBlueProvider),
    Mailgun(MailgunProvider),
}

impl Provider {
    pub fn platform(&self) -> Platform {
        match self {
            Self::SendGrid(_) => Platform::SendGrid,
            Self::SendinBlue(_) => Platform::SendinBlue,
            Self::Mailgun(_) => Platform::Mailgun,
        }
    }
}

#[async_trait]
impl EmailProvider for Provider {
    async fn send(&self, email: &OutboundEmail) -> CourierResult<SentEmail> {
        match self {
            Self::SendGrid(provider) => provider.send(email).await,
            Self::SendinBlue(provider) => provider.send(email).await,
            Self::Mailgun(provider) => provider.send(email).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::SendGrid(provider) => provider.name(),
            Self::SendinBlue(provider) => provider.name(),
            Self::Mailgun(provider) => provider.name(),
        }
    }
}

/// `Name <addr>`, or just the address when there is no name.
pub(crate) fn mailbox(name: &str, email: &str) -> String {
    if name.trim().is_empty() {
        email.to_string()
    } else {
        format!("{} <{}>", name, email)
    }
}

/// `None` for blank strings.
pub(crate) fn non_empty(value: &str) -> Option<String> {
    (!value.trim().is_empty()).then(|| value.to_string())
}
