//! The platform-neutral email message.

use crate::credentials::{CredentialRole, CredentialSet, ProviderEntry, ProviderTable};
use crate::error::CourierResult;
use crate::mailer::Mailer;
use crate::platform::Platform;
use crate::provider::SentEmail;
use crate::resolver::CredentialResolver;

/// A single transactional email plus the credentials it will be sent with.
///
/// Empty strings mean "unset". The sender address is seeded from the
/// provider's sender variable when there is one. The provider entry the
/// credentials were resolved against travels with them, so their variable
/// names are always read through the table that produced them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    pub to_name: String,
    pub to_addr: String,
    pub from_name: String,
    pub from_addr: String,
    pub reply_to_name: String,
    pub reply_to_addr: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
    credentials: Option<(ProviderEntry, CredentialSet)>,
}

impl Envelope {
    /// Build an envelope for whichever provider is configured in the environment.
    pub fn new_transactional() -> CourierResult<Self> {
        Self::new_transactional_with(&CredentialResolver::default())
    }

    /// Same as [`Envelope::new_transactional`] with a caller-provided resolver.
    pub fn new_transactional_with(resolver: &CredentialResolver) -> CourierResult<Self> {
        let (credentials, platform) = resolver.resolve()?;
        Ok(Self::with_credentials_in(
            resolver.table(),
            credentials,
            platform,
        ))
    }

    /// Build an envelope from explicit credentials, skipping the environment.
    pub fn with_credentials(credentials: CredentialSet, platform: Platform) -> Self {
        Self::with_credentials_in(&ProviderTable::standard(), credentials, platform)
    }

    /// Build an envelope from explicit credentials described by `table`.
    pub fn with_credentials_in(
        table: &ProviderTable,
        credentials: CredentialSet,
        platform: Platform,
    ) -> Self {
        let entry = table
            .entry(platform)
            .cloned()
            .unwrap_or_else(|| ProviderEntry::new(platform, Vec::new()));
        let from_addr = credentials
            .lookup(&entry, CredentialRole::Sender)
            .unwrap_or_default()
            .to_string();

        Self {
            from_addr,
            credentials: Some((entry, credentials)),
            ..Default::default()
        }
    }

    /// Set the recipient.
    pub fn to(mut self, name: impl Into<String>, addr: impl Into<String>) -> Self {
        self.to_name = name.into();
        self.to_addr = addr.into();
        self
    }

    /// Set the sender, replacing the seeded address.
    pub fn from(mut self, name: impl Into<String>, addr: impl Into<String>) -> Self {
        self.from_name = name.into();
        self.from_addr = addr.into();
        self
    }

    /// Set the reply-to address.
    pub fn reply_to(mut self, name: impl Into<String>, addr: impl Into<String>) -> Self {
        self.reply_to_name = name.into();
        self.reply_to_addr = addr.into();
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Set plain text body
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_body = text.into();
        self
    }

    /// Set HTML body
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html_body = html.into();
        self
    }

    /// Attached provider and credentials, if any.
    pub fn credentials(&self) -> Option<(Platform, &CredentialSet)> {
        self.credentials
            .as_ref()
            .map(|(entry, credentials)| (entry.platform, credentials))
    }

    /// The table entry naming the variables in the attached credential set.
    pub fn provider_entry(&self) -> Option<&ProviderEntry> {
        self.credentials.as_ref().map(|(entry, _)| entry)
    }

    pub(crate) fn attached(&self) -> Option<(&ProviderEntry, &CredentialSet)> {
        self.credentials
            .as_ref()
            .map(|(entry, credentials)| (entry, credentials))
    }

    pub fn platform(&self) -> Option<Platform> {
        self.credentials.as_ref().map(|(entry, _)| entry.platform)
    }

    /// Whether a non-empty credential set is attached.
    pub fn has_credentials(&self) -> bool {
        self.credentials
            .as_ref()
            .is_some_and(|(_, credentials)| !credentials.is_empty())
    }

    /// Send through a [`Mailer`] with the default configuration.
    pub async fn send(&self) -> CourierResult<SentEmail> {
        Mailer::default().send(self).await
    }
}
