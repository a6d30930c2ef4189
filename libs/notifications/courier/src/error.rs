//! Error types for transactional email delivery.

use crate::credentials::CredentialRole;
use crate::platform::Platform;
use thiserror::Error;

/// Result type for courier operations.
pub type CourierResult<T> = Result<T, CourierError>;

/// Errors that can occur while resolving credentials or sending an envelope.
#[derive(Debug, Error)]
pub enum CourierError {
    /// No provider had its full set of variables in the environment.
    #[error("No complete set of provider credentials found in the environment")]
    NoCredentialsFound,

    /// The envelope was dispatched without attached credentials.
    #[error("No credentials set on envelope (build it with Envelope::new_transactional)")]
    NoCredentialsSet,

    /// The provider is not known to the configured provider table.
    #[error("Platform '{0}' not resolved")]
    UnresolvedPlatform(String),

    /// The attached credential set has no usable value for a role the
    /// provider needs.
    #[error("{platform} credentials have no value for {role:?}")]
    MissingCredential {
        platform: Platform,
        role: CredentialRole,
    },

    /// The provider requires a sender address and none was given.
    #[error("Cannot send via {0} without a sender address")]
    MissingSender(Platform),

    /// The request never produced a usable response.
    #[error("{platform} request failed: {source}")]
    ProviderTransport {
        platform: Platform,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with a non-success status code.
    #[error("{platform} rejected the email with status {status}: {body}")]
    ProviderRejected {
        platform: Platform,
        status: u16,
        /// Provider-assigned id, when the provider created the message anyway.
        message_id: Option<String>,
        body: String,
    },
}

impl CourierError {
    /// Whether the error came from talking to a provider rather than from local setup.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            Self::ProviderTransport { .. } | Self::ProviderRejected { .. }
        )
    }
}
