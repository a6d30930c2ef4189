//! Transactional email over third-party delivery APIs.
//!
//! One message, one recipient, one provider. The provider is picked by
//! looking for its credentials in the environment.
//!
//! ## Providers
//!
//! | Platform | Required variables |
//! |----------|--------------------|
//! | SendGrid | `SENDGRID_API_KEY`, `SENDGRID_SENDER` |
//! | SendinBlue | `SENDINBLUE_API_KEY`, `SENDINBLUE_SENDER` |
//! | Mailgun | `MAILGUN_API_KEY`, `MAILGUN_BASE_URL` |
//!
//! When several are configured the first one in the table above wins.
//!
//! `MAILGUN_BASE_URL` is either the domain-scoped API base
//! (`https://api.eu.mailgun.net/v3/mg.example.com`) or a bare sending domain
//! (`mg.example.com`), which is sent through the US endpoint.
//!
//! ## Usage
//!
//! ```ignore
//! use courier::Envelope;
//!
//! let envelope = Envelope::new_transactional()?
//!     .to("Ann", "ann@example.com")
//!     .with_subject("Your receipt")
//!     .with_text("Thanks for your order.");
//!
//! let sent = envelope.send().await?;
//! ```

pub mod credentials;
pub mod envelope;
pub mod error;
pub mod mailer;
pub mod platform;
pub mod provider;
pub mod resolver;
pub mod sanitize;

pub use credentials::{CredentialRole, CredentialSet, ProviderEntry, ProviderTable, RequiredVar};
pub use envelope::Envelope;
pub use error::{CourierError, CourierResult};
pub use mailer::{CourierConfig, Mailer, ProviderEndpoints};
pub use platform::Platform;
pub use provider::{EmailProvider, OutboundEmail, Provider, SentEmail};
pub use resolver::CredentialResolver;
pub use sanitize::sanitize_html;
