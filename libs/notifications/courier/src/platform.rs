//! Identifiers for the supported delivery providers.

use strum::{AsRefStr, Display, EnumIter, EnumString};

/// A third-party transactional email service.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Platform {
    SendGrid,
    SendinBlue,
    Mailgun,
}

impl Platform {
    /// Every platform, in default resolution priority.
    pub const ALL: [Platform; 3] = [Platform::SendGrid, Platform::SendinBlue, Platform::Mailgun];
}
