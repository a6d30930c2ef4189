//! Provider credential configuration.
//!
//! A [`ProviderTable`] says which environment variables each provider needs;
//! a [`CredentialSet`] holds the values that were found for one provider.

use crate::platform::Platform;
use std::collections::BTreeMap;
use std::fmt;

/// What a variable means within its provider's set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialRole {
    ApiKey,
    Sender,
    BaseUrl,
}

/// One environment variable a provider requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredVar {
    pub role: CredentialRole,
    pub name: String,
}

impl RequiredVar {
    pub fn new(role: CredentialRole, name: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
        }
    }
}

/// The variables that must all be non-empty for a provider to be usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderEntry {
    pub platform: Platform,
    pub vars: Vec<RequiredVar>,
}

impl ProviderEntry {
    pub fn new(platform: Platform, vars: Vec<RequiredVar>) -> Self {
        Self { platform, vars }
    }

    /// Variable name holding `role`, if this provider has one.
    pub fn var_name(&self, role: CredentialRole) -> Option<&str> {
        self.vars
            .iter()
            .find(|var| var.role == role)
            .map(|var| var.name.as_str())
    }
}

/// Immutable provider configuration. Entry order is resolution priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderTable {
    entries: Vec<ProviderEntry>,
}

impl ProviderTable {
    pub fn new(entries: Vec<ProviderEntry>) -> Self {
        Self { entries }
    }

    /// The table for the public provider APIs.
    pub fn standard() -> Self {
        use CredentialRole::*;

        Self::new(vec![
            ProviderEntry::new(
                Platform::SendGrid,
                vec![
                    RequiredVar::new(ApiKey, "SENDGRID_API_KEY"),
                    RequiredVar::new(Sender, "SENDGRID_SENDER"),
                ],
            ),
            ProviderEntry::new(
                Platform::SendinBlue,
                vec![
                    RequiredVar::new(ApiKey, "SENDINBLUE_API_KEY"),
                    RequiredVar::new(Sender, "SENDINBLUE_SENDER"),
                ],
            ),
            ProviderEntry::new(
                Platform::Mailgun,
                vec![
                    RequiredVar::new(ApiKey, "MAILGUN_API_KEY"),
                    RequiredVar::new(BaseUrl, "MAILGUN_BASE_URL"),
                ],
            ),
        ])
    }

    pub fn entries(&self) -> &[ProviderEntry] {
        &self.entries
    }

    pub fn entry(&self, platform: Platform) -> Option<&ProviderEntry> {
        self.entries.iter().find(|entry| entry.platform == platform)
    }

    pub fn var_name(&self, platform: Platform, role: CredentialRole) -> Option<&str> {
        self.entry(platform).and_then(|entry| entry.var_name(role))
    }

    /// A table holding only `platform`'s entry.
    pub fn restricted_to(&self, platform: Platform) -> Self {
        Self::new(self.entry(platform).cloned().into_iter().collect())
    }
}

impl Default for ProviderTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Values for one provider, keyed by environment variable name.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    values: BTreeMap<String, String>,
}

impl CredentialSet {
    pub fn new<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Value of the variable playing `role` in `entry`.
    pub fn lookup(&self, entry: &ProviderEntry, role: CredentialRole) -> Option<&str> {
        entry.var_name(role).and_then(|name| self.get(name))
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

// Values are API keys; only the names are printed.
impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("vars", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}
