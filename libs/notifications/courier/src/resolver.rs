//! Picks a provider by scanning the environment for its credentials.

use crate::credentials::{CredentialSet, ProviderEntry, ProviderTable};
use crate::error::{CourierError, CourierResult};
use crate::platform::Platform;
use tracing::{debug, warn};

/// Resolves which provider is configured, in table priority order.
#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    table: ProviderTable,
}

impl CredentialResolver {
    pub fn new(table: ProviderTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ProviderTable {
        &self.table
    }

    /// Resolve against the process environment.
    pub fn resolve(&self) -> CourierResult<(CredentialSet, Platform)> {
        self.resolve_with(core_config::env_non_empty)
    }

    /// Resolve against an arbitrary variable source.
    ///
    /// The first entry whose variables are all present and non-blank wins.
    pub fn resolve_with<F>(&self, lookup: F) -> CourierResult<(CredentialSet, Platform)>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let satisfied: Vec<(&ProviderEntry, CredentialSet)> = self
            .table
            .entries()
            .iter()
            .filter_map(|entry| collect_entry(entry, &lookup).map(|creds| (entry, creds)))
            .collect();

        let mut satisfied = satisfied.into_iter();
        let (entry, credentials) = satisfied.next().ok_or(CourierError::NoCredentialsFound)?;

        let ignored: Vec<Platform> = satisfied.map(|(entry, _)| entry.platform).collect();
        if !ignored.is_empty() {
            warn!(
                selected = %entry.platform,
                ignored = ?ignored,
                "Credentials for several providers found, using the highest priority one"
            );
        }

        debug!(platform = %entry.platform, "Resolved provider credentials");
        Ok((credentials, entry.platform))
    }
}

fn collect_entry<F>(entry: &ProviderEntry, lookup: &F) -> Option<CredentialSet>
where
    F: Fn(&str) -> Option<String>,
{
    let mut found = Vec::with_capacity(entry.vars.len());
    let mut complete = true;

    for var in &entry.vars {
        match lookup(&var.name) {
            Some(value) => found.push((var.name.clone(), value)),
            None => {
                debug!(platform = %entry.platform, var = %var.name, "Required variable not set");
                complete = false;
            }
        }
    }

    // An entry with no variables can never be "configured".
    (complete && !found.is_empty()).then(|| CredentialSet::new(found))
}
