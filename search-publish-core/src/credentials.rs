//! Credential resolution: persisted configuration merged with an ad-hoc override.

use serde::{Deserialize, Serialize};

/// Everything needed to reach and authenticate against the search cluster.
///
/// Empty strings and a `None` port mean "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub access_secret: String,
}

impl Credentials {
    pub fn new(
        host: impl Into<String>,
        port: Option<u16>,
        access_key: impl Into<String>,
        access_secret: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            access_key: access_key.into(),
            access_secret: access_secret.into(),
        }
    }

    /// Override bundle that only replaces the host.
    pub fn host_override(host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }
}

/// Merges `override_creds` over `persisted`, field by field.
///
/// A field of the override only wins when it is present and non-empty. Neither
/// input is modified; the merged set is a fresh value.
pub fn resolve(persisted: &Credentials, override_creds: Option<&Credentials>) -> Credentials {
    let mut merged = persisted.clone();
    let Some(over) = override_creds else {
        return merged;
    };

    if !over.host.is_empty() {
        merged.host = over.host.clone();
    }
    if !over.access_key.is_empty() {
        merged.access_key = over.access_key.clone();
    }
    if !over.access_secret.is_empty() {
        merged.access_secret = over.access_secret.clone();
    }
    if over.port.is_some() {
        merged.port = over.port;
    }

    tracing::debug!(
        host = %merged.host,
        port = ?merged.port,
        access_key_set = !merged.access_key.is_empty(),
        access_secret_set = !merged.access_secret.is_empty(),
        "Resolved cluster credentials"
    );
    merged
}
