use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::credentials::Credentials;

/// Persisted cluster options (`cluster.url`, `cluster.port`, `cluster.access_key`,
/// `cluster.access_secret`). Absent values stay empty and may be overridden
/// when publishing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterSettings {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub access_secret: String,
}

impl ClusterSettings {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.url.clone(),
            self.port,
            self.access_key.clone(),
            self.access_secret.clone(),
        )
    }
}

/// Everything a publish needs besides the per-invocation override.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    pub cluster: ClusterSettings,
    pub project_dir: PathBuf,
}

impl PublishConfig {
    pub fn trace_loaded(&self) {
        info!(
            project_dir = %self.project_dir.display(),
            host = %self.cluster.url,
            port = ?self.cluster.port,
            "Loaded PublishConfig"
        );
        debug!(
            access_key_set = !self.cluster.access_key.is_empty(),
            access_secret_set = !self.cluster.access_secret.is_empty(),
            "Cluster credentials presence"
        );
    }
}
