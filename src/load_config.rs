//! `load_config` module: Loads a YAML config file into the core's [`PublishConfig`],
//! filling in secrets from the environment.
//!
//! # Responsibilities
//! - Parse the user-supplied YAML into type-safe structs
//! - Take `access_key` / `access_secret` from `SEARCH_ACCESS_KEY` / `SEARCH_ACCESS_SECRET`
//!   when the file leaves them out, so secrets can stay out of the file
//! - Leave every other absent option empty: the publish-time override may still supply it
//!
//! # Errors
//! All errors use `anyhow::Error` and are surfaced at the CLI boundary.
//!
//! Accepted schema:
//!
//! ```yaml
//! cluster:
//!   url: search.example.com
//!   port: 9243
//!   access_key: key
//!   access_secret: secret
//! project:
//!   path: ./site
//! ```

use anyhow::Result;
use search_publish_core::config::{ClusterSettings, PublishConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const ACCESS_KEY_ENV: &str = "SEARCH_ACCESS_KEY";
pub const ACCESS_SECRET_ENV: &str = "SEARCH_ACCESS_SECRET";

#[derive(Debug, Deserialize)]
pub struct ProjectSection {
    #[serde(default = "default_project_path")]
    pub path: PathBuf,
}

impl Default for ProjectSection {
    fn default() -> Self {
        ProjectSection {
            path: default_project_path(),
        }
    }
}

fn default_project_path() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    cluster: ClusterSettings,
    #[serde(default)]
    project: ProjectSection,
}

fn secret_from_env(current: &mut String, var: &str) {
    if !current.is_empty() {
        return;
    }
    if let Ok(value) = std::env::var(var) {
        info!(var, "Credential taken from environment");
        *current = value;
    }
}

/// Loads a YAML config file and injects secrets from the environment.
/// Relative project paths are resolved against the config file's directory.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PublishConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let mut cluster = raw.cluster;
    secret_from_env(&mut cluster.access_key, ACCESS_KEY_ENV);
    secret_from_env(&mut cluster.access_secret, ACCESS_SECRET_ENV);

    let project_dir = if raw.project.path.is_absolute() {
        raw.project.path
    } else {
        path_ref
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(raw.project.path)
    };

    let config = PublishConfig {
        cluster,
        project_dir,
    };
    config.trace_loaded();
    Ok(config)
}
