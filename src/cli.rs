//! CLI interface for search-publish: command parsing and the async entrypoint.
//!
//! All pipeline logic lives in `search-publish-core`; this module only maps
//! arguments onto a [`PublishRequest`], prints progress, and reports errors.
//! Call [`run`] with a constructed [`Cli`] for programmatic or test use.

use crate::cluster::HttpConnector;
use crate::load_config::load_config;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use search_publish_core::connection;
use search_publish_core::content::ProjectPad;
use search_publish_core::credentials::{resolve, Credentials};
use search_publish_core::publish::{PublishRequest, PublishRun};
use search_publish_core::search::{find, DEFAULT_FIELD};
use std::path::PathBuf;

/// CLI for search-publish: publish site content into a search cluster.
#[derive(Parser)]
#[clap(
    name = "search-publish",
    version,
    about = "Publish a static site's pages as documents into a search cluster, one index per model"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

/// Credential flags; each one overrides the config file when non-empty.
#[derive(Args, Debug, Default, Clone)]
pub struct CredentialArgs {
    /// Cluster host
    #[clap(long)]
    pub host: Option<String>,
    /// Cluster port
    #[clap(long)]
    pub port: Option<u16>,
    /// Access key
    #[clap(long)]
    pub access_key: Option<String>,
    /// Access secret
    #[clap(long)]
    pub access_secret: Option<String>,
}

impl CredentialArgs {
    /// The override bundle, or `None` when no flag was given.
    pub fn to_override(&self) -> Option<Credentials> {
        if self.host.is_none()
            && self.port.is_none()
            && self.access_key.is_none()
            && self.access_secret.is_none()
        {
            return None;
        }
        Some(Credentials::new(
            self.host.clone().unwrap_or_default(),
            self.port,
            self.access_key.clone().unwrap_or_default(),
            self.access_secret.clone().unwrap_or_default(),
        ))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish every page of the site to the cluster
    Publish {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Target locator, e.g. elasticsearch://search.example.com; its host overrides the config
        #[clap(long)]
        target: Option<reqwest::Url>,
        #[clap(flatten)]
        credentials: CredentialArgs,
    },
    /// Run a match query against published documents
    Search {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Text to match
        #[clap(long)]
        text: String,
        /// Field to match against
        #[clap(long, default_value = DEFAULT_FIELD)]
        field: String,
        /// Index to search; all indexes when omitted
        #[clap(long)]
        index: Option<String>,
        #[clap(flatten)]
        credentials: CredentialArgs,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Publish {
            config,
            target,
            credentials,
        } => {
            let config = load_config(config)?;
            tracing::info!(command = "publish", "Starting publish");
            let pad = ProjectPad::open(&config.project_dir)?;
            let request = PublishRequest {
                target,
                credentials: credentials.to_override(),
            };
            let persisted = config.cluster.credentials();
            let connector = HttpConnector;
            let run = PublishRun::new(&connector, &pad, &persisted, request);

            let mut steps = Box::pin(run.into_stream());
            while let Some(step) = steps.next().await {
                match step {
                    Ok(progress) => println!("{progress}"),
                    Err(e) => {
                        tracing::error!(command = "publish", error = %e, "Publish failed");
                        return Err(anyhow::Error::new(e));
                    }
                }
            }
            Ok(())
        }
        Commands::Search {
            config,
            text,
            field,
            index,
            credentials,
        } => {
            let config = load_config(config)?;
            let creds = resolve(&config.cluster.credentials(), credentials.to_override().as_ref());
            let conn = connection::connect(&HttpConnector, &creds)?;

            let result = find(conn.cluster(), &text, Some(&field), index.as_deref()).await;
            if let Err(e) = conn.disconnect().await {
                tracing::warn!(command = "search", error = %e, "Disconnect failed");
            }
            let hits = result?;
            println!("{}", serde_json::to_string_pretty(&hits)?);
            Ok(())
        }
    }
}
