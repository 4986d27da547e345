use anyhow::Result;
use clap::Parser;
use search_publish::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Cluster secrets may live in a local .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "search-publish starting");

    let cli = Cli::parse();
    let result = run(cli).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "search-publish failed");
    }
    result
}
