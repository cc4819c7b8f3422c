//! songlib-api - song catalog HTTP service
//!
//! Stores songs in a relational table and enriches new entries with release
//! date, lyrics and link from an external lookup service.
//!
//! Startup order: `.env` → tracing → config → database connect → migrations
//! → listen. Any startup failure exits with an error.

use anyhow::{Context, Result};
use clap::Parser;
use songlib_api::cli::Cli;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine; real environment variables still apply
    let dotenv_path = dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting SongLib API (songlib-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if let Some(path) = dotenv_path {
        info!("Loaded environment from {}", path.display());
    }

    let cli = Cli::parse();
    let config = cli.resolve().context("Invalid configuration")?;
    info!("Database: {}", config.database.describe());

    songlib_api::run(config).await
}
