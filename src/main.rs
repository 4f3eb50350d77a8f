//! Download every file of a SugarSync account into a local directory.
//!
//! Sync folders are mirrored one at a time, preserving remote folder names
//! and file modification times.

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sugarsync_dl::config::Config;
use sugarsync_dl::mirror::Mirror;
use sugarsync_dl::sugarsync::SugarSyncClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    // Parse configuration
    let config = Config::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting sugarsync-dl");
    tracing::info!("API base URL: {}", config.base_url);

    let output = config.output_dir();
    std::fs::create_dir_all(&output)?;
    tracing::info!("Output directory: {}", output.display());

    let client = SugarSyncClient::new(config.client_config(), config.credentials())?;
    let mirror = Mirror::new(client, config.replace);

    if !mirror.download_all(&output).await {
        tracing::error!("Program terminated with a fatal error");
        return Ok(ExitCode::FAILURE);
    }

    tracing::info!("Successfully downloaded files to {}", output.display());
    Ok(ExitCode::SUCCESS)
}
