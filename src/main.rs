//! astro-relay binary
//!
//! Reads configuration from the environment (and `.env`), then posts space
//! imagery to the configured Telegram channel until stopped.

use astro_relay::{Config, SpaceRelay};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("astro_relay=info")),
        )
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "relay stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> astro_relay::Result<()> {
    let config = Config::from_env()?;
    tracing::info!(
        images_dir = %config.storage.images_dir.display(),
        disposal = ?config.storage.disposal,
        interval_secs = config.schedule.interval.as_secs(),
        apod = config.nasa.apod_count,
        natural = config.nasa.natural_count,
        launch = config.spacex.count,
        launch_number = config.spacex.launch_number,
        "starting astro-relay"
    );

    SpaceRelay::new(config)?.run().await
}
