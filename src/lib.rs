//! # astro-relay
//!
//! Recurring job that posts space imagery to a Telegram channel.
//!
//! Every attempt:
//! 1. Collects image URLs from NASA APOD, NASA EPIC (natural color) and a
//!    SpaceX launch gallery, each limited to its configured count
//! 2. Downloads them one by one into a working directory
//! 3. Uploads every file in that directory to the channel
//! 4. Deletes the directory or moves its files into an archive
//! 5. Sleeps for the configured interval
//!
//! ## Quick Start
//!
//! ```no_run
//! use astro_relay::{Config, SpaceRelay};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let relay = SpaceRelay::new(config)?;
//!
//!     let mut events = relay.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     relay.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Working directory cleanup
pub mod disposer;
/// Error types
pub mod error;
/// Image downloads
pub mod fetcher;
/// Channel publishing
pub mod publisher;
/// Attempt loop
pub mod relay;
/// Upstream image feeds
pub mod sources;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{Config, DisposalPolicy};
pub use error::{Error, Result};
pub use fetcher::FileFetcher;
pub use publisher::{Publisher, TelegramPublisher};
pub use relay::SpaceRelay;
pub use sources::{ApodSource, EpicSource, ImageSource, SpaceXSource};
pub use types::{AttemptReport, Event, ImageRef, SourceKind};

/// Resolves when the process is asked to stop
///
/// - **Unix:** SIGTERM or SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** Ctrl+C via `tokio::signal::ctrl_c()`.
#[cfg(unix)]
pub(crate) async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM signal"),
                _ = sigint.recv() => tracing::info!("Received SIGINT signal (Ctrl+C)"),
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C signal, running until an error");
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(not(unix))]
pub(crate) async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal, running until an error");
            std::future::pending::<()>().await;
        }
    }
}
