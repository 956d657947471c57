//! The fetch → download → publish → dispose loop
//!
//! [`SpaceRelay`] owns one instance of every component and runs attempts
//! strictly one after another on the calling task. Nothing inside an attempt
//! runs concurrently; the only race is between the inter-attempt sleep and the
//! shutdown signal.
//!
//! # Example
//!
//! ```no_run
//! use astro_relay::{Config, SpaceRelay};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let relay = SpaceRelay::new(config)?;
//!
//! // Runs until SIGINT/SIGTERM or the first error
//! relay.run().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::disposer;
use crate::error::Result;
use crate::fetcher::FileFetcher;
use crate::publisher::{Publisher, TelegramPublisher, publish_directory};
use crate::sources::{ApodSource, EpicSource, ImageSource, SpaceXSource};
use crate::types::{AttemptReport, Event, ImageRef, SourceKind};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{debug, info};

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Recurring space-imagery relay
pub struct SpaceRelay {
    /// Immutable run configuration
    config: Arc<Config>,

    /// Feeds queried on every attempt, in order
    sources: Vec<Box<dyn ImageSource>>,

    /// Downloads image references into the working directory
    fetcher: FileFetcher,

    /// Channel the images are posted to
    publisher: Arc<dyn Publisher>,

    /// Progress notifications
    event_tx: broadcast::Sender<Event>,
}

impl SpaceRelay {
    /// Build a relay with the APOD, EPIC and SpaceX feeds and a Telegram
    /// publisher, all sharing one HTTP client
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("astro-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let sources: Vec<Box<dyn ImageSource>> = vec![
            Box::new(ApodSource::new(http_client.clone(), &config.nasa)),
            Box::new(EpicSource::new(http_client.clone(), &config.nasa)),
            Box::new(SpaceXSource::new(http_client.clone(), &config.spacex)),
        ];
        let publisher = Arc::new(TelegramPublisher::new(
            http_client.clone(),
            &config.telegram,
        ));

        Ok(Self::with_components(
            Arc::new(config),
            sources,
            FileFetcher::new(http_client),
            publisher,
        ))
    }

    /// Build a relay from explicit parts
    pub fn with_components(
        config: Arc<Config>,
        sources: Vec<Box<dyn ImageSource>>,
        fetcher: FileFetcher,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            sources,
            fetcher,
            publisher,
            event_tx,
        }
    }

    /// Replace the publisher (e.g. to post somewhere other than Telegram)
    pub fn with_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Subscribe to progress events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The configuration this relay was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run attempts until SIGINT/SIGTERM arrives or an attempt fails
    ///
    /// Signal handlers are armed before the first attempt. A signal received
    /// during an attempt takes effect once the attempt and its disposal have
    /// finished.
    pub async fn run(&self) -> Result<()> {
        self.run_until(crate::wait_for_signal()).await
    }

    /// Run attempts until `shutdown` resolves or an attempt fails
    ///
    /// `shutdown` is polled once before every attempt (so it is armed while
    /// the attempt runs) and raced against the inter-attempt sleep. It never
    /// interrupts an attempt in flight.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let interval = self.config.schedule.interval;
        let mut attempt: u64 = 1;

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!(attempt, "shutdown requested before attempt, relay stopped");
                    return Ok(());
                }
                _ = std::future::ready(()) => {}
            }

            let report = self.run_attempt(attempt).await?;
            info!(
                attempt,
                downloaded = report.downloaded,
                published = report.published,
                disposed = report.disposed,
                "attempt finished"
            );

            info!(seconds = interval.as_secs(), "sleeping until next attempt");
            tokio::select! {
                _ = &mut shutdown => {
                    info!(attempt, "shutdown requested, relay stopped");
                    return Ok(());
                }
                _ = sleep(interval) => {}
            }

            attempt += 1;
        }
    }

    /// Run one full pass: download, publish, settle, dispose
    ///
    /// Any error aborts the attempt immediately; files already downloaded
    /// stay in the working directory.
    pub async fn run_attempt(&self, attempt: u64) -> Result<AttemptReport> {
        let images_dir = &self.config.storage.images_dir;
        info!(attempt, dir = %images_dir.display(), "attempt started");
        self.event_tx.send(Event::AttemptStarted { attempt }).ok();

        let mut report = AttemptReport {
            attempt,
            ..Default::default()
        };

        report.downloaded = self.download_all().await?;
        info!(attempt, count = report.downloaded, "images downloaded");

        if tokio::fs::try_exists(images_dir).await? {
            let event_tx = &self.event_tx;
            report.published =
                publish_directory(self.publisher.as_ref(), images_dir, |path| {
                    event_tx
                        .send(Event::ImagePublished {
                            path: path.to_path_buf(),
                        })
                        .ok();
                })
                .await?;
            info!(attempt, count = report.published, "images posted");

            let settle = self.config.schedule.settle_delay;
            if !settle.is_zero() {
                debug!(?settle, "waiting before cleanup");
                sleep(settle).await;
            }

            report.disposed = disposer::dispose(
                self.config.storage.disposal,
                images_dir,
                &self.config.storage.archive_dir,
            )
            .await?;
            self.event_tx
                .send(Event::Disposed {
                    files: report.disposed,
                })
                .ok();
        } else {
            info!(attempt, "no images this attempt, nothing to post");
        }

        self.event_tx
            .send(Event::AttemptFinished {
                report: report.clone(),
            })
            .ok();
        Ok(report)
    }

    /// Query every source and download its images into the working directory
    ///
    /// # Returns
    /// Number of files written
    pub async fn download_all(&self) -> Result<usize> {
        let mut downloaded = 0;

        for source in &self.sources {
            let kind = source.kind();
            if source.count() == 0 {
                debug!(source = %kind, "count is zero, skipping source");
                self.event_tx.send(Event::SourceSkipped { source: kind }).ok();
                continue;
            }

            let images = source.collect().await?;
            debug!(source = %kind, images = images.len(), "collected image references");

            for image in &images {
                let (url, path) = self.download(kind, image).await?;
                self.event_tx
                    .send(Event::ImageDownloaded {
                        source: kind,
                        url,
                        path,
                    })
                    .ok();
                downloaded += 1;
            }
        }

        Ok(downloaded)
    }

    /// Download one reference into the working directory
    async fn download(&self, kind: SourceKind, image: &ImageRef) -> Result<(String, PathBuf)> {
        let path = self
            .fetcher
            .fetch(&image.url, &self.config.storage.images_dir)
            .await?;
        debug!(source = %kind, path = %path.display(), "image saved");
        Ok((image.url.clone(), path))
    }
}
