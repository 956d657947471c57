//! Core types and events

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which upstream feed an image came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// NASA Astronomy Picture of the Day
    Apod,
    /// NASA EPIC natural-color Earth imagery
    NaturalEarth,
    /// SpaceX launch photo gallery
    LaunchGallery,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Apod => "apod",
            SourceKind::NaturalEarth => "natural_earth",
            SourceKind::LaunchGallery => "launch_gallery",
        };
        f.write_str(name)
    }
}

/// A single image to download
///
/// Identity is the URL only. Two references whose URLs share a basename land
/// on the same local file and the later one wins. A failed download is never
/// retried under another URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// URL to fetch
    pub url: String,
}

impl ImageRef {
    /// Reference to `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Counters for one pass through the loop
#[must_use]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptReport {
    /// 1-based attempt number
    pub attempt: u64,
    /// Files written by the fetcher (overwrites count once per write)
    pub downloaded: usize,
    /// Files uploaded to the channel
    pub published: usize,
    /// Files deleted or archived
    pub disposed: usize,
}

/// Progress notifications emitted by the relay
///
/// Subscribe with [`SpaceRelay::subscribe`](crate::SpaceRelay::subscribe).
/// Events are informational; dropping the receiver has no effect on the loop.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A new attempt began
    AttemptStarted {
        /// Attempt number
        attempt: u64,
    },

    /// A source was not queried because its count is zero
    SourceSkipped {
        /// The skipped source
        source: SourceKind,
    },

    /// An image was written to the working directory
    ImageDownloaded {
        /// Source the image came from
        source: SourceKind,
        /// URL actually fetched
        url: String,
        /// Local path written
        path: PathBuf,
    },

    /// A file was uploaded to the channel
    ImagePublished {
        /// Local path uploaded
        path: PathBuf,
    },

    /// The working directory was cleaned up
    Disposed {
        /// Number of files deleted or archived
        files: usize,
    },

    /// An attempt finished successfully
    AttemptFinished {
        /// Summary of the attempt
        report: AttemptReport,
    },
}
