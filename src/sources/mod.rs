//! Upstream image feeds
//!
//! Each feed is an independent adapter with no shared state. The relay talks
//! to them through [`ImageSource`], which hides the per-feed count policy:
//!
//! - [`ApodSource`] asks the API for `count` entries directly
//! - [`EpicSource`] keeps the first `count` catalog entries
//! - [`SpaceXSource`] keeps the first `count` launch photos, or all of them
//!   when fewer are available

use crate::error::Result;
use crate::types::{ImageRef, SourceKind};
use async_trait::async_trait;

/// NASA Astronomy Picture of the Day
pub mod apod;
/// NASA EPIC natural-color imagery
pub mod epic;
/// SpaceX launch galleries
pub mod spacex;

pub use apod::{ApodEntry, ApodSource};
pub use epic::{EpicItem, EpicSource};
pub use spacex::SpaceXSource;

/// A feed that produces image references for one attempt
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Which feed this is (used in logs and events)
    fn kind(&self) -> SourceKind;

    /// Number of images requested per attempt; zero disables the source
    fn count(&self) -> usize;

    /// Query the feed and return at most [`count`](Self::count) references
    async fn collect(&self) -> Result<Vec<ImageRef>>;
}

/// Keep the first `count` items, or all of them when fewer are available
///
/// Order is the order returned by the API; nothing is sorted.
pub fn take_first<T>(mut items: Vec<T>, count: usize) -> Vec<T> {
    items.truncate(count);
    items
}
