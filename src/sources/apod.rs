use super::ImageSource;
use crate::config::NasaConfig;
use crate::error::Result;
use crate::types::{ImageRef, SourceKind};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

/// One APOD record
///
/// Only the fields the relay uses are modeled; the rest of the payload is
/// ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ApodEntry {
    /// Title of the picture
    #[serde(default)]
    pub title: Option<String>,

    /// Publication date (`YYYY-MM-DD`)
    #[serde(default)]
    pub date: Option<String>,

    /// "image" or "video"
    #[serde(default)]
    pub media_type: Option<String>,

    /// High-resolution image URL (preferred)
    #[serde(default)]
    pub hdurl: Option<String>,

    /// Standard-resolution URL, used when `hdurl` is absent
    #[serde(default)]
    pub url: Option<String>,
}

impl ApodEntry {
    /// The reference to download: `hdurl` when present, else `url`
    ///
    /// Entries with neither yield `None`.
    pub fn image_ref(&self) -> Option<ImageRef> {
        self.hdurl
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| self.url.as_deref().filter(|u| !u.is_empty()))
            .map(ImageRef::new)
    }
}

/// The endpoint answers with one object when `count` is absent and a list
/// otherwise
#[derive(Deserialize)]
#[serde(untagged)]
enum ApodPayload {
    Many(Vec<ApodEntry>),
    One(ApodEntry),
}

impl From<ApodPayload> for Vec<ApodEntry> {
    fn from(payload: ApodPayload) -> Self {
        match payload {
            ApodPayload::Many(entries) => entries,
            ApodPayload::One(entry) => vec![entry],
        }
    }
}

/// Client for `GET /planetary/apod`
///
/// HTTP error statuses are swallowed: the attempt continues with no APOD
/// images. Transport and decoding failures still propagate.
pub struct ApodSource {
    http_client: reqwest::Client,
    api_base: String,
    api_key: String,
    count: usize,
}

impl ApodSource {
    /// Create a client from the NASA section of the configuration
    pub fn new(http_client: reqwest::Client, config: &NasaConfig) -> Self {
        Self {
            http_client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            count: config.apod_count,
        }
    }

    /// Request `count` random APOD entries
    ///
    /// Always returns a list, even for a single entry. A non-success status
    /// is logged and yields an empty list.
    pub async fn fetch_best(&self, count: usize) -> Result<Vec<ApodEntry>> {
        let url = format!("{}/planetary/apod", self.api_base);
        let count_param = count.to_string();

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("count", count_param.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                url = %url,
                "APOD request failed, continuing without APOD images"
            );
            return Ok(Vec::new());
        }

        let body = response.bytes().await?;
        let payload: ApodPayload = serde_json::from_slice(&body)?;
        let entries: Vec<ApodEntry> = payload.into();

        debug!(requested = count, received = entries.len(), "fetched APOD entries");
        Ok(entries)
    }
}

#[async_trait]
impl ImageSource for ApodSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Apod
    }

    fn count(&self) -> usize {
        self.count
    }

    async fn collect(&self) -> Result<Vec<ImageRef>> {
        let entries = self.fetch_best(self.count).await?;

        Ok(entries
            .iter()
            .filter_map(|entry| {
                let image = entry.image_ref();
                if image.is_none() {
                    warn!(title = ?entry.title, date = ?entry.date, "APOD entry has no URL, skipping");
                }
                image
            })
            .collect())
    }
}
