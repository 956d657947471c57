use super::{ImageSource, take_first};
use crate::config::NasaConfig;
use crate::error::{Error, Result};
use crate::types::{ImageRef, SourceKind};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDateTime};
use serde::Deserialize;
use tracing::debug;

/// Catalog date format; the two spaces between date and time are significant
pub const EPIC_DATE_FORMAT: &str = "%Y-%m-%d  %H:%M:%S";

/// One entry of the natural-color catalog
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct EpicItem {
    /// Image identifier, e.g. `epic_1b_20210305101010`
    pub image: String,

    /// Capture timestamp in [`EPIC_DATE_FORMAT`]
    pub date: String,

    /// Free-text caption
    #[serde(default)]
    pub caption: Option<String>,
}

impl EpicItem {
    /// Parse the capture timestamp
    pub fn captured_at(&self) -> Result<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.date, EPIC_DATE_FORMAT).map_err(|source| {
            Error::DateParse {
                value: self.date.clone(),
                source,
            }
        })
    }
}

/// Build the archive PNG URL for a catalog item
///
/// `{base}/EPIC/archive/natural/{yyyy}/{mm}/{dd}/png/{image}.png`, with
/// `?api_key=...` appended when `api_key` is given.
pub fn archive_url(api_base: &str, item: &EpicItem, api_key: Option<&str>) -> Result<String> {
    let captured = item.captured_at()?;
    let mut url = format!(
        "{}/EPIC/archive/natural/{}/{:02}/{:02}/png/{}.png",
        api_base.trim_end_matches('/'),
        captured.year(),
        captured.month(),
        captured.day(),
        item.image
    );
    if let Some(key) = api_key {
        url.push_str("?api_key=");
        url.push_str(key);
    }
    Ok(url)
}

/// Client for `GET /EPIC/api/natural/`
pub struct EpicSource {
    http_client: reqwest::Client,
    api_base: String,
    api_key: String,
    append_api_key: bool,
    count: usize,
}

impl EpicSource {
    /// Create a client from the NASA section of the configuration
    pub fn new(http_client: reqwest::Client, config: &NasaConfig) -> Self {
        Self {
            http_client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            append_api_key: config.epic_append_api_key,
            count: config.natural_count,
        }
    }

    /// Fetch the catalog and derive one archive URL per item
    ///
    /// Catalog order is preserved. A single malformed date fails the whole
    /// call.
    pub async fn fetch_urls(&self) -> Result<Vec<String>> {
        let url = format!("{}/EPIC/api/natural/", self.api_base);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let items: Vec<EpicItem> = serde_json::from_slice(&body)?;
        debug!(items = items.len(), "fetched EPIC catalog");

        let key = self.append_api_key.then_some(self.api_key.as_str());
        items
            .iter()
            .map(|item| archive_url(&self.api_base, item, key))
            .collect()
    }
}

#[async_trait]
impl ImageSource for EpicSource {
    fn kind(&self) -> SourceKind {
        SourceKind::NaturalEarth
    }

    fn count(&self) -> usize {
        self.count
    }

    async fn collect(&self) -> Result<Vec<ImageRef>> {
        let urls = self.fetch_urls().await?;
        Ok(take_first(urls, self.count)
            .into_iter()
            .map(ImageRef::new)
            .collect())
    }
}
