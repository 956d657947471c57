use super::{ImageSource, take_first};
use crate::config::SpaceXConfig;
use crate::error::{Error, Result};
use crate::types::{ImageRef, SourceKind};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

#[derive(Deserialize)]
struct LaunchRecord {
    #[serde(default)]
    links: LaunchLinks,
}

#[derive(Default, Deserialize)]
struct LaunchLinks {
    #[serde(default)]
    flickr_images: Vec<String>,
}

/// Client for `GET /v3/launches/{flight_number}`
pub struct SpaceXSource {
    http_client: reqwest::Client,
    api_base: String,
    launch_number: u32,
    count: usize,
}

impl SpaceXSource {
    /// Create a client from the SpaceX section of the configuration
    pub fn new(http_client: reqwest::Client, config: &SpaceXConfig) -> Self {
        Self {
            http_client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            launch_number: config.launch_number,
            count: config.count,
        }
    }

    /// Photo URLs attached to a launch, in API order
    ///
    /// A launch without photos yields an empty list.
    pub async fn fetch_launch_images(&self, launch_id: u32) -> Result<Vec<String>> {
        let url = format!("{}/v3/launches/{}", self.api_base, launch_id);

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let record: LaunchRecord = serde_json::from_slice(&body)?;

        debug!(
            launch = launch_id,
            photos = record.links.flickr_images.len(),
            "fetched launch record"
        );
        Ok(record.links.flickr_images)
    }
}

#[async_trait]
impl ImageSource for SpaceXSource {
    fn kind(&self) -> SourceKind {
        SourceKind::LaunchGallery
    }

    fn count(&self) -> usize {
        self.count
    }

    async fn collect(&self) -> Result<Vec<ImageRef>> {
        let photos = self.fetch_launch_images(self.launch_number).await?;
        Ok(take_first(photos, self.count)
            .into_iter()
            .map(ImageRef::new)
            .collect())
    }
}
