//! Image download into a local directory

use crate::error::{Error, Result, redact_url};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Derive the local file name for a URL
///
/// The name is the last non-empty path segment; query string and fragment are
/// ignored.
///
/// # Examples
///
/// ```
/// use astro_relay::fetcher::file_name_from_url;
///
/// let name = file_name_from_url("https://apod.nasa.gov/apod/image/2401/M31.jpg?x=1").unwrap();
/// assert_eq!(name, "M31.jpg");
/// ```
pub fn file_name_from_url(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;

    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidUrl(format!("{url}: no file name in path")))
}

/// Downloads URLs into a directory, one blocking request at a time
#[derive(Clone, Debug)]
pub struct FileFetcher {
    http_client: reqwest::Client,
}

impl FileFetcher {
    /// Create a fetcher sharing the given HTTP client
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    /// Download `url` into `destination_dir`
    ///
    /// The directory (and its parents) is created if missing. An existing file
    /// with the same name is overwritten.
    ///
    /// # Returns
    /// The path of the written file
    ///
    /// # Errors
    /// - [`Error::InvalidUrl`] if no file name can be derived
    /// - [`Error::Http`] on any non-success status; the reported URL has its
    ///   query string removed
    /// - [`Error::Network`] / [`Error::Io`] on transport or filesystem failure
    pub async fn fetch(&self, url: &str, destination_dir: &Path) -> Result<PathBuf> {
        let file_name = file_name_from_url(url)?;
        let target = destination_dir.join(&file_name);

        tokio::fs::create_dir_all(destination_dir).await?;

        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                url: redact_url(url),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        tokio::fs::write(&target, &body).await?;

        debug!(
            url = %redact_url(url),
            path = %target.display(),
            bytes = body.len(),
            "downloaded file"
        );
        Ok(target)
    }
}
