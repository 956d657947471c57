//! Publishing local images to a channel
//!
//! [`publish_directory`] walks a directory and hands every file to a
//! [`Publisher`]. Uploads are strictly sequential and the first failure aborts
//! the walk; files uploaded before the failure stay published.

use crate::config::TelegramConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Destination for published images
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Upload one image file
    async fn publish_photo(&self, path: &Path) -> Result<()>;
}

/// All regular files under `dir`, recursively, sorted by path
pub fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Io(std::io::Error::other(e)))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// [`collect_files`] on the blocking thread pool
pub async fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let dir = dir.to_path_buf();
    tokio::task::spawn_blocking(move || collect_files(&dir))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?
}

/// Upload every file under `dir`
///
/// `on_published` is called after each successful upload.
///
/// # Returns
/// Number of files uploaded
pub async fn publish_directory<F>(
    publisher: &dyn Publisher,
    dir: &Path,
    mut on_published: F,
) -> Result<usize>
where
    F: FnMut(&Path),
{
    let files = list_files(dir).await?;
    debug!(dir = %dir.display(), files = files.len(), "publishing directory");

    for file in &files {
        publisher.publish_photo(file).await?;
        on_published(file);
    }

    Ok(files.len())
}

#[derive(Deserialize)]
struct BotResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Posts photos to a Telegram channel through the Bot API `sendPhoto` method
///
/// The bot token is part of the endpoint path, so transport errors are
/// returned without their URL.
pub struct TelegramPublisher {
    http_client: reqwest::Client,
    endpoint: String,
    chat_id: String,
    upload_timeout: Duration,
}

impl TelegramPublisher {
    /// Create a publisher from the Telegram section of the configuration
    pub fn new(http_client: reqwest::Client, config: &TelegramConfig) -> Self {
        Self {
            http_client,
            endpoint: format!(
                "{}/bot{}/sendPhoto",
                config.api_base.trim_end_matches('/'),
                config.bot_token
            ),
            chat_id: config.chat_id.clone(),
            upload_timeout: config.upload_timeout,
        }
    }

    async fn send(&self, path: &Path) -> Result<()> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo".to_string());

        let form = reqwest::multipart::Form::new()
            .text("chat_id", self.chat_id.clone())
            .part(
                "photo",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );

        let response = self
            .http_client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(hide_endpoint)?;

        let status = response.status();
        let body = response.bytes().await.map_err(hide_endpoint)?;

        // The Bot API reports failures in the body as well as the status line
        match serde_json::from_slice::<BotResponse>(&body) {
            Ok(reply) if status.is_success() && reply.ok => Ok(()),
            Ok(reply) => Err(Error::Telegram {
                status: status.as_u16(),
                description: reply
                    .description
                    .unwrap_or_else(|| "request was not accepted".to_string()),
            }),
            Err(_) if status.is_success() => Ok(()),
            Err(_) => Err(Error::Telegram {
                status: status.as_u16(),
                description: String::from_utf8_lossy(&body).into_owned(),
            }),
        }
    }
}

fn hide_endpoint(e: reqwest::Error) -> Error {
    Error::Network(e.without_url())
}

#[async_trait]
impl Publisher for TelegramPublisher {
    async fn publish_photo(&self, path: &Path) -> Result<()> {
        match tokio::time::timeout(self.upload_timeout, self.send(path)).await {
            Ok(Ok(())) => {
                info!(path = %path.display(), chat = %self.chat_id, "photo posted");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(path = %path.display(), error = %e, "photo upload failed");
                Err(e)
            }
            Err(_) => {
                warn!(path = %path.display(), timeout = ?self.upload_timeout, "photo upload timed out");
                Err(Error::Timeout(self.upload_timeout))
            }
        }
    }
}
