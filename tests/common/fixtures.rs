//! Mock upstream APIs and relay configuration for integration tests

use astro_relay::Publisher;
use astro_relay::config::{
    Config, DisposalPolicy, NasaConfig, ScheduleConfig, SpaceXConfig, StorageConfig,
    TelegramConfig,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Bot token used by every test config
pub const BOT_TOKEN: &str = "123:abc";

/// Telegram endpoint path for [`BOT_TOKEN`]
pub const SEND_PHOTO_PATH: &str = "/bot123:abc/sendPhoto";

/// Launch number used by every test config
pub const LAUNCH_NUMBER: u32 = 67;

/// Per-source counts for a test run
#[derive(Clone, Copy, Debug)]
pub struct Counts {
    pub apod: usize,
    pub natural: usize,
    pub launch: usize,
}

/// Config with every API pointed at `mock_server`
pub fn test_config(
    mock_server: &MockServer,
    root: &Path,
    counts: Counts,
    disposal: DisposalPolicy,
) -> Config {
    Config {
        nasa: NasaConfig {
            api_key: "DEMO_KEY".to_string(),
            api_base: mock_server.uri(),
            apod_count: counts.apod,
            natural_count: counts.natural,
            epic_append_api_key: true,
        },
        spacex: SpaceXConfig {
            api_base: mock_server.uri(),
            launch_number: LAUNCH_NUMBER,
            count: counts.launch,
        },
        telegram: TelegramConfig {
            bot_token: BOT_TOKEN.to_string(),
            chat_id: "@space_pics".to_string(),
            api_base: mock_server.uri(),
            upload_timeout: Duration::from_secs(10),
        },
        storage: StorageConfig {
            images_dir: root.join("images"),
            archive_dir: root.join("archive"),
            disposal,
        },
        schedule: ScheduleConfig {
            interval: Duration::from_secs(3600),
            settle_delay: Duration::ZERO,
        },
    }
}

/// Serve `body` for `GET image_path`
pub async fn mount_image(mock_server: &MockServer, image_path: &str, body: &[u8], expected: u64) {
    Mock::given(method("GET"))
        .and(path(image_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .expect(expected)
        .mount(mock_server)
        .await;
}

/// APOD answering with one entry whose hdurl/url point at the mock server
pub async fn mount_apod(mock_server: &MockServer, hd_path: Option<&str>, sd_path: &str) {
    let uri = mock_server.uri();
    let mut entry = serde_json::json!({
        "title": "Andromeda",
        "date": "2024-01-15",
        "media_type": "image",
        "url": format!("{uri}{sd_path}"),
    });
    if let Some(hd) = hd_path {
        entry["hdurl"] = serde_json::Value::String(format!("{uri}{hd}"));
    }

    Mock::given(method("GET"))
        .and(path("/planetary/apod"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([entry])))
        .mount(mock_server)
        .await;
}

/// EPIC catalog with the given `(image, date)` items
pub async fn mount_epic_catalog(mock_server: &MockServer, items: &[(&str, &str)]) {
    let catalog: Vec<_> = items
        .iter()
        .map(|(image, date)| serde_json::json!({ "image": image, "date": date }))
        .collect();

    Mock::given(method("GET"))
        .and(path("/EPIC/api/natural/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog))
        .mount(mock_server)
        .await;
}

/// Launch record whose gallery lists `photo_paths` on the mock server
pub async fn mount_launch(mock_server: &MockServer, photo_paths: &[&str]) {
    let uri = mock_server.uri();
    let photos: Vec<String> = photo_paths.iter().map(|p| format!("{uri}{p}")).collect();

    Mock::given(method("GET"))
        .and(path(format!("/v3/launches/{LAUNCH_NUMBER}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "flight_number": LAUNCH_NUMBER,
            "links": { "flickr_images": photos }
        })))
        .mount(mock_server)
        .await;
}

/// Telegram `sendPhoto` accepting every upload
pub async fn mount_send_photo(mock_server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path(SEND_PHOTO_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": { "message_id": 1 }
        })))
        .expect(expected)
        .mount(mock_server)
        .await;
}

/// Number of requests the mock server saw for `request_path`
pub async fn request_count(mock_server: &MockServer, request_path: &str) -> usize {
    mock_server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == request_path)
        .count()
}

/// Sorted file names directly inside `dir`
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

/// Publisher that records uploads and snapshots the directory on first call
#[derive(Default)]
pub struct RecordingPublisher {
    pub uploaded: Mutex<Vec<PathBuf>>,
    pub dir_at_first_upload: Mutex<Option<Vec<String>>>,
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish_photo(&self, photo: &Path) -> astro_relay::Result<()> {
        if let Ok(mut snapshot) = self.dir_at_first_upload.lock()
            && snapshot.is_none()
            && let Some(parent) = photo.parent()
        {
            *snapshot = Some(file_names(parent));
        }
        if let Ok(mut uploaded) = self.uploaded.lock() {
            uploaded.push(photo.to_path_buf());
        }
        Ok(())
    }
}
