//! Configuration types for astro-relay
//!
//! The configuration is read once at startup (from the process environment,
//! optionally seeded by a `.env` file) and then shared read-only by every
//! component for the lifetime of the loop.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, str::FromStr, time::Duration};

/// Default NASA API base URL
pub const NASA_API_BASE: &str = "https://api.nasa.gov";
/// Default SpaceX API base URL
pub const SPACEX_API_BASE: &str = "https://api.spacexdata.com";
/// Default Telegram Bot API base URL
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// NASA credentials and per-feed counts (APOD and EPIC)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NasaConfig {
    /// API key sent as `api_key` on every NASA request
    pub api_key: String,

    /// Base URL for the NASA API (default: "https://api.nasa.gov")
    #[serde(default = "default_nasa_base")]
    pub api_base: String,

    /// Number of APOD entries to request per attempt
    #[serde(default)]
    pub apod_count: usize,

    /// Number of EPIC natural-color images to download per attempt
    #[serde(default)]
    pub natural_count: usize,

    /// Append `?api_key=...` to EPIC archive image URLs (default: true)
    #[serde(default = "default_true")]
    pub epic_append_api_key: bool,
}

/// SpaceX launch gallery settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpaceXConfig {
    /// Base URL for the SpaceX API (default: "https://api.spacexdata.com")
    #[serde(default = "default_spacex_base")]
    pub api_base: String,

    /// Flight number of the launch whose photos are posted (default: 67)
    #[serde(default = "default_launch_number")]
    pub launch_number: u32,

    /// Maximum number of launch photos to download per attempt
    #[serde(default)]
    pub count: usize,
}

impl Default for SpaceXConfig {
    fn default() -> Self {
        Self {
            api_base: default_spacex_base(),
            launch_number: default_launch_number(),
            count: 0,
        }
    }
}

/// Telegram channel publishing settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by @BotFather
    pub bot_token: String,

    /// Target channel (numeric id or `@channel_name`)
    pub chat_id: String,

    /// Base URL for the Bot API (default: "https://api.telegram.org")
    #[serde(default = "default_telegram_base")]
    pub api_base: String,

    /// Timeout for a single photo upload (default: 150 seconds)
    #[serde(default = "default_upload_timeout", with = "seconds")]
    pub upload_timeout: Duration,
}

/// What happens to published images at the end of an attempt
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisposalPolicy {
    /// Remove the image directory and everything in it (default)
    #[default]
    Delete,
    /// Move every file into the archive directory
    Archive,
}

/// A disposal policy name other than `delete` or `archive`
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("expected \"delete\" or \"archive\"")]
pub struct ParseDisposalPolicyError;

impl FromStr for DisposalPolicy {
    type Err = ParseDisposalPolicyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "delete" => Ok(DisposalPolicy::Delete),
            "archive" => Ok(DisposalPolicy::Archive),
            _ => Err(ParseDisposalPolicyError),
        }
    }
}

/// Local directories used by the loop
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Working directory images are downloaded into (default: "images")
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,

    /// Destination for the archive disposal policy (default: "archive")
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,

    /// Disposal policy applied after publishing
    #[serde(default)]
    pub disposal: DisposalPolicy,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            images_dir: default_images_dir(),
            archive_dir: default_archive_dir(),
            disposal: DisposalPolicy::default(),
        }
    }
}

/// Loop timing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Sleep between attempts
    #[serde(with = "seconds")]
    pub interval: Duration,

    /// Pause between publishing and disposal (default: 2 seconds)
    #[serde(default = "default_settle_delay", with = "seconds")]
    pub settle_delay: Duration,
}

/// Main configuration for the relay
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// NASA APOD / EPIC settings
    pub nasa: NasaConfig,

    /// SpaceX launch gallery settings
    #[serde(default)]
    pub spacex: SpaceXConfig,

    /// Telegram publishing settings
    pub telegram: TelegramConfig,

    /// Local directories and disposal policy
    #[serde(default)]
    pub storage: StorageConfig,

    /// Loop timing
    pub schedule: ScheduleConfig,
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// A `.env` file in the working directory is loaded first when present;
    /// variables already set in the environment take precedence over it.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env file");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Keys and defaults match [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let config = Config {
            nasa: NasaConfig {
                api_key: env.required("NASA_API_KEY")?,
                api_base: env.optional("NASA_API_BASE").unwrap_or_else(default_nasa_base),
                apod_count: env.parse_required("NASA_BEST_IMAGES_TO_DOWNLOAD")?,
                natural_count: env.parse_required("NASA_NATURAL_IMAGES_TO_DOWNLOAD")?,
                epic_append_api_key: env.parse_or("EPIC_APPEND_API_KEY", true)?,
            },
            spacex: SpaceXConfig {
                api_base: env
                    .optional("SPACEX_API_BASE")
                    .unwrap_or_else(default_spacex_base),
                launch_number: env.parse_or("SPACEX_LAUNCH_NUMBER", default_launch_number())?,
                count: env.parse_required("SPACEX_LAUNCH_IMAGES_TO_DOWNLOAD")?,
            },
            telegram: TelegramConfig {
                bot_token: env.required("TELEGRAM_API_KEY")?,
                chat_id: env.required("TELEGRAM_CHAT_ID")?,
                api_base: env
                    .optional("TELEGRAM_API_BASE")
                    .unwrap_or_else(default_telegram_base),
                upload_timeout: Duration::from_secs(
                    env.parse_or("TELEGRAM_UPLOAD_TIMEOUT", default_upload_timeout().as_secs())?,
                ),
            },
            storage: StorageConfig {
                images_dir: env
                    .optional("IMAGES_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_images_dir),
                archive_dir: env
                    .optional("ARCHIVE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_archive_dir),
                disposal: env.parse_or("DISPOSAL_POLICY", DisposalPolicy::default())?,
            },
            schedule: ScheduleConfig {
                interval: Duration::from_secs(env.parse_required("TIME_SLEEP")?),
                settle_delay: Duration::from_secs(
                    env.parse_or("SETTLE_DELAY", default_settle_delay().as_secs())?,
                ),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make every attempt fail
    pub fn validate(&self) -> Result<()> {
        if self.nasa.api_key.trim().is_empty() {
            return Err(Error::config("NASA_API_KEY", "must not be empty"));
        }
        if self.telegram.bot_token.trim().is_empty() {
            return Err(Error::config("TELEGRAM_API_KEY", "must not be empty"));
        }
        if self.telegram.chat_id.trim().is_empty() {
            return Err(Error::config("TELEGRAM_CHAT_ID", "must not be empty"));
        }
        if self.telegram.upload_timeout.is_zero() {
            return Err(Error::config(
                "TELEGRAM_UPLOAD_TIMEOUT",
                "must be greater than zero",
            ));
        }
        // Archived files inside the working directory would be published
        // again on the next attempt
        if self.storage.disposal == DisposalPolicy::Archive
            && self.storage.archive_dir.starts_with(&self.storage.images_dir)
        {
            return Err(Error::config(
                "ARCHIVE_DIR",
                "must not be IMAGES_DIR or inside it when archiving",
            ));
        }
        Ok(())
    }
}

/// Typed access to string key/value settings
struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.optional(key)
            .ok_or_else(|| Error::config(key, format!("{key} is not set")))
    }

    fn parse_required<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.required(key)?;
        parse_value(key, &raw)
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(key) {
            Some(raw) => parse_value(key, &raw),
            None => Ok(default),
        }
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::config(key, format!("invalid value {raw:?}: {e}")))
}

fn default_nasa_base() -> String {
    NASA_API_BASE.to_string()
}

fn default_spacex_base() -> String {
    SPACEX_API_BASE.to_string()
}

fn default_telegram_base() -> String {
    TELEGRAM_API_BASE.to_string()
}

fn default_launch_number() -> u32 {
    67
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("images")
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("archive")
}

fn default_upload_timeout() -> Duration {
    Duration::from_secs(150)
}

fn default_settle_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_true() -> bool {
    true
}

/// Durations written as a whole number of seconds
mod seconds {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        value.as_secs().serialize(s)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("NASA_API_KEY", "nasa-key"),
            ("TELEGRAM_API_KEY", "123:abc"),
            ("TELEGRAM_CHAT_ID", "@space_pics"),
            ("TIME_SLEEP", "86400"),
            ("NASA_BEST_IMAGES_TO_DOWNLOAD", "1"),
            ("NASA_NATURAL_IMAGES_TO_DOWNLOAD", "3"),
            ("SPACEX_LAUNCH_IMAGES_TO_DOWNLOAD", "5"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<Config> {
        Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_from_lookup_applies_defaults() {
        let config = load(&base_vars()).unwrap();

        assert_eq!(config.nasa.api_key, "nasa-key");
        assert_eq!(config.nasa.api_base, NASA_API_BASE);
        assert_eq!(config.nasa.apod_count, 1);
        assert_eq!(config.nasa.natural_count, 3);
        assert!(config.nasa.epic_append_api_key);
        assert_eq!(config.spacex.count, 5);
        assert_eq!(config.spacex.launch_number, 67);
        assert_eq!(config.telegram.chat_id, "@space_pics");
        assert_eq!(config.telegram.upload_timeout, Duration::from_secs(150));
        assert_eq!(config.schedule.interval, Duration::from_secs(86400));
        assert_eq!(config.schedule.settle_delay, Duration::from_secs(2));
        assert_eq!(config.storage.images_dir, PathBuf::from("images"));
        assert_eq!(config.storage.disposal, DisposalPolicy::Delete);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let mut vars = base_vars();
        vars.insert("DISPOSAL_POLICY", "Archive");
        vars.insert("ARCHIVE_DIR", "/var/lib/relay/archive");
        vars.insert("SPACEX_LAUNCH_NUMBER", "56");
        vars.insert("EPIC_APPEND_API_KEY", "false");
        vars.insert("SETTLE_DELAY", "0");

        let config = load(&vars).unwrap();
        assert_eq!(config.storage.disposal, DisposalPolicy::Archive);
        assert_eq!(
            config.storage.archive_dir,
            PathBuf::from("/var/lib/relay/archive")
        );
        assert_eq!(config.spacex.launch_number, 56);
        assert!(!config.nasa.epic_append_api_key);
        assert!(config.schedule.settle_delay.is_zero());
    }

    #[test]
    fn test_missing_required_key() {
        let mut vars = base_vars();
        vars.remove("TELEGRAM_CHAT_ID");

        match load(&vars) {
            Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("TELEGRAM_CHAT_ID")),
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_count() {
        let mut vars = base_vars();
        vars.insert("NASA_BEST_IMAGES_TO_DOWNLOAD", "three");

        match load(&vars) {
            Err(Error::Config { key, message }) => {
                assert_eq!(key.as_deref(), Some("NASA_BEST_IMAGES_TO_DOWNLOAD"));
                assert!(message.contains("three"));
            }
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_disposal_policy() {
        let mut vars = base_vars();
        vars.insert("DISPOSAL_POLICY", "shred");

        let err = load(&vars).unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: invalid value \"shred\": expected \"delete\" or \"archive\""
        );
        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("DISPOSAL_POLICY")),
            other => panic!("Expected Config error, got {other:?}"),
        }
        assert_eq!(
            "shred".parse::<DisposalPolicy>(),
            Err(ParseDisposalPolicyError)
        );
    }

    #[test]
    fn test_archive_dir_must_differ() {
        let mut vars = base_vars();
        vars.insert("DISPOSAL_POLICY", "archive");
        vars.insert("ARCHIVE_DIR", "images");
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_archive_dir_inside_images_dir_rejected() {
        let mut vars = base_vars();
        vars.insert("DISPOSAL_POLICY", "archive");
        vars.insert("IMAGES_DIR", "/srv/relay/images");
        vars.insert("ARCHIVE_DIR", "/srv/relay/images/archive");

        match load(&vars) {
            Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("ARCHIVE_DIR")),
            other => panic!("Expected Config error, got {other:?}"),
        }

        // Siblings and a shared name prefix are fine
        vars.insert("ARCHIVE_DIR", "/srv/relay/images-archive");
        assert!(load(&vars).is_ok());

        // Only the archive policy ever writes there
        vars.insert("ARCHIVE_DIR", "/srv/relay/images/archive");
        vars.insert("DISPOSAL_POLICY", "delete");
        assert!(load(&vars).is_ok());
    }

    #[test]
    fn test_zero_upload_timeout_rejected() {
        let mut vars = base_vars();
        vars.insert("TELEGRAM_UPLOAD_TIMEOUT", "0");
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_from_json_str_with_defaults() {
        let json = r#"{
            "nasa": { "api_key": "k", "apod_count": 2 },
            "telegram": { "bot_token": "t", "chat_id": "42" },
            "schedule": { "interval": 3600 }
        }"#;

        let config = Config::from_json_str(json).unwrap();
        assert_eq!(config.nasa.apod_count, 2);
        assert_eq!(config.nasa.natural_count, 0);
        assert_eq!(config.spacex.launch_number, 67);
        assert_eq!(config.telegram.upload_timeout, Duration::from_secs(150));
        assert_eq!(config.schedule.interval, Duration::from_secs(3600));
        assert_eq!(config.storage.archive_dir, PathBuf::from("archive"));
    }

    #[test]
    fn test_durations_are_whole_seconds_in_json() {
        let config = load(&base_vars()).unwrap();
        let json = serde_json::to_value(&config).unwrap();

        assert_eq!(json["schedule"]["interval"], 86400);
        assert_eq!(json["schedule"]["settle_delay"], 2);
        assert_eq!(json["telegram"]["upload_timeout"], 150);

        let back: Config = serde_json::from_value(json).unwrap();
        assert_eq!(back.schedule.interval, Duration::from_secs(86400));
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        let vars = base_vars();
        // SAFETY: serialized with other env-mutating tests
        unsafe {
            for (k, v) in &vars {
                std::env::set_var(k, v);
            }
            std::env::set_var("TIME_SLEEP", "60");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.schedule.interval, Duration::from_secs(60));
        assert_eq!(config.nasa.natural_count, 3);

        unsafe {
            for k in vars.keys() {
                std::env::remove_var(k);
            }
        }
    }
}
