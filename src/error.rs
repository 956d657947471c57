//! Error types for astro-relay
//!
//! Every fallible operation in the crate returns [`Result`]. Errors carry enough
//! context (URL, status code, config key) to be logged once at the top of the
//! loop and then end the process.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for astro-relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for astro-relay
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The environment key that caused the error (e.g., "TIME_SLEEP")
        key: Option<String>,
    },

    /// I/O error (directory creation, file writes, deletion, rename)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error (connection failure, body read failure)
    ///
    /// The wrapped error never carries a query string; see
    /// [`redact_url`].
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The remote side answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Http {
        /// Requested URL, without query string or fragment
        url: String,
        /// HTTP status code returned
        status: u16,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A catalog date did not match the expected format
    #[error("failed to parse date {value:?}: {source}")]
    DateParse {
        /// The raw date string
        value: String,
        /// Underlying chrono error
        #[source]
        source: chrono::ParseError,
    },

    /// URL could not be parsed or has no file name
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Telegram Bot API rejected a request
    #[error("telegram error (HTTP {status}): {description}")]
    Telegram {
        /// HTTP status code returned by the Bot API
        status: u16,
        /// Description field of the Bot API response
        description: String,
    },

    /// An upload did not finish in time
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for Error {
    fn from(mut e: reqwest::Error) -> Self {
        // NASA keys travel as `api_key=` in the query
        if let Some(url) = e.url_mut() {
            url.set_query(None);
            url.set_fragment(None);
        }
        Error::Network(e)
    }
}

/// `url` without its query string and fragment, safe to log or return
///
/// Unparseable input is reduced to everything before the first `?` or `#`.
pub fn redact_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.into()
        }
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

impl Error {
    /// Build a configuration error tied to an environment key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}
