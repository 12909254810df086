//! Store configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;

pub const DEFAULT_STORE_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_CACHE_DIR: &str = ".worldwiki-cache";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing required env var {0}")]
    Missing(&'static str),

    /// A value is present but unusable.
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Base URL of the document store, without trailing slash.
    pub base_url: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    /// Owner of the page collection.
    pub user_id: String,
    /// Directory of the file-backed local cache.
    pub cache_dir: PathBuf,
    pub request_timeout_secs: u64,
    /// Interval of the remote change poller.
    pub poll_interval_ms: u64,
}

impl StoreConfig {
    /// Build typed store config from environment variables.
    ///
    /// Required:
    /// - `WIKI_USER_ID`
    ///
    /// Optional:
    /// - `WIKI_STORE_BASE_URL`: default `http://127.0.0.1:8080`
    /// - `WIKI_STORE_TOKEN`
    /// - `WIKI_CACHE_DIR`: default `.worldwiki-cache`
    /// - `WIKI_REQUEST_TIMEOUT_SECS`: default 30
    /// - `WIKI_POLL_INTERVAL_MS`: default 5000
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the user id is missing, the base URL is
    /// not http(s), or an interval is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        let user_id = std::env::var("WIKI_USER_ID").unwrap_or_default();
        let base_url = std::env::var("WIKI_STORE_BASE_URL").ok();
        let token = std::env::var("WIKI_STORE_TOKEN").ok();
        Self::with_overrides(base_url.as_deref(), &user_id, token)
    }

    /// Build config from explicit connection values; the remaining fields
    /// still come from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `user_id` is blank, the base URL is not
    /// http(s), or the request timeout or poll interval is zero.
    pub fn with_overrides(base_url: Option<&str>, user_id: &str, token: Option<String>) -> Result<Self, ConfigError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(ConfigError::Missing("WIKI_USER_ID"));
        }
        let cache_dir = std::env::var("WIKI_CACHE_DIR").map_or_else(|_| PathBuf::from(DEFAULT_CACHE_DIR), PathBuf::from);

        Ok(Self {
            base_url: parse_base_url(base_url)?,
            token: token.filter(|t| !t.trim().is_empty()),
            user_id: user_id.to_string(),
            cache_dir,
            request_timeout_secs: env_nonzero("WIKI_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            poll_interval_ms: env_nonzero("WIKI_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?,
        })
    }
}

pub(crate) fn parse_base_url(raw: Option<&str>) -> Result<String, ConfigError> {
    let url = raw.map_or(DEFAULT_STORE_BASE_URL, str::trim).trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::Invalid { key: "WIKI_STORE_BASE_URL", reason: format!("'{url}' is not an http(s) URL") });
    }
    Ok(url.to_string())
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_nonzero(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env_parse(key, default) {
        0 => Err(ConfigError::Invalid { key, reason: "must be greater than zero".into() }),
        value => Ok(value),
    }
}
