//! Document store over a JSON REST backend.
//!
//! Pages are JSON documents at `{base}/users/{uid}/pages/{key}`; binaries
//! are raw bodies at `{base}/users/{uid}/files/{path}`. `PATCH` merges a
//! page, `PUT` uploads a binary.
//!
//! ERROR HANDLING
//! ==============
//! A 404 on read means "no such page"; a 404 on delete means "already
//! gone". Every other non-success status becomes `StoreError::Status` with
//! the response body. The change poller logs failures and keeps polling.

#[cfg(test)]
#[path = "rest_test.rs"]
mod rest_test;

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::{DocumentStore, EVENT_CAPACITY, PageSnapshot, Progress, StoreError, StoreEvent};
use crate::config::StoreConfig;
use crate::page::Page;

pub struct RestStore {
    http: reqwest::Client,
    base_url: String,
    user_id: String,
    events: broadcast::Sender<StoreEvent>,
}

#[derive(Deserialize)]
struct UploadResponse {
    url: Option<String>,
}

impl RestStore {
    /// Build a client for the collection described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Unauthenticated` without a user id and
    /// `StoreError::HttpClientBuild` if the token or client is unusable.
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        if config.user_id.trim().is_empty() {
            return Err(StoreError::Unauthenticated);
        }
        if config.request_timeout_secs == 0 {
            return Err(StoreError::HttpClientBuild("request timeout must be greater than zero".into()));
        }
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| StoreError::HttpClientBuild(e.to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| StoreError::HttpClientBuild(e.to_string()))?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_id: config.user_id.clone(),
            events,
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/users/{}", self.base_url, self.user_id)
    }

    fn pages_url(&self) -> String {
        format!("{}/pages", self.collection_url())
    }

    fn page_url(&self, key: &str) -> String {
        format!("{}/{key}", self.pages_url())
    }

    fn file_url(&self, path: &str) -> String {
        format!("{}/files/{}", self.collection_url(), path.trim_start_matches('/'))
    }

    /// Whether `url` addresses a binary in this store.
    fn owns_binary(&self, url: &str) -> bool {
        url.starts_with(&format!("{}/files/", self.collection_url()))
    }

    /// Fetch the page list once and publish it if it differs from `last`.
    /// Returns whether a change was published.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if listing fails; `last` is left unchanged.
    pub async fn poll_once(&self, last: &mut Option<PageSnapshot>) -> Result<bool, StoreError> {
        let snapshot = self.list().await?;
        if !snapshot_changed(last.as_ref(), &snapshot) {
            return Ok(false);
        }
        *last = Some(snapshot.clone());
        if self.events.send(StoreEvent::PagesChanged(snapshot)).is_err() {
            debug!("no store subscribers");
        }
        Ok(true)
    }
}

/// Whether `next` should be published after `last`.
pub(crate) fn snapshot_changed(last: Option<&PageSnapshot>, next: &PageSnapshot) -> bool {
    last != Some(next)
}

async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status { status: status.as_u16(), body })
}

#[async_trait::async_trait]
impl DocumentStore for RestStore {
    async fn load(&self, key: &str) -> Result<Option<Page>, StoreError> {
        let response = self.http.get(self.page_url(key)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let text = check(response).await?.text().await?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    async fn save(&self, key: &str, page: &Page) -> Result<(), StoreError> {
        let response = self.http.patch(self.page_url(key)).json(page).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let response = self.http.delete(self.page_url(key)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check(response).await?;
        Ok(())
    }

    async fn list(&self) -> Result<PageSnapshot, StoreError> {
        let response = self.http.get(self.pages_url()).send().await?;
        let text = check(response).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn upload(&self, path: &str, bytes: Vec<u8>, on_progress: Progress<'_>) -> Result<String, StoreError> {
        let url = self.file_url(path);
        on_progress(0.0);
        let response = self
            .http
            .put(&url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await?;
        let text = check(response).await?.text().await?;
        on_progress(100.0);
        let reported = serde_json::from_str::<UploadResponse>(&text).ok().and_then(|r| r.url);
        Ok(reported.unwrap_or(url))
    }

    async fn delete_binary(&self, url: &str) -> Result<(), StoreError> {
        if !self.owns_binary(url) {
            warn!(url, "binary is not in this store; leaving it");
            return Ok(());
        }
        let response = self.http.delete(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check(response).await?;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}

/// Shortest period the change poller runs at.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub(crate) fn poll_period(interval: Duration) -> Duration {
    interval.max(MIN_POLL_INTERVAL)
}

/// Spawn the background change poller. Returns a handle for shutdown.
///
/// Intervals below [`MIN_POLL_INTERVAL`] are raised to it.
pub fn spawn_change_poller(store: Arc<RestStore>, interval: Duration) -> JoinHandle<()> {
    let period = poll_period(interval);
    info!(interval_ms = period.as_millis(), "page change poller configured");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last = None;
        loop {
            ticker.tick().await;
            if let Err(e) = store.poll_once(&mut last).await {
                warn!(error = %e, "page change poll failed");
            }
        }
    })
}
