//! The external document store.
//!
//! DESIGN
//! ======
//! Pages live in a per-user collection keyed by page key; binaries (map
//! images, media) live next to them and are addressed by URL. The store is
//! an async trait so sessions can run against [`memory::MemoryStore`] in
//! tests and offline, or [`rest::RestStore`] against a real backend.
//!
//! Writes use merge semantics: fields of the written page replace the
//! stored ones, other stored meta fields survive. Every adapter publishes a
//! full page snapshot on its broadcast channel after each change it sees.

pub mod memory;
pub mod rest;

use std::collections::BTreeMap;

use tokio::sync::broadcast;

use crate::page::Page;

/// Capacity of each store's change channel.
pub const EVENT_CAPACITY: usize = 16;

/// All pages, keyed by page key.
pub type PageSnapshot = BTreeMap<String, Page>;

/// Upload progress callback, receiving a percentage in `[0, 100]`.
pub type Progress<'a> = &'a (dyn Fn(f64) + Send + Sync);

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No signed-in user owns the collection.
    #[error("not signed in")]
    Unauthenticated,

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The store rejected the write.
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Change notification from a store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    PagesChanged(PageSnapshot),
}

/// Async page and binary storage. Enables mocking in tests.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one page; `Ok(None)` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be reached or answers garbage.
    async fn load(&self, key: &str) -> Result<Option<Page>, StoreError>;

    /// Merge-write one page, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the write fails.
    async fn save(&self, key: &str, page: &Page) -> Result<(), StoreError>;

    /// Remove one page. Removing a missing page succeeds.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the delete fails.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Every page in the collection.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the listing fails.
    async fn list(&self) -> Result<PageSnapshot, StoreError>;

    /// Store `bytes` under `path` and return its download URL.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the upload fails.
    async fn upload(&self, path: &str, bytes: Vec<u8>, on_progress: Progress<'_>) -> Result<String, StoreError>;

    /// Remove a binary by URL. Removing a missing binary succeeds.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the delete fails.
    async fn delete_binary(&self, url: &str) -> Result<(), StoreError>;

    /// Receive a snapshot after every change.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}
