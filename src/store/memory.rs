//! In-process store for tests and offline use.

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{RwLock, broadcast};
use tracing::debug;

use super::{DocumentStore, EVENT_CAPACITY, PageSnapshot, Progress, StoreError, StoreEvent};
use crate::page::Page;

const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;
const URL_SCHEME: &str = "memory://";

pub struct MemoryStore {
    pages: RwLock<PageSnapshot>,
    binaries: RwLock<HashMap<String, Vec<u8>>>,
    events: broadcast::Sender<StoreEvent>,
    reject_writes: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_pages(PageSnapshot::new())
    }

    /// Store pre-populated with `pages`.
    #[must_use]
    pub fn with_pages(pages: PageSnapshot) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            pages: RwLock::new(pages),
            binaries: RwLock::new(HashMap::new()),
            events,
            reject_writes: AtomicBool::new(false),
        }
    }

    /// Make every following write fail, to exercise error paths.
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Whether a binary is stored at `url`.
    pub async fn has_binary(&self, url: &str) -> bool {
        self.binaries.read().await.contains_key(url)
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Rejected("memory store is read-only".into()));
        }
        Ok(())
    }

    fn publish(&self, snapshot: PageSnapshot) {
        if self.events.send(StoreEvent::PagesChanged(snapshot)).is_err() {
            debug!("no store subscribers");
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn load(&self, key: &str) -> Result<Option<Page>, StoreError> {
        Ok(self.pages.read().await.get(key).cloned())
    }

    async fn save(&self, key: &str, page: &Page) -> Result<(), StoreError> {
        self.check_writable()?;
        let snapshot = {
            let mut pages = self.pages.write().await;
            pages.entry(key.to_string()).or_default().merge_from(page);
            pages.clone()
        };
        self.publish(snapshot);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        let snapshot = {
            let mut pages = self.pages.write().await;
            if pages.remove(key).is_none() {
                return Ok(());
            }
            pages.clone()
        };
        self.publish(snapshot);
        Ok(())
    }

    async fn list(&self) -> Result<PageSnapshot, StoreError> {
        Ok(self.pages.read().await.clone())
    }

    async fn upload(&self, path: &str, bytes: Vec<u8>, on_progress: Progress<'_>) -> Result<String, StoreError> {
        self.check_writable()?;
        let total = bytes.len();
        on_progress(0.0);
        let mut sent = 0usize;
        for chunk in bytes.chunks(UPLOAD_CHUNK_BYTES) {
            sent += chunk.len();
            #[allow(clippy::cast_precision_loss)]
            let percent = sent as f64 / total as f64 * 100.0;
            on_progress(percent);
        }
        if total == 0 {
            on_progress(100.0);
        }
        let url = format!("{URL_SCHEME}{}", path.trim_start_matches('/'));
        self.binaries.write().await.insert(url.clone(), bytes);
        Ok(url)
    }

    async fn delete_binary(&self, url: &str) -> Result<(), StoreError> {
        self.check_writable()?;
        self.binaries.write().await.remove(url);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
