//! Scene persistence: scene documents in page metadata, mirrored locally.
//!
//! DESIGN
//! ======
//! Each editor keeps its document as a JSON string in one page meta field
//! (`map`, `graph`, `system`). Loading reads the page from the store and
//! runs the document through migration. When the store fails or has no
//! document, the local cache copy is used if it belongs to the same page,
//! and otherwise the default document. Loading never fails.
//!
//! Maps and systems also mirror their last document and page key into the
//! local cache on every committed edit, so an interrupted session can be
//! restored. The relationship graph has no cache mirror.
//!
//! ERROR HANDLING
//! ==============
//! `save` returns `PersistError`; sessions turn it into a user notice. The
//! caller's document is only borrowed, so a failed save leaves it intact.
//! Cache problems are logged and otherwise ignored.

#[cfg(test)]
#[path = "persistence_test.rs"]
mod persistence_test;

use std::sync::Arc;

use canvas::doc::{SceneDocument, SceneError, SceneKind, from_meta_field};
use canvas::palette::{MarkerCategory, Palette};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{
    LAST_MAP_SLUG, LAST_MAP_STATE, LAST_SYSTEM_SLUG, LAST_SYSTEM_STATE, LocalCache, MAP_CUSTOM_CATEGORIES,
    MAP_VISIBLE_CATS,
};
use crate::category::Category;
use crate::context::AppContext;
use crate::page::Page;
use crate::store::{DocumentStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The document could not be serialised.
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// A new page was requested with a name that yields an empty key.
    #[error("name is empty")]
    EmptyName,

    /// A new page would overwrite an existing one.
    #[error("page `{0}` already exists")]
    Exists(String),
}

/// Local cache keys that mirror one editor's last document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheKeys {
    pub slug: &'static str,
    pub state: &'static str,
}

/// Cache keys for `kind`, or `None` if that editor is not mirrored.
#[must_use]
pub fn cache_keys(kind: SceneKind) -> Option<CacheKeys> {
    match kind {
        SceneKind::Map => Some(CacheKeys { slug: LAST_MAP_SLUG, state: LAST_MAP_STATE }),
        SceneKind::System => Some(CacheKeys { slug: LAST_SYSTEM_SLUG, state: LAST_SYSTEM_STATE }),
        SceneKind::Relationships => None,
    }
}

#[derive(Clone)]
pub struct ScenePersistence {
    store: Arc<dyn DocumentStore>,
    cache: Arc<dyn LocalCache>,
}

impl ScenePersistence {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, cache: Arc<dyn LocalCache>) -> Self {
        Self { store, cache }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<dyn LocalCache> {
        &self.cache
    }

    /// Load the document stored on `page_id`.
    pub async fn load<D: SceneDocument>(&self, page_id: &str) -> D {
        let field = D::KIND.meta_field();
        match self.store.load(page_id).await {
            Ok(Some(page)) => match page.meta.get(field) {
                Some(Value::Null) | None => debug!(page_id, kind = %D::KIND, "page has no scene document"),
                Some(Value::String(raw)) if raw.trim().is_empty() => {
                    debug!(page_id, kind = %D::KIND, "page has an empty scene document");
                }
                stored => return from_meta_field(stored),
            },
            Ok(None) => debug!(page_id, kind = %D::KIND, "page not found"),
            Err(e) => warn!(error = %e, page_id, kind = %D::KIND, "store load failed, trying local cache"),
        }
        if let Some(doc) = self.cached(page_id) {
            info!(page_id, kind = %D::KIND, "restored scene from local cache");
            return doc;
        }
        D::default()
    }

    /// The cached document for `page_id`, if the cache mirrors that page.
    fn cached<D: SceneDocument>(&self, page_id: &str) -> Option<D> {
        let keys = cache_keys(D::KIND)?;
        if self.cache.get(keys.slug).as_deref() != Some(page_id) {
            return None;
        }
        let raw = self.cache.get(keys.state)?;
        match canvas::doc::parse(&raw) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(error = %e, page_id, kind = %D::KIND, "cached scene unreadable");
                None
            }
        }
    }

    /// Write `doc` into the page `page_id`, creating the page if needed.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] if the document cannot be serialised or the
    /// store rejects the write. Neither `ctx` nor the cache change then.
    pub async fn save<D: SceneDocument>(&self, ctx: &mut AppContext, page_id: &str, doc: &D) -> Result<(), PersistError> {
        let json = doc.to_json()?;
        let mut page = ctx.page(page_id).cloned().unwrap_or_else(|| Page::for_scene(D::KIND, page_id));
        page.meta.insert(D::KIND.meta_field().into(), Value::String(json.clone()));
        self.store.save(page_id, &page).await?;
        ctx.upsert(page_id, page);
        self.mirror(D::KIND, page_id, &json);
        info!(page_id, kind = %D::KIND, "scene saved");
        Ok(())
    }

    /// Create the page `page_id` titled `title` holding `doc`.
    ///
    /// # Errors
    ///
    /// Returns `PersistError::Exists` if the context already has that page,
    /// otherwise as [`ScenePersistence::save`].
    pub async fn create<D: SceneDocument>(
        &self,
        ctx: &mut AppContext,
        page_id: &str,
        title: &str,
        doc: &D,
    ) -> Result<(), PersistError> {
        if ctx.page(page_id).is_some() {
            return Err(PersistError::Exists(page_id.to_string()));
        }
        let json = doc.to_json()?;
        let mut page = Page::new(Category::for_scene(D::KIND), title);
        page.meta.insert(D::KIND.meta_field().into(), Value::String(json.clone()));
        self.store.save(page_id, &page).await?;
        ctx.upsert(page_id, page);
        self.mirror(D::KIND, page_id, &json);
        info!(page_id, kind = %D::KIND, "scene page created");
        Ok(())
    }

    /// Mirror the in-progress `doc` to the local cache.
    pub fn write_cache<D: SceneDocument>(&self, page_id: &str, doc: &D) {
        if cache_keys(D::KIND).is_none() {
            return;
        }
        match doc.to_json() {
            Ok(json) => self.mirror(D::KIND, page_id, &json),
            Err(e) => warn!(error = %e, page_id, kind = %D::KIND, "scene not cached"),
        }
    }

    fn mirror(&self, kind: SceneKind, page_id: &str, json: &str) {
        if let Some(keys) = cache_keys(kind) {
            self.cache.set(keys.slug, page_id);
            self.cache.set(keys.state, json);
        }
    }

    /// Record `page_id` as the last opened page of `kind`. A mirror left by
    /// another page is dropped.
    pub fn remember_selection(&self, kind: SceneKind, page_id: &str) {
        if let Some(keys) = cache_keys(kind) {
            if self.cache.get(keys.slug).as_deref() != Some(page_id) {
                self.cache.remove(keys.state);
            }
            self.cache.set(keys.slug, page_id);
        }
    }

    /// Forget the last opened page of `kind`, dropping its mirror too.
    pub fn forget_selection(&self, kind: SceneKind) {
        if let Some(keys) = cache_keys(kind) {
            self.cache.remove(keys.slug);
            self.cache.remove(keys.state);
        }
    }

    #[must_use]
    pub fn last_selection(&self, kind: SceneKind) -> Option<String> {
        cache_keys(kind).and_then(|keys| self.cache.get(keys.slug)).filter(|slug| !slug.is_empty())
    }

    /// Persist custom marker categories and the visible set.
    pub fn save_palette(&self, palette: &Palette) {
        match serde_json::to_string(palette.custom_categories()) {
            Ok(json) => self.cache.set(MAP_CUSTOM_CATEGORIES, &json),
            Err(e) => warn!(error = %e, "custom categories not cached"),
        }
        match serde_json::to_string(&palette.visible_keys()) {
            Ok(json) => self.cache.set(MAP_VISIBLE_CATS, &json),
            Err(e) => warn!(error = %e, "visible categories not cached"),
        }
    }

    /// Default palette plus whatever custom categories and visibility the
    /// cache holds.
    #[must_use]
    pub fn restore_palette(&self) -> Palette {
        let mut palette = Palette::new();
        if let Some(raw) = self.cache.get(MAP_CUSTOM_CATEGORIES) {
            match serde_json::from_str::<Vec<MarkerCategory>>(&raw) {
                Ok(custom) => palette.restore_custom(custom),
                Err(e) => warn!(error = %e, "cached custom categories unreadable"),
            }
        }
        if let Some(raw) = self.cache.get(MAP_VISIBLE_CATS) {
            match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(visible) => palette.restore_visible(&visible),
                Err(e) => warn!(error = %e, "cached visible categories unreadable"),
            }
        }
        palette
    }
}
