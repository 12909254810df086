//! Editor sessions: one canvas editor bound to one page.
//!
//! DESIGN
//! ======
//! An `EditorSession` owns the engine of one editor kind plus the
//! persistence adapter, and remembers which page it shows. Opening a page
//! is three steps so the host can release the context during the await:
//! `begin_open` issues a `LoadTicket`, `load` fetches the document, and
//! `apply_loaded` installs it only if the ticket is still current.
//!
//! The free functions below cover the page-level operations around the
//! editors: creating and deleting map and system pages, picking the page to
//! reopen on start, and folding remote changes into the context.
//!
//! ERROR HANDLING
//! ==============
//! Saves report a `Notice` instead of an error so the host can show it
//! and move on; the in-memory document is never rolled back. Page-level
//! operations return `PersistError`.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use canvas::camera::Size;
use canvas::doc::{MapDoc, RELATIONSHIPS_PAGE, SceneDocument, SceneError, SceneKind, SystemDoc};
use canvas::engine::{Action, EngineCore};
use canvas::map_scene::MapScene;
use canvas::relationship_scene::RelationshipScene;
use canvas::scene::Scene;
use canvas::system_scene::SystemScene;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::category::Category;
use crate::context::{AppContext, LoadTicket};
use crate::page::slugify;
use crate::persistence::{PersistError, ScenePersistence};
use crate::store::{Progress, StoreEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

/// Builds an editor scene around a loaded document.
pub trait SceneFactory: Scene + Sized {
    fn build(doc: Self::Doc, persistence: &ScenePersistence) -> Self;
}

impl SceneFactory for MapScene {
    fn build(doc: MapDoc, persistence: &ScenePersistence) -> Self {
        MapScene::new(doc, persistence.restore_palette())
    }
}

impl SceneFactory for SystemScene {
    fn build(doc: SystemDoc, _persistence: &ScenePersistence) -> Self {
        SystemScene::new(doc)
    }
}

impl SceneFactory for RelationshipScene {
    fn build(doc: canvas::doc::RelationshipDoc, _persistence: &ScenePersistence) -> Self {
        RelationshipScene::new(doc)
    }
}

pub struct EditorSession<S: SceneFactory> {
    persistence: ScenePersistence,
    engine: EngineCore<S>,
    page_id: Option<String>,
}

impl<S: SceneFactory> EditorSession<S> {
    /// Session showing an empty default document until a page is opened.
    #[must_use]
    pub fn new(persistence: ScenePersistence) -> Self {
        let scene = S::build(S::Doc::default(), &persistence);
        Self { persistence, engine: EngineCore::new(scene), page_id: None }
    }

    #[must_use]
    pub fn page_id(&self) -> Option<&str> {
        self.page_id.as_deref()
    }

    #[must_use]
    pub fn engine(&self) -> &EngineCore<S> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut EngineCore<S> {
        &mut self.engine
    }

    #[must_use]
    pub fn persistence(&self) -> &ScenePersistence {
        &self.persistence
    }

    /// Select `page_id` and return the ticket its load must present.
    pub fn begin_open(ctx: &mut AppContext, page_id: &str) -> LoadTicket {
        ctx.select(page_id)
    }

    /// Fetch the document for `ticket`. Never fails.
    pub async fn load(persistence: &ScenePersistence, ticket: &LoadTicket) -> S::Doc {
        persistence.load(&ticket.page_id).await
    }

    /// Install a loaded document if `ticket` is still current. Returns the
    /// engine actions, or `None` if the load was stale and dropped.
    pub fn apply_loaded(&mut self, ctx: &AppContext, ticket: &LoadTicket, doc: S::Doc) -> Option<Vec<Action>> {
        if !ctx.is_current(ticket) {
            debug!(page_id = %ticket.page_id, generation = ticket.generation, "stale scene load dropped");
            return None;
        }
        self.persistence.remember_selection(<S::Doc as SceneDocument>::KIND, &ticket.page_id);
        self.page_id = Some(ticket.page_id.clone());
        let scene = S::build(doc, &self.persistence);
        let mut actions = self.engine.load(scene);
        actions.extend(self.engine.fit_to_viewport());
        Some(actions)
    }

    /// Open `page_id` in one go.
    pub async fn open(&mut self, ctx: &mut AppContext, page_id: &str) -> Vec<Action> {
        let ticket = Self::begin_open(ctx, page_id);
        let doc = Self::load(&self.persistence, &ticket).await;
        self.apply_loaded(ctx, &ticket, doc).unwrap_or_default()
    }

    /// Write the current document to its page.
    pub async fn save(&self, ctx: &mut AppContext) -> Notice {
        let Some(page_id) = self.page_id.as_deref() else {
            return Notice::error("No page is open");
        };
        match self.persistence.save(ctx, page_id, self.engine.scene.doc()).await {
            Ok(()) => Notice::info("Saved"),
            Err(e) => {
                let kind = <S::Doc as SceneDocument>::KIND;
                warn!(error = %e, page_id, %kind, "scene save failed");
                Notice::error(format!("Save failed: {e}"))
            }
        }
    }

    /// Carry out the persistence side of engine actions.
    pub fn apply_actions(&self, actions: &[Action]) {
        let Some(page_id) = self.page_id.as_deref() else {
            return;
        };
        if actions.contains(&Action::CacheWrite) {
            self.persistence.write_cache(page_id, self.engine.scene.doc());
        }
    }
}

impl EditorSession<MapScene> {
    /// Register a custom marker category and persist the palette.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError`] for an empty or duplicate category name.
    pub fn add_category(&mut self, label: &str, color: &str, icon: &str) -> Result<String, SceneError> {
        let key = self.engine.scene.palette_mut().add_custom(label, color, icon)?;
        self.persistence.save_palette(self.engine.scene.palette());
        Ok(key)
    }

    /// Show or hide one marker category and persist the choice.
    pub fn set_category_visible(&mut self, key: &str, visible: bool) -> Vec<Action> {
        self.engine.scene.palette_mut().set_visible(key, visible);
        self.persistence.save_palette(self.engine.scene.palette());
        vec![Action::RenderNeeded]
    }
}

impl EditorSession<RelationshipScene> {
    /// Match the cards to the current character pages.
    pub fn sync_pages(&mut self, ctx: &AppContext) -> Vec<Action> {
        let width = self.engine.viewport_width;
        if self.engine.scene.sync_pages(&ctx.character_cards(), width) {
            vec![Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }
}

/// A map background image to upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub size: Size,
}

/// `a b?.png` → `a_b_.png`.
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

fn now_millis() -> i128 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}

/// Create a map page named `name`, uploading its image first when given.
/// Returns the new page key.
///
/// # Errors
///
/// Returns `PersistError::EmptyName` if `name` has no usable characters,
/// `PersistError::Exists` if the key is taken, or the upload/store error.
pub async fn create_map(
    persistence: &ScenePersistence,
    ctx: &mut AppContext,
    name: &str,
    image: Option<ImageUpload>,
    on_progress: Progress<'_>,
) -> Result<String, PersistError> {
    let slug = new_page_key(ctx, name)?;
    let mut doc = MapDoc::default();
    if let Some(image) = image {
        let path = format!("maps/{slug}/{}_{}", now_millis(), sanitize_file_name(&image.file_name));
        let url = persistence.store().upload(&path, image.bytes, on_progress).await?;
        doc.image_url = Some(url);
        doc.image_size = Some(image.size);
    }
    persistence.create(ctx, &slug, name.trim(), &doc).await?;
    info!(page_id = %slug, "map created");
    Ok(slug)
}

/// Create an empty system page named `name`. Returns the new page key.
///
/// # Errors
///
/// As [`create_map`], without the upload.
pub async fn create_system(persistence: &ScenePersistence, ctx: &mut AppContext, name: &str) -> Result<String, PersistError> {
    let slug = new_page_key(ctx, name)?;
    persistence.create(ctx, &slug, name.trim(), &SystemDoc::default()).await?;
    info!(page_id = %slug, "system created");
    Ok(slug)
}

fn new_page_key(ctx: &AppContext, name: &str) -> Result<String, PersistError> {
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(PersistError::EmptyName);
    }
    if ctx.page(&slug).is_some() {
        return Err(PersistError::Exists(slug));
    }
    Ok(slug)
}

/// Delete a map page and its uploaded image. Returns the map to show next.
///
/// # Errors
///
/// Returns the store error if the page could not be deleted. A failed
/// image delete is logged and does not stop the page delete.
pub async fn delete_map(persistence: &ScenePersistence, ctx: &mut AppContext, slug: &str) -> Result<Option<String>, PersistError> {
    let doc: MapDoc = canvas::doc::from_meta_field(ctx.page(slug).and_then(|p| p.meta.get(SceneKind::Map.meta_field())));
    if let Some(url) = doc.image_url.as_deref() {
        if let Err(e) = persistence.store().delete_binary(url).await {
            warn!(error = %e, page_id = slug, url, "map image delete failed");
        }
    }
    delete_scene_page(persistence, ctx, SceneKind::Map, slug).await
}

/// Delete a system page. Returns the system to show next.
///
/// # Errors
///
/// Returns the store error if the page could not be deleted.
pub async fn delete_system(persistence: &ScenePersistence, ctx: &mut AppContext, slug: &str) -> Result<Option<String>, PersistError> {
    delete_scene_page(persistence, ctx, SceneKind::System, slug).await
}

async fn delete_scene_page(
    persistence: &ScenePersistence,
    ctx: &mut AppContext,
    kind: SceneKind,
    slug: &str,
) -> Result<Option<String>, PersistError> {
    persistence.store().delete(slug).await?;
    ctx.remove(slug);
    let next = ctx.pages_in(Category::for_scene(kind)).into_iter().next();
    match next.as_deref() {
        Some(next) => persistence.remember_selection(kind, next),
        None => persistence.forget_selection(kind),
    }
    info!(page_id = slug, %kind, next = ?next, "scene page deleted");
    Ok(next)
}

/// The page an editor of `kind` should open on start: the last one opened
/// if it still exists, else the first page of that kind.
#[must_use]
pub fn restore_last(persistence: &ScenePersistence, ctx: &AppContext, kind: SceneKind) -> Option<String> {
    if kind == SceneKind::Relationships {
        return Some(RELATIONSHIPS_PAGE.to_string());
    }
    let category = Category::for_scene(kind);
    persistence
        .last_selection(kind)
        .filter(|slug| ctx.page(slug).is_some_and(|page| page.category() == category))
        .or_else(|| ctx.pages_in(category).into_iter().next())
}

/// Fold a store change notification into the context.
pub fn apply_store_event(ctx: &mut AppContext, event: StoreEvent) {
    match event {
        StoreEvent::PagesChanged(pages) => {
            debug!(count = pages.len(), "page index refreshed");
            ctx.replace_all(pages);
        }
    }
}
