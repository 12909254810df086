//! The seam between the generic interaction engine and one editor's document.
//!
//! [`crate::engine::EngineCore`] drives pointer gestures, camera moves and
//! selection; everything that depends on what the entities *are* (their
//! shape for hit-testing, how a position is stored, what placing or
//! connecting creates, how they are drawn) lives behind [`Scene`]. The three
//! editors implement it in [`crate::map_scene`], [`crate::system_scene`] and
//! [`crate::relationship_scene`].

use crate::camera::{Camera, Point, Size, ZoomLimits};
use crate::doc::{Anchor, EntityId, SceneDocument};
use crate::input::{PendingEdge, Selection, Tool};
use crate::render::{Layer, LayerWriter, View};

/// One editor's document plus its geometry and drawing rules.
pub trait Scene {
    type Doc: SceneDocument;

    fn doc(&self) -> &Self::Doc;

    fn zoom_limits(&self) -> ZoomLimits;

    /// Whether committed edits are mirrored into the local cache.
    fn writes_through(&self) -> bool {
        true
    }

    /// Whether a new edge waits for the host to supply its label.
    fn prompts_edge_label(&self) -> bool {
        false
    }

    /// World position used for dragging (centre or top-left, per editor).
    fn position(&self, id: &str) -> Option<Point>;

    /// Position as persisted, reported to the host after a move.
    fn stored_position(&self, id: &str) -> Option<Point> {
        self.position(id)
    }

    /// Move an entity. Returns `false` if the id is unknown.
    fn set_position(&mut self, id: &str, world: Point) -> bool;

    /// Adjust a drag target before it is applied.
    fn constrain_drag(&self, _id: &str, world: Point, _camera: &Camera, _viewport: Size) -> Point {
        world
    }

    fn hit_entity(&self, world: Point, camera: &Camera) -> Option<EntityId>;

    fn hit_edge(&self, _world: Point, _camera: &Camera) -> Option<EntityId> {
        None
    }

    /// A point that starts or ends an edge under the current tool.
    fn hit_connector(&self, _world: Point, _camera: &Camera, _tool: &Tool) -> Option<(EntityId, Option<Anchor>)> {
        None
    }

    /// World point where an edge attaches to an entity.
    fn connector_point(&self, id: &str, _anchor: Option<Anchor>) -> Option<Point> {
        self.position(id)
    }

    /// Create an entity of `kind` at `world`. `None` if the editor does not place entities.
    fn place(&mut self, _kind: &str, _world: Point) -> Option<EntityId> {
        None
    }

    /// Create the proposed edge. `None` if it is rejected.
    fn connect(&mut self, _edge: &PendingEdge, _label: &str) -> Option<EntityId> {
        None
    }

    /// Remove an entity and every edge touching it. Returns the removed edge
    /// ids, or `None` if nothing was removed.
    fn delete_entity(&mut self, id: &str) -> Option<Vec<EntityId>>;

    fn delete_edge(&mut self, _id: &str) -> bool {
        false
    }

    fn set_label(&mut self, selection: &Selection, label: &str) -> bool;

    fn linked_page(&self, _id: &str) -> Option<String> {
        None
    }

    fn set_linked_page(&mut self, _id: &str, _page: Option<String>) -> bool {
        false
    }

    /// Camera that shows the whole document in `viewport`.
    fn fit(&mut self, viewport: Size) -> Camera;

    /// Emit commands for one layer.
    fn draw(&self, layer: Layer, out: &mut LayerWriter<'_>, view: &View);

    /// Emit overlay commands highlighting `selection`.
    fn draw_selection(&self, selection: &Selection, out: &mut LayerWriter<'_>, view: &View);
}

/// `Some(page)` for a non-blank page name, trimmed.
pub(crate) fn page_or_none(page: Option<String>) -> Option<String> {
    page.map(|p| p.trim().to_string()).filter(|p| !p.is_empty())
}

/// `New Location`, `New Entity`, …
pub(crate) fn default_label(kind_label: &str) -> String {
    format!("New {kind_label}")
}
