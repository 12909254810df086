use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use crate::camera::{Camera, Point, Size};
use crate::consts::{ZOOM_STEP_IN, ZOOM_STEP_OUT};
use crate::doc::{Anchor, EntityId};
use crate::input::{Button, InputState, Key, Modifiers, PendingEdge, Selection, Tool, UiState, WheelDelta, beyond_click_threshold};
use crate::render::{self, View};
use crate::scene::Scene;
use crate::schedule::RedrawScheduler;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RenderNeeded,
    SelectionChanged(Option<Selection>),
    EntityCreated(EntityId),
    /// An entity finished moving; `x` / `y` are the stored coordinates.
    EntityMoved { id: EntityId, x: f64, y: f64 },
    EntityDeleted { id: EntityId, edges: Vec<EntityId> },
    /// A press/release on an entity that stayed under the click threshold.
    EntityActivated(EntityId),
    EdgeCreated(EntityId),
    EdgeDeleted(EntityId),
    /// The host should ask for a label, then call `confirm_edge` or `cancel_edge`.
    EdgeLabelRequested { from: EntityId, to: EntityId },
    /// The host should confirm, then call `delete_edge`.
    EdgeDeleteRequested(EntityId),
    OpenPage(String),
    /// The document changed in a way that is mirrored to the local cache.
    CacheWrite,
    SetCursor(String),
    ZoomChanged(f64),
}

/// Core engine state: everything that does not touch the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
pub struct EngineCore<S: Scene> {
    pub scene: S,
    pub camera: Camera,
    pub ui: UiState,
    pub input: InputState,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dpr: f64,
}

impl<S: Scene> EngineCore<S> {
    #[must_use]
    pub fn new(scene: S) -> Self {
        Self {
            scene,
            camera: Camera::default(),
            ui: UiState::default(),
            input: InputState::default(),
            viewport_width: 0.0,
            viewport_height: 0.0,
            dpr: 1.0,
        }
    }

    // --- Data inputs ---

    /// Swap in a freshly loaded scene, dropping any gesture and selection.
    pub fn load(&mut self, scene: S) -> Vec<Action> {
        self.scene = scene;
        self.input = InputState::Idle;
        let mut actions = self.clear_selection();
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Update viewport dimensions and device pixel ratio. Each is clamped to at least 1.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.viewport_width = width_css.max(1.0);
        self.viewport_height = height_css.max(1.0);
        self.dpr = if dpr.is_finite() { dpr.max(1.0) } else { 1.0 };
    }

    #[must_use]
    pub fn viewport(&self) -> Size {
        Size::new(self.viewport_width, self.viewport_height)
    }

    // --- Tool ---

    /// Set the active tool. Any in-flight gesture or proposed edge is dropped.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        let cursor = tool.cursor().to_string();
        self.ui.tool = tool;
        self.input = InputState::Idle;
        vec![Action::SetCursor(cursor), Action::RenderNeeded]
    }

    // --- Camera ---

    /// Toolbar zoom, anchored at the viewport centre.
    pub fn zoom_by(&mut self, factor: f64) -> Vec<Action> {
        let center = Point::new(self.viewport_width / 2.0, self.viewport_height / 2.0);
        self.zoom_at(center, factor)
    }

    /// Frame the whole document.
    pub fn fit_to_viewport(&mut self) -> Vec<Action> {
        self.camera = self.scene.fit(self.viewport());
        vec![Action::ZoomChanged(self.camera.zoom), Action::RenderNeeded]
    }

    fn zoom_at(&mut self, anchor: Point, factor: f64) -> Vec<Action> {
        if self.camera.zoom_at(anchor, factor, self.scene.zoom_limits()) {
            vec![Action::ZoomChanged(self.camera.zoom), Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if matches!(self.input, InputState::AwaitingEdgeLabel { .. }) || button == Button::Secondary {
            return Vec::new();
        }

        if button == Button::Middle || modifiers.shift || self.ui.tool == Tool::Pan {
            self.start_pan(screen_pt, None);
            return vec![Action::SetCursor("grabbing".into())];
        }

        let world = self.camera.screen_to_world(screen_pt);

        if let Some((from, from_anchor)) = self.scene.hit_connector(world, &self.camera, &self.ui.tool) {
            self.input = InputState::Connecting { from, from_anchor, current_world: world };
            return vec![Action::SetCursor("crosshair".into()), Action::RenderNeeded];
        }

        if let Tool::Place(kind) = &self.ui.tool {
            let kind = kind.clone();
            self.start_pan(screen_pt, Some(kind));
            return Vec::new();
        }

        if modifiers.command() {
            if let Some(edge) = self.scene.hit_edge(world, &self.camera) {
                return vec![Action::EdgeDeleteRequested(edge)];
            }
        }

        if let Some(id) = self.scene.hit_entity(world, &self.camera) {
            let Some(pos) = self.scene.position(&id) else {
                return Vec::new();
            };
            let mut actions = self.select(Selection::Entity(id.clone()));
            self.input = InputState::DraggingEntity {
                id,
                start_screen: screen_pt,
                grab_offset: Point::new(pos.x - world.x, pos.y - world.y),
                moved: false,
            };
            actions.push(Action::RenderNeeded);
            return actions;
        }

        if let Some(edge) = self.scene.hit_edge(world, &self.camera) {
            let mut actions = self.select(Selection::Edge(edge));
            actions.push(Action::RenderNeeded);
            return actions;
        }

        let mut actions = self.clear_selection();
        if !actions.is_empty() {
            actions.push(Action::RenderNeeded);
        }
        self.start_pan(screen_pt, None);
        actions.push(Action::SetCursor("grabbing".into()));
        actions
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        let world = self.camera.screen_to_world(screen_pt);
        let viewport = self.viewport();
        match &mut self.input {
            InputState::Panning { last_screen, .. } => {
                let (dx, dy) = (screen_pt.x - last_screen.x, screen_pt.y - last_screen.y);
                *last_screen = screen_pt;
                self.camera.pan_by(dx, dy);
                vec![Action::RenderNeeded]
            }
            InputState::DraggingEntity { id, start_screen, grab_offset, moved } => {
                if !*moved && !beyond_click_threshold(*start_screen, screen_pt) {
                    return Vec::new();
                }
                *moved = true;
                let target = Point::new(world.x + grab_offset.x, world.y + grab_offset.y);
                let target = self.scene.constrain_drag(id, target, &self.camera, viewport);
                let id = id.clone();
                self.scene.set_position(&id, target);
                vec![Action::RenderNeeded]
            }
            InputState::Connecting { current_world, .. } => {
                *current_world = world;
                vec![Action::RenderNeeded]
            }
            InputState::Idle | InputState::AwaitingEdgeLabel { .. } => Vec::new(),
        }
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        let world = self.camera.screen_to_world(screen_pt);
        match std::mem::take(&mut self.input) {
            InputState::Panning { start_screen, place: Some(kind), .. }
                if !beyond_click_threshold(start_screen, screen_pt) =>
            {
                self.place(&kind, world)
            }
            InputState::Panning { .. } => vec![Action::SetCursor(self.ui.tool.cursor().into())],
            InputState::DraggingEntity { id, moved, .. } => {
                if !moved {
                    return vec![Action::EntityActivated(id)];
                }
                let mut actions = Vec::new();
                if let Some(p) = self.scene.stored_position(&id) {
                    actions.push(Action::EntityMoved { id, x: p.x, y: p.y });
                }
                self.push_cache_write(&mut actions);
                actions.push(Action::RenderNeeded);
                actions
            }
            InputState::Connecting { from, from_anchor, .. } => self.finish_connect(from, from_anchor, world),
            pending @ InputState::AwaitingEdgeLabel { .. } => {
                self.input = pending;
                Vec::new()
            }
            InputState::Idle => Vec::new(),
        }
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, _modifiers: Modifiers) -> Vec<Action> {
        if delta.dy == 0.0 {
            return Vec::new();
        }
        let factor = if delta.dy < 0.0 { ZOOM_STEP_IN } else { ZOOM_STEP_OUT };
        self.zoom_at(screen_pt, factor)
    }

    pub fn on_key_down(&mut self, key: Key, _modifiers: Modifiers) -> Vec<Action> {
        match key.0.as_str() {
            "Delete" | "Backspace" if matches!(self.input, InputState::Idle) => self.delete_selected(),
            "Escape" => {
                let had_gesture = !matches!(self.input, InputState::Idle);
                self.input = InputState::Idle;
                let mut actions = self.clear_selection();
                if had_gesture || !actions.is_empty() {
                    actions.push(Action::RenderNeeded);
                }
                actions
            }
            _ => Vec::new(),
        }
    }

    // --- Edge confirmation ---

    /// Create the proposed edge with `label`.
    pub fn confirm_edge(&mut self, label: &str) -> Vec<Action> {
        let InputState::AwaitingEdgeLabel { pending } = std::mem::take(&mut self.input) else {
            return Vec::new();
        };
        self.create_edge(&pending, label)
    }

    /// Drop the proposed edge.
    pub fn cancel_edge(&mut self) -> Vec<Action> {
        if matches!(self.input, InputState::AwaitingEdgeLabel { .. }) {
            self.input = InputState::Idle;
            return vec![Action::RenderNeeded];
        }
        Vec::new()
    }

    pub fn delete_edge(&mut self, id: &str) -> Vec<Action> {
        if !self.scene.delete_edge(id) {
            return Vec::new();
        }
        let mut actions = Vec::new();
        if self.ui.selection == Some(Selection::Edge(id.to_string())) {
            actions.extend(self.clear_selection());
        }
        actions.push(Action::EdgeDeleted(id.to_string()));
        self.push_cache_write(&mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Inspector ---

    /// Delete the selected entity (with its edges) or edge.
    pub fn delete_selected(&mut self) -> Vec<Action> {
        match self.ui.selection.clone() {
            Some(Selection::Entity(id)) => {
                let Some(edges) = self.scene.delete_entity(&id) else {
                    return Vec::new();
                };
                let mut actions = self.clear_selection();
                actions.push(Action::EntityDeleted { id, edges });
                self.push_cache_write(&mut actions);
                actions.push(Action::RenderNeeded);
                actions
            }
            Some(Selection::Edge(id)) => self.delete_edge(&id),
            None => Vec::new(),
        }
    }

    /// Rename the selected entity or edge.
    pub fn set_label(&mut self, label: &str) -> Vec<Action> {
        let Some(selection) = self.ui.selection.clone() else {
            return Vec::new();
        };
        if !self.scene.set_label(&selection, label) {
            return Vec::new();
        }
        let mut actions = Vec::new();
        self.push_cache_write(&mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Link the selected entity to a wiki page (`None` or blank clears it).
    pub fn set_linked_page(&mut self, page: Option<String>) -> Vec<Action> {
        let Some(Selection::Entity(id)) = self.ui.selection.clone() else {
            return Vec::new();
        };
        if !self.scene.set_linked_page(&id, page) {
            return Vec::new();
        }
        let mut actions = Vec::new();
        self.push_cache_write(&mut actions);
        actions
    }

    /// Navigate to the selected entity's linked page, if it has one.
    pub fn open_linked_page(&self) -> Vec<Action> {
        let Some(Selection::Entity(id)) = &self.ui.selection else {
            return Vec::new();
        };
        self.scene.linked_page(id).map(Action::OpenPage).into_iter().collect()
    }

    // --- Queries ---

    /// The current selection, if any.
    #[must_use]
    pub fn selection(&self) -> Option<&Selection> {
        self.ui.selection.as_ref()
    }

    /// The current camera state.
    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Edge waiting for a label, if any.
    #[must_use]
    pub fn pending_edge(&self) -> Option<&PendingEdge> {
        match &self.input {
            InputState::AwaitingEdgeLabel { pending } => Some(pending),
            _ => None,
        }
    }

    // --- Internals ---

    fn start_pan(&mut self, screen_pt: Point, place: Option<String>) {
        self.input = InputState::Panning { start_screen: screen_pt, last_screen: screen_pt, place };
    }

    fn select(&mut self, selection: Selection) -> Vec<Action> {
        if self.ui.selection.as_ref() == Some(&selection) {
            return Vec::new();
        }
        self.ui.selection = Some(selection.clone());
        vec![Action::SelectionChanged(Some(selection))]
    }

    fn clear_selection(&mut self) -> Vec<Action> {
        if self.ui.selection.take().is_some() { vec![Action::SelectionChanged(None)] } else { Vec::new() }
    }

    fn push_cache_write(&self, actions: &mut Vec<Action>) {
        if self.scene.writes_through() {
            actions.push(Action::CacheWrite);
        }
    }

    fn place(&mut self, kind: &str, world: Point) -> Vec<Action> {
        let Some(id) = self.scene.place(kind, world) else {
            return Vec::new();
        };
        let mut actions = vec![Action::EntityCreated(id.clone())];
        actions.extend(self.select(Selection::Entity(id)));
        self.push_cache_write(&mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    fn finish_connect(&mut self, from: EntityId, from_anchor: Option<Anchor>, world: Point) -> Vec<Action> {
        let target = self
            .scene
            .hit_connector(world, &self.camera, &self.ui.tool)
            .or_else(|| self.scene.hit_entity(world, &self.camera).map(|id| (id, None)));
        let mut actions = vec![Action::SetCursor(self.ui.tool.cursor().into())];
        let Some((to, to_anchor)) = target.filter(|(to, _)| *to != from) else {
            actions.push(Action::RenderNeeded);
            return actions;
        };
        let pending = PendingEdge { from, to, from_anchor, to_anchor };
        if self.scene.prompts_edge_label() {
            actions.push(Action::EdgeLabelRequested { from: pending.from.clone(), to: pending.to.clone() });
            self.input = InputState::AwaitingEdgeLabel { pending };
            actions.push(Action::RenderNeeded);
            return actions;
        }
        actions.extend(self.create_edge(&pending, ""));
        actions
    }

    fn create_edge(&mut self, pending: &PendingEdge, label: &str) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Some(id) = self.scene.connect(pending, label) {
            actions.push(Action::EdgeCreated(id));
            self.push_cache_write(&mut actions);
        }
        actions.push(Action::RenderNeeded);
        actions
    }
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine<S: Scene> {
    canvas: HtmlCanvasElement,
    background: Option<HtmlImageElement>,
    scheduler: RedrawScheduler,
    pub core: EngineCore<S>,
}

impl<S: Scene> Engine<S> {
    /// Create a new engine bound to the given canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement, scene: S) -> Self {
        Self { canvas, background: None, scheduler: RedrawScheduler::new(), core: EngineCore::new(scene) }
    }

    /// Image painted by scenes that draw a background image.
    pub fn set_background_image(&mut self, image: Option<HtmlImageElement>) {
        self.background = image;
    }

    // --- Viewport ---

    /// Update viewport dimensions and resize the backing store to match the DPR.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.core.set_viewport(width_css, height_css, dpr);
        self.canvas.set_width(render::backing_size(self.core.viewport_width, self.core.dpr));
        self.canvas.set_height(render::backing_size(self.core.viewport_height, self.core.dpr));
    }

    // --- Frames ---

    /// Schedule `on_frame` for the next animation frame unless one is already
    /// pending. The callback should call [`Engine::frame`]. Returns whether a
    /// new frame was scheduled.
    ///
    /// # Errors
    ///
    /// Returns `Err` if there is no window or the browser refuses the request.
    pub fn request_frame(&mut self, on_frame: &Closure<dyn FnMut(f64)>) -> Result<bool, JsValue> {
        if !self.scheduler.request() {
            return Ok(false);
        }
        let Some(window) = web_sys::window() else {
            self.scheduler.cancel();
            return Err(JsValue::from_str("no window"));
        };
        if let Err(e) = window.request_animation_frame(on_frame.as_ref().unchecked_ref()) {
            self.scheduler.cancel();
            return Err(e);
        }
        Ok(true)
    }

    /// Animation-frame entry point: draws once per scheduled frame.
    ///
    /// # Errors
    ///
    /// Returns `Err` if drawing fails.
    pub fn frame(&mut self) -> Result<(), JsValue> {
        if self.scheduler.begin_frame() { self.render() } else { Ok(()) }
    }

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the 2D context is unavailable or a draw call fails.
    pub fn render(&self) -> Result<(), JsValue> {
        let Some(ctx) = self.canvas.get_context("2d")? else {
            return Err(JsValue::from_str("2d context unavailable"));
        };
        let ctx: CanvasRenderingContext2d = ctx.dyn_into()?;
        let view = View { camera: self.core.camera, viewport: self.core.viewport() };
        let list = render::build_display_list(&self.core.scene, &self.core.ui, &self.core.input, &view);
        render::paint(&ctx, &list, &view, self.core.dpr, self.background.as_ref())
    }
}
