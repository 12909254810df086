//! Input model: tools, modifier keys, mouse buttons, selection, and the
//! gesture state machine.
//!
//! `Tool` and `Modifiers` capture the user's intent at the time of a pointer
//! event. `InputState` is the active gesture being tracked between
//! pointer-down and pointer-up, carrying all context needed to compute
//! incremental deltas and to tell a click from a drag on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::consts::CLICK_THRESHOLD_PX;
use crate::doc::{Anchor, EntityId};

/// Which tool is currently active.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Tool {
    /// Every drag pans; nothing is selected or created.
    Pan,
    /// Select, move, and inspect entities (default).
    #[default]
    Select,
    /// Create an entity of the given kind on click.
    Place(String),
    /// Draw an edge between two entities.
    Connect,
}

impl Tool {
    /// Map a toolbar name to a tool. Names other than `pan`, `select`, and
    /// `connect` are placement kinds; `node` places a default system entity.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "pan" => Self::Pan,
            "" | "select" => Self::Select,
            "connect" => Self::Connect,
            "node" => Self::Place("entity".to_string()),
            other => Self::Place(other.to_string()),
        }
    }

    /// Cursor shown while the tool is idle over the canvas.
    #[must_use]
    pub fn cursor(&self) -> &'static str {
        match self {
            Self::Pan => "grab",
            Self::Select => "default",
            Self::Place(_) | Self::Connect => "crosshair",
        }
    }
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Command on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key as reported by the browser (e.g. `"Delete"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// What the inspector is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Entity(EntityId),
    Edge(EntityId),
}

impl Selection {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Entity(id) | Self::Edge(id) => id,
        }
    }
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Currently active tool.
    pub tool: Tool,
    /// Current selection, if any.
    pub selection: Option<Selection>,
}

/// An edge waiting for the host to confirm its label.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEdge {
    pub from: EntityId,
    pub to: EntityId,
    pub from_anchor: Option<Anchor>,
    pub to_anchor: Option<Anchor>,
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is dragging the view.
    Panning {
        /// Screen position at pointer-down.
        start_screen: Point,
        /// Screen position of the previous pointer event.
        last_screen: Point,
        /// Kind to place if the gesture ends as a click.
        place: Option<String>,
    },
    /// The user pressed on an entity and may be moving it.
    DraggingEntity {
        id: EntityId,
        /// Screen position at pointer-down.
        start_screen: Point,
        /// Entity position minus pointer position, in world units.
        grab_offset: Point,
        /// Set once the pointer has left the click threshold.
        moved: bool,
    },
    /// The user is dragging out a new edge from an entity.
    Connecting {
        from: EntityId,
        from_anchor: Option<Anchor>,
        /// World position of the preview line's free end.
        current_world: Point,
    },
    /// An edge has been proposed; waiting for `confirm_edge` or `cancel_edge`.
    AwaitingEdgeLabel { pending: PendingEdge },
}

/// Whether the pointer moved far enough from `start` to count as a drag.
#[must_use]
pub fn beyond_click_threshold(start: Point, now: Point) -> bool {
    start.dist_sq(now) > CLICK_THRESHOLD_PX * CLICK_THRESHOLD_PX
}
