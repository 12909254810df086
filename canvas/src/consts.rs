//! Shared numeric constants for the canvas crate.

// ── Gestures ────────────────────────────────────────────────────

/// Pointer travel (screen pixels) below which a press/release pair is a click.
pub const CLICK_THRESHOLD_PX: f64 = 4.0;

/// Zoom factor applied per wheel notch or toolbar press when zooming in.
pub const ZOOM_STEP_IN: f64 = 1.1;

/// Zoom factor applied per wheel notch or toolbar press when zooming out.
pub const ZOOM_STEP_OUT: f64 = 0.9;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space radius of a map marker.
pub const MARKER_RADIUS_PX: f64 = 10.0;

/// Screen-space radius of a system node.
pub const SYSTEM_NODE_RADIUS_PX: f64 = 18.0;

/// Extra world-space slop added to the system node hit radius.
pub const SYSTEM_NODE_SLOP: f64 = 2.0;

/// Screen-space tolerance for picking an edge segment.
pub const EDGE_TOLERANCE_PX: f64 = 12.0;

/// Screen-space radius of a relationship card anchor.
pub const ANCHOR_RADIUS_PX: f64 = 8.0;

// ── Relationship layout ─────────────────────────────────────────

/// Character card width in world units.
pub const CARD_WIDTH: f64 = 120.0;

/// Character card height in world units.
pub const CARD_HEIGHT: f64 = 160.0;

/// Connection anchors on each of the left and right card sides.
pub const ANCHORS_PER_SIDE: usize = 3;

/// Gap between cards in the grid layout.
pub const LAYOUT_GAP: f64 = 40.0;

/// Minimum width the grid layout assumes when choosing a column count.
pub const LAYOUT_PREFERRED_WIDTH: f64 = 1200.0;

/// Offset of freshly synced cards from the top-left of existing content.
pub const NEW_CARD_OFFSET: f64 = 20.0;

/// Viewport padding used when fitting the relationship graph.
pub const FIT_PADDING_PX: f64 = 32.0;

/// Smallest zoom the relationship fit will choose.
pub const FIT_MIN_ZOOM: f64 = 0.35;

/// Padding that keeps a dragged card inside the viewport at fit zoom.
pub const DRAG_CLAMP_PAD_PX: f64 = 6.0;

// ── Systems ─────────────────────────────────────────────────────

/// Default virtual canvas width for a new system.
pub const SYSTEM_VIRTUAL_WIDTH: f64 = 4000.0;

/// Default virtual canvas height for a new system.
pub const SYSTEM_VIRTUAL_HEIGHT: f64 = 3000.0;

/// World-space spacing of the system background grid.
pub const GRID_STEP: f64 = 100.0;

/// Grids whose screen spacing falls to this or below are not drawn.
pub const GRID_MIN_SCREEN_STEP_PX: f64 = 8.0;

/// Arrowhead length in screen pixels.
pub const ARROW_SIZE_PX: f64 = 10.0;
