//! Rendering: builds a display list from scene state and paints it to a 2D
//! context.
//!
//! [`build_display_list`] is pure and fixes the z-order: background, edges,
//! entities, then overlays (selection and connect preview). Scenes only ever
//! write into the layer they are handed, so an editor cannot draw a node
//! beneath its edges. [`paint`] is the only place that touches
//! [`web_sys::CanvasRenderingContext2d`].
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use crate::camera::{Camera, Point, Rect, Size};
use crate::consts::ARROW_SIZE_PX;
use crate::input::{InputState, UiState};
use crate::scene::Scene;

/// Arrowhead half-angle in radians (~30°).
const ARROW_ANGLE: f64 = PI / 6.0;

/// Connect preview line colour.
const PREVIEW_COLOR: &str = "#f472b6";

/// Fill shown where a map image has not loaded yet.
const IMAGE_PLACEHOLDER: &str = "#1f2937";

/// Draw pass, in paint order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Background,
    Edges,
    Entities,
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

/// One drawing primitive in world coordinates. Sizes that should stay
/// constant on screen are pre-divided by zoom (see [`View::px`]).
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Fill { rect: Rect, color: String },
    /// The scene's background image stretched over `rect`.
    Image { rect: Rect },
    Grid { bounds: Rect, step: f64, color: String, width: f64 },
    Line { from: Point, to: Point, color: String, width: f64, dashed: bool },
    Polygon { points: Vec<Point>, color: String },
    Circle { center: Point, radius: f64, fill: Option<String>, stroke: Option<String>, width: f64 },
    StrokeRect { rect: Rect, color: String, width: f64 },
    Text { at: Point, text: String, size: f64, color: String, align: TextAlign },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub layer: Layer,
    pub cmd: DrawCmd,
}

/// Ordered drawing commands for one frame.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    items: Vec<DrawItem>,
}

impl DisplayList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer that tags everything it receives with `layer`.
    pub fn writer(&mut self, layer: Layer) -> LayerWriter<'_> {
        LayerWriter { list: self, layer }
    }

    #[must_use]
    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of commands on `layer`.
    #[must_use]
    pub fn count(&self, layer: Layer) -> usize {
        self.items.iter().filter(|i| i.layer == layer).count()
    }
}

/// Append-only handle onto one layer of a [`DisplayList`].
pub struct LayerWriter<'a> {
    list: &'a mut DisplayList,
    layer: Layer,
}

impl LayerWriter<'_> {
    pub fn push(&mut self, cmd: DrawCmd) {
        self.list.items.push(DrawItem { layer: self.layer, cmd });
    }

    #[must_use]
    pub fn layer(&self) -> Layer {
        self.layer
    }
}

/// Camera plus viewport, as seen by scene drawing code.
#[derive(Debug, Clone, Copy)]
pub struct View {
    pub camera: Camera,
    pub viewport: Size,
}

impl View {
    /// World length that appears as `screen_px` CSS pixels.
    #[must_use]
    pub fn px(&self, screen_px: f64) -> f64 {
        self.camera.screen_dist_to_world(screen_px)
    }

    /// World rectangle currently on screen.
    #[must_use]
    pub fn visible(&self) -> Rect {
        self.camera.visible_world(self.viewport)
    }
}

/// Filled arrowhead with its tip at `tip`, pointing away from `from`.
#[must_use]
pub fn arrowhead(from: Point, tip: Point, view: &View, color: &str) -> DrawCmd {
    let size = view.px(ARROW_SIZE_PX);
    let angle = (tip.y - from.y).atan2(tip.x - from.x);
    DrawCmd::Polygon {
        points: vec![
            tip,
            Point::new(tip.x - size * (angle - ARROW_ANGLE).cos(), tip.y - size * (angle - ARROW_ANGLE).sin()),
            Point::new(tip.x - size * (angle + ARROW_ANGLE).cos(), tip.y - size * (angle + ARROW_ANGLE).sin()),
        ],
        color: color.to_string(),
    }
}

/// Build the frame for `scene` in fixed layer order.
pub fn build_display_list<S: Scene>(scene: &S, ui: &UiState, input: &InputState, view: &View) -> DisplayList {
    let mut list = DisplayList::new();
    for layer in [Layer::Background, Layer::Edges, Layer::Entities] {
        scene.draw(layer, &mut list.writer(layer), view);
    }

    let mut overlay = list.writer(Layer::Overlay);
    if let Some(selection) = &ui.selection {
        scene.draw_selection(selection, &mut overlay, view);
    }
    let preview = match input {
        InputState::Connecting { from, from_anchor, current_world } => {
            scene.connector_point(from, *from_anchor).map(|start| (start, *current_world))
        }
        InputState::AwaitingEdgeLabel { pending } => scene
            .connector_point(&pending.from, pending.from_anchor)
            .zip(scene.connector_point(&pending.to, pending.to_anchor)),
        _ => None,
    };
    if let Some((from, to)) = preview {
        overlay.push(DrawCmd::Line { from, to, color: PREVIEW_COLOR.to_string(), width: view.px(2.0), dashed: true });
    }
    list
}

/// Backing-store size for a CSS length at the given device pixel ratio.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn backing_size(css: f64, dpr: f64) -> u32 {
    let px = (css * dpr).floor();
    if px.is_finite() && px >= 1.0 { px.min(f64::from(u32::MAX)) as u32 } else { 1 }
}

/// Paint a display list.
///
/// `view.viewport` is in CSS pixels; `dpr` scales the backing store.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn paint(
    ctx: &CanvasRenderingContext2d,
    list: &DisplayList,
    view: &View,
    dpr: f64,
    image: Option<&HtmlImageElement>,
) -> Result<(), JsValue> {
    // Layer 0: clear in device pixels.
    ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, view.viewport.width, view.viewport.height);

    let cam = view.camera;
    ctx.set_transform(dpr * cam.zoom, 0.0, 0.0, dpr * cam.zoom, dpr * cam.pan_x, dpr * cam.pan_y)?;

    for item in list.items() {
        paint_cmd(ctx, &item.cmd, image)?;
    }
    Ok(())
}

// =============================================================
// Command dispatch
// =============================================================

fn paint_cmd(ctx: &CanvasRenderingContext2d, cmd: &DrawCmd, image: Option<&HtmlImageElement>) -> Result<(), JsValue> {
    match cmd {
        DrawCmd::Fill { rect, color } => {
            ctx.set_fill_style_str(color);
            ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
            Ok(())
        }
        DrawCmd::Image { rect } => paint_image(ctx, *rect, image),
        DrawCmd::Grid { bounds, step, color, width } => {
            paint_grid(ctx, *bounds, *step, color, *width);
            Ok(())
        }
        DrawCmd::Line { from, to, color, width, dashed } => paint_line(ctx, *from, *to, color, *width, *dashed),
        DrawCmd::Polygon { points, color } => {
            paint_polygon(ctx, points, color);
            Ok(())
        }
        DrawCmd::Circle { center, radius, fill, stroke, width } => {
            paint_circle(ctx, *center, *radius, fill.as_deref(), stroke.as_deref(), *width)
        }
        DrawCmd::StrokeRect { rect, color, width } => {
            ctx.set_stroke_style_str(color);
            ctx.set_line_width(*width);
            ctx.stroke_rect(rect.x, rect.y, rect.width, rect.height);
            Ok(())
        }
        DrawCmd::Text { at, text, size, color, align } => {
            ctx.set_fill_style_str(color);
            ctx.set_font(&format!("{size}px sans-serif"));
            ctx.set_text_align(match align {
                TextAlign::Left => "left",
                TextAlign::Center => "center",
            });
            ctx.set_text_baseline("middle");
            ctx.fill_text(text, at.x, at.y)
        }
    }
}

fn paint_image(ctx: &CanvasRenderingContext2d, rect: Rect, image: Option<&HtmlImageElement>) -> Result<(), JsValue> {
    match image {
        Some(img) if img.complete() && img.natural_width() > 0 => {
            ctx.draw_image_with_html_image_element_and_dw_and_dh(img, rect.x, rect.y, rect.width, rect.height)
        }
        _ => {
            ctx.set_fill_style_str(IMAGE_PLACEHOLDER);
            ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
            Ok(())
        }
    }
}

fn paint_grid(ctx: &CanvasRenderingContext2d, bounds: Rect, step: f64, color: &str, width: f64) {
    if step <= 0.0 {
        return;
    }
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(width);
    ctx.begin_path();
    let right = bounds.x + bounds.width;
    let bottom = bounds.y + bounds.height;
    let mut x = (bounds.x / step).ceil() * step;
    while x <= right {
        ctx.move_to(x, bounds.y);
        ctx.line_to(x, bottom);
        x += step;
    }
    let mut y = (bounds.y / step).ceil() * step;
    while y <= bottom {
        ctx.move_to(bounds.x, y);
        ctx.line_to(right, y);
        y += step;
    }
    ctx.stroke();
}

fn paint_line(
    ctx: &CanvasRenderingContext2d,
    from: Point,
    to: Point,
    color: &str,
    width: f64,
    dashed: bool,
) -> Result<(), JsValue> {
    ctx.save();
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(width);
    if dashed {
        let dash = js_sys::Array::of2(&JsValue::from_f64(width * 3.0), &JsValue::from_f64(width * 3.0));
        ctx.set_line_dash(&dash)?;
    }
    ctx.begin_path();
    ctx.move_to(from.x, from.y);
    ctx.line_to(to.x, to.y);
    ctx.stroke();
    ctx.restore();
    Ok(())
}

fn paint_polygon(ctx: &CanvasRenderingContext2d, points: &[Point], color: &str) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    ctx.set_fill_style_str(color);
    ctx.begin_path();
    ctx.move_to(first.x, first.y);
    for p in rest {
        ctx.line_to(p.x, p.y);
    }
    ctx.close_path();
    ctx.fill();
}

fn paint_circle(
    ctx: &CanvasRenderingContext2d,
    center: Point,
    radius: f64,
    fill: Option<&str>,
    stroke: Option<&str>,
    width: f64,
) -> Result<(), JsValue> {
    if radius <= 0.0 {
        return Ok(());
    }
    ctx.begin_path();
    ctx.arc(center.x, center.y, radius, 0.0, 2.0 * PI)?;
    if let Some(color) = fill {
        ctx.set_fill_style_str(color);
        ctx.fill();
    }
    if let Some(color) = stroke {
        ctx.set_stroke_style_str(color);
        ctx.set_line_width(width);
        ctx.stroke();
    }
    Ok(())
}
