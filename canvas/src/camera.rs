//! Coordinate transform: camera pan/zoom, zoom-at-point, fitting, and the
//! normalised image frame used by map markers.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to `other`.
    #[must_use]
    pub fn dist_sq(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn dist(self, other: Point) -> f64 {
        self.dist_sq(other).sqrt()
    }
}

/// Width and height, as persisted for image sizes and virtual canvases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Smallest rectangle covering both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = (self.x + self.width).max(other.x + other.width);
        let max_y = (self.y + self.height).max(other.y + other.height);
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// Inclusive zoom range for one editor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
}

impl ZoomLimits {
    pub const MAP: ZoomLimits = ZoomLimits { min: 0.1, max: 10.0 };
    pub const SYSTEM: ZoomLimits = ZoomLimits { min: 0.1, max: 10.0 };
    pub const RELATIONSHIPS: ZoomLimits = ZoomLimits { min: 0.3, max: 2.5 };

    #[must_use]
    pub fn clamp(self, zoom: f64) -> f64 {
        if zoom.is_finite() { zoom.clamp(self.min, self.max) } else { 1.0_f64.clamp(self.min, self.max) }
    }
}

/// Camera state for pan/zoom.
///
/// `pan_x` / `pan_y` are in CSS pixels.
/// `zoom` is a scale factor (1.0 = no zoom).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0 }
    }
}

impl Camera {
    /// Convert a screen-space point (CSS pixels) to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.zoom,
            y: (screen.y - self.pan_y) / self.zoom,
        }
    }

    /// Convert a world-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.zoom + self.pan_x,
            y: world.y * self.zoom + self.pan_y,
        }
    }

    /// Convert a screen-space distance (pixels) to world-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }

    /// Shift the view by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Multiply zoom by `factor` while keeping the world point under `anchor`
    /// fixed on screen. Returns `false` when the clamped zoom did not change.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64, limits: ZoomLimits) -> bool {
        let old = self.zoom;
        let new = limits.clamp(old * factor);
        if (new - old).abs() < f64::EPSILON {
            return false;
        }
        let ratio = new / old;
        self.pan_x = anchor.x - (anchor.x - self.pan_x) * ratio;
        self.pan_y = anchor.y - (anchor.y - self.pan_y) * ratio;
        self.zoom = new;
        true
    }

    /// Visible world rectangle for a viewport of the given CSS size.
    #[must_use]
    pub fn visible_world(&self, viewport: Size) -> Rect {
        let origin = self.screen_to_world(Point::new(0.0, 0.0));
        Rect::new(
            origin.x,
            origin.y,
            self.screen_dist_to_world(viewport.width),
            self.screen_dist_to_world(viewport.height),
        )
    }
}

/// Scale `content` to fit the viewport and centre it.
#[must_use]
pub fn fit_center(content: Rect, viewport: Size, limits: ZoomLimits) -> Camera {
    let cw = content.width.max(1.0);
    let ch = content.height.max(1.0);
    let vw = viewport.width.max(1.0);
    let vh = viewport.height.max(1.0);
    let zoom = limits.clamp((vw / cw).min(vh / ch));
    Camera {
        pan_x: (vw - cw * zoom) / 2.0 - content.x * zoom,
        pan_y: (vh - ch * zoom) / 2.0 - content.y * zoom,
        zoom,
    }
}

/// Scale `content` down (never up past 1.0) to fit inside the padded
/// viewport and align it to the top-left padding corner.
#[must_use]
pub fn fit_top_left(content: Rect, viewport: Size, padding: f64, min_zoom: f64) -> Camera {
    let cw = content.width.max(1.0);
    let ch = content.height.max(1.0);
    let avail_w = (viewport.width - padding * 2.0).max(50.0);
    let avail_h = (viewport.height - padding * 2.0).max(50.0);
    let zoom = (avail_w / cw).min(avail_h / ch).min(1.0).max(min_zoom);
    Camera {
        pan_x: padding - content.x * zoom,
        pan_y: padding - content.y * zoom,
        zoom,
    }
}

/// Map image frame: world space is image pixels, stored positions are the
/// same point divided by the image size and clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageFrame {
    width: f64,
    height: f64,
}

impl ImageFrame {
    /// Build a frame, replacing zero, negative, or missing dimensions with 1.
    #[must_use]
    pub fn new(size: Option<Size>) -> Self {
        let safe = |v: f64| if v.is_finite() && v > 0.0 { v } else { 1.0 };
        match size {
            Some(s) => Self { width: safe(s.width), height: safe(s.height) },
            None => Self { width: 1.0, height: 1.0 },
        }
    }

    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// World (image pixel) point to normalised `[0, 1]` coordinates.
    #[must_use]
    pub fn normalize(&self, world: Point) -> Point {
        Point::new(clamp_unit(world.x / self.width), clamp_unit(world.y / self.height))
    }

    /// Normalised coordinates to a world (image pixel) point.
    #[must_use]
    pub fn denormalize(&self, norm: Point) -> Point {
        Point::new(norm.x * self.width, norm.y * self.height)
    }
}

/// Clamp to `[0, 1]`, mapping NaN to 0.
#[must_use]
pub fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}
