#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

// --- Point ---

#[test]
fn point_new() {
    let p = Point::new(3.0, 4.0);
    assert_eq!(p.x, 3.0);
    assert_eq!(p.y, 4.0);
}

#[test]
fn point_dist_is_euclidean() {
    let a = Point::new(0.0, 0.0);
    let b = Point::new(3.0, 4.0);
    assert!(approx_eq(a.dist(b), 5.0));
    assert!(approx_eq(a.dist_sq(b), 25.0));
}

// --- Rect ---

#[test]
fn rect_contains_edges_inclusive() {
    let r = Rect::new(10.0, 10.0, 20.0, 20.0);
    assert!(r.contains(Point::new(10.0, 10.0)));
    assert!(r.contains(Point::new(30.0, 30.0)));
    assert!(!r.contains(Point::new(30.1, 15.0)));
}

#[test]
fn rect_union_covers_both() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    let b = Rect::new(20.0, -5.0, 5.0, 5.0);
    let u = a.union(&b);
    assert_eq!(u, Rect::new(0.0, -5.0, 25.0, 15.0));
}

// --- Camera defaults ---

#[test]
fn camera_default_is_identity() {
    let cam = Camera::default();
    assert_eq!(cam.pan_x, 0.0);
    assert_eq!(cam.pan_y, 0.0);
    assert_eq!(cam.zoom, 1.0);
}

// --- screen_to_world / world_to_screen ---

#[test]
fn screen_to_world_identity() {
    let cam = Camera::default();
    let world = cam.screen_to_world(Point::new(50.0, 75.0));
    assert!(point_approx_eq(world, Point::new(50.0, 75.0)));
}

#[test]
fn screen_to_world_with_pan_and_zoom() {
    let cam = Camera { pan_x: 100.0, pan_y: 50.0, zoom: 2.0 };
    let world = cam.screen_to_world(Point::new(300.0, 250.0));
    assert!(point_approx_eq(world, Point::new(100.0, 100.0)));
}

#[test]
fn round_trip_across_zoom_range() {
    let pans = [(-350.0, 12.5), (0.0, 0.0), (820.25, -4000.0)];
    let zooms = [0.1, 0.3, 0.9, 1.0, 1.1, 2.5, 7.3, 10.0];
    let points = [Point::new(0.0, 0.0), Point::new(-17.5, 912.0), Point::new(1e4, -3.25)];
    for (pan_x, pan_y) in pans {
        for zoom in zooms {
            let cam = Camera { pan_x, pan_y, zoom };
            for p in points {
                let back = cam.world_to_screen(cam.screen_to_world(p));
                assert!((back.x - p.x).abs() < 1e-6 && (back.y - p.y).abs() < 1e-6, "{p:?} at {cam:?}");
            }
        }
    }
}

#[test]
fn screen_dist_scales_inverse_to_zoom() {
    let cam = Camera { pan_x: 5.0, pan_y: 5.0, zoom: 4.0 };
    assert!(approx_eq(cam.screen_dist_to_world(12.0), 3.0));
}

// --- pan / zoom ---

#[test]
fn pan_by_accumulates() {
    let mut cam = Camera::default();
    cam.pan_by(10.0, -5.0);
    cam.pan_by(2.0, 1.0);
    assert_eq!(cam.pan_x, 12.0);
    assert_eq!(cam.pan_y, -4.0);
}

#[test]
fn zoom_at_keeps_anchor_world_point_fixed() {
    let mut cam = Camera { pan_x: 40.0, pan_y: -20.0, zoom: 1.3 };
    let anchor = Point::new(321.0, 123.0);
    let before = cam.screen_to_world(anchor);
    assert!(cam.zoom_at(anchor, 1.1, ZoomLimits::MAP));
    let after = cam.screen_to_world(anchor);
    assert!(point_approx_eq(before, after));
}

#[test]
fn zoom_at_clamps_to_limits() {
    let mut cam = Camera { pan_x: 0.0, pan_y: 0.0, zoom: 2.4 };
    cam.zoom_at(Point::new(0.0, 0.0), 1.1, ZoomLimits::RELATIONSHIPS);
    assert_eq!(cam.zoom, 2.5);
    assert!(!cam.zoom_at(Point::new(0.0, 0.0), 1.1, ZoomLimits::RELATIONSHIPS));
}

#[test]
fn zoom_at_lower_bound() {
    let mut cam = Camera { pan_x: 0.0, pan_y: 0.0, zoom: 0.105 };
    cam.zoom_at(Point::new(10.0, 10.0), 0.9, ZoomLimits::SYSTEM);
    assert_eq!(cam.zoom, 0.1);
}

#[test]
fn zoom_limits_clamp_non_finite() {
    assert_eq!(ZoomLimits::MAP.clamp(f64::NAN), 1.0);
    assert_eq!(ZoomLimits::RELATIONSHIPS.clamp(f64::INFINITY), 1.0);
}

#[test]
fn visible_world_matches_corners() {
    let cam = Camera { pan_x: -100.0, pan_y: -50.0, zoom: 2.0 };
    let r = cam.visible_world(Size::new(400.0, 200.0));
    assert!(approx_eq(r.x, 50.0));
    assert!(approx_eq(r.y, 25.0));
    assert!(approx_eq(r.width, 200.0));
    assert!(approx_eq(r.height, 100.0));
}

// --- fit ---

#[test]
fn fit_center_letterboxes_wide_image() {
    let cam = fit_center(Rect::new(0.0, 0.0, 1000.0, 500.0), Size::new(500.0, 500.0), ZoomLimits::MAP);
    assert!(approx_eq(cam.zoom, 0.5));
    assert!(approx_eq(cam.pan_x, 0.0));
    assert!(approx_eq(cam.pan_y, 125.0));
}

#[test]
fn fit_center_zero_viewport_uses_unit_denominator() {
    let cam = fit_center(Rect::new(0.0, 0.0, 0.0, 0.0), Size::new(0.0, 0.0), ZoomLimits::MAP);
    assert!(cam.zoom.is_finite());
    assert!(approx_eq(cam.zoom, 1.0));
}

#[test]
fn fit_top_left_never_zooms_in() {
    let cam = fit_top_left(Rect::new(0.0, 0.0, 100.0, 100.0), Size::new(2000.0, 2000.0), 32.0, 0.35);
    assert_eq!(cam.zoom, 1.0);
    assert_eq!(cam.pan_x, 32.0);
    assert_eq!(cam.pan_y, 32.0);
}

#[test]
fn fit_top_left_respects_min_zoom() {
    let cam = fit_top_left(Rect::new(-200.0, 0.0, 10_000.0, 10_000.0), Size::new(800.0, 600.0), 32.0, 0.35);
    assert_eq!(cam.zoom, 0.35);
    assert!(approx_eq(cam.pan_x, 32.0 + 200.0 * 0.35));
}

// --- ImageFrame ---

#[test]
fn image_frame_normalizes_and_clamps() {
    let frame = ImageFrame::new(Some(Size::new(1000.0, 500.0)));
    assert!(point_approx_eq(frame.normalize(Point::new(250.0, 125.0)), Point::new(0.25, 0.25)));
    assert!(point_approx_eq(frame.normalize(Point::new(-5.0, 900.0)), Point::new(0.0, 1.0)));
}

#[test]
fn image_frame_zero_size_falls_back_to_one() {
    let frame = ImageFrame::new(Some(Size::new(0.0, -3.0)));
    assert_eq!(frame.size(), Size::new(1.0, 1.0));
    let n = frame.normalize(Point::new(0.5, 0.25));
    assert!(point_approx_eq(n, Point::new(0.5, 0.25)));
}

#[test]
fn image_frame_missing_size_is_unit() {
    let frame = ImageFrame::new(None);
    assert_eq!(frame.bounds(), Rect::new(0.0, 0.0, 1.0, 1.0));
}

#[test]
fn image_frame_denormalize_inverts_normalize_inside_bounds() {
    let frame = ImageFrame::new(Some(Size::new(640.0, 480.0)));
    let world = Point::new(320.0, 120.0);
    assert!(point_approx_eq(frame.denormalize(frame.normalize(world)), world));
}

#[test]
fn clamp_unit_handles_nan() {
    assert_eq!(clamp_unit(f64::NAN), 0.0);
    assert_eq!(clamp_unit(1.5), 1.0);
    assert_eq!(clamp_unit(-0.1), 0.0);
}
