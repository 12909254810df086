#![allow(clippy::float_cmp)]

use super::*;

fn scene_with_image(width: f64, height: f64) -> MapScene {
    let mut scene = MapScene::new(MapDoc::default(), Palette::new());
    scene.set_image("https://img/world.png".into(), Size::new(width, height));
    scene
}

fn add_marker(scene: &mut MapScene, kind: &str, x: f64, y: f64) -> EntityId {
    let marker = Marker::new(kind, x, y, "M".into());
    let id = marker.id.clone();
    scene.doc.markers.push(marker);
    id
}

// =============================================================
// Placement
// =============================================================

#[test]
fn place_stores_normalized_position() {
    let mut scene = scene_with_image(1000.0, 500.0);
    let id = scene.place("location", Point::new(250.0, 125.0)).unwrap();
    let marker = scene.marker(&id).unwrap();
    assert_eq!((marker.x, marker.y), (0.25, 0.25));
    assert_eq!(marker.kind, "location");
    assert_eq!(marker.label, "New Location");
    assert_eq!(marker.floor, "ground");
    assert_eq!(marker.z, 0);
    assert!(marker.linked_page.is_none());
    assert!(marker.meta.is_empty());
}

#[test]
fn place_outside_image_is_clamped() {
    let mut scene = scene_with_image(100.0, 100.0);
    let id = scene.place("home", Point::new(-20.0, 500.0)).unwrap();
    assert_eq!(scene.stored_position(&id), Some(Point::new(0.0, 1.0)));
}

#[test]
fn place_custom_kind_uses_category_label() {
    let mut scene = scene_with_image(100.0, 100.0);
    let key = scene.palette_mut().add_custom("Dragon Lair", "#f00", "🐉").unwrap();
    let id = scene.place(&key, Point::new(50.0, 50.0)).unwrap();
    assert_eq!(scene.marker(&id).unwrap().label, "New Dragon Lair");
}

#[test]
fn place_without_image_size_uses_unit_frame() {
    let mut scene = MapScene::new(MapDoc::default(), Palette::new());
    let id = scene.place("location", Point::new(0.5, 0.5)).unwrap();
    assert_eq!(scene.stored_position(&id), Some(Point::new(0.5, 0.5)));
}

// =============================================================
// Position
// =============================================================

#[test]
fn position_is_image_pixels() {
    let mut scene = scene_with_image(1000.0, 500.0);
    let id = add_marker(&mut scene, "location", 0.5, 0.5);
    assert_eq!(scene.position(&id), Some(Point::new(500.0, 250.0)));
}

#[test]
fn set_position_clamps() {
    let mut scene = scene_with_image(200.0, 100.0);
    let id = add_marker(&mut scene, "location", 0.5, 0.5);
    assert!(scene.set_position(&id, Point::new(500.0, 50.0)));
    assert_eq!(scene.stored_position(&id), Some(Point::new(1.0, 0.5)));
    assert!(!scene.set_position("m-missing", Point::new(0.0, 0.0)));
}

// =============================================================
// Hit-testing
// =============================================================

#[test]
fn hit_at_marker_centre_at_every_zoom() {
    let mut scene = scene_with_image(1000.0, 1000.0);
    let id = add_marker(&mut scene, "location", 0.3, 0.7);
    let world = scene.position(&id).unwrap();
    for zoom in [0.1, 0.5, 1.0, 4.0, 10.0] {
        let cam = Camera { pan_x: 13.0, pan_y: -7.0, zoom };
        assert_eq!(scene.hit_entity(world, &cam), Some(id.clone()), "zoom {zoom}");
    }
}

#[test]
fn hit_radius_is_screen_constant() {
    let mut scene = scene_with_image(1000.0, 1000.0);
    let id = add_marker(&mut scene, "location", 0.5, 0.5);
    let cam = Camera { pan_x: 0.0, pan_y: 0.0, zoom: 2.0 };
    // 9 screen px away at zoom 2 is 4.5 world units.
    assert_eq!(scene.hit_entity(Point::new(504.5, 500.0), &cam), Some(id));
    // 11 screen px away misses.
    assert!(scene.hit_entity(Point::new(505.5, 500.0), &cam).is_none());
}

#[test]
fn hit_prefers_nearest_marker() {
    let mut scene = scene_with_image(1000.0, 1000.0);
    let _far = add_marker(&mut scene, "location", 0.500, 0.5);
    let near = add_marker(&mut scene, "location", 0.506, 0.5);
    let cam = Camera::default();
    assert_eq!(scene.hit_entity(Point::new(505.0, 500.0), &cam), Some(near));
}

#[test]
fn hidden_category_is_not_hit() {
    let mut scene = scene_with_image(1000.0, 1000.0);
    add_marker(&mut scene, "home", 0.5, 0.5);
    scene.palette_mut().set_visible("home", false);
    assert!(scene.hit_entity(Point::new(500.0, 500.0), &Camera::default()).is_none());
}

// =============================================================
// Inspector operations
// =============================================================

#[test]
fn label_and_linked_page_edit() {
    let mut scene = scene_with_image(10.0, 10.0);
    let id = add_marker(&mut scene, "location", 0.1, 0.1);
    assert!(scene.set_label(&Selection::Entity(id.clone()), "Harbor"));
    assert!(scene.set_linked_page(&id, Some("  harbor_town ".into())));
    assert_eq!(scene.marker(&id).unwrap().label, "Harbor");
    assert_eq!(scene.linked_page(&id).as_deref(), Some("harbor_town"));

    assert!(scene.set_linked_page(&id, Some("   ".into())));
    assert!(scene.linked_page(&id).is_none());
}

#[test]
fn edge_label_is_rejected() {
    let mut scene = scene_with_image(10.0, 10.0);
    assert!(!scene.set_label(&Selection::Edge("e-1".into()), "x"));
}

#[test]
fn delete_marker() {
    let mut scene = scene_with_image(10.0, 10.0);
    let id = add_marker(&mut scene, "location", 0.1, 0.1);
    assert_eq!(scene.delete_entity(&id), Some(Vec::new()));
    assert!(scene.doc().markers.is_empty());
    assert_eq!(scene.delete_entity(&id), None);
}

// =============================================================
// Fit / draw
// =============================================================

#[test]
fn fit_centres_image() {
    let mut scene = scene_with_image(1000.0, 500.0);
    let cam = scene.fit(Size::new(500.0, 500.0));
    assert_eq!(cam.zoom, 0.5);
    assert_eq!(cam.pan_y, 125.0);
}

#[test]
fn hidden_markers_are_not_drawn() {
    let mut scene = scene_with_image(100.0, 100.0);
    add_marker(&mut scene, "home", 0.5, 0.5);
    add_marker(&mut scene, "location", 0.2, 0.2);
    scene.palette_mut().set_visible("home", false);

    let view = View { camera: Camera::default(), viewport: Size::new(100.0, 100.0) };
    let mut list = crate::render::DisplayList::new();
    scene.draw(Layer::Entities, &mut list.writer(Layer::Entities), &view);
    let circles = list.items().iter().filter(|i| matches!(i.cmd, DrawCmd::Circle { .. })).count();
    assert_eq!(circles, 1);
}

#[test]
fn background_is_image_when_url_present() {
    let scene = scene_with_image(100.0, 50.0);
    let view = View { camera: Camera::default(), viewport: Size::new(100.0, 100.0) };
    let mut list = crate::render::DisplayList::new();
    scene.draw(Layer::Background, &mut list.writer(Layer::Background), &view);
    assert!(matches!(list.items()[0].cmd, DrawCmd::Image { .. }));
}
