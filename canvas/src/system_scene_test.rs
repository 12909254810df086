#![allow(clippy::float_cmp)]

use super::*;
use crate::render::DisplayList;

fn node(id: &str, x: f64, y: f64) -> SystemNode {
    SystemNode { id: id.into(), kind: "entity".into(), label: id.into(), page: None, x, y, meta: Meta::new() }
}

fn edge(id: &str, from: &str, to: &str) -> SystemEdge {
    SystemEdge { id: id.into(), from: from.into(), to: to.into(), label: String::new(), meta: Meta::new() }
}

fn scene(nodes: Vec<SystemNode>, edges: Vec<SystemEdge>) -> SystemScene {
    SystemScene::new(SystemDoc { nodes, edges, ..SystemDoc::default() })
}

fn pending(from: &str, to: &str) -> PendingEdge {
    PendingEdge { from: from.into(), to: to.into(), from_anchor: None, to_anchor: None }
}

// =============================================================
// Hit-testing
// =============================================================

#[test]
fn node_hit_radius_scales_with_zoom() {
    let s = scene(vec![node("n-a", 100.0, 100.0)], vec![]);
    let zoomed_out = Camera { pan_x: 0.0, pan_y: 0.0, zoom: 0.5 };
    // 18 / 0.5 + 2 = 38 world units.
    assert_eq!(s.hit_entity(Point::new(137.0, 100.0), &zoomed_out), Some("n-a".into()));
    assert!(s.hit_entity(Point::new(139.0, 100.0), &zoomed_out).is_none());
}

#[test]
fn node_hit_at_centre_every_zoom() {
    let s = scene(vec![node("n-a", -40.0, 75.0)], vec![]);
    for zoom in [0.1, 1.0, 10.0] {
        let cam = Camera { pan_x: 3.0, pan_y: 4.0, zoom };
        assert_eq!(s.hit_entity(Point::new(-40.0, 75.0), &cam), Some("n-a".into()));
    }
}

#[test]
fn edge_hit_picks_nearest_segment() {
    let s = scene(
        vec![node("n-a", 0.0, 0.0), node("n-b", 200.0, 0.0), node("n-c", 0.0, 10.0), node("n-d", 200.0, 10.0)],
        vec![edge("e-top", "n-a", "n-b"), edge("e-bottom", "n-c", "n-d")],
    );
    let cam = Camera::default();
    assert_eq!(s.hit_edge(Point::new(100.0, 3.0), &cam), Some("e-top".into()));
    assert_eq!(s.hit_edge(Point::new(100.0, 8.0), &cam), Some("e-bottom".into()));
    assert!(s.hit_edge(Point::new(100.0, 40.0), &cam).is_none());
}

#[test]
fn dangling_edge_is_not_hit() {
    let s = scene(vec![node("n-a", 0.0, 0.0)], vec![edge("e-1", "n-a", "n-ghost")]);
    assert!(s.hit_edge(Point::new(0.0, 0.0), &Camera::default()).is_none());
}

#[test]
fn connector_only_under_connect_tool() {
    let s = scene(vec![node("n-a", 0.0, 0.0)], vec![]);
    let cam = Camera::default();
    assert!(s.hit_connector(Point::new(0.0, 0.0), &cam, &Tool::Select).is_none());
    assert_eq!(s.hit_connector(Point::new(0.0, 0.0), &cam, &Tool::Connect), Some(("n-a".into(), None)));
}

// =============================================================
// Mutation
// =============================================================

#[test]
fn place_creates_one_node_at_world_point() {
    let mut s = scene(vec![], vec![]);
    let id = s.place("entity", Point::new(12.5, -8.0)).unwrap();
    assert_eq!(s.doc().nodes.len(), 1);
    let n = s.node(&id).unwrap();
    assert_eq!((n.x, n.y), (12.5, -8.0));
    assert_eq!(n.label, "New Entity");
    assert!(n.page.is_none());
    assert!(id.starts_with("n-"));
}

#[test]
fn connect_rejects_self_and_missing() {
    let mut s = scene(vec![node("n-a", 0.0, 0.0), node("n-b", 10.0, 0.0)], vec![]);
    assert!(s.connect(&pending("n-a", "n-a"), "").is_none());
    assert!(s.connect(&pending("n-a", "n-zzz"), "").is_none());
    let id = s.connect(&pending("n-a", "n-b"), " flows ").unwrap();
    assert_eq!(s.edge(&id).unwrap().label, "flows");
}

#[test]
fn deleting_node_removes_all_its_edges() {
    let mut s = scene(
        vec![node("n-a", 0.0, 0.0), node("n-b", 10.0, 0.0), node("n-c", 20.0, 0.0)],
        vec![edge("e-ab", "n-a", "n-b"), edge("e-ca", "n-c", "n-a"), edge("e-bc", "n-b", "n-c")],
    );
    let mut removed = s.delete_entity("n-a").unwrap();
    removed.sort();
    assert_eq!(removed, vec!["e-ab".to_string(), "e-ca".to_string()]);
    assert!(s.doc().edges.iter().all(|e| e.from != "n-a" && e.to != "n-a"));
    assert_eq!(s.doc().edges.len(), 1);
    assert!(s.delete_entity("n-a").is_none());
}

#[test]
fn delete_edge_by_id() {
    let mut s = scene(vec![node("n-a", 0.0, 0.0), node("n-b", 1.0, 0.0)], vec![edge("e-1", "n-a", "n-b")]);
    assert!(s.delete_edge("e-1"));
    assert!(!s.delete_edge("e-1"));
}

#[test]
fn labels_for_nodes_and_edges() {
    let mut s = scene(vec![node("n-a", 0.0, 0.0), node("n-b", 1.0, 0.0)], vec![edge("e-1", "n-a", "n-b")]);
    assert!(s.set_label(&Selection::Entity("n-a".into()), "Mana"));
    assert!(s.set_label(&Selection::Edge("e-1".into()), "feeds"));
    assert_eq!(s.node("n-a").unwrap().label, "Mana");
    assert_eq!(s.edge("e-1").unwrap().label, "feeds");
    assert!(!s.set_label(&Selection::Edge("e-nope".into()), "x"));
}

#[test]
fn linked_page_round_trip() {
    let mut s = scene(vec![node("n-a", 0.0, 0.0)], vec![]);
    assert!(s.set_linked_page("n-a", Some("mana_flow".into())));
    assert_eq!(s.linked_page("n-a").as_deref(), Some("mana_flow"));
}

// =============================================================
// Fit / draw
// =============================================================

#[test]
fn fit_covers_virtual_size() {
    let mut s = scene(vec![], vec![]);
    let cam = s.fit(Size::new(800.0, 600.0));
    assert_eq!(cam.zoom, 0.2);
}

#[test]
fn grid_skipped_when_too_dense() {
    let s = scene(vec![], vec![]);
    let dense = View { camera: Camera { pan_x: 0.0, pan_y: 0.0, zoom: 0.08 }, viewport: Size::new(800.0, 600.0) };
    let mut list = DisplayList::new();
    s.draw(Layer::Background, &mut list.writer(Layer::Background), &dense);
    assert!(!list.items().iter().any(|i| matches!(i.cmd, DrawCmd::Grid { .. })));

    let normal = View { camera: Camera::default(), viewport: Size::new(800.0, 600.0) };
    let mut list = DisplayList::new();
    s.draw(Layer::Background, &mut list.writer(Layer::Background), &normal);
    assert!(list.items().iter().any(|i| matches!(i.cmd, DrawCmd::Grid { .. })));
}

#[test]
fn edges_draw_arrowheads_and_skip_dangling() {
    let s = scene(
        vec![node("n-a", 0.0, 0.0), node("n-b", 300.0, 0.0)],
        vec![edge("e-1", "n-a", "n-b"), edge("e-2", "n-a", "n-gone")],
    );
    let view = View { camera: Camera::default(), viewport: Size::new(800.0, 600.0) };
    let mut list = DisplayList::new();
    s.draw(Layer::Edges, &mut list.writer(Layer::Edges), &view);
    let lines = list.items().iter().filter(|i| matches!(i.cmd, DrawCmd::Line { .. })).count();
    let heads = list.items().iter().filter(|i| matches!(i.cmd, DrawCmd::Polygon { .. })).count();
    assert_eq!(lines, 1);
    assert_eq!(heads, 1);
}
