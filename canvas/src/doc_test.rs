#![allow(clippy::float_cmp)]

use serde_json::json;

use super::*;

// =============================================================
// SceneKind
// =============================================================

#[test]
fn scene_kind_meta_fields() {
    assert_eq!(SceneKind::Map.meta_field(), "map");
    assert_eq!(SceneKind::Relationships.meta_field(), "graph");
    assert_eq!(SceneKind::System.meta_field(), "system");
}

#[test]
fn scene_kind_parse_accepts_aliases() {
    assert_eq!(SceneKind::parse("Maps"), Some(SceneKind::Map));
    assert_eq!(SceneKind::parse("graph"), Some(SceneKind::Relationships));
    assert_eq!(SceneKind::parse(" systems "), Some(SceneKind::System));
    assert_eq!(SceneKind::parse("timeline"), None);
}

#[test]
fn scene_kind_display_round_trips_through_parse() {
    for kind in [SceneKind::Map, SceneKind::Relationships, SceneKind::System] {
        assert_eq!(SceneKind::parse(&kind.to_string()), Some(kind));
    }
}

// =============================================================
// Ids
// =============================================================

#[test]
fn new_id_has_prefix_and_is_unique() {
    let a = new_id("m");
    let b = new_id("m");
    assert!(a.starts_with("m-"));
    assert_ne!(a, b);
}

#[test]
fn now_rfc3339_is_parseable_shape() {
    let ts = now_rfc3339().unwrap_or_default();
    assert!(ts.contains('T'));
}

// =============================================================
// Defaults / malformed input
// =============================================================

#[test]
fn not_json_loads_default_map() {
    let doc: MapDoc = parse_or_default("not json");
    assert_eq!(doc, MapDoc::default());
    assert_eq!(doc.meta_version, CURRENT_META_VERSION);
    assert!(doc.markers.is_empty());
}

#[test]
fn not_json_loads_default_system() {
    let doc: SystemDoc = parse_or_default("not json");
    assert_eq!(doc.virtual_size, Size::new(4000.0, 3000.0));
    assert!(doc.nodes.is_empty());
}

#[test]
fn empty_string_is_error_and_default() {
    assert!(matches!(parse::<RelationshipDoc>("  "), Err(SceneError::Empty)));
    let doc: RelationshipDoc = parse_or_default("");
    assert!(doc.nodes.is_empty());
}

#[test]
fn non_object_is_rejected() {
    assert!(matches!(parse::<MapDoc>("[1,2,3]"), Err(SceneError::NotAnObject)));
    assert!(matches!(parse::<MapDoc>("42"), Err(SceneError::NotAnObject)));
}

#[test]
fn shape_mismatch_is_json_error() {
    assert!(matches!(parse::<MapDoc>(r#"{"markers": "nope"}"#), Err(SceneError::Json(_))));
}

#[test]
fn from_meta_field_accepts_string_and_object() {
    let as_string = json!("{\"metaVersion\":1,\"nodes\":[{\"key\":\"ana\",\"x\":5,\"y\":6}],\"edges\":[]}");
    let doc: RelationshipDoc = from_meta_field(Some(&as_string));
    assert_eq!(doc.nodes.len(), 1);

    let as_object = json!({"metaVersion": 1, "nodes": [], "edges": []});
    let doc: RelationshipDoc = from_meta_field(Some(&as_object));
    assert!(doc.nodes.is_empty());
}

#[test]
fn from_meta_field_missing_or_bad_is_default() {
    let doc: SystemDoc = from_meta_field(None);
    assert_eq!(doc, SystemDoc::default());
    let doc: SystemDoc = from_meta_field(Some(&json!(17)));
    assert_eq!(doc, SystemDoc::default());
    let doc: SystemDoc = from_meta_field(Some(&Value::Null));
    assert_eq!(doc, SystemDoc::default());
}

// =============================================================
// Migration
// =============================================================

#[test]
fn map_v0_gets_version_layers_and_ids() {
    let raw = json!({
        "imageUrl": "https://img/world.png",
        "imageSize": {"width": 1000, "height": 500},
        "scale": 0,
        "markers": [{"type": "", "x": 0.5, "y": 0.5, "label": "Keep"}]
    });
    let doc: MapDoc = migrate(raw).unwrap();
    assert_eq!(doc.meta_version, CURRENT_META_VERSION);
    assert_eq!(doc.scale, 1.0);
    assert!(doc.layers.is_empty());
    assert_eq!(doc.markers[0].kind, "location");
    assert!(doc.markers[0].id.starts_with("m-"));
    assert_eq!(doc.markers[0].floor, "ground");
    assert_eq!(doc.markers[0].icon, "default-pin");
}

#[test]
fn map_markers_are_clamped_on_load() {
    let raw = json!({"metaVersion": 1, "markers": [{"id": "m-1", "x": 1.7, "y": -0.2}]});
    let doc: MapDoc = migrate(raw).unwrap();
    assert_eq!(doc.markers[0].x, 1.0);
    assert_eq!(doc.markers[0].y, 0.0);
}

#[test]
fn duplicate_ids_are_reassigned() {
    let raw = json!({"metaVersion": 1, "markers": [
        {"id": "m-1", "x": 0.1, "y": 0.1},
        {"id": "m-1", "x": 0.2, "y": 0.2}
    ]});
    let doc: MapDoc = migrate(raw).unwrap();
    assert_eq!(doc.markers[0].id, "m-1");
    assert_ne!(doc.markers[1].id, "m-1");
}

#[test]
fn relationships_v0_assigns_edge_ids_and_drops_empty_endpoints() {
    let raw = json!({
        "nodes": [{"key": "a", "x": 0, "y": 0}, {"key": "b", "x": 300, "y": 0}],
        "edges": [
            {"from": "a", "to": "b", "type": "friend"},
            {"from": "", "to": "b", "type": "ghost"}
        ]
    });
    let doc: RelationshipDoc = migrate(raw).unwrap();
    assert_eq!(doc.meta_version, CURRENT_META_VERSION);
    assert_eq!(doc.edges.len(), 1);
    let edge = &doc.edges[0];
    assert!(edge.id.starts_with("e-"));
    assert_eq!(edge.from_side, AnchorSide::Right);
    assert_eq!(edge.to_side, AnchorSide::Left);
    assert_eq!(edge.from_index, 1);
    assert_eq!(edge.to_index, 1);
}

#[test]
fn relationship_anchor_index_is_clamped() {
    let raw = json!({"metaVersion": 1, "edges": [{"id": "e-1", "from": "a", "to": "b", "fromIndex": 9}]});
    let doc: RelationshipDoc = migrate(raw).unwrap();
    assert_eq!(doc.edges[0].from_index, ANCHORS_PER_SIDE - 1);
}

#[test]
fn system_v0_gets_virtual_size_and_ids() {
    let raw = json!({
        "virtualSize": {"width": 0, "height": 0},
        "nodes": [{"label": "Mana", "x": 10, "y": 20, "type": ""}],
        "edges": [{"from": "x", "to": "y"}]
    });
    let doc: SystemDoc = migrate(raw).unwrap();
    assert_eq!(doc.virtual_size, Size::new(4000.0, 3000.0));
    assert_eq!(doc.nodes[0].kind, "entity");
    assert!(doc.nodes[0].id.starts_with("n-"));
    assert!(doc.edges[0].id.starts_with("e-"));
}

#[test]
fn newer_version_is_loaded_as_is() {
    let raw = json!({"metaVersion": 7, "scale": 3, "markers": []});
    let doc: MapDoc = migrate(raw).unwrap();
    assert_eq!(doc.meta_version, 7);
    assert_eq!(doc.scale, 3.0);
}

// =============================================================
// Encoding
// =============================================================

#[test]
fn map_serializes_camel_case() {
    let mut doc = MapDoc::default();
    doc.markers.push(Marker::new("home", 0.25, 0.75, "New Home".to_string()));
    let value = doc.to_value().unwrap();
    assert_eq!(value["metaVersion"], 1);
    let marker = &value["markers"][0];
    assert_eq!(marker["type"], "home");
    assert_eq!(marker["linkedPage"], Value::Null);
    assert!(marker.get("createdAt").is_some());
    assert!(marker.get("color").is_none());
}

#[test]
fn relationship_positions_are_rounded_on_encode() {
    let mut doc = RelationshipDoc::default();
    doc.nodes.push(RelNode { key: "ana".into(), x: 10.6, y: -3.4, meta: Meta::new() });
    let value = doc.to_value().unwrap();
    assert_eq!(value["nodes"][0]["x"], 11.0);
    assert_eq!(value["nodes"][0]["y"], -3.0);
    assert_eq!(doc.nodes[0].x, 10.6);
}

#[test]
fn encoded_document_parses_back() {
    let mut doc = SystemDoc::default();
    doc.nodes.push(SystemNode {
        id: "n-1".into(),
        kind: "entity".into(),
        label: "Mana".into(),
        page: Some("mana".into()),
        x: 100.0,
        y: 200.0,
        meta: Meta::new(),
    });
    let text = doc.to_json().unwrap();
    let back: SystemDoc = parse(&text).unwrap();
    assert_eq!(back, doc);
}

#[test]
fn marker_new_clamps_position() {
    let m = Marker::new("location", 2.0, -1.0, "X".into());
    assert_eq!((m.x, m.y), (1.0, 0.0));
}
