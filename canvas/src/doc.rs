//! Scene documents: the persisted shape of maps, the relationship graph, and
//! system flowcharts, plus schema versioning and migration.
//!
//! Each document is stored as JSON inside one field of a wiki page's
//! metadata (see [`SceneKind::meta_field`]). Loading goes through
//! [`parse_or_default`] / [`from_meta_field`], which never fail: malformed
//! input is logged and replaced by the document's default. Documents carry a
//! `metaVersion`; [`migrate`] upgrades older layouts before any editor sees
//! them.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::camera::{Size, clamp_unit};
use crate::consts::{ANCHORS_PER_SIDE, SYSTEM_VIRTUAL_HEIGHT, SYSTEM_VIRTUAL_WIDTH};

/// Schema version written by this crate.
pub const CURRENT_META_VERSION: u32 = 1;

/// Reserved page key holding the single relationship graph.
pub const RELATIONSHIPS_PAGE: &str = "__relationships";

/// Identifier of a marker, node, or edge within one document.
pub type EntityId = String;

/// Free-form metadata bag carried by entities.
pub type Meta = Map<String, Value>;

/// Errors raised while decoding or encoding a scene document.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("scene document is empty")]
    Empty,
    #[error("scene document is not a JSON object")]
    NotAnObject,
    #[error("invalid scene JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid category key `{0}`")]
    InvalidCategory(String),
    #[error("category `{0}` already exists")]
    DuplicateCategory(String),
}

/// Which editor a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneKind {
    Map,
    Relationships,
    System,
}

impl SceneKind {
    /// Page metadata field that stores this document.
    #[must_use]
    pub fn meta_field(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::Relationships => "graph",
            Self::System => "system",
        }
    }

    /// Category label given to pages created for this document.
    #[must_use]
    pub fn category_label(self) -> &'static str {
        match self {
            Self::Map => "Maps",
            Self::Relationships => "Relationships",
            Self::System => "Systems",
        }
    }

    /// Accepts the kind name, its plural, or the metadata field name.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "map" | "maps" => Some(Self::Map),
            "relationships" | "relationship" | "graph" => Some(Self::Relationships),
            "system" | "systems" => Some(Self::System),
            _ => None,
        }
    }
}

impl std::fmt::Display for SceneKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Map => "map",
            Self::Relationships => "relationships",
            Self::System => "system",
        };
        f.write_str(name)
    }
}

/// Generate a fresh entity id such as `m-6f1c…`.
#[must_use]
pub fn new_id(prefix: &str) -> EntityId {
    format!("{prefix}-{}", Uuid::new_v4())
}

/// Current UTC time as RFC 3339, or `None` if formatting fails.
#[must_use]
pub fn now_rfc3339() -> Option<String> {
    match OffsetDateTime::now_utc().format(&Rfc3339) {
        Ok(s) => Some(s),
        Err(e) => {
            log::warn!("timestamp format failed: {e}");
            None
        }
    }
}

/// Give every empty or repeated id a fresh one.
fn ensure_unique_ids<'a>(ids: impl Iterator<Item = &'a mut EntityId>, prefix: &str) {
    let mut seen = HashSet::new();
    for id in ids {
        if id.is_empty() || !seen.insert(id.clone()) {
            *id = new_id(prefix);
            seen.insert(id.clone());
        }
    }
}

// =============================================================
// Versioning
// =============================================================

/// Common behaviour for persisted scene documents.
pub trait SceneDocument: Serialize + DeserializeOwned + Default + Clone {
    const KIND: SceneKind;

    fn meta_version(&self) -> u32;

    fn set_meta_version(&mut self, version: u32);

    /// Rewrite a document stored at schema version `from` into the current layout.
    fn upgrade(&mut self, from: u32);

    /// Restore invariants that hold at every version (unique ids, clamped positions).
    fn repair(&mut self) {}

    /// Encode for storage.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::Json` if serialisation fails.
    fn to_value(&self) -> Result<Value, SceneError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Encode for storage as a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `SceneError::Json` if serialisation fails.
    fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string(&self.to_value()?)?)
    }
}

/// Decode a raw JSON value and bring it to the current schema version.
///
/// # Errors
///
/// Returns `SceneError::NotAnObject` for non-object input and
/// `SceneError::Json` when the object does not match the document shape.
pub fn migrate<D: SceneDocument>(raw: Value) -> Result<D, SceneError> {
    if !raw.is_object() {
        return Err(SceneError::NotAnObject);
    }
    let mut doc: D = serde_json::from_value(raw)?;
    let from = doc.meta_version();
    if from > CURRENT_META_VERSION {
        log::warn!("{} document has newer metaVersion {from}; loading as-is", D::KIND);
    } else if from < CURRENT_META_VERSION {
        doc.upgrade(from);
        doc.set_meta_version(CURRENT_META_VERSION);
    }
    doc.repair();
    Ok(doc)
}

/// Parse a JSON string into a current-version document.
///
/// # Errors
///
/// Returns `SceneError::Empty` for blank input, otherwise any error from
/// JSON decoding or [`migrate`].
pub fn parse<D: SceneDocument>(raw: &str) -> Result<D, SceneError> {
    if raw.trim().is_empty() {
        return Err(SceneError::Empty);
    }
    let value: Value = serde_json::from_str(raw)?;
    migrate(value)
}

/// Parse a JSON string, falling back to the default document on any error.
#[must_use]
pub fn parse_or_default<D: SceneDocument>(raw: &str) -> D {
    match parse(raw) {
        Ok(doc) => doc,
        Err(e) => {
            log::warn!("unreadable {} document, using default: {e}", D::KIND);
            D::default()
        }
    }
}

/// Decode a page metadata field that holds either a JSON string or an
/// inline object. Absent or unreadable fields yield the default document.
#[must_use]
pub fn from_meta_field<D: SceneDocument>(field: Option<&Value>) -> D {
    match field {
        None | Some(Value::Null) => D::default(),
        Some(Value::String(raw)) => parse_or_default(raw),
        Some(other) => match migrate(other.clone()) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("unreadable {} document, using default: {e}", D::KIND);
                D::default()
            }
        },
    }
}

// =============================================================
// Map
// =============================================================

fn default_scale() -> f64 {
    1.0
}

fn default_marker_kind() -> String {
    "location".to_string()
}

fn default_floor() -> String {
    "ground".to_string()
}

fn default_icon() -> String {
    "default-pin".to_string()
}

/// A map: background image plus markers at normalised positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapDoc {
    #[serde(default)]
    pub meta_version: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub image_size: Option<Size>,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub layers: Vec<Value>,
    #[serde(default)]
    pub markers: Vec<Marker>,
}

impl Default for MapDoc {
    fn default() -> Self {
        Self {
            meta_version: CURRENT_META_VERSION,
            image_url: None,
            image_size: None,
            scale: 1.0,
            layers: Vec::new(),
            markers: Vec::new(),
        }
    }
}

/// A map marker. `x` / `y` are fractions of the image size in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    #[serde(default)]
    pub id: EntityId,
    /// Marker category key (`location`, `home`, or a custom key).
    #[serde(rename = "type", default = "default_marker_kind")]
    pub kind: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_floor")]
    pub floor: String,
    #[serde(default)]
    pub z: i64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub linked_page: Option<String>,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default)]
    pub meta: Meta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Per-marker colour override; the category colour applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Marker {
    /// A new marker of `kind` at a normalised position.
    #[must_use]
    pub fn new(kind: &str, x: f64, y: f64, label: String) -> Self {
        Self {
            id: new_id("m"),
            kind: kind.to_string(),
            x: clamp_unit(x),
            y: clamp_unit(y),
            floor: default_floor(),
            z: 0,
            label,
            linked_page: None,
            icon: default_icon(),
            meta: Meta::new(),
            created_at: now_rfc3339(),
            color: None,
        }
    }
}

impl SceneDocument for MapDoc {
    const KIND: SceneKind = SceneKind::Map;

    fn meta_version(&self) -> u32 {
        self.meta_version
    }

    fn set_meta_version(&mut self, version: u32) {
        self.meta_version = version;
    }

    fn upgrade(&mut self, from: u32) {
        if from == 0 {
            if !(self.scale.is_finite() && self.scale > 0.0) {
                self.scale = 1.0;
            }
            for marker in &mut self.markers {
                if marker.kind.trim().is_empty() {
                    marker.kind = default_marker_kind();
                }
            }
        }
    }

    fn repair(&mut self) {
        ensure_unique_ids(self.markers.iter_mut().map(|m| &mut m.id), "m");
        for marker in &mut self.markers {
            marker.x = clamp_unit(marker.x);
            marker.y = clamp_unit(marker.y);
        }
    }
}

// =============================================================
// Relationships
// =============================================================

/// Side of a character card an edge attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnchorSide {
    Left,
    #[default]
    Right,
}

/// One connection point on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub side: AnchorSide,
    pub index: usize,
}

impl Anchor {
    /// Middle anchor on `side`.
    #[must_use]
    pub fn middle(side: AnchorSide) -> Self {
        Self { side, index: ANCHORS_PER_SIDE / 2 }
    }
}

fn default_from_side() -> AnchorSide {
    AnchorSide::Right
}

fn default_to_side() -> AnchorSide {
    AnchorSide::Left
}

fn default_anchor_index() -> usize {
    ANCHORS_PER_SIDE / 2
}

/// The global relationship graph. Nodes are character pages keyed by page name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipDoc {
    #[serde(default)]
    pub meta_version: u32,
    #[serde(default)]
    pub nodes: Vec<RelNode>,
    #[serde(default)]
    pub edges: Vec<RelEdge>,
}

impl Default for RelationshipDoc {
    fn default() -> Self {
        Self { meta_version: CURRENT_META_VERSION, nodes: Vec::new(), edges: Vec::new() }
    }
}

/// A character card. `x` / `y` is the card's top-left corner in world units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelNode {
    pub key: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub meta: Meta,
}

/// A typed relationship between two cards, pinned to anchors on each side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelEdge {
    #[serde(default)]
    pub id: EntityId,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    /// Relationship label, e.g. "sibling" or "rival".
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default = "default_from_side")]
    pub from_side: AnchorSide,
    #[serde(default = "default_anchor_index")]
    pub from_index: usize,
    #[serde(default = "default_to_side")]
    pub to_side: AnchorSide,
    #[serde(default = "default_anchor_index")]
    pub to_index: usize,
}

impl RelEdge {
    #[must_use]
    pub fn from_anchor(&self) -> Anchor {
        Anchor { side: self.from_side, index: self.from_index }
    }

    #[must_use]
    pub fn to_anchor(&self) -> Anchor {
        Anchor { side: self.to_side, index: self.to_index }
    }
}

impl SceneDocument for RelationshipDoc {
    const KIND: SceneKind = SceneKind::Relationships;

    fn meta_version(&self) -> u32 {
        self.meta_version
    }

    fn set_meta_version(&mut self, version: u32) {
        self.meta_version = version;
    }

    fn upgrade(&mut self, from: u32) {
        if from == 0 {
            self.edges.retain(|e| !e.from.is_empty() && !e.to.is_empty());
        }
    }

    fn repair(&mut self) {
        ensure_unique_ids(self.edges.iter_mut().map(|e| &mut e.id), "e");
        for edge in &mut self.edges {
            edge.from_index = edge.from_index.min(ANCHORS_PER_SIDE - 1);
            edge.to_index = edge.to_index.min(ANCHORS_PER_SIDE - 1);
        }
    }

    /// Card positions are stored as whole world units.
    fn to_value(&self) -> Result<Value, SceneError> {
        let mut rounded = self.clone();
        for node in &mut rounded.nodes {
            node.x = node.x.round();
            node.y = node.y.round();
        }
        Ok(serde_json::to_value(&rounded)?)
    }
}

// =============================================================
// Systems
// =============================================================

fn default_virtual_size() -> Size {
    Size::new(SYSTEM_VIRTUAL_WIDTH, SYSTEM_VIRTUAL_HEIGHT)
}

fn default_node_kind() -> String {
    "entity".to_string()
}

/// A system flowchart on a fixed virtual canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemDoc {
    #[serde(default)]
    pub meta_version: u32,
    #[serde(default = "default_virtual_size")]
    pub virtual_size: Size,
    #[serde(default)]
    pub nodes: Vec<SystemNode>,
    #[serde(default)]
    pub edges: Vec<SystemEdge>,
}

impl Default for SystemDoc {
    fn default() -> Self {
        Self {
            meta_version: CURRENT_META_VERSION,
            virtual_size: default_virtual_size(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }
}

/// A flowchart node centred at `x` / `y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemNode {
    #[serde(default)]
    pub id: EntityId,
    #[serde(rename = "type", default = "default_node_kind")]
    pub kind: String,
    #[serde(default)]
    pub label: String,
    /// Linked wiki page, if any.
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub meta: Meta,
}

/// A directed flowchart edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemEdge {
    #[serde(default)]
    pub id: EntityId,
    #[serde(default)]
    pub from: EntityId,
    #[serde(default)]
    pub to: EntityId,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub meta: Meta,
}

impl SceneDocument for SystemDoc {
    const KIND: SceneKind = SceneKind::System;

    fn meta_version(&self) -> u32 {
        self.meta_version
    }

    fn set_meta_version(&mut self, version: u32) {
        self.meta_version = version;
    }

    fn upgrade(&mut self, from: u32) {
        if from == 0 {
            let size = self.virtual_size;
            if !(size.width > 0.0 && size.height > 0.0) {
                self.virtual_size = default_virtual_size();
            }
            for node in &mut self.nodes {
                if node.kind.trim().is_empty() {
                    node.kind = default_node_kind();
                }
            }
        }
    }

    fn repair(&mut self) {
        ensure_unique_ids(self.nodes.iter_mut().map(|n| &mut n.id), "n");
        ensure_unique_ids(self.edges.iter_mut().map(|e| &mut e.id), "e");
    }
}
