//! Relationship editor: one card per character page, joined by typed edges
//! pinned to anchors on the card sides.
//!
//! Cards are not created or deleted here; they follow the wiki's character
//! pages through [`RelationshipScene::sync_pages`]. Card positions are the
//! top-left corner in world units.

#[cfg(test)]
#[path = "relationship_scene_test.rs"]
mod relationship_scene_test;

use serde_json::Value;

use crate::camera::{Camera, Point, Rect, Size, ZoomLimits, fit_top_left};
use crate::consts::{
    ANCHOR_RADIUS_PX, ANCHORS_PER_SIDE, CARD_HEIGHT, CARD_WIDTH, DRAG_CLAMP_PAD_PX, EDGE_TOLERANCE_PX, FIT_MIN_ZOOM,
    FIT_PADDING_PX, LAYOUT_GAP, LAYOUT_PREFERRED_WIDTH, NEW_CARD_OFFSET,
};
use crate::doc::{Anchor, AnchorSide, EntityId, Meta, RelEdge, RelNode, RelationshipDoc, new_id};
use crate::hit::{dist_to_segment, nearest_within};
use crate::input::{PendingEdge, Selection, Tool};
use crate::render::{DrawCmd, Layer, LayerWriter, TextAlign, View};
use crate::scene::Scene;

/// Zoom within this distance of the last fit counts as "at fit".
const FIT_EPSILON: f64 = 0.001;

const SPACE_COLOR: &str = "#020617";
const CARD_FILL: &str = "#111827";
const CARD_STROKE: &str = "#334155";
const ANCHOR_FILL: &str = "#0ea5e9";
const EDGE_SHADOW: &str = "rgba(0, 0, 0, 0.35)";
const EDGE_COLOR: &str = "#38bdf8";
const TEXT_COLOR: &str = "#e5e7eb";
const SELECTION_COLOR: &str = "#facc15";

pub struct RelationshipScene {
    doc: RelationshipDoc,
    last_fit_zoom: Option<f64>,
}

impl RelationshipScene {
    #[must_use]
    pub fn new(doc: RelationshipDoc) -> Self {
        Self { doc, last_fit_zoom: None }
    }

    #[must_use]
    pub fn node(&self, key: &str) -> Option<&RelNode> {
        self.doc.nodes.iter().find(|n| n.key == key)
    }

    #[must_use]
    pub fn edge(&self, id: &str) -> Option<&RelEdge> {
        self.doc.edges.iter().find(|e| e.id == id)
    }

    /// Zoom chosen by the most recent [`Scene::fit`].
    #[must_use]
    pub fn last_fit_zoom(&self) -> Option<f64> {
        self.last_fit_zoom
    }

    #[must_use]
    pub fn card_rect(node: &RelNode) -> Rect {
        Rect::new(node.x, node.y, CARD_WIDTH, CARD_HEIGHT)
    }

    /// World position of an anchor on `node`.
    #[must_use]
    pub fn anchor_point(node: &RelNode, anchor: Anchor) -> Point {
        let x = match anchor.side {
            AnchorSide::Left => node.x,
            AnchorSide::Right => node.x + CARD_WIDTH,
        };
        let index = anchor.index.min(ANCHORS_PER_SIDE - 1);
        Point::new(x, node.y + CARD_HEIGHT * slot_fraction(index))
    }

    /// Bounding box of all cards, or `None` if there are none.
    #[must_use]
    pub fn content_bounds(&self) -> Option<Rect> {
        self.doc.nodes.iter().map(Self::card_rect).reduce(|acc, r| acc.union(&r))
    }

    /// Arrange every card in a grid sized to the viewport width.
    pub fn layout_grid(&mut self, viewport_width: f64) {
        let count = self.doc.nodes.len();
        if count == 0 {
            return;
        }
        let cols = grid_columns(viewport_width, count);
        for (i, node) in self.doc.nodes.iter_mut().enumerate() {
            let (col, row) = (i % cols, i / cols);
            node.x = index_f64(col) * (CARD_WIDTH + LAYOUT_GAP);
            node.y = index_f64(row) * (CARD_HEIGHT + LAYOUT_GAP);
        }
    }

    /// Make the card set match the given character pages (`(key, meta)`).
    ///
    /// Existing cards keep their position and take the fresh metadata; cards
    /// whose page is gone are dropped (their edges stay and are skipped as
    /// dangling). New cards go in a row just inside the top-left of the
    /// kept cards, or into a fresh grid when nothing was placed yet.
    /// Returns `true` if any card was added or removed.
    pub fn sync_pages(&mut self, pages: &[(String, Meta)], viewport_width: f64) -> bool {
        let mut previous: Vec<RelNode> = std::mem::take(&mut self.doc.nodes);
        let mut added = Vec::new();
        let mut next = Vec::with_capacity(pages.len());
        for (key, meta) in pages {
            if let Some(pos) = previous.iter().position(|n| n.key == *key) {
                let mut node = previous.swap_remove(pos);
                node.meta = meta.clone();
                next.push(node);
            } else {
                added.push(next.len());
                next.push(RelNode { key: key.clone(), x: 0.0, y: 0.0, meta: meta.clone() });
            }
        }
        let changed = !added.is_empty() || !previous.is_empty();
        let bounds = next
            .iter()
            .enumerate()
            .filter(|(i, _)| !added.contains(i))
            .map(|(_, n)| Self::card_rect(n))
            .reduce(|acc, r| acc.union(&r));
        self.doc.nodes = next;

        match bounds {
            Some(b) => {
                for (i, idx) in added.iter().enumerate() {
                    let node = &mut self.doc.nodes[*idx];
                    node.x = b.x + NEW_CARD_OFFSET + index_f64(i) * (CARD_WIDTH + LAYOUT_GAP);
                    node.y = b.y + NEW_CARD_OFFSET;
                }
            }
            _ if !added.is_empty() => self.layout_grid(viewport_width),
            _ => {}
        }
        changed
    }

    fn node_mut(&mut self, key: &str) -> Option<&mut RelNode> {
        self.doc.nodes.iter_mut().find(|n| n.key == key)
    }

    fn anchors(&self) -> impl Iterator<Item = (&RelNode, Anchor, Point)> {
        self.doc.nodes.iter().flat_map(|node| {
            [AnchorSide::Left, AnchorSide::Right].into_iter().flat_map(move |side| {
                (0..ANCHORS_PER_SIDE).map(move |index| {
                    let anchor = Anchor { side, index };
                    (node, anchor, Self::anchor_point(node, anchor))
                })
            })
        })
    }

    /// Endpoints of every edge whose cards both exist.
    fn resolved_edges(&self) -> impl Iterator<Item = (&RelEdge, Point, Point)> {
        self.doc.edges.iter().filter_map(|e| {
            let a = self.node(&e.from)?;
            let b = self.node(&e.to)?;
            Some((e, Self::anchor_point(a, e.from_anchor()), Self::anchor_point(b, e.to_anchor())))
        })
    }

    fn at_fit_zoom(&self, camera: &Camera) -> bool {
        self.last_fit_zoom.is_some_and(|fit| camera.zoom <= fit + FIT_EPSILON)
    }
}

/// Grid columns for `count` cards in a viewport `viewport_width` wide.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn grid_columns(viewport_width: f64, count: usize) -> usize {
    let width = viewport_width.max(LAYOUT_PREFERRED_WIDTH);
    let cols = ((width - 80.0) / (CARD_WIDTH + LAYOUT_GAP)).floor().max(1.0) as usize;
    cols.clamp(1, count.max(1))
}

#[allow(clippy::cast_precision_loss)]
fn index_f64(i: usize) -> f64 {
    i as f64
}

/// Vertical position of anchor `index` as a fraction of card height.
fn slot_fraction(index: usize) -> f64 {
    index_f64(index + 1) / index_f64(ANCHORS_PER_SIDE + 1)
}

/// Card title: the page's `title` metadata, else the key prettified.
fn card_title(node: &RelNode) -> String {
    if let Some(Value::String(title)) = node.meta.get("title") {
        if !title.trim().is_empty() {
            return title.clone();
        }
    }
    node.key
        .split(['_', '-'])
        .filter(|w| !w.is_empty())
        .map(crate::palette::capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

impl Scene for RelationshipScene {
    type Doc = RelationshipDoc;

    fn doc(&self) -> &RelationshipDoc {
        &self.doc
    }

    fn zoom_limits(&self) -> ZoomLimits {
        ZoomLimits::RELATIONSHIPS
    }

    fn writes_through(&self) -> bool {
        false
    }

    fn prompts_edge_label(&self) -> bool {
        true
    }

    fn position(&self, id: &str) -> Option<Point> {
        self.node(id).map(|n| Point::new(n.x, n.y))
    }

    fn set_position(&mut self, id: &str, world: Point) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        node.x = world.x;
        node.y = world.y;
        true
    }

    /// At fit zoom the whole graph is on screen, so keep dragged cards there.
    fn constrain_drag(&self, _id: &str, world: Point, camera: &Camera, viewport: Size) -> Point {
        if !self.at_fit_zoom(camera) {
            return world;
        }
        let min = camera.screen_to_world(Point::new(DRAG_CLAMP_PAD_PX, DRAG_CLAMP_PAD_PX));
        let max = camera.screen_to_world(Point::new(
            viewport.width - DRAG_CLAMP_PAD_PX,
            viewport.height - DRAG_CLAMP_PAD_PX,
        ));
        let max_x = (max.x - CARD_WIDTH).max(min.x);
        let max_y = (max.y - CARD_HEIGHT).max(min.y);
        Point::new(world.x.clamp(min.x, max_x), world.y.clamp(min.y, max_y))
    }

    fn hit_entity(&self, world: Point, _camera: &Camera) -> Option<EntityId> {
        nearest_within(
            self.doc.nodes.iter().filter(|n| Self::card_rect(n).contains(world)).map(|n| (n.key.clone(), 0.0)),
            0.0,
        )
    }

    fn hit_edge(&self, world: Point, camera: &Camera) -> Option<EntityId> {
        let tolerance = camera.screen_dist_to_world(EDGE_TOLERANCE_PX);
        nearest_within(self.resolved_edges().map(|(e, a, b)| (e.id.clone(), dist_to_segment(world, a, b))), tolerance)
    }

    /// Anchors connect under every tool.
    fn hit_connector(&self, world: Point, camera: &Camera, _tool: &Tool) -> Option<(EntityId, Option<Anchor>)> {
        let radius = camera.screen_dist_to_world(ANCHOR_RADIUS_PX);
        nearest_within(
            self.anchors().map(|(node, anchor, p)| ((node.key.clone(), Some(anchor)), world.dist(p))),
            radius,
        )
    }

    fn connector_point(&self, id: &str, anchor: Option<Anchor>) -> Option<Point> {
        let node = self.node(id)?;
        Some(match anchor {
            Some(a) => Self::anchor_point(node, a),
            None => Self::card_rect(node).center(),
        })
    }

    /// The relationship type may be blank; only a cancelled prompt skips the edge.
    fn connect(&mut self, edge: &PendingEdge, label: &str) -> Option<EntityId> {
        let kind = label.trim();
        if edge.from == edge.to || self.node(&edge.from).is_none() || self.node(&edge.to).is_none() {
            return None;
        }
        let from = edge.from_anchor.unwrap_or(Anchor::middle(AnchorSide::Right));
        let to = edge.to_anchor.unwrap_or(Anchor::middle(AnchorSide::Left));
        let id = new_id("e");
        self.doc.edges.push(RelEdge {
            id: id.clone(),
            from: edge.from.clone(),
            to: edge.to.clone(),
            kind: kind.to_string(),
            from_side: from.side,
            from_index: from.index,
            to_side: to.side,
            to_index: to.index,
        });
        Some(id)
    }

    /// Cards follow pages and cannot be deleted from the graph.
    fn delete_entity(&mut self, _id: &str) -> Option<Vec<EntityId>> {
        None
    }

    fn delete_edge(&mut self, id: &str) -> bool {
        let before = self.doc.edges.len();
        self.doc.edges.retain(|e| e.id != id);
        self.doc.edges.len() < before
    }

    fn set_label(&mut self, selection: &Selection, label: &str) -> bool {
        let Selection::Edge(id) = selection else {
            return false;
        };
        let Some(edge) = self.doc.edges.iter_mut().find(|e| e.id == *id) else {
            return false;
        };
        edge.kind = label.trim().to_string();
        true
    }

    /// A card's page is its key.
    fn linked_page(&self, id: &str) -> Option<String> {
        self.node(id).map(|n| n.key.clone())
    }

    fn fit(&mut self, viewport: Size) -> Camera {
        let bounds = self.content_bounds().unwrap_or(Rect::new(0.0, 0.0, CARD_WIDTH, CARD_HEIGHT));
        let camera = fit_top_left(bounds, viewport, FIT_PADDING_PX, FIT_MIN_ZOOM);
        let camera = Camera { zoom: ZoomLimits::RELATIONSHIPS.clamp(camera.zoom), ..camera };
        self.last_fit_zoom = Some(camera.zoom);
        camera
    }

    fn draw(&self, layer: Layer, out: &mut LayerWriter<'_>, view: &View) {
        match layer {
            Layer::Background => out.push(DrawCmd::Fill { rect: view.visible(), color: SPACE_COLOR.to_string() }),
            Layer::Edges => {
                for (edge, a, b) in self.resolved_edges() {
                    out.push(DrawCmd::Line { from: a, to: b, color: EDGE_SHADOW.to_string(), width: 6.0, dashed: false });
                    out.push(DrawCmd::Line { from: a, to: b, color: EDGE_COLOR.to_string(), width: 2.0, dashed: false });
                    if !edge.kind.is_empty() {
                        out.push(DrawCmd::Text {
                            at: Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0 - 10.0),
                            text: edge.kind.clone(),
                            size: 12.0,
                            color: TEXT_COLOR.to_string(),
                            align: TextAlign::Center,
                        });
                    }
                }
            }
            Layer::Entities => {
                for node in &self.doc.nodes {
                    let rect = Self::card_rect(node);
                    out.push(DrawCmd::Fill { rect, color: CARD_FILL.to_string() });
                    out.push(DrawCmd::StrokeRect { rect, color: CARD_STROKE.to_string(), width: 1.0 });
                    out.push(DrawCmd::Text {
                        at: Point::new(rect.x + CARD_WIDTH / 2.0, rect.y + CARD_HEIGHT - 14.0),
                        text: card_title(node),
                        size: 13.0,
                        color: TEXT_COLOR.to_string(),
                        align: TextAlign::Center,
                    });
                }
                for (_, _, p) in self.anchors() {
                    out.push(DrawCmd::Circle {
                        center: p,
                        radius: view.px(ANCHOR_RADIUS_PX),
                        fill: Some(ANCHOR_FILL.to_string()),
                        stroke: None,
                        width: 0.0,
                    });
                }
            }
            Layer::Overlay => {}
        }
    }

    fn draw_selection(&self, selection: &Selection, out: &mut LayerWriter<'_>, view: &View) {
        match selection {
            Selection::Entity(key) => {
                if let Some(node) = self.node(key) {
                    let r = Self::card_rect(node);
                    let pad = view.px(3.0);
                    out.push(DrawCmd::StrokeRect {
                        rect: Rect::new(r.x - pad, r.y - pad, r.width + pad * 2.0, r.height + pad * 2.0),
                        color: SELECTION_COLOR.to_string(),
                        width: view.px(2.0),
                    });
                }
            }
            Selection::Edge(id) => {
                if let Some((_, a, b)) = self.resolved_edges().find(|(e, _, _)| e.id == *id) {
                    out.push(DrawCmd::Line {
                        from: a,
                        to: b,
                        color: SELECTION_COLOR.to_string(),
                        width: 3.0,
                        dashed: false,
                    });
                }
            }
        }
    }
}
