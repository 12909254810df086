//! System editor: a flowchart of nodes and directed edges on a fixed
//! virtual canvas.

#[cfg(test)]
#[path = "system_scene_test.rs"]
mod system_scene_test;

use crate::camera::{Camera, Point, Rect, Size, ZoomLimits, fit_center};
use crate::consts::{EDGE_TOLERANCE_PX, GRID_MIN_SCREEN_STEP_PX, GRID_STEP, SYSTEM_NODE_RADIUS_PX, SYSTEM_NODE_SLOP};
use crate::doc::{Anchor, EntityId, Meta, SystemDoc, SystemEdge, SystemNode, new_id};
use crate::hit::{dist_to_segment, nearest_within};
use crate::input::{PendingEdge, Selection, Tool};
use crate::palette::capitalize;
use crate::render::{DrawCmd, Layer, LayerWriter, TextAlign, View, arrowhead};
use crate::scene::{Scene, default_label, page_or_none};

const PLATE_COLOR: &str = "#0b1220";
const GRID_COLOR: &str = "rgba(148, 163, 184, 0.12)";
const EDGE_COLOR: &str = "#94a3b8";
const NODE_FILL: &str = "#1e293b";
const NODE_STROKE: &str = "#38bdf8";
const TEXT_COLOR: &str = "#e2e8f0";
const SELECTION_COLOR: &str = "#facc15";

pub struct SystemScene {
    doc: SystemDoc,
}

impl SystemScene {
    #[must_use]
    pub fn new(doc: SystemDoc) -> Self {
        Self { doc }
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&SystemNode> {
        self.doc.nodes.iter().find(|n| n.id == id)
    }

    #[must_use]
    pub fn edge(&self, id: &str) -> Option<&SystemEdge> {
        self.doc.edges.iter().find(|e| e.id == id)
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut SystemNode> {
        self.doc.nodes.iter_mut().find(|n| n.id == id)
    }

    fn center(node: &SystemNode) -> Point {
        Point::new(node.x, node.y)
    }

    /// Endpoints of every edge whose nodes both exist.
    fn resolved_edges(&self) -> impl Iterator<Item = (&SystemEdge, Point, Point)> {
        self.doc.edges.iter().filter_map(|e| {
            let a = self.node(&e.from)?;
            let b = self.node(&e.to)?;
            Some((e, Self::center(a), Self::center(b)))
        })
    }

    fn draw_background(&self, out: &mut LayerWriter<'_>, view: &View) {
        let bounds = Rect::new(0.0, 0.0, self.doc.virtual_size.width, self.doc.virtual_size.height);
        out.push(DrawCmd::Fill { rect: bounds, color: PLATE_COLOR.to_string() });
        if GRID_STEP * view.camera.zoom > GRID_MIN_SCREEN_STEP_PX {
            out.push(DrawCmd::Grid { bounds, step: GRID_STEP, color: GRID_COLOR.to_string(), width: view.px(1.0) });
        }
    }

    fn draw_edges(&self, out: &mut LayerWriter<'_>, view: &View) {
        let radius = view.px(SYSTEM_NODE_RADIUS_PX);
        for (edge, a, b) in self.resolved_edges() {
            out.push(DrawCmd::Line { from: a, to: b, color: EDGE_COLOR.to_string(), width: view.px(2.0), dashed: false });
            let len = a.dist(b);
            if len > radius {
                let tip = Point::new(b.x - (b.x - a.x) / len * radius, b.y - (b.y - a.y) / len * radius);
                out.push(arrowhead(a, tip, view, EDGE_COLOR));
            }
            if !edge.label.is_empty() {
                out.push(DrawCmd::Text {
                    at: Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0 - view.px(8.0)),
                    text: edge.label.clone(),
                    size: view.px(12.0),
                    color: TEXT_COLOR.to_string(),
                    align: TextAlign::Center,
                });
            }
        }
    }

    fn draw_nodes(&self, out: &mut LayerWriter<'_>, view: &View) {
        for node in &self.doc.nodes {
            let center = Self::center(node);
            out.push(DrawCmd::Circle {
                center,
                radius: view.px(SYSTEM_NODE_RADIUS_PX),
                fill: Some(NODE_FILL.to_string()),
                stroke: Some(NODE_STROKE.to_string()),
                width: view.px(2.0),
            });
            out.push(DrawCmd::Text {
                at: Point::new(center.x, center.y + view.px(SYSTEM_NODE_RADIUS_PX + 12.0)),
                text: node.label.clone(),
                size: view.px(12.0),
                color: TEXT_COLOR.to_string(),
                align: TextAlign::Center,
            });
        }
    }
}

impl Scene for SystemScene {
    type Doc = SystemDoc;

    fn doc(&self) -> &SystemDoc {
        &self.doc
    }

    fn zoom_limits(&self) -> ZoomLimits {
        ZoomLimits::SYSTEM
    }

    fn position(&self, id: &str) -> Option<Point> {
        self.node(id).map(Self::center)
    }

    fn set_position(&mut self, id: &str, world: Point) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        node.x = world.x;
        node.y = world.y;
        true
    }

    fn hit_entity(&self, world: Point, camera: &Camera) -> Option<EntityId> {
        let radius = camera.screen_dist_to_world(SYSTEM_NODE_RADIUS_PX) + SYSTEM_NODE_SLOP;
        nearest_within(self.doc.nodes.iter().map(|n| (n.id.clone(), world.dist(Self::center(n)))), radius)
    }

    fn hit_edge(&self, world: Point, camera: &Camera) -> Option<EntityId> {
        let tolerance = camera.screen_dist_to_world(EDGE_TOLERANCE_PX);
        nearest_within(self.resolved_edges().map(|(e, a, b)| (e.id.clone(), dist_to_segment(world, a, b))), tolerance)
    }

    fn hit_connector(&self, world: Point, camera: &Camera, tool: &Tool) -> Option<(EntityId, Option<Anchor>)> {
        if *tool != Tool::Connect {
            return None;
        }
        self.hit_entity(world, camera).map(|id| (id, None))
    }

    fn place(&mut self, kind: &str, world: Point) -> Option<EntityId> {
        let id = new_id("n");
        self.doc.nodes.push(SystemNode {
            id: id.clone(),
            kind: kind.to_string(),
            label: default_label(&capitalize(kind)),
            page: None,
            x: world.x,
            y: world.y,
            meta: Meta::new(),
        });
        Some(id)
    }

    fn connect(&mut self, edge: &PendingEdge, label: &str) -> Option<EntityId> {
        if edge.from == edge.to || self.node(&edge.from).is_none() || self.node(&edge.to).is_none() {
            return None;
        }
        let id = new_id("e");
        self.doc.edges.push(SystemEdge {
            id: id.clone(),
            from: edge.from.clone(),
            to: edge.to.clone(),
            label: label.trim().to_string(),
            meta: Meta::new(),
        });
        Some(id)
    }

    fn delete_entity(&mut self, id: &str) -> Option<Vec<EntityId>> {
        let before = self.doc.nodes.len();
        self.doc.nodes.retain(|n| n.id != id);
        if self.doc.nodes.len() == before {
            return None;
        }
        let removed = self
            .doc
            .edges
            .iter()
            .filter(|e| e.from == id || e.to == id)
            .map(|e| e.id.clone())
            .collect();
        self.doc.edges.retain(|e| e.from != id && e.to != id);
        Some(removed)
    }

    fn delete_edge(&mut self, id: &str) -> bool {
        let before = self.doc.edges.len();
        self.doc.edges.retain(|e| e.id != id);
        self.doc.edges.len() < before
    }

    fn set_label(&mut self, selection: &Selection, label: &str) -> bool {
        match selection {
            Selection::Entity(id) => {
                let Some(node) = self.node_mut(id) else {
                    return false;
                };
                node.label = label.to_string();
                true
            }
            Selection::Edge(id) => {
                let Some(edge) = self.doc.edges.iter_mut().find(|e| e.id == *id) else {
                    return false;
                };
                edge.label = label.to_string();
                true
            }
        }
    }

    fn linked_page(&self, id: &str) -> Option<String> {
        self.node(id).and_then(|n| n.page.clone())
    }

    fn set_linked_page(&mut self, id: &str, page: Option<String>) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        node.page = page_or_none(page);
        true
    }

    fn fit(&mut self, viewport: Size) -> Camera {
        let size = self.doc.virtual_size;
        fit_center(Rect::new(0.0, 0.0, size.width, size.height), viewport, ZoomLimits::SYSTEM)
    }

    fn draw(&self, layer: Layer, out: &mut LayerWriter<'_>, view: &View) {
        match layer {
            Layer::Background => self.draw_background(out, view),
            Layer::Edges => self.draw_edges(out, view),
            Layer::Entities => self.draw_nodes(out, view),
            Layer::Overlay => {}
        }
    }

    fn draw_selection(&self, selection: &Selection, out: &mut LayerWriter<'_>, view: &View) {
        match selection {
            Selection::Entity(id) => {
                if let Some(node) = self.node(id) {
                    out.push(DrawCmd::Circle {
                        center: Self::center(node),
                        radius: view.px(SYSTEM_NODE_RADIUS_PX + 4.0),
                        fill: None,
                        stroke: Some(SELECTION_COLOR.to_string()),
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
                        width: view.px(3.0),
                        dashed: false,
                    });
                }
            }
        }
    }
}
