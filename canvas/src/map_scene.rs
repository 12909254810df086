//! Map editor: markers pinned to a background image.
//!
//! World space is image pixels. Markers store their position as a fraction
//! of the image size, so moving the image to a different resolution keeps
//! every marker in place.

#[cfg(test)]
#[path = "map_scene_test.rs"]
mod map_scene_test;

use crate::camera::{Camera, ImageFrame, Point, Size, ZoomLimits, fit_center};
use crate::consts::MARKER_RADIUS_PX;
use crate::doc::{EntityId, MapDoc, Marker};
use crate::hit::nearest_within;
use crate::input::Selection;
use crate::palette::Palette;
use crate::render::{DrawCmd, Layer, LayerWriter, TextAlign, View};
use crate::scene::{Scene, default_label, page_or_none};

const PLATE_COLOR: &str = "#0f172a";
const MARKER_OUTLINE: &str = "#ffffff";
const LABEL_COLOR: &str = "#f8fafc";
const SELECTION_COLOR: &str = "#facc15";

pub struct MapScene {
    doc: MapDoc,
    palette: Palette,
}

impl MapScene {
    #[must_use]
    pub fn new(doc: MapDoc, palette: Palette) -> Self {
        Self { doc, palette }
    }

    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn palette_mut(&mut self) -> &mut Palette {
        &mut self.palette
    }

    #[must_use]
    pub fn frame(&self) -> ImageFrame {
        ImageFrame::new(self.doc.image_size)
    }

    /// Replace the background image. Marker fractions are unchanged.
    pub fn set_image(&mut self, url: String, size: Size) {
        self.doc.image_url = Some(url);
        self.doc.image_size = Some(size);
    }

    #[must_use]
    pub fn marker(&self, id: &str) -> Option<&Marker> {
        self.doc.markers.iter().find(|m| m.id == id)
    }

    fn marker_mut(&mut self, id: &str) -> Option<&mut Marker> {
        self.doc.markers.iter_mut().find(|m| m.id == id)
    }

    fn visible_markers(&self) -> impl Iterator<Item = &Marker> {
        self.doc.markers.iter().filter(|m| self.palette.is_visible(&m.kind))
    }

    fn world_of(&self, marker: &Marker) -> Point {
        self.frame().denormalize(Point::new(marker.x, marker.y))
    }
}

impl Scene for MapScene {
    type Doc = MapDoc;

    fn doc(&self) -> &MapDoc {
        &self.doc
    }

    fn zoom_limits(&self) -> ZoomLimits {
        ZoomLimits::MAP
    }

    fn position(&self, id: &str) -> Option<Point> {
        self.marker(id).map(|m| self.world_of(m))
    }

    fn stored_position(&self, id: &str) -> Option<Point> {
        self.marker(id).map(|m| Point::new(m.x, m.y))
    }

    fn set_position(&mut self, id: &str, world: Point) -> bool {
        let norm = self.frame().normalize(world);
        let Some(marker) = self.marker_mut(id) else {
            return false;
        };
        marker.x = norm.x;
        marker.y = norm.y;
        true
    }

    fn hit_entity(&self, world: Point, camera: &Camera) -> Option<EntityId> {
        let radius = camera.screen_dist_to_world(MARKER_RADIUS_PX);
        nearest_within(self.visible_markers().map(|m| (m.id.clone(), world.dist(self.world_of(m)))), radius)
    }

    fn place(&mut self, kind: &str, world: Point) -> Option<EntityId> {
        let norm = self.frame().normalize(world);
        let marker = Marker::new(kind, norm.x, norm.y, default_label(&self.palette.label_for(kind)));
        let id = marker.id.clone();
        self.doc.markers.push(marker);
        Some(id)
    }

    fn delete_entity(&mut self, id: &str) -> Option<Vec<EntityId>> {
        let before = self.doc.markers.len();
        self.doc.markers.retain(|m| m.id != id);
        (self.doc.markers.len() < before).then(Vec::new)
    }

    fn set_label(&mut self, selection: &Selection, label: &str) -> bool {
        let Selection::Entity(id) = selection else {
            return false;
        };
        let Some(marker) = self.marker_mut(id) else {
            return false;
        };
        marker.label = label.to_string();
        true
    }

    fn linked_page(&self, id: &str) -> Option<String> {
        self.marker(id).and_then(|m| m.linked_page.clone())
    }

    fn set_linked_page(&mut self, id: &str, page: Option<String>) -> bool {
        let Some(marker) = self.marker_mut(id) else {
            return false;
        };
        marker.linked_page = page_or_none(page);
        true
    }

    fn fit(&mut self, viewport: Size) -> Camera {
        fit_center(self.frame().bounds(), viewport, ZoomLimits::MAP)
    }

    fn draw(&self, layer: Layer, out: &mut LayerWriter<'_>, view: &View) {
        match layer {
            Layer::Background => {
                let rect = self.frame().bounds();
                if self.doc.image_url.is_some() {
                    out.push(DrawCmd::Image { rect });
                } else {
                    out.push(DrawCmd::Fill { rect, color: PLATE_COLOR.to_string() });
                }
            }
            Layer::Entities => {
                for marker in self.visible_markers() {
                    let center = self.world_of(marker);
                    let (category_color, icon) = self.palette.style_for(&marker.kind);
                    let color = marker.color.as_deref().unwrap_or(category_color);
                    out.push(DrawCmd::Circle {
                        center,
                        radius: view.px(MARKER_RADIUS_PX),
                        fill: Some(color.to_string()),
                        stroke: Some(MARKER_OUTLINE.to_string()),
                        width: view.px(2.0),
                    });
                    out.push(DrawCmd::Text {
                        at: center,
                        text: icon.to_string(),
                        size: view.px(11.0),
                        color: MARKER_OUTLINE.to_string(),
                        align: TextAlign::Center,
                    });
                    if !marker.label.is_empty() {
                        out.push(DrawCmd::Text {
                            at: Point::new(center.x, center.y - view.px(MARKER_RADIUS_PX + 8.0)),
                            text: marker.label.clone(),
                            size: view.px(12.0),
                            color: LABEL_COLOR.to_string(),
                            align: TextAlign::Center,
                        });
                    }
                }
            }
            Layer::Edges | Layer::Overlay => {}
        }
    }

    fn draw_selection(&self, selection: &Selection, out: &mut LayerWriter<'_>, view: &View) {
        let Selection::Entity(id) = selection else {
            return;
        };
        let Some(marker) = self.marker(id) else {
            return;
        };
        if !self.palette.is_visible(&marker.kind) {
            return;
        }
        out.push(DrawCmd::Circle {
            center: self.world_of(marker),
            radius: view.px(MARKER_RADIUS_PX + 4.0),
            fill: None,
            stroke: Some(SELECTION_COLOR.to_string()),
            width: view.px(2.0),
        });
    }
}
