//! Fault lines: polylines extruded in the shader, hit-tested by distance.

use foundation::ids::FeatureId;
use foundation::math::Vec2;
use geometry::mesh::{open_ring, polygon_outline, simple_line};
use gpu::{Geometry, LayerId, MeshStore, RenderFrame, ShaderKind, UniformValue};
use runtime::DebugSink;
use scene::LineDictionary;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::colors::{ColorError, Rgb, parse_rgb};
use crate::geojson::{GeoFeature, GeoGeometry, project_ring};
use crate::highlight::{MeshEmphasis, MeshHighlighter, PolygonMeshes};
use crate::layer::{
    DragState, FeatureHit, Layer, MapView, PointerEvent, PointerKind, PointerOutcome,
};
use crate::resize::{ResizeConfig, ZoomScale};
use crate::symbology::{DEFAULT_Z_INDEX, OUTLINE_WIDTH, outline_uniforms};

pub const FAULTLINES: &str = "faultlines";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FaultlineConfig {
    pub line_color: String,
    pub highlight_color: String,
    pub line_resize: ResizeConfig,
    /// Maximum pointer distance to a line, projected units.
    pub hit_distance: f64,
    pub hit_cell_size: f64,
    pub label_key: String,
}

impl Default for FaultlineConfig {
    fn default() -> Self {
        Self {
            line_color: "#727d82".to_string(),
            highlight_color: "#00ffff".to_string(),
            line_resize: ResizeConfig::new(ZoomScale::new(7.0, 0.6), ZoomScale::new(17.0, 0.03)),
            hit_distance: 0.5,
            hit_cell_size: 1.2,
            label_key: "label".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Faultline {
    pub label: String,
    pub properties: Map<String, Value>,
    pub meshes: Vec<PolygonMeshes>,
}

pub struct FaultlineModule {
    config: FaultlineConfig,
    color: Rgb,
    store: MeshStore,
    debug: DebugSink,
    lines: Vec<Faultline>,
    dict: LineDictionary<usize>,
    highlighter: MeshHighlighter,
    drag: DragState,
    zoom: Option<f64>,
}

impl FaultlineModule {
    pub fn new(layer: LayerId, config: FaultlineConfig, debug: DebugSink) -> Result<Self, ColorError> {
        let color = parse_rgb(&config.line_color)?;
        let highlight = parse_rgb(&config.highlight_color)?;
        Ok(Self {
            color,
            store: MeshStore::new(layer),
            debug,
            lines: Vec::new(),
            dict: LineDictionary::new(config.hit_cell_size),
            highlighter: MeshHighlighter::new(MeshEmphasis::outline(highlight)),
            drag: DragState::default(),
            zoom: None,
            config,
        })
    }

    pub fn store(&self) -> &MeshStore {
        &self.store
    }

    pub fn lines(&self) -> &[Faultline] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn line_width(&self) -> f64 {
        let resize = &self.config.line_resize;
        self.zoom.map_or(resize.min.scale, |z| resize.radius(z))
    }

    /// Replaces every fault. Line strings are drawn open, polygon rings
    /// closed; points are ignored. Returns how many faults were drawn.
    pub fn set(&mut self, view: &dyn MapView, features: &[GeoFeature]) -> usize {
        self.clear();
        let width = self.line_width();
        let mut skipped = 0usize;

        for (index, feature) in features.iter().enumerate() {
            let feature_index = self.lines.len();
            let mut segments: Vec<(Vec<Vec2>, bool)> = Vec::new();
            match &feature.geometry {
                GeoGeometry::LineString(points) => {
                    segments.push((project_ring(view, points), false));
                }
                GeoGeometry::Polygon(_) | GeoGeometry::MultiPolygon(_) => {
                    for rings in feature.geometry.polygons() {
                        segments.extend(rings.iter().map(|r| (project_ring(view, r), true)));
                    }
                }
                GeoGeometry::Point(_) => {}
            }
            segments.retain(|(points, closed)| {
                let min = if *closed { 3 } else { 2 };
                open_ring(points).len() >= min
            });
            if segments.is_empty() {
                warn!(index, kind = feature.geometry.kind(), "skipping fault without a line");
                skipped += 1;
                continue;
            }

            let id = self.dict.insert(feature_index);
            let mut meshes = Vec::with_capacity(segments.len());
            for (points, closed) in &segments {
                let mesh = if *closed {
                    let mut ring = open_ring(points).to_vec();
                    if let Some(&first) = ring.first() {
                        ring.push(first);
                    }
                    self.dict.add_line(id, &ring);
                    polygon_outline(points)
                } else {
                    self.dict.add_line(id, points);
                    simple_line(points)
                };
                let handle = self.store.submit(
                    ShaderKind::Outline,
                    Geometry::Normals(mesh),
                    outline_uniforms(self.color, width),
                    DEFAULT_Z_INDEX,
                );
                meshes.push(PolygonMeshes {
                    fill: None,
                    outline: handle,
                });
            }

            let label = feature
                .property_str(&self.config.label_key)
                .map(str::to_string)
                .or_else(|| feature.id.clone())
                .unwrap_or_default();
            self.highlighter.add(meshes.clone());
            self.lines.push(Faultline {
                label,
                properties: feature.properties.clone(),
                meshes,
            });
        }
        self.store.request_redraw();

        let count = self.lines.len();
        debug!(faults = count, skipped, "faultlines set");
        self.debug.emit(FAULTLINES, "set", format!("{count} faults added"));
        count
    }

    pub fn test_position(&self, position: Vec2) -> Option<FeatureId> {
        self.dict
            .get_closest(position, self.config.hit_distance)
            .map(|hit| FeatureId::from_index(*hit.value))
    }

    pub fn highlighted(&self) -> Option<FeatureId> {
        self.highlighter.current()
    }

    pub fn clear_highlight(&mut self) -> bool {
        if !self.highlighter.revert(&mut self.store) {
            return false;
        }
        self.store.request_redraw();
        true
    }

    fn hit(&self, id: FeatureId) -> Option<FeatureHit> {
        let line = self.lines.get(id.index())?;
        let mut hit = FeatureHit::new(FAULTLINES, id, line.label.clone());
        hit.properties = line.properties.clone();
        Some(hit)
    }
}

impl Layer for FaultlineModule {
    fn name(&self) -> &'static str {
        FAULTLINES
    }

    fn id(&self) -> LayerId {
        self.store.layer()
    }

    fn clear(&mut self) {
        self.store.clear();
        self.lines.clear();
        self.dict.clear();
        self.highlighter.clear();
    }

    fn resize(&mut self, zoom: f64) {
        self.zoom = Some(zoom);
        if self.lines.is_empty() {
            return;
        }
        let width = self.line_width();
        for part in self.lines.iter().flat_map(|l| &l.meshes) {
            self.store
                .set_uniform(part.outline, OUTLINE_WIDTH, UniformValue::Float(width as f32));
        }
        trace!(zoom, width, "faultline resize");
    }

    fn is_visible(&self) -> bool {
        self.store.is_layer_visible()
    }

    fn set_visibility(&mut self, visible: bool) -> bool {
        self.store.set_layer_visible(visible)
    }

    fn handle_pointer(&mut self, event: &PointerEvent) -> PointerOutcome {
        let skip = self.drag.track(event.kind);
        if !self.is_visible() || self.lines.is_empty() {
            return PointerOutcome::ignored();
        }
        match event.kind {
            PointerKind::Move if !skip => {
                let Some(id) = self.test_position(event.position) else {
                    self.clear_highlight();
                    return PointerOutcome::ignored();
                };
                if self.highlighter.current() != Some(id) {
                    self.highlighter.highlight(&mut self.store, id);
                    self.store.request_redraw();
                }
                PointerOutcome::consumed(self.hit(id).into_iter().collect())
            }
            PointerKind::Click => match self.test_position(event.position) {
                Some(id) => PointerOutcome::consumed(self.hit(id).into_iter().collect()),
                None => PointerOutcome::ignored(),
            },
            PointerKind::Out => {
                self.clear_highlight();
                PointerOutcome::ignored()
            }
            _ => PointerOutcome::ignored(),
        }
    }

    fn drain_commands(&mut self) -> RenderFrame {
        self.store.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::{FaultlineConfig, FaultlineModule};
    use crate::geojson::GeoDocument;
    use crate::layer::{FlatView, Layer, PointerEvent, PointerKind};
    use crate::symbology::OUTLINE_COLOR;
    use foundation::math::Vec2;
    use gpu::{LayerId, UniformValue};
    use pretty_assertions::assert_eq;
    use runtime::DebugSink;
    use serde_json::json;

    fn loaded() -> FaultlineModule {
        let doc = GeoDocument::from_geojson_value(&json!([
            { "type": "Feature", "properties": { "label": "F1" },
              "geometry": { "type": "LineString", "coordinates": [[0, 0], [10, 0]] } },
            { "type": "Feature", "properties": { "label": "F2" },
              "geometry": { "type": "Polygon",
                            "coordinates": [[[20, 0], [30, 0], [30, 10], [20, 0]]] } },
            { "type": "Feature", "properties": { "label": "F3" },
              "geometry": { "type": "LineString", "coordinates": [[50, 0]] } }
        ]))
        .unwrap();
        let mut module =
            FaultlineModule::new(LayerId(4), FaultlineConfig::default(), DebugSink::new()).unwrap();
        assert_eq!(module.set(&FlatView::new(1.0, 8.0), &doc.features), 2);
        module
    }

    #[test]
    fn hits_within_distance_only() {
        let module = loaded();
        assert_eq!(module.test_position(Vec2::new(5.0, 0.3)).map(|id| id.index()), Some(0));
        assert_eq!(module.test_position(Vec2::new(5.0, 2.0)), None);
        // Closing edge of the ring, from (30, -10) back to (20, 0).
        assert_eq!(module.test_position(Vec2::new(25.0, -5.0)).map(|id| id.index()), Some(1));
    }

    #[test]
    fn hover_recolors_and_restores() {
        let mut module = loaded();
        let outline = module.lines()[0].meshes[0].outline;
        let before = module.store().uniform(outline, OUTLINE_COLOR);
        let over = PointerEvent::new(Vec2::new(5.0, 0.1), PointerKind::Move);
        assert_eq!(module.handle_pointer(&over).hits[0].label, "F1");
        assert_eq!(
            module.store().uniform(outline, OUTLINE_COLOR),
            Some(UniformValue::Vec3([0.0, 1.0, 1.0]))
        );
        module.handle_pointer(&PointerEvent::new(Vec2::ZERO, PointerKind::Out));
        assert_eq!(module.store().uniform(outline, OUTLINE_COLOR), before);
        assert_eq!(module.highlighted(), None);
    }
}
