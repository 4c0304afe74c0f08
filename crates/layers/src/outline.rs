//! License and block boundaries: polygon outlines without fill, hit-tested
//! against the triangulated interior.

use foundation::ids::FeatureId;
use foundation::math::Vec2;
use geometry::mesh::{polygon, polygon_outline};
use gpu::{Geometry, LayerId, MeshStore, RenderFrame, ShaderKind, UniformValue};
use runtime::DebugSink;
use scene::TriangleDictionary;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::colors::{ColorError, Rgb, parse_rgb};
use crate::geojson::{GeoFeature, project_ring};
use crate::highlight::{MeshEmphasis, MeshHighlighter, PolygonMeshes};
use crate::layer::{
    DragState, FeatureHit, Layer, MapView, PointerEvent, PointerKind, PointerOutcome,
};
use crate::resize::{ResizeConfig, ZoomScale};
use crate::symbology::{DEFAULT_Z_INDEX, OUTLINE_WIDTH, outline_uniforms};

pub const OUTLINES: &str = "outlines";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutlineConfig {
    pub line_color: String,
    pub highlight_color: String,
    pub outline_resize: ResizeConfig,
    pub hit_cell_size: f64,
    /// Property used as the hit label.
    pub label_key: String,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            line_color: "#000000".to_string(),
            highlight_color: "#00ffff".to_string(),
            outline_resize: ResizeConfig::new(ZoomScale::new(7.0, 0.8), ZoomScale::new(17.0, 0.05)),
            hit_cell_size: 1.2,
            label_key: "label".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutlineFeature {
    pub label: String,
    pub properties: Map<String, Value>,
    pub meshes: Vec<PolygonMeshes>,
}

pub struct OutlineModule {
    config: OutlineConfig,
    color: Rgb,
    store: MeshStore,
    debug: DebugSink,
    features: Vec<OutlineFeature>,
    dict: TriangleDictionary<usize>,
    highlighter: MeshHighlighter,
    drag: DragState,
    zoom: Option<f64>,
}

impl OutlineModule {
    pub fn new(layer: LayerId, config: OutlineConfig, debug: DebugSink) -> Result<Self, ColorError> {
        let color = parse_rgb(&config.line_color)?;
        let highlight = parse_rgb(&config.highlight_color)?;
        Ok(Self {
            color,
            store: MeshStore::new(layer),
            debug,
            features: Vec::new(),
            dict: TriangleDictionary::new(config.hit_cell_size),
            highlighter: MeshHighlighter::new(MeshEmphasis::outline(highlight)),
            drag: DragState::default(),
            zoom: None,
            config,
        })
    }

    pub fn store(&self) -> &MeshStore {
        &self.store
    }

    pub fn features(&self) -> &[OutlineFeature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    fn outline_radius(&self) -> f64 {
        let resize = &self.config.outline_resize;
        self.zoom.map_or(resize.min.scale, |z| resize.radius(z))
    }

    /// Replaces every outline. Non-polygonal or degenerate features are
    /// skipped. Returns how many features were drawn.
    pub fn set(&mut self, view: &dyn MapView, features: &[GeoFeature]) -> usize {
        self.clear();
        let width = self.outline_radius();
        let mut skipped = 0usize;

        for (index, feature) in features.iter().enumerate() {
            let mut meshes = Vec::new();
            let feature_index = self.features.len();
            let mut dict_id = None;
            for rings in feature.geometry.polygons() {
                let projected: Vec<Vec<Vec2>> =
                    rings.iter().map(|ring| project_ring(view, ring)).collect();
                let interior = match polygon(&projected) {
                    Ok(mesh) => mesh,
                    Err(err) => {
                        warn!(index, %err, "skipping outline part");
                        continue;
                    }
                };
                let id = *dict_id.get_or_insert_with(|| self.dict.insert(feature_index));
                let points: Vec<Vec2> =
                    (0..interior.vertex_count()).map(|i| interior.vertex(i)).collect();
                self.dict.add_triangles(id, &points, &interior.triangles);

                for ring in projected.iter().filter(|r| r.len() >= 3) {
                    let handle = self.store.submit(
                        ShaderKind::Outline,
                        Geometry::Normals(polygon_outline(ring)),
                        outline_uniforms(self.color, width),
                        DEFAULT_Z_INDEX + feature_index as i64,
                    );
                    meshes.push(PolygonMeshes {
                        fill: None,
                        outline: handle,
                    });
                }
            }
            if meshes.is_empty() {
                skipped += 1;
                continue;
            }
            let label = feature
                .property_str(&self.config.label_key)
                .map(str::to_string)
                .or_else(|| feature.id.clone())
                .unwrap_or_default();
            self.highlighter.add(meshes.clone());
            self.features.push(OutlineFeature {
                label,
                properties: feature.properties.clone(),
                meshes,
            });
        }
        self.store.request_redraw();

        let count = self.features.len();
        debug!(outlines = count, skipped, "outlines set");
        self.debug.emit(OUTLINES, "set", format!("{count} outlines added"));
        count
    }

    pub fn test_position(&self, position: Vec2) -> Option<FeatureId> {
        self.dict
            .get_polygon_at(position)
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
        let feature = self.features.get(id.index())?;
        let mut hit = FeatureHit::new(OUTLINES, id, feature.label.clone());
        hit.properties = feature.properties.clone();
        Some(hit)
    }
}

impl Layer for OutlineModule {
    fn name(&self) -> &'static str {
        OUTLINES
    }

    fn id(&self) -> LayerId {
        self.store.layer()
    }

    fn clear(&mut self) {
        self.store.clear();
        self.features.clear();
        self.dict.clear();
        self.highlighter.clear();
    }

    fn resize(&mut self, zoom: f64) {
        self.zoom = Some(zoom);
        if self.features.is_empty() {
            return;
        }
        let width = self.outline_radius();
        for part in self.features.iter().flat_map(|f| &f.meshes) {
            self.store
                .set_uniform(part.outline, OUTLINE_WIDTH, UniformValue::Float(width as f32));
        }
        trace!(zoom, width, "outline resize");
    }

    fn is_visible(&self) -> bool {
        self.store.is_layer_visible()
    }

    fn set_visibility(&mut self, visible: bool) -> bool {
        self.store.set_layer_visible(visible)
    }

    fn handle_pointer(&mut self, event: &PointerEvent) -> PointerOutcome {
        let skip = self.drag.track(event.kind);
        if !self.is_visible() || self.features.is_empty() {
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
