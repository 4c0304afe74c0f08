//! Filled polygons with outlines, hit-tested by triangle containment.
//!
//! One collection holds either `Polygon` or `MultiPolygon` features. Every
//! polygon part becomes a fill mesh plus one outline mesh per ring, and all
//! parts of a feature share one z-index, one hit-test id and one label.

use foundation::ids::FeatureId;
use foundation::math::Vec2;
use geometry::center_of_mass;
use geometry::mesh::{polygon, polygon_outline};
use gpu::{Geometry, MeshStore, ShaderKind, UniformValue};
use scene::TriangleDictionary;
use serde_json::{Map, Value};
use tracing::warn;

use super::config::GeoJsonConfig;
use super::document::{GeoFeature, project_ring};
use crate::colors::hex_rgba;
use crate::highlight::{FillOverride, MeshEmphasis, MeshHighlighter, PolygonMeshes};
use crate::labels::{LabelCandidate, LabelManager, LabelOptions};
use crate::layer::MapView;
use crate::symbology::{
    DEFAULT_Z_INDEX, FILL_HASH_WIDTH, FeatureProps, LabelLocation, OUTLINE_WIDTH, fill_uniforms,
    hash_displacement, outline_uniforms,
};

const HIGHLIGHT_OUTLINE: [f32; 3] = [0.0, 1.0, 1.0];
const FORCED_OUTLINE: [f32; 3] = [0.0, 0.0, 0.0];
const FORCED_FILL: [f32; 3] = [0.0, 1.0, 1.0];

#[derive(Debug, Clone, PartialEq)]
pub struct GeoJsonPolygon {
    pub label: Option<String>,
    pub properties: Map<String, Value>,
    pub meshes: Vec<PolygonMeshes>,
}

#[derive(Debug)]
pub struct PolygonCollection {
    features: Vec<GeoJsonPolygon>,
    dict: TriangleDictionary<usize>,
    highlighter: MeshHighlighter,
    forced: MeshHighlighter,
    labels: LabelManager,
    z_index: i64,
}

impl PolygonCollection {
    pub fn new(config: &GeoJsonConfig) -> Self {
        let forced = MeshEmphasis::outline(FORCED_OUTLINE).with_fill(FillOverride {
            col1: FORCED_FILL,
            col2: FORCED_FILL,
            opacity: Some(1.0),
        });
        Self {
            features: Vec::new(),
            dict: TriangleDictionary::new(config.hit_cell_size),
            highlighter: MeshHighlighter::new(MeshEmphasis::outline(HIGHLIGHT_OUTLINE)),
            forced: MeshHighlighter::new(forced),
            labels: LabelManager::new(LabelOptions {
                base_scale: config.label_base_scale(),
                color: hex_rgba(config.label_color),
                ..LabelOptions::default()
            }),
            z_index: DEFAULT_Z_INDEX,
        }
    }

    pub fn features(&self) -> &[GeoJsonPolygon] {
        &self.features
    }

    pub fn labels(&self) -> &LabelManager {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Draws one feature. Returns false if no part could be triangulated or
    /// the style colors are invalid.
    pub fn add(
        &mut self,
        store: &mut MeshStore,
        view: &dyn MapView,
        feature: &GeoFeature,
        props: &FeatureProps,
        outline_width: f64,
        hash_width: f64,
    ) -> bool {
        let (line, fill_style) = match (props.style.line_rgb(), props.style.fill()) {
            (Ok(line), Ok(fill)) => (line, fill),
            (Err(err), _) | (_, Err(err)) => {
                warn!(id = ?feature.id, %err, "skipping polygon with invalid style");
                return false;
            }
        };
        if let Some(scale) = props.style.label_scale {
            self.labels.set_base_scale(scale);
        }

        let index = self.features.len();
        let mut dict_id = None;
        let mut meshes = Vec::new();
        let mut candidates = Vec::new();
        for rings in feature.geometry.polygons() {
            let projected: Vec<Vec<Vec2>> =
                rings.iter().map(|ring| project_ring(view, ring)).collect();
            let fill = match polygon(&projected) {
                Ok(mesh) => mesh,
                Err(err) => {
                    warn!(id = ?feature.id, %err, "skipping polygon part");
                    continue;
                }
            };
            let id = *dict_id.get_or_insert_with(|| self.dict.insert(index));
            let points: Vec<Vec2> = (0..fill.vertex_count()).map(|i| fill.vertex(i)).collect();
            self.dict.add_triangles(id, &points, &fill.triangles);
            if let Some((position, mass)) = center_of_mass(&fill) {
                candidates.push(LabelCandidate::new(position, mass));
            }

            let fill_handle = store.submit(
                ShaderKind::Fill,
                Geometry::Plain(fill),
                fill_uniforms(&fill_style, hash_displacement(index as u32), hash_width as f32),
                self.z_index,
            );
            for (ring_index, ring) in projected.iter().enumerate() {
                if ring.len() < 3 {
                    continue;
                }
                let outline = store.submit(
                    ShaderKind::Outline,
                    Geometry::Normals(polygon_outline(ring)),
                    outline_uniforms(line, outline_width),
                    self.z_index,
                );
                // Holes share the fill of their outer ring.
                meshes.push(PolygonMeshes {
                    fill: (ring_index == 0).then_some(fill_handle),
                    outline,
                });
            }
        }
        if meshes.is_empty() {
            return false;
        }
        self.z_index += 1;

        if let Some(label) = &props.label {
            let location =
                LabelLocation::from_properties(&feature.properties).merged(props.label_location());
            self.labels.add_label(label.clone(), candidates, location);
        }
        self.highlighter.add(meshes.clone());
        self.forced.add(meshes.clone());
        self.features.push(GeoJsonPolygon {
            label: props.label.clone(),
            properties: feature.properties.clone(),
            meshes,
        });
        true
    }

    pub fn test_position(&self, position: Vec2) -> Option<FeatureId> {
        self.dict
            .get_polygon_at(position)
            .map(|hit| FeatureId::from_index(*hit.value))
    }

    pub fn highlighted(&self) -> Option<FeatureId> {
        self.highlighter.current()
    }

    pub fn forced(&self) -> Option<FeatureId> {
        self.forced.current()
    }

    /// Hover highlight of the polygon under `position`, reverting any other.
    /// Returns the hit and whether render state changed.
    pub fn hover(&mut self, store: &mut MeshStore, position: Vec2) -> (Option<FeatureId>, bool) {
        match self.test_position(position) {
            Some(id) if self.highlighter.current() == Some(id) => (Some(id), false),
            Some(id) => (Some(id), self.highlighter.highlight(store, id)),
            None => (None, self.highlighter.revert(store)),
        }
    }

    pub fn revert_hover(&mut self, store: &mut MeshStore) -> bool {
        self.highlighter.revert(store)
    }

    /// Highlights `id` with a solid fill, dropping the hover highlight first.
    pub fn force_highlight_on(&mut self, store: &mut MeshStore, id: FeatureId) -> bool {
        if id.index() >= self.features.len() {
            return false;
        }
        self.highlighter.revert(store);
        self.forced.highlight(store, id)
    }

    pub fn force_highlight_off(&mut self, store: &mut MeshStore) -> bool {
        self.forced.revert(store)
    }

    /// Index of the first feature whose `key` property equals `value`.
    pub fn find_by_property(&self, key: &str, value: &Value) -> Option<FeatureId> {
        self.features
            .iter()
            .position(|f| f.properties.get(key) == Some(value))
            .map(FeatureId::from_index)
    }

    pub fn set_outline_width(&self, store: &mut MeshStore, width: f64) {
        let value = UniformValue::Float(width as f32);
        for part in self.features.iter().flat_map(|f| &f.meshes) {
            store.set_uniform(part.outline, OUTLINE_WIDTH, value);
        }
    }

    pub fn set_hash_width(&self, store: &mut MeshStore, width: f64) {
        let value = UniformValue::Float(width as f32);
        for fill in self.features.iter().flat_map(|f| &f.meshes).filter_map(|p| p.fill) {
            store.set_uniform(fill, FILL_HASH_WIDTH, value);
        }
    }

    pub fn draw_labels(&mut self, store: &mut MeshStore, view: &dyn MapView, scale: f64) {
        self.labels.draw(store, view, scale);
    }

    pub fn resize_labels(&mut self, store: &mut MeshStore, scale: f64) {
        self.labels.resize(store, scale);
    }

    pub fn show_labels(&mut self, store: &mut MeshStore) {
        self.labels.show_labels(store);
    }

    pub fn hide_labels(&mut self, store: &mut MeshStore) {
        self.labels.hide_labels(store);
    }

    /// Forgets every feature. Meshes are removed by the owner's store clear;
    /// labels are removed here.
    pub fn clear(&mut self, store: &mut MeshStore) {
        self.labels.clear(store);
        self.features.clear();
        self.dict.clear();
        self.highlighter.clear();
        self.forced.clear();
        self.z_index = DEFAULT_Z_INDEX;
    }
}
