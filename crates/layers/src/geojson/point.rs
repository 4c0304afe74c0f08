//! Point markers drawn above every other feature.

use foundation::ids::FeatureId;
use foundation::math::Vec2;
use geometry::mesh::{Marker, marker};
use gpu::{Geometry, MeshStore, ShaderKind, Uniforms};
use scene::PointDictionary;
use serde_json::{Map, Value};
use tracing::warn;

use super::config::GeoJsonConfig;
use super::document::{GeoFeature, GeoGeometry};
use crate::highlight::{GraphicsHighlighter, HIGHLIGHT_CYAN, PointGraphic};
use crate::layer::MapView;
use crate::symbology::{FeatureProps, POINT_Z_INDEX};

#[derive(Debug, Clone, PartialEq)]
pub struct GeoJsonPoint {
    pub label: Option<String>,
    pub properties: Map<String, Value>,
    pub position: Vec2,
}

#[derive(Debug)]
pub struct PointCollection {
    features: Vec<GeoJsonPoint>,
    dict: PointDictionary<usize>,
    highlighter: GraphicsHighlighter,
    hit_distance: f64,
}

impl PointCollection {
    pub fn new(config: &GeoJsonConfig) -> Self {
        let grid = config.point_grid;
        Self {
            features: Vec::new(),
            dict: PointDictionary::new(grid.min_cell, grid.max_cell, grid.tiers),
            highlighter: GraphicsHighlighter::new(HIGHLIGHT_CYAN),
            hit_distance: config.point_hit_distance,
        }
    }

    pub fn features(&self) -> &[GeoJsonPoint] {
        &self.features
    }

    pub fn graphic(&self, id: FeatureId) -> Option<&PointGraphic> {
        self.highlighter.get(id)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn add(
        &mut self,
        store: &mut MeshStore,
        view: &dyn MapView,
        feature: &GeoFeature,
        props: &FeatureProps,
    ) -> bool {
        let GeoGeometry::Point(point) = &feature.geometry else {
            return false;
        };
        let paint = match props.style.marker_paint(None) {
            Ok(paint) => paint,
            Err(err) => {
                warn!(id = ?feature.id, %err, "skipping point with invalid style");
                return false;
            }
        };

        let position = point.project(view);
        let handle = match marker(position, &props.style.shape(), &paint) {
            Marker::Geometry(mesh) => store.submit(
                ShaderKind::Marker,
                Geometry::Colored(mesh),
                Uniforms::new(),
                POINT_Z_INDEX,
            ),
            Marker::Sprite(sprite) => store.submit_sprite(sprite, POINT_Z_INDEX),
        };
        let index = self.features.len();
        self.dict.add(position, index);
        self.highlighter.add(PointGraphic {
            handle,
            center: position,
            style: props.style.clone(),
        });
        self.features.push(GeoJsonPoint {
            label: props.label.clone(),
            properties: feature.properties.clone(),
            position,
        });
        true
    }

    pub fn test_position(&self, position: Vec2) -> Option<FeatureId> {
        self.dict
            .get_closest_under(position, self.hit_distance)
            .map(|hit| FeatureId::from_index(*hit.value))
    }

    pub fn highlighted(&self) -> Option<FeatureId> {
        self.highlighter.current()
    }

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

    /// Sprite outlines scale with the zoom, so an active highlight is redone.
    pub fn resize(&mut self, store: &mut MeshStore, zoom: f64) -> bool {
        self.highlighter.resize(store, zoom)
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.highlighter.set_zoom(zoom);
    }

    pub fn clear(&mut self) {
        self.features.clear();
        self.dict.clear();
        self.highlighter.clear();
    }
}
