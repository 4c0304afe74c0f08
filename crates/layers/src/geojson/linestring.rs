//! Line strings drawn as normal-extruded strokes, hit-tested by distance.

use foundation::ids::FeatureId;
use foundation::math::Vec2;
use geometry::mesh::simple_line;
use gpu::{Geometry, MeshStore, ShaderKind, UniformValue};
use scene::LineDictionary;
use serde_json::{Map, Value};
use tracing::warn;

use super::config::GeoJsonConfig;
use super::document::{GeoFeature, GeoGeometry, project_ring};
use crate::highlight::{MeshEmphasis, MeshHighlighter, PolygonMeshes};
use crate::layer::MapView;
use crate::symbology::{DEFAULT_Z_INDEX, FeatureProps, OUTLINE_WIDTH, outline_uniforms};

#[derive(Debug, Clone, PartialEq)]
pub struct GeoJsonLine {
    pub label: Option<String>,
    pub properties: Map<String, Value>,
    pub mesh: PolygonMeshes,
}

#[derive(Debug)]
pub struct LineStringCollection {
    features: Vec<GeoJsonLine>,
    dict: LineDictionary<usize>,
    highlighter: MeshHighlighter,
    hit_distance: f64,
}

impl LineStringCollection {
    pub fn new(config: &GeoJsonConfig) -> Self {
        Self {
            features: Vec::new(),
            dict: LineDictionary::new(config.hit_cell_size),
            highlighter: MeshHighlighter::new(MeshEmphasis::outline([0.0, 1.0, 1.0])),
            hit_distance: config.line_hit_distance,
        }
    }

    pub fn features(&self) -> &[GeoJsonLine] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Lines start at the style's own width; resizing later applies the
    /// configured curve if there is one.
    pub fn add(
        &mut self,
        store: &mut MeshStore,
        view: &dyn MapView,
        feature: &GeoFeature,
        props: &FeatureProps,
    ) -> bool {
        let GeoGeometry::LineString(points) = &feature.geometry else {
            return false;
        };
        if points.len() < 2 {
            warn!(id = ?feature.id, points = points.len(), "skipping short line string");
            return false;
        }
        let color = match props.style.line_rgb() {
            Ok(color) => color,
            Err(err) => {
                warn!(id = ?feature.id, %err, "skipping line string with invalid style");
                return false;
            }
        };

        let projected = project_ring(view, points);
        let index = self.features.len();
        self.dict.add(&projected, index);
        let outline = store.submit(
            ShaderKind::Outline,
            Geometry::Normals(simple_line(&projected)),
            outline_uniforms(color, props.style.line_width),
            DEFAULT_Z_INDEX,
        );
        let mesh = PolygonMeshes {
            fill: None,
            outline,
        };
        self.highlighter.add(vec![mesh]);
        self.features.push(GeoJsonLine {
            label: props.label.clone(),
            properties: feature.properties.clone(),
            mesh,
        });
        true
    }

    pub fn test_position(&self, position: Vec2) -> Option<FeatureId> {
        self.dict
            .get_closest(position, self.hit_distance)
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

    pub fn set_width(&self, store: &mut MeshStore, width: f64) {
        let value = UniformValue::Float(width as f32);
        for line in &self.features {
            store.set_uniform(line.mesh.outline, OUTLINE_WIDTH, value);
        }
    }

    pub fn clear(&mut self) {
        self.features.clear();
        self.dict.clear();
        self.highlighter.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::LineStringCollection;
    use crate::geojson::{GeoDocument, GeoJsonConfig};
    use crate::layer::FlatView;
    use crate::symbology::{DEFAULT_LINE_WIDTH, FeatureProps, OUTLINE_WIDTH};
    use foundation::math::Vec2;
    use gpu::{LayerId, MeshStore, UniformValue};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn lines_hit_within_threshold_and_skip_short_ones() {
        let doc = GeoDocument::from_geojson_value(&json!([
            { "type": "Feature", "properties": { "name": "pipe" },
              "geometry": { "type": "LineString", "coordinates": [[0, 0], [10, 0], [10, 10]] } },
            { "type": "Feature", "properties": {},
              "geometry": { "type": "LineString", "coordinates": [[20, 0]] } }
        ]))
        .unwrap();
        let mut store = MeshStore::new(LayerId(5));
        let mut lines = LineStringCollection::new(&GeoJsonConfig::default());
        let view = FlatView::new(1.0, 8.0);
        let props = FeatureProps::default();
        assert!(lines.add(&mut store, &view, &doc.features[0], &props));
        assert!(!lines.add(&mut store, &view, &doc.features[1], &props));
        assert_eq!(lines.len(), 1);

        let outline = lines.features()[0].mesh.outline;
        assert_eq!(
            store.uniform(outline, OUTLINE_WIDTH),
            Some(UniformValue::Float(DEFAULT_LINE_WIDTH as f32))
        );

        assert_eq!(lines.test_position(Vec2::new(11.5, -5.0)).map(|id| id.index()), Some(0));
        assert_eq!(lines.test_position(Vec2::new(13.0, -5.0)), None);

        let (hit, changed) = lines.hover(&mut store, Vec2::new(5.0, 0.5));
        assert!(hit.is_some() && changed);
        assert_eq!(lines.hover(&mut store, Vec2::new(5.0, 9.0)), (None, true));
    }
}
