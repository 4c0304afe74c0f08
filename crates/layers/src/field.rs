//! Discovery and field polygons filled by hydrocarbon type, with one label
//! per field placed on its heaviest part.

use foundation::ids::FeatureId;
use foundation::math::Vec2;
use geometry::mesh::{polygon, polygon_outline};
use geometry::center_of_mass;
use gpu::{Geometry, LayerId, MeshStore, RenderFrame, ShaderKind, UniformValue};
use runtime::DebugSink;
use scene::TriangleDictionary;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use crate::colors::{Rgb, hex_rgba};
use crate::geojson::{GeoFeature, LngLat, project_ring};
use crate::highlight::{FillOverride, MeshEmphasis, MeshHighlighter, PolygonMeshes};
use crate::labels::{LabelCandidate, LabelManager, LabelOptions};
use crate::layer::{
    DragState, FeatureHit, Layer, MapView, PointerEvent, PointerKind, PointerOutcome,
};
use crate::resize::{LabelResizeConfig, ResizeConfig, ZoomScale};
use crate::symbology::{
    FILL_HASH_WIDTH, FillStyle, LabelLocation, OUTLINE_WIDTH, fill_uniforms, hash_displacement,
    outline_uniforms,
};

pub const FIELDS: &str = "fields";

const RED: Rgb = [0.8, 0.0, 0.0];
const GREEN: Rgb = [0.133, 0.6, 0.133];
const PINK: Rgb = [1.0, 0.753, 0.796];
const GRAY: Rgb = [0.6, 0.6, 0.6];
const OUTLINE_RED: Rgb = [0.6, 0.0, 0.0];
const OUTLINE_GRAY: Rgb = [0.5, 0.5, 0.5];

const HIGHLIGHT_FILL1: Rgb = [0.75, 0.36, 0.42];
const HIGHLIGHT_FILL2: Rgb = [0.42, 0.69, 0.44];
const HIGHLIGHT_OUTLINE: Rgb = [0.0, 1.0, 1.0];
const LABEL_COLOR: u32 = 0x454545;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldConfig {
    /// Hash stripe width, clamped to `[min_hash, max_hash]`.
    pub initial_hash: f64,
    pub min_hash: f64,
    pub max_hash: Option<f64>,
    pub outline_resize: ResizeConfig,
    pub label_resize: LabelResizeConfig,
    pub labels_visible: bool,
    /// Bucket size of the hit-test grid, projected units.
    pub hit_cell_size: f64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            initial_hash: 1.0,
            min_hash: 0.0,
            max_hash: None,
            outline_resize: ResizeConfig::new(ZoomScale::new(7.0, 0.8), ZoomScale::new(17.0, 0.05)),
            label_resize: LabelResizeConfig {
                min: ZoomScale::new(11.0, 0.1),
                max: ZoomScale::new(17.0, 0.025),
                base_scale: 0.15,
                threshold: None,
            },
            labels_visible: true,
            hit_cell_size: 1.2,
        }
    }
}

impl FieldConfig {
    pub fn hash_width(&self) -> f64 {
        let width = self.initial_hash.max(self.min_hash);
        self.max_hash.map_or(width, |max| width.min(max))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HydrocarbonType {
    Oil,
    Gas,
    GasCondensate,
    OilGas,
    Other,
}

impl HydrocarbonType {
    pub fn parse(code: Option<&str>) -> Self {
        match code.map(str::trim) {
            Some("OIL") => HydrocarbonType::Oil,
            Some("GAS") => HydrocarbonType::Gas,
            Some("GAS/CONDENSATE") => HydrocarbonType::GasCondensate,
            Some("OIL/GAS") => HydrocarbonType::OilGas,
            _ => HydrocarbonType::Other,
        }
    }

    pub fn style(self) -> FieldStyle {
        let solid = |fill: Rgb, outline: Rgb| FieldStyle {
            fill: FillStyle {
                col1: fill,
                col2: fill,
                opacity: 0.6,
                hashed: false,
            },
            outline,
        };
        match self {
            HydrocarbonType::Oil => solid(GREEN, GREEN),
            HydrocarbonType::Gas => solid(RED, OUTLINE_RED),
            HydrocarbonType::GasCondensate => FieldStyle {
                fill: FillStyle {
                    col1: PINK,
                    col2: RED,
                    opacity: 0.6,
                    hashed: true,
                },
                outline: OUTLINE_RED,
            },
            HydrocarbonType::OilGas => FieldStyle {
                fill: FillStyle {
                    col1: RED,
                    col2: GREEN,
                    opacity: 0.6,
                    hashed: true,
                },
                outline: OUTLINE_GRAY,
            },
            HydrocarbonType::Other => FieldStyle {
                fill: FillStyle {
                    col1: GRAY,
                    col2: GRAY,
                    opacity: 0.15,
                    hashed: false,
                },
                outline: OUTLINE_GRAY,
            },
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FieldStyle {
    pub fill: FillStyle,
    pub outline: Rgb,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DiscoveryProps {
    label: Option<String>,
    dsc_name: Option<String>,
    fld_name: Option<String>,
    wlb_name: Option<String>,
    dsc_hc_type: Option<String>,
    #[serde(alias = "hctype")]
    hc_type: Option<String>,
}

/// One field after grouping: every polygon that shares its name.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessedField {
    pub key: String,
    pub label: String,
    pub hc_type: HydrocarbonType,
    /// Properties of the first feature of the group.
    pub properties: Map<String, Value>,
    /// Outer ring plus holes, per part.
    pub parts: Vec<Vec<Vec<LngLat>>>,
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Display name: the field name when known, otherwise the discovery name
/// without its wellbore prefix.
fn display_label(props: &DiscoveryProps, key: &str) -> String {
    if let Some(field) = props.fld_name.as_deref() {
        return capitalize(field);
    }
    let Some(discovery) = props.dsc_name.as_deref() else {
        return key.to_string();
    };
    match props.wlb_name.as_deref() {
        Some(wellbore) if wellbore != discovery => discovery
            .replace(wellbore, "")
            .replace(['(', ')'], "")
            .trim()
            .to_string(),
        _ => discovery.to_string(),
    }
}

/// Groups polygon features by discovery name (falling back to `label`),
/// keeping first-seen order. Features with empty or non-polygonal geometry
/// and features without a name are skipped.
pub fn preprocess_fields(features: &[GeoFeature]) -> Vec<PreprocessedField> {
    let mut out: Vec<PreprocessedField> = Vec::new();
    for (index, feature) in features.iter().enumerate() {
        if feature.geometry.is_empty() {
            continue;
        }
        let polygons = feature.geometry.polygons();
        if polygons.is_empty() {
            warn!(index, kind = feature.geometry.kind(), "field geometry is not polygonal");
            continue;
        }
        let props: DiscoveryProps =
            serde_json::from_value(Value::Object(feature.properties.clone())).unwrap_or_default();
        let Some(key) = props.dsc_name.clone().or_else(|| props.label.clone()) else {
            warn!(index, "field without a name");
            continue;
        };
        let parts = polygons
            .into_iter()
            .filter(|rings| rings.first().is_some_and(|outer| !outer.is_empty()))
            .map(<[Vec<LngLat>]>::to_vec);

        if let Some(existing) = out.iter_mut().find(|f| f.key == key) {
            existing.parts.extend(parts);
            continue;
        }
        let hc = props.dsc_hc_type.as_deref().or(props.hc_type.as_deref());
        out.push(PreprocessedField {
            label: display_label(&props, &key),
            hc_type: HydrocarbonType::parse(hc),
            properties: feature.properties.clone(),
            parts: parts.collect(),
            key,
        });
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldFeature {
    pub key: String,
    pub label: String,
    pub hc_type: HydrocarbonType,
    pub properties: Map<String, Value>,
    pub meshes: Vec<PolygonMeshes>,
}

pub struct FieldModule {
    config: FieldConfig,
    store: MeshStore,
    debug: DebugSink,
    fields: Vec<FieldFeature>,
    dict: TriangleDictionary<usize>,
    highlighter: MeshHighlighter,
    labels: LabelManager,
    labels_visible: bool,
    drag: DragState,
    zoom: Option<f64>,
}

impl FieldModule {
    pub fn new(layer: LayerId, config: FieldConfig, debug: DebugSink) -> Self {
        let labels = LabelManager::new(label_options(&config));
        Self {
            store: MeshStore::new(layer),
            debug,
            fields: Vec::new(),
            dict: TriangleDictionary::new(config.hit_cell_size),
            highlighter: MeshHighlighter::new(highlight_emphasis()),
            labels,
            labels_visible: config.labels_visible,
            drag: DragState::default(),
            zoom: None,
            config,
        }
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn store(&self) -> &MeshStore {
        &self.store
    }

    pub fn fields(&self) -> &[FieldFeature] {
        &self.fields
    }

    pub fn labels(&self) -> &LabelManager {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn outline_radius(&self) -> f64 {
        let resize = &self.config.outline_resize;
        self.zoom.map_or(resize.min.scale, |z| resize.radius(z))
    }

    fn label_scale(&self) -> f64 {
        let resize = &self.config.label_resize;
        self.zoom.map_or(resize.min.scale, |z| resize.radius(z))
    }

    /// Replaces every field. Returns how many fields were drawn.
    pub fn set(&mut self, view: &dyn MapView, features: &[GeoFeature]) -> usize {
        self.clear();
        let preprocessed = preprocess_fields(features);
        let hash_width = self.config.hash_width() as f32;
        let outline_width = self.outline_radius();
        let mut z_index = 0;
        let mut seed = 0u32;
        let mut skipped_parts = 0usize;
        let mut skipped = 0usize;

        for field in preprocessed {
            let style = field.hc_type.style();
            let index = self.fields.len();
            let mut dict_id = None;
            let mut meshes = Vec::with_capacity(field.parts.len());
            let mut candidates = Vec::with_capacity(field.parts.len());

            for rings in &field.parts {
                let projected: Vec<Vec<Vec2>> =
                    rings.iter().map(|ring| project_ring(view, ring)).collect();
                let fill = match polygon(&projected) {
                    Ok(mesh) => mesh,
                    Err(err) => {
                        warn!(field = %field.key, %err, "skipping field part");
                        skipped_parts += 1;
                        continue;
                    }
                };
                let id = *dict_id.get_or_insert_with(|| self.dict.insert(index));
                let points: Vec<Vec2> = (0..fill.vertex_count()).map(|i| fill.vertex(i)).collect();
                self.dict.add_triangles(id, &points, &fill.triangles);
                if let Some((position, mass)) = center_of_mass(&fill) {
                    candidates.push(LabelCandidate::new(position, mass));
                }

                let outline = polygon_outline(&projected[0]);
                let fill_handle = self.store.submit(
                    ShaderKind::Fill,
                    Geometry::Plain(fill),
                    fill_uniforms(&style.fill, hash_displacement(seed), hash_width),
                    z_index,
                );
                let outline_handle = self.store.submit(
                    ShaderKind::Outline,
                    Geometry::Normals(outline),
                    outline_uniforms(style.outline, outline_width),
                    z_index + 1,
                );
                meshes.push(PolygonMeshes {
                    fill: Some(fill_handle),
                    outline: outline_handle,
                });
                z_index += 2;
                seed += 1;
            }
            if meshes.is_empty() {
                warn!(field = %field.key, "skipping field without a drawable part");
                skipped += 1;
                continue;
            }

            self.labels.add_label(
                field.label.clone(),
                candidates,
                LabelLocation::from_properties(&field.properties),
            );
            self.highlighter.add(meshes.clone());
            self.fields.push(FieldFeature {
                key: field.key,
                label: field.label,
                hc_type: field.hc_type,
                properties: field.properties,
                meshes,
            });
        }

        if self.labels_visible {
            self.draw_labels(view);
        }
        self.store.request_redraw();

        let count = self.fields.len();
        debug!(fields = count, skipped, skipped_parts, "fields set");
        self.debug.emit(FIELDS, "set", format!("{count} fields added"));
        self.debug.count(FIELDS, "plotted", count as u64);
        count
    }

    fn draw_labels(&mut self, view: &dyn MapView) {
        let scale = self.label_scale();
        self.labels.draw(&mut self.store, view, scale);
        if self.zoom.is_some_and(|z| self.config.label_resize.hides_at(z)) {
            self.labels.hide_labels(&mut self.store);
        }
    }

    pub fn labels_visible(&self) -> bool {
        self.labels_visible
    }

    pub fn show_labels(&mut self, view: &dyn MapView) {
        self.labels_visible = true;
        if !self.labels.is_drawn() {
            self.draw_labels(view);
        } else {
            self.labels.show_labels(&mut self.store);
        }
        self.store.request_redraw();
    }

    pub fn hide_labels(&mut self) {
        self.labels_visible = false;
        self.labels.hide_labels(&mut self.store);
        self.store.request_redraw();
    }

    /// Field under a projected position.
    pub fn test_position(&self, position: Vec2) -> Option<FeatureId> {
        self.dict
            .get_polygon_at(position)
            .map(|hit| FeatureId::from_index(*hit.value))
    }

    pub fn highlighted(&self) -> Option<FeatureId> {
        self.highlighter.current()
    }

    /// Highlights the field under `position`. Returns true if a field is
    /// under it.
    pub fn highlight_at(&mut self, position: Vec2) -> bool {
        let Some(id) = self.test_position(position) else {
            self.clear_highlight();
            return false;
        };
        if self.highlighter.current() != Some(id) {
            self.highlighter.highlight(&mut self.store, id);
            self.store.request_redraw();
        }
        true
    }

    pub fn clear_highlight(&mut self) -> bool {
        if !self.highlighter.revert(&mut self.store) {
            return false;
        }
        self.store.request_redraw();
        true
    }

    /// Sets the hash stripe width of every fill, clamped to the configured
    /// range. Returns the applied width.
    pub fn set_hash_width(&mut self, width: f64) -> f64 {
        self.config.initial_hash = width;
        let width = self.config.hash_width();
        let value = UniformValue::Float(width as f32);
        for part in self.fields.iter().flat_map(|f| &f.meshes) {
            if let Some(fill) = part.fill {
                self.store.set_uniform(fill, FILL_HASH_WIDTH, value);
            }
        }
        self.store.request_redraw();
        width
    }

    fn hit(&self, id: FeatureId) -> Option<FeatureHit> {
        let field = self.fields.get(id.index())?;
        let mut hit = FeatureHit::new(FIELDS, id, field.label.clone());
        hit.properties = field.properties.clone();
        Some(hit)
    }
}

fn label_options(config: &FieldConfig) -> LabelOptions {
    LabelOptions {
        base_scale: config.label_resize.base_scale,
        color: hex_rgba(LABEL_COLOR),
        ..LabelOptions::default()
    }
}

fn highlight_emphasis() -> MeshEmphasis {
    MeshEmphasis::outline(HIGHLIGHT_OUTLINE).with_fill(FillOverride {
        col1: HIGHLIGHT_FILL1,
        col2: HIGHLIGHT_FILL2,
        opacity: None,
    })
}

impl Layer for FieldModule {
    fn name(&self) -> &'static str {
        FIELDS
    }

    fn id(&self) -> LayerId {
        self.store.layer()
    }

    fn clear(&mut self) {
        self.labels.clear(&mut self.store);
        self.store.clear();
        self.fields.clear();
        self.dict.clear();
        self.highlighter.clear();
    }

    fn resize(&mut self, zoom: f64) {
        self.zoom = Some(zoom);
        if self.fields.is_empty() {
            return;
        }
        let width = UniformValue::Float(self.outline_radius() as f32);
        for field in &self.fields {
            for part in &field.meshes {
                self.store.set_uniform(part.outline, OUTLINE_WIDTH, width);
            }
        }
        if self.labels_visible && self.labels.is_drawn() {
            if self.config.label_resize.hides_at(zoom) {
                self.labels.hide_labels(&mut self.store);
            } else {
                if !self.labels.is_visible() {
                    self.labels.show_labels(&mut self.store);
                }
                let scale = self.label_scale();
                self.labels.resize(&mut self.store, scale);
            }
        }
        trace!(zoom, outline_width = ?width, "field resize");
    }

    fn is_visible(&self) -> bool {
        self.store.is_layer_visible()
    }

    fn set_visibility(&mut self, visible: bool) -> bool {
        self.store.set_layer_visible(visible)
    }

    fn handle_pointer(&mut self, event: &PointerEvent) -> PointerOutcome {
        let skip = self.drag.track(event.kind);
        if !self.is_visible() || self.fields.is_empty() {
            return PointerOutcome::ignored();
        }
        match event.kind {
            PointerKind::Move if !skip => {
                if !self.highlight_at(event.position) {
                    return PointerOutcome::ignored();
                }
                let hits = self.highlighted().and_then(|id| self.hit(id));
                PointerOutcome::consumed(hits.into_iter().collect())
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
    use super::{FIELDS, FieldConfig, FieldModule, HydrocarbonType, preprocess_fields};
    use crate::geojson::GeoDocument;
    use crate::layer::{FlatView, Layer, PointerEvent, PointerKind};
    use crate::symbology::{
        FILL_COLOR1, FILL_HASH_WIDTH, FILL_HASHED, OUTLINE_COLOR, OUTLINE_WIDTH,
    };
    use foundation::math::Vec2;
    use gpu::{LayerId, UniformValue};
    use pretty_assertions::assert_eq;
    use runtime::DebugSink;
    use serde_json::{Value, json};

    fn square(x: f64, y: f64, size: f64) -> Value {
        json!([[[x, y], [x + size, y], [x + size, y + size], [x, y + size], [x, y]]])
    }

    fn features() -> GeoDocument {
        GeoDocument::from_geojson_value(&json!([
            { "type": "Feature",
              "properties": { "dscName": "31/2-1 Troll", "fldName": "TROLL", "dscHcType": "GAS" },
              "geometry": { "type": "Polygon", "coordinates": square(0.0, 0.0, 1.0) } },
            { "type": "Feature",
              "properties": { "dscName": "31/2-1 Troll", "dscHcType": "GAS" },
              "geometry": { "type": "MultiPolygon",
                            "coordinates": [square(2.0, 0.0, 2.0)] } },
            { "type": "Feature",
              "properties": { "dscName": "25/8-4 (Grane)", "wlbName": "25/8-4", "dscHcType": "OIL/GAS" },
              "geometry": { "type": "Polygon", "coordinates": square(0.0, 5.0, 1.0) } },
            { "type": "Feature",
              "properties": { "dscName": "Empty" },
              "geometry": { "type": "Polygon", "coordinates": [] } }
        ]))
        .unwrap()
    }

    fn loaded() -> (FieldModule, DebugSink) {
        let debug = DebugSink::new();
        let mut module = FieldModule::new(LayerId(2), FieldConfig::default(), debug.clone());
        let doc = features();
        assert_eq!(module.set(&FlatView::new(1.0, 12.0), &doc.features), 2);
        (module, debug)
    }

    #[test]
    fn hydrocarbon_styles() {
        let gas = HydrocarbonType::parse(Some("GAS")).style();
        assert_eq!(gas.fill.col1, [0.8, 0.0, 0.0]);
        assert!(!gas.fill.hashed);
        let mixed = HydrocarbonType::parse(Some("GAS/CONDENSATE")).style();
        assert!(mixed.fill.hashed);
        assert_eq!(mixed.fill.col1, [1.0, 0.753, 0.796]);
        let other = HydrocarbonType::parse(None).style();
        assert_eq!(other.fill.opacity, 0.15);
    }

    #[test]
    fn parts_are_grouped_by_discovery_name() {
        let fields = preprocess_fields(&features().features);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].label, "Troll");
        assert_eq!(fields[0].parts.len(), 2);
        assert_eq!(fields[0].hc_type, HydrocarbonType::Gas);
        assert_eq!(fields[1].label, "Grane");
        assert_eq!(fields[1].hc_type, HydrocarbonType::OilGas);
    }

    #[test]
    fn set_submits_fill_and_outline_per_part() {
        let (module, debug) = loaded();
        assert_eq!(module.store().mesh_count(), 6);
        let troll = &module.fields()[0];
        let [first, second] = troll.meshes.as_slice() else {
            panic!("expected two parts");
        };
        let fill = first.fill.unwrap();
        assert_eq!(module.store().z_index(fill), Some(0));
        assert_eq!(module.store().z_index(first.outline), Some(1));
        assert_eq!(module.store().z_index(second.outline), Some(3));
        assert_eq!(module.labels().len(), 2);
        assert_eq!(module.store().text_count(), 2);
        assert_eq!(debug.metrics().counter(FIELDS, "plotted"), 2);

        let grane = module.fields()[1].meshes[0].fill.unwrap();
        assert_eq!(
            module.store().uniform(grane, FILL_HASHED),
            Some(UniformValue::Bool(true))
        );
    }

    #[test]
    fn fields_without_a_drawable_part_are_dropped() {
        let debug = DebugSink::new();
        let mut module = FieldModule::new(LayerId(2), FieldConfig::default(), debug.clone());
        let doc = GeoDocument::from_geojson_value(&json!([
            { "type": "Feature",
              "properties": { "dscName": "Sliver" },
              "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [0, 0]]] } },
            { "type": "Feature",
              "properties": { "dscName": "Block" },
              "geometry": { "type": "Polygon", "coordinates": square(5.0, 5.0, 1.0) } }
        ]))
        .unwrap();
        let view = FlatView::new(1.0, 12.0);

        assert_eq!(module.set(&view, &doc.features[..1]), 0);
        assert!(module.is_empty());
        assert_eq!(module.store().mesh_count(), 0);
        assert_eq!(module.labels().len(), 0);
        assert_eq!(module.test_position(Vec2::new(0.2, -0.1)), None);

        assert_eq!(module.set(&view, &doc.features), 1);
        assert_eq!(module.fields()[0].label, "Block");
        assert_eq!(
            module.test_position(Vec2::new(5.5, -5.5)).map(|id| id.index()),
            Some(0)
        );
        assert_eq!(debug.metrics().counter(FIELDS, "plotted"), 1);
    }

    #[test]
    fn hover_highlights_the_whole_field() {
        let (mut module, _) = loaded();
        // Second Troll part, projected y is negated latitude.
        let inside = Vec2::new(3.0, -1.0);
        let outcome = module.handle_pointer(&PointerEvent::new(inside, PointerKind::Move));
        assert!(outcome.consumed);
        assert_eq!(outcome.hits[0].label, "Troll");

        for part in &module.fields()[0].meshes {
            assert_eq!(
                module.store().uniform(part.outline, OUTLINE_COLOR),
                Some(UniformValue::Vec3([0.0, 1.0, 1.0]))
            );
        }
        let fill = module.fields()[0].meshes[0].fill.unwrap();
        assert_eq!(
            module.store().uniform(fill, FILL_COLOR1),
            Some(UniformValue::Vec3([0.75, 0.36, 0.42]))
        );

        let outside = Vec2::new(50.0, 50.0);
        assert!(!module.handle_pointer(&PointerEvent::new(outside, PointerKind::Move)).consumed);
        assert_eq!(
            module.store().uniform(fill, FILL_COLOR1),
            Some(UniformValue::Vec3([0.8, 0.0, 0.0]))
        );
        assert_eq!(module.store().z_index(fill), Some(0));
        assert!(!module.clear_highlight());
    }

    #[test]
    fn resize_scales_outlines_and_hides_labels_below_threshold() {
        let debug = DebugSink::new();
        let mut config = FieldConfig::default();
        config.label_resize.threshold = Some(10.0);
        let mut module = FieldModule::new(LayerId(2), config, debug);
        module.resize(9.0);
        assert_eq!(module.store().pending(), 0);

        module.set(&FlatView::new(1.0, 12.0), &features().features);
        assert_eq!(module.labels().visible_count(module.store()), 0);
        module.resize(12.0);
        assert_eq!(module.labels().visible_count(module.store()), 2);
        let outline = module.fields()[0].meshes[0].outline;
        let expected = module.config().outline_resize.radius(12.0) as f32;
        assert_eq!(
            module.store().uniform(outline, OUTLINE_WIDTH),
            Some(UniformValue::Float(expected))
        );
        module.resize(10.0);
        assert_eq!(module.labels().visible_count(module.store()), 0);
    }

    #[test]
    fn hash_width_is_clamped() {
        let config: FieldConfig =
            serde_json::from_value(json!({ "initialHash": 5.0, "maxHash": 2.0 })).unwrap();
        assert_eq!(config.hash_width(), 2.0);
        assert_eq!(config.outline_resize.min.zoom, 7.0);

        let (mut module, _) = loaded();
        assert_eq!(module.set_hash_width(-1.0), 0.0);
        let fill = module.fields()[1].meshes[0].fill.unwrap();
        assert_eq!(
            module.store().uniform(fill, FILL_HASH_WIDTH),
            Some(UniformValue::Float(0.0))
        );
    }
}
