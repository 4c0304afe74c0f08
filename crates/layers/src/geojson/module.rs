use foundation::ids::FeatureId;
use foundation::math::Vec2;
use gpu::{LayerId, MeshStore, RenderFrame};
use runtime::DebugSink;
use serde_json::Value;
use tracing::{debug, trace, warn};

use super::config::GeoJsonConfig;
use super::document::{GeoFeature, GeoGeometry};
use super::linestring::LineStringCollection;
use super::point::PointCollection;
use super::polygon::PolygonCollection;
use crate::layer::{
    DragState, FeatureHit, Layer, MapView, PointerEvent, PointerKind, PointerOutcome,
};
use crate::symbology::FeatureProps;

pub const GEOJSON: &str = "geojson";

/// Host callback resolving the style and label of one feature.
pub type StyleCallback<'a> = &'a dyn Fn(&GeoFeature) -> FeatureProps;

/// Style used when the host passes no callback: default colors, labelled
/// by the `label` property.
pub fn default_props(feature: &GeoFeature) -> FeatureProps {
    FeatureProps {
        label: feature.property_str("label").map(str::to_string),
        ..FeatureProps::default()
    }
}

/// Sub-collection a hit or forced highlight refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GeoJsonKind {
    Point,
    LineString,
    Polygon,
    MultiPolygon,
}

impl GeoJsonKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GeoJsonKind::Point => "Point",
            GeoJsonKind::LineString => "LineString",
            GeoJsonKind::Polygon => "Polygon",
            GeoJsonKind::MultiPolygon => "MultiPolygon",
        }
    }
}

/// Mixed GeoJSON features: points, line strings, polygons and multipolygons
/// each kept in their own collection on one layer.
pub struct GeoJsonModule {
    config: GeoJsonConfig,
    store: MeshStore,
    debug: DebugSink,
    points: PointCollection,
    lines: LineStringCollection,
    polygons: PolygonCollection,
    multipolygons: PolygonCollection,
    labels_drawn: bool,
    labels_visible: bool,
    highlight_enabled: bool,
    drag: DragState,
    zoom: Option<f64>,
}

impl GeoJsonModule {
    pub fn new(layer: LayerId, config: GeoJsonConfig, debug: DebugSink) -> Self {
        Self {
            store: MeshStore::new(layer),
            debug,
            points: PointCollection::new(&config),
            lines: LineStringCollection::new(&config),
            polygons: PolygonCollection::new(&config),
            multipolygons: PolygonCollection::new(&config),
            labels_drawn: false,
            labels_visible: false,
            highlight_enabled: true,
            drag: DragState::default(),
            zoom: None,
            config,
        }
    }

    pub fn config(&self) -> &GeoJsonConfig {
        &self.config
    }

    pub fn store(&self) -> &MeshStore {
        &self.store
    }

    pub fn points(&self) -> &PointCollection {
        &self.points
    }

    pub fn lines(&self) -> &LineStringCollection {
        &self.lines
    }

    pub fn polygons(&self) -> &PolygonCollection {
        &self.polygons
    }

    pub fn multipolygons(&self) -> &PolygonCollection {
        &self.multipolygons
    }

    pub fn len(&self) -> usize {
        self.points.len() + self.lines.len() + self.polygons.len() + self.multipolygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces every feature. `style` defaults to [`default_props`]. Returns
    /// how many features were drawn.
    pub fn set(
        &mut self,
        view: &dyn MapView,
        features: &[GeoFeature],
        style: Option<StyleCallback<'_>>,
        labels_visible: bool,
    ) -> usize {
        self.clear();
        let zoom = view.current_zoom();
        self.zoom = Some(zoom);
        let hash_width = self.config.hash_width();
        let mut skipped = 0usize;

        for feature in features {
            let props = match style {
                Some(style) => style(feature),
                None => default_props(feature),
            };
            let width = self.config.outline_width(Some(zoom), props.style.line_width);
            let added = match &feature.geometry {
                GeoGeometry::Point(_) => self.points.add(&mut self.store, view, feature, &props),
                GeoGeometry::LineString(_) => {
                    self.lines.add(&mut self.store, view, feature, &props)
                }
                GeoGeometry::Polygon(_) => self.polygons.add(
                    &mut self.store,
                    view,
                    feature,
                    &props,
                    width,
                    hash_width,
                ),
                GeoGeometry::MultiPolygon(_) => self.multipolygons.add(
                    &mut self.store,
                    view,
                    feature,
                    &props,
                    width,
                    hash_width,
                ),
            };
            if !added {
                skipped += 1;
            }
        }
        self.points.set_zoom(zoom);
        self.labels_visible = labels_visible;
        if labels_visible {
            self.draw_labels(view);
        }
        self.store.request_redraw();

        let count = self.len();
        debug!(
            features = count,
            points = self.points.len(),
            lines = self.lines.len(),
            polygons = self.polygons.len(),
            multipolygons = self.multipolygons.len(),
            skipped,
            "geojson set"
        );
        if skipped > 0 {
            warn!(skipped, "geojson features were not drawn");
        }
        self.debug.emit(GEOJSON, "set", format!("{count} features added"));
        self.debug.count(GEOJSON, "plotted", count as u64);
        count
    }

    /// Draws polygon labels once; later calls are no-ops.
    pub fn draw_labels(&mut self, view: &dyn MapView) {
        if self.labels_drawn {
            return;
        }
        self.labels_drawn = true;
        let scale = self.config.label_scale(self.zoom);
        self.polygons.draw_labels(&mut self.store, view, scale);
        self.multipolygons.draw_labels(&mut self.store, view, scale);
        let hidden = !self.labels_visible || self.zoom.is_some_and(|z| self.config.hides_labels_at(z));
        if hidden {
            self.polygons.hide_labels(&mut self.store);
            self.multipolygons.hide_labels(&mut self.store);
        }
    }

    pub fn labels_visible(&self) -> bool {
        self.labels_visible
    }

    pub fn show_labels(&mut self, view: &dyn MapView) {
        self.labels_visible = true;
        self.draw_labels(view);
        self.polygons.show_labels(&mut self.store);
        self.multipolygons.show_labels(&mut self.store);
        self.store.request_redraw();
    }

    pub fn hide_labels(&mut self, view: &dyn MapView) {
        self.labels_visible = false;
        self.draw_labels(view);
        self.polygons.hide_labels(&mut self.store);
        self.multipolygons.hide_labels(&mut self.store);
        self.store.request_redraw();
    }

    /// Pointer moves stop highlighting while disabled.
    pub fn set_highlight_enabled(&mut self, enabled: bool) {
        self.highlight_enabled = enabled;
        if !enabled {
            self.clear_highlight();
        }
    }

    /// Features under a projected position without touching any highlight,
    /// ordered polygons, multipolygons, line strings, points.
    pub fn hits_at(&self, position: Vec2) -> Vec<FeatureHit> {
        [
            (GeoJsonKind::Polygon, self.polygons.test_position(position)),
            (GeoJsonKind::MultiPolygon, self.multipolygons.test_position(position)),
            (GeoJsonKind::LineString, self.lines.test_position(position)),
            (GeoJsonKind::Point, self.points.test_position(position)),
        ]
        .into_iter()
        .filter_map(|(kind, id)| self.hit(kind, id?))
        .collect()
    }

    /// Hover-highlights the top feature of every collection under `position`.
    pub fn hover(&mut self, position: Vec2) -> Vec<FeatureHit> {
        let store = &mut self.store;
        let (polygon, a) = self.polygons.hover(store, position);
        let (multipolygon, b) = self.multipolygons.hover(store, position);
        let (line, c) = self.lines.hover(store, position);
        let (point, d) = self.points.hover(store, position);
        if a || b || c || d {
            self.store.request_redraw();
        }
        [
            (GeoJsonKind::Polygon, polygon),
            (GeoJsonKind::MultiPolygon, multipolygon),
            (GeoJsonKind::LineString, line),
            (GeoJsonKind::Point, point),
        ]
        .into_iter()
        .filter_map(|(kind, id)| self.hit(kind, id?))
        .collect()
    }

    pub fn clear_highlight(&mut self) -> bool {
        let store = &mut self.store;
        let changed = [
            self.polygons.revert_hover(store),
            self.multipolygons.revert_hover(store),
            self.lines.revert_hover(store),
            self.points.revert_hover(store),
        ]
        .contains(&true);
        if changed {
            self.store.request_redraw();
        }
        changed
    }

    /// Solid highlight of one polygon or multipolygon that ignores the pointer.
    pub fn force_highlight_on(&mut self, kind: GeoJsonKind, id: FeatureId) -> bool {
        let changed = match kind {
            GeoJsonKind::Polygon => self.polygons.force_highlight_on(&mut self.store, id),
            GeoJsonKind::MultiPolygon => {
                self.multipolygons.force_highlight_on(&mut self.store, id)
            }
            GeoJsonKind::Point | GeoJsonKind::LineString => false,
        };
        if changed {
            self.store.request_redraw();
        }
        changed
    }

    pub fn force_highlight_off(&mut self) -> bool {
        let polygons = self.polygons.force_highlight_off(&mut self.store);
        let multipolygons = self.multipolygons.force_highlight_off(&mut self.store);
        self.store.request_redraw();
        polygons || multipolygons
    }

    /// First polygon, then multipolygon, whose `key` property equals `value`.
    pub fn find_polygon(&self, key: &str, value: &Value) -> Option<(GeoJsonKind, FeatureId)> {
        self.polygons
            .find_by_property(key, value)
            .map(|id| (GeoJsonKind::Polygon, id))
            .or_else(|| {
                self.multipolygons
                    .find_by_property(key, value)
                    .map(|id| (GeoJsonKind::MultiPolygon, id))
            })
    }

    /// Sets the hash stripe width of every polygon fill, clamped to the
    /// configured range. Returns the applied width.
    pub fn set_hash_width(&mut self, width: f64) -> f64 {
        self.config.initial_hash = width;
        let width = self.config.hash_width();
        self.polygons.set_hash_width(&mut self.store, width);
        self.multipolygons.set_hash_width(&mut self.store, width);
        self.store.request_redraw();
        width
    }

    fn hit(&self, kind: GeoJsonKind, id: FeatureId) -> Option<FeatureHit> {
        let (label, properties) = match kind {
            GeoJsonKind::Point => {
                let f = self.points.features().get(id.index())?;
                (f.label.clone(), &f.properties)
            }
            GeoJsonKind::LineString => {
                let f = self.lines.features().get(id.index())?;
                (f.label.clone(), &f.properties)
            }
            GeoJsonKind::Polygon => {
                let f = self.polygons.features().get(id.index())?;
                (f.label.clone(), &f.properties)
            }
            GeoJsonKind::MultiPolygon => {
                let f = self.multipolygons.features().get(id.index())?;
                (f.label.clone(), &f.properties)
            }
        };
        let mut hit = FeatureHit::new(GEOJSON, id, label.unwrap_or_default());
        hit.group = Some(kind.as_str().to_string());
        hit.properties = properties.clone();
        Some(hit)
    }
}

impl Layer for GeoJsonModule {
    fn name(&self) -> &'static str {
        GEOJSON
    }

    fn id(&self) -> LayerId {
        self.store.layer()
    }

    fn clear(&mut self) {
        self.polygons.clear(&mut self.store);
        self.multipolygons.clear(&mut self.store);
        self.lines.clear();
        self.points.clear();
        self.store.clear();
        self.labels_drawn = false;
    }

    fn resize(&mut self, zoom: f64) {
        self.zoom = Some(zoom);
        if self.is_empty() {
            return;
        }
        self.points.resize(&mut self.store, zoom);
        if let Some(resize) = self.config.outline_resize {
            let width = resize.radius(zoom);
            self.lines.set_width(&mut self.store, width);
            self.polygons.set_outline_width(&mut self.store, width);
            self.multipolygons.set_outline_width(&mut self.store, width);
            trace!(zoom, width, "geojson resize");
        }
        if self.labels_drawn && self.labels_visible {
            if self.config.hides_labels_at(zoom) {
                self.polygons.hide_labels(&mut self.store);
                self.multipolygons.hide_labels(&mut self.store);
            } else {
                let scale = self.config.label_scale(Some(zoom));
                for collection in [&mut self.polygons, &mut self.multipolygons] {
                    collection.show_labels(&mut self.store);
                    collection.resize_labels(&mut self.store, scale);
                }
            }
        }
    }

    fn is_visible(&self) -> bool {
        self.store.is_layer_visible()
    }

    fn set_visibility(&mut self, visible: bool) -> bool {
        self.store.set_layer_visible(visible)
    }

    fn handle_pointer(&mut self, event: &PointerEvent) -> PointerOutcome {
        let skip = self.drag.track(event.kind);
        if !self.is_visible() || self.is_empty() {
            return PointerOutcome::ignored();
        }
        match event.kind {
            PointerKind::Move if !skip && self.highlight_enabled => {
                let hits = self.hover(event.position);
                if hits.is_empty() {
                    PointerOutcome::ignored()
                } else {
                    PointerOutcome::consumed(hits)
                }
            }
            PointerKind::Click => {
                let hits = self.hits_at(event.position);
                match hits.into_iter().next() {
                    Some(hit) => PointerOutcome::consumed(vec![hit]),
                    None => PointerOutcome::ignored(),
                }
            }
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
    use super::{GEOJSON, GeoJsonKind, GeoJsonModule, default_props};
    use crate::geojson::{GeoDocument, GeoFeature, GeoJsonConfig};
    use crate::layer::{FlatView, Layer, PointerEvent, PointerKind};
    use crate::resize::{LabelResizeConfig, ResizeConfig, ZoomScale};
    use crate::symbology::{FILL_OPACITY, FeatureProps, FeatureStyle, OUTLINE_WIDTH};
    use foundation::ids::FeatureId;
    use foundation::math::Vec2;
    use gpu::{LayerId, UniformValue};
    use pretty_assertions::assert_eq;
    use runtime::DebugSink;
    use serde_json::json;

    fn document() -> GeoDocument {
        GeoDocument::from_geojson_value(&json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": { "label": "Prospect A", "prospectName": "A" },
                  "geometry": { "type": "Polygon",
                                "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]] } },
                { "type": "Feature", "properties": { "label": "Prospect B", "prospectName": "B" },
                  "geometry": { "type": "MultiPolygon", "coordinates": [
                      [[[0, 0], [4, 0], [4, 4], [0, 4], [0, 0]]],
                      [[[20, 0], [24, 0], [24, 4], [20, 4], [20, 0]]]
                  ] } },
                { "type": "Feature", "properties": { "label": "Pipeline" },
                  "geometry": { "type": "LineString", "coordinates": [[-5, 2], [30, 2]] } },
                { "type": "Feature", "properties": { "label": "Rig" },
                  "geometry": { "type": "Point", "coordinates": [2, 2] } },
                { "type": "Feature", "properties": {},
                  "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0]]] } }
            ]
        }))
        .unwrap()
    }

    fn config() -> GeoJsonConfig {
        GeoJsonConfig {
            outline_resize: Some(ResizeConfig::new(
                ZoomScale::new(0.0, 1.0),
                ZoomScale::new(10.0, 0.0),
            )),
            label_resize: Some(LabelResizeConfig {
                min: ZoomScale::new(0.0, 1.0),
                max: ZoomScale::new(10.0, 2.0),
                base_scale: 1.0,
                threshold: Some(3.0),
            }),
            ..GeoJsonConfig::default()
        }
    }

    fn loaded(labels: bool) -> (GeoJsonModule, DebugSink) {
        let debug = DebugSink::new();
        let mut module = GeoJsonModule::new(LayerId(6), config(), debug.clone());
        let filled = |feature: &GeoFeature| FeatureProps {
            style: FeatureStyle {
                fill_color: Some("#00ff00".into()),
                fill_opacity: 0.4,
                ..FeatureStyle::default()
            },
            ..default_props(feature)
        };
        let count = module.set(&FlatView::new(1.0, 5.0), &document().features, Some(&filled), labels);
        assert_eq!(count, 4);
        (module, debug)
    }

    #[test]
    fn features_split_by_geometry() {
        let (module, debug) = loaded(false);
        assert_eq!(module.polygons().len(), 1);
        assert_eq!(module.multipolygons().len(), 1);
        assert_eq!(module.multipolygons().features()[0].meshes.len(), 2);
        assert_eq!(module.lines().len(), 1);
        assert_eq!(module.points().len(), 1);
        assert_eq!(debug.metrics().counter(GEOJSON, "plotted"), 4);

        let outline = module.polygons().features()[0].meshes[0].outline;
        assert_eq!(
            module.store().uniform(outline, OUTLINE_WIDTH),
            Some(UniformValue::Float(0.5))
        );
        assert_eq!(module.store().text_count(), 0);
    }

    #[test]
    fn hits_are_ordered_by_collection() {
        let (mut module, _) = loaded(false);
        let hits = module.hover(Vec2::new(2.0, -2.0));
        let kinds: Vec<_> = hits.iter().map(|h| h.group.as_deref().unwrap_or("")).collect();
        assert_eq!(kinds, vec!["Polygon", "MultiPolygon", "LineString", "Point"]);
        assert_eq!(hits[3].label, "Rig");
        assert_eq!(module.polygons().highlighted(), Some(FeatureId(0)));

        let click = module.handle_pointer(&PointerEvent::new(Vec2::new(22.0, -3.0), PointerKind::Click));
        assert_eq!(click.hits.len(), 1);
        assert_eq!(click.hits[0].label, "Prospect B");

        module.handle_pointer(&PointerEvent::new(Vec2::ZERO, PointerKind::Out));
        assert_eq!(module.polygons().highlighted(), None);
        assert_eq!(module.points().highlighted(), None);
    }

    #[test]
    fn disabled_highlight_ignores_moves() {
        let (mut module, _) = loaded(false);
        module.set_highlight_enabled(false);
        let outcome = module.handle_pointer(&PointerEvent::new(Vec2::new(2.0, -2.0), PointerKind::Move));
        assert!(!outcome.consumed);
        assert_eq!(module.polygons().highlighted(), None);
    }

    #[test]
    fn forced_highlight_by_property() {
        let (mut module, _) = loaded(false);
        let (kind, id) = module.find_polygon("prospectName", &json!("B")).unwrap();
        assert_eq!(kind, GeoJsonKind::MultiPolygon);
        assert!(module.force_highlight_on(kind, id));
        let fill = module.multipolygons().features()[0].meshes[1].fill.unwrap();
        assert_eq!(module.store().uniform(fill, FILL_OPACITY), Some(UniformValue::Float(1.0)));
        assert!(!module.force_highlight_on(GeoJsonKind::Point, FeatureId(0)));

        assert!(module.force_highlight_off());
        assert_eq!(module.store().uniform(fill, FILL_OPACITY), Some(UniformValue::Float(0.4)));
    }

    #[test]
    fn labels_toggle_and_hide_below_threshold() {
        let (mut module, _) = loaded(true);
        let view = FlatView::new(1.0, 5.0);
        assert_eq!(module.store().text_count(), 2);
        let visible = |m: &GeoJsonModule| {
            [m.polygons(), m.multipolygons()]
                .iter()
                .map(|c| c.labels().visible_count(m.store()))
                .sum::<usize>()
        };
        assert_eq!(visible(&module), 2);

        module.resize(2.0);
        assert_eq!(visible(&module), 0);
        module.resize(6.0);
        assert_eq!(visible(&module), 2);

        module.hide_labels(&view);
        assert_eq!(visible(&module), 0);
        module.resize(6.0);
        assert_eq!(visible(&module), 0);
        module.show_labels(&view);
        assert_eq!(visible(&module), 2);
    }

    #[test]
    fn clear_drops_everything() {
        let (mut module, _) = loaded(true);
        module.clear();
        assert!(module.is_empty());
        assert_eq!(module.store().mesh_count(), 0);
        assert_eq!(module.store().text_count(), 0);
        module.resize(4.0);
        assert_eq!(module.polygons().len(), 0);
    }
}
