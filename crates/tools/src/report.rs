//! Loads a payload into one feature module and summarizes what it produced.

use clap::ValueEnum;
use gpu::{LayerId, MeshStore};
use layers::colors::ColorError;
use layers::faultline::{FaultlineConfig, FaultlineModule};
use layers::field::{FieldConfig, FieldModule};
use layers::geojson::{DocumentError, GeoDocument, GeoJsonConfig, GeoJsonModule};
use layers::outline::{OutlineConfig, OutlineModule};
use layers::wellbores::{SourceData, WellboreConfig, WellboreModule};
use layers::{FeatureHit, FlatView, Layer, MapView, PointerEvent, PointerKind};
use runtime::{DebugSink, Event};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

const LAYER: LayerId = LayerId(1);

/// Module a GeoJSON payload is loaded into.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum FeatureKind {
    Geojson,
    Field,
    Outline,
    Faultline,
}

#[derive(Debug)]
pub enum ReportError {
    Document(DocumentError),
    Json(serde_json::Error),
    Color(ColorError),
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Document(e) => write!(f, "invalid GeoJSON: {e}"),
            ReportError::Json(e) => write!(f, "invalid JSON: {e}"),
            ReportError::Color(e) => write!(f, "invalid color in config: {e}"),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Document(e) => Some(e),
            ReportError::Json(e) => Some(e),
            ReportError::Color(e) => Some(e),
        }
    }
}

impl From<DocumentError> for ReportError {
    fn from(value: DocumentError) -> Self {
        ReportError::Document(value)
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(value: serde_json::Error) -> Self {
        ReportError::Json(value)
    }
}

impl From<ColorError> for ReportError {
    fn from(value: ColorError) -> Self {
        ReportError::Color(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    pub units_per_degree: f64,
    pub zoom: f64,
    pub labels: bool,
    /// Module config as JSON; missing fields keep their defaults.
    pub config: Option<String>,
    /// `(lat, lng)` clicked after loading.
    pub click: Option<(f64, f64)>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            units_per_degree: 100.0,
            zoom: 10.0,
            labels: false,
            config: None,
            click: None,
        }
    }
}

impl LoadOptions {
    fn view(&self) -> FlatView {
        FlatView::new(self.units_per_degree, self.zoom)
    }

    fn module_config<T: DeserializeOwned + Default>(&self) -> Result<T, serde_json::Error> {
        match &self.config {
            Some(raw) => serde_json::from_str(raw),
            None => Ok(T::default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventLine {
    pub sequence: u64,
    pub source: String,
    pub kind: &'static str,
    pub message: String,
}

impl From<Event> for EventLine {
    fn from(event: Event) -> Self {
        Self {
            sequence: event.sequence,
            source: event.source,
            kind: event.kind,
            message: event.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HitLine {
    pub module: &'static str,
    pub id: u32,
    pub label: String,
    pub group: Option<String>,
    pub relative: Option<f64>,
}

impl From<FeatureHit> for HitLine {
    fn from(hit: FeatureHit) -> Self {
        Self {
            module: hit.module,
            id: hit.id.0,
            label: hit.label,
            group: hit.group,
            relative: hit.relative,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub module: &'static str,
    /// Input records, counting ones the parser dropped.
    pub records: usize,
    pub plotted: usize,
    pub meshes: usize,
    pub texts: usize,
    pub topology_submissions: u64,
    pub uniform_updates: u64,
    pub render_commands: usize,
    pub hits: Vec<HitLine>,
    pub events: Vec<EventLine>,
}

#[derive(Debug, Copy, Clone)]
struct StoreSnapshot {
    meshes: usize,
    texts: usize,
    topology_submissions: u64,
    uniform_updates: u64,
}

impl StoreSnapshot {
    fn of(store: &MeshStore) -> Self {
        let stats = store.stats();
        Self {
            meshes: store.mesh_count(),
            texts: store.text_count(),
            topology_submissions: stats.topology_submissions,
            uniform_updates: stats.uniform_updates,
        }
    }
}

/// Parses a GeoJSON payload and draws it with the chosen module.
pub fn load_features(
    kind: FeatureKind,
    payload: &str,
    options: &LoadOptions,
) -> Result<LoadReport, ReportError> {
    let doc = GeoDocument::from_geojson_str(payload)?;
    let records = doc.features.len() + doc.skipped;
    debug!(?kind, records, skipped = doc.skipped, "parsed document");
    let view = options.view();
    let debug = DebugSink::new();

    let report = match kind {
        FeatureKind::Geojson => {
            let config: GeoJsonConfig = options.module_config()?;
            let mut module = GeoJsonModule::new(LAYER, config, debug.clone());
            let plotted = module.set(&view, &doc.features, None, options.labels);
            let store = StoreSnapshot::of(module.store());
            finish(&mut module, store, records, plotted, &view, options)
        }
        FeatureKind::Field => {
            let config: FieldConfig = options.module_config()?;
            let mut module = FieldModule::new(LAYER, config, debug.clone());
            let plotted = module.set(&view, &doc.features);
            if options.labels {
                module.show_labels(&view);
            }
            let store = StoreSnapshot::of(module.store());
            finish(&mut module, store, records, plotted, &view, options)
        }
        FeatureKind::Outline => {
            let config: OutlineConfig = options.module_config()?;
            let mut module = OutlineModule::new(LAYER, config, debug.clone())?;
            let plotted = module.set(&view, &doc.features);
            let store = StoreSnapshot::of(module.store());
            finish(&mut module, store, records, plotted, &view, options)
        }
        FeatureKind::Faultline => {
            let config: FaultlineConfig = options.module_config()?;
            let mut module = FaultlineModule::new(LAYER, config, debug.clone())?;
            let plotted = module.set(&view, &doc.features);
            let store = StoreSnapshot::of(module.store());
            finish(&mut module, store, records, plotted, &view, options)
        }
    };
    Ok(with_events(report, &debug))
}

/// Parses a JSON array of wellbores and draws them into `group`.
pub fn load_wellbores(
    payload: &str,
    group: &str,
    options: &LoadOptions,
) -> Result<LoadReport, ReportError> {
    let data: Vec<SourceData> = serde_json::from_str(payload)?;
    let records = data.len();
    let view = options.view();
    let debug = DebugSink::new();
    let config: WellboreConfig = options.module_config()?;
    let mut module = WellboreModule::new(LAYER, config, debug.clone());
    let plotted = module.set(&view, data, group);
    module.set_label_visibility(options.labels);
    let store = StoreSnapshot::of(module.store());
    let report = finish(&mut module, store, records, plotted, &view, options);
    Ok(with_events(report, &debug))
}

fn finish(
    module: &mut dyn Layer,
    store: StoreSnapshot,
    records: usize,
    plotted: usize,
    view: &FlatView,
    options: &LoadOptions,
) -> LoadReport {
    let hits = match options.click {
        Some((lat, lng)) => {
            let event = PointerEvent::new(view.project(lat, lng), PointerKind::Click);
            let outcome = module.handle_pointer(&event);
            debug!(lat, lng, hits = outcome.hits.len(), "clicked");
            outcome.hits.into_iter().map(HitLine::from).collect()
        }
        None => Vec::new(),
    };
    let render_commands = module.drain_commands().len();
    info!(
        module = module.name(),
        records,
        plotted,
        meshes = store.meshes,
        render_commands,
        "loaded"
    );
    LoadReport {
        module: module.name(),
        records,
        plotted,
        meshes: store.meshes,
        texts: store.texts,
        topology_submissions: store.topology_submissions,
        uniform_updates: store.uniform_updates,
        render_commands,
        hits,
        events: Vec::new(),
    }
}

fn with_events(mut report: LoadReport, debug: &DebugSink) -> LoadReport {
    report.events = debug.drain_events().into_iter().map(EventLine::from).collect();
    report
}

#[cfg(test)]
mod tests {
    use super::{FeatureKind, LoadOptions, ReportError, load_features, load_wellbores};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn collection() -> String {
        json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": { "label": "block" },
                  "geometry": { "type": "Polygon",
                                "coordinates": [[[0, 0], [4, 0], [4, 4], [0, 4], [0, 0]]] } },
                { "type": "Feature", "properties": {},
                  "geometry": { "type": "LineString", "coordinates": [[10, 10], [12, 10]] } },
                { "type": "Feature", "properties": {},
                  "geometry": { "type": "Point", "coordinates": [20, 20] } },
                { "type": "Feature", "properties": {}, "geometry": null }
            ]
        })
        .to_string()
    }

    #[test]
    fn geojson_load_reports_counts_and_click_hits() {
        let options = LoadOptions {
            click: Some((2.0, 2.0)),
            ..LoadOptions::default()
        };
        let report = load_features(FeatureKind::Geojson, &collection(), &options).unwrap();
        assert_eq!(report.module, "geojson");
        assert_eq!(report.records, 4);
        assert_eq!(report.plotted, 3);
        assert!(report.meshes >= 3);
        assert!(report.render_commands > 0);
        assert_eq!(report.hits.len(), 1);
        assert_eq!(report.hits[0].label, "block");
        assert_eq!(report.hits[0].group.as_deref(), Some("Polygon"));
        assert!(!report.events.is_empty());
    }

    #[test]
    fn faultlines_skip_points() {
        let report =
            load_features(FeatureKind::Faultline, &collection(), &LoadOptions::default()).unwrap();
        assert_eq!(report.module, "faultlines");
        assert_eq!(report.plotted, 2);
        assert!(report.hits.is_empty());
    }

    #[test]
    fn config_overrides_are_parsed() {
        let options = LoadOptions {
            config: Some(json!({ "lineColor": "not a color" }).to_string()),
            ..LoadOptions::default()
        };
        let err = load_features(FeatureKind::Outline, &collection(), &options).unwrap_err();
        assert!(matches!(err, ReportError::Color(_)), "{err}");

        let options = LoadOptions {
            config: Some("{".into()),
            ..LoadOptions::default()
        };
        let err = load_features(FeatureKind::Field, &collection(), &options).unwrap_err();
        assert!(matches!(err, ReportError::Json(_)));
    }

    #[test]
    fn rejects_non_collections() {
        let err = load_features(FeatureKind::Geojson, "{\"type\":\"Point\"}", &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, ReportError::Document(_)));
    }

    #[test]
    fn wellbores_load_into_group() {
        let payload = json!([
            { "wellboreGuid": 1, "label": "A-1", "path": [[0.0, 0.0], [0.0, 0.05], [0.0, 0.1]] },
            { "id": 2, "label": "A-2", "path": [] }
        ])
        .to_string();
        let options = LoadOptions {
            click: Some((0.0, 0.05)),
            ..LoadOptions::default()
        };
        let report = load_wellbores(&payload, "drilled", &options).unwrap();
        assert_eq!(report.module, "wellbores");
        assert_eq!((report.records, report.plotted), (2, 1));
        assert_eq!(report.hits.len(), 1);
        assert_eq!(report.hits[0].label, "A-1");
    }
}
