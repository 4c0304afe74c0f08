use serde_json::{Map, Value};
use tracing::warn;

use crate::layer::MapView;
use foundation::math::Vec2;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn project(self, view: &dyn MapView) -> Vec2 {
        view.project(self.lat, self.lng)
    }
}

pub fn project_ring(view: &dyn MapView, ring: &[LngLat]) -> Vec<Vec2> {
    ring.iter().map(|p| p.project(view)).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeoGeometry {
    Point(LngLat),
    LineString(Vec<LngLat>),
    Polygon(Vec<Vec<LngLat>>),
    MultiPolygon(Vec<Vec<Vec<LngLat>>>),
}

impl GeoGeometry {
    pub fn kind(&self) -> &'static str {
        match self {
            GeoGeometry::Point(_) => "Point",
            GeoGeometry::LineString(_) => "LineString",
            GeoGeometry::Polygon(_) => "Polygon",
            GeoGeometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// True when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        match self {
            GeoGeometry::Point(_) => false,
            GeoGeometry::LineString(points) => points.is_empty(),
            GeoGeometry::Polygon(rings) => rings.first().is_none_or(Vec::is_empty),
            GeoGeometry::MultiPolygon(polygons) => polygons
                .iter()
                .all(|rings| rings.first().is_none_or(Vec::is_empty)),
        }
    }

    /// Polygons of a polygonal geometry, each as outer ring plus holes.
    pub fn polygons(&self) -> Vec<&[Vec<LngLat>]> {
        match self {
            GeoGeometry::Polygon(rings) => vec![rings.as_slice()],
            GeoGeometry::MultiPolygon(polygons) => polygons.iter().map(Vec::as_slice).collect(),
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeoFeature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    pub geometry: GeoGeometry,
}

impl GeoFeature {
    pub fn new(geometry: GeoGeometry, properties: Map<String, Value>) -> Self {
        Self {
            id: None,
            properties,
            geometry,
        }
    }

    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }
}

/// Parsed features. Features that fail to parse are dropped and counted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoDocument {
    pub features: Vec<GeoFeature>,
    pub skipped: usize,
}

#[derive(Debug)]
pub enum DocumentError {
    Json(serde_json::Error),
    NotAFeatureCollection,
}

impl std::fmt::Display for DocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentError::Json(e) => write!(f, "JSON parse error: {e}"),
            DocumentError::NotAFeatureCollection => {
                write!(f, "expected a GeoJSON FeatureCollection or feature array")
            }
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocumentError::Json(e) => Some(e),
            DocumentError::NotAFeatureCollection => None,
        }
    }
}

impl GeoDocument {
    pub fn from_geojson_str(payload: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(payload).map_err(DocumentError::Json)?;
        Self::from_geojson_value(&value)
    }

    /// Accepts a `FeatureCollection` or a bare array of features.
    pub fn from_geojson_value(value: &Value) -> Result<Self, DocumentError> {
        let features = match value {
            Value::Array(items) => items,
            Value::Object(obj) => {
                if obj.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
                    return Err(DocumentError::NotAFeatureCollection);
                }
                obj.get("features")
                    .and_then(Value::as_array)
                    .ok_or(DocumentError::NotAFeatureCollection)?
            }
            _ => return Err(DocumentError::NotAFeatureCollection),
        };
        Ok(Self::from_features(features))
    }

    pub fn from_features(values: &[Value]) -> Self {
        let mut doc = Self::default();
        for (index, value) in values.iter().enumerate() {
            match parse_feature(value) {
                Ok(feature) => doc.features.push(feature),
                Err(reason) => {
                    warn!(index, %reason, "skipping GeoJSON feature");
                    doc.skipped += 1;
                }
            }
        }
        doc
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

fn parse_feature(value: &Value) -> Result<GeoFeature, String> {
    let obj = value.as_object().ok_or("feature must be an object")?;
    let ty = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or("feature missing type")?;
    if ty != "Feature" {
        return Err(format!("unexpected feature type: {ty}"));
    }
    let id = match obj.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    let properties = obj
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    let geometry = parse_geometry(obj.get("geometry").ok_or("feature missing geometry")?)?;
    Ok(GeoFeature {
        id,
        properties,
        geometry,
    })
}

fn parse_geometry(value: &Value) -> Result<GeoGeometry, String> {
    let obj = value.as_object().ok_or("geometry must be an object")?;
    let ty = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or("geometry missing type")?;
    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates")?;

    match ty {
        "Point" => Ok(GeoGeometry::Point(parse_point(coords)?)),
        "LineString" => Ok(GeoGeometry::LineString(parse_points(coords)?)),
        "Polygon" => Ok(GeoGeometry::Polygon(parse_rings(coords)?)),
        "MultiPolygon" => {
            let polygons = coords
                .as_array()
                .ok_or("MultiPolygon coordinates must be an array of polygons")?;
            polygons
                .iter()
                .map(parse_rings)
                .collect::<Result<_, _>>()
                .map(GeoGeometry::MultiPolygon)
        }
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

fn parse_point(coords: &Value) -> Result<LngLat, String> {
    let arr = coords.as_array().ok_or("position must be an array")?;
    let [lng, lat, ..] = arr.as_slice() else {
        return Err("position must have [lng, lat]".to_string());
    };
    let lng = lng.as_f64().ok_or("lng must be a number")?;
    let lat = lat.as_f64().ok_or("lat must be a number")?;
    if !lng.is_finite() || !lat.is_finite() {
        return Err("position must be finite".to_string());
    }
    Ok(LngLat::new(lng, lat))
}

fn parse_points(coords: &Value) -> Result<Vec<LngLat>, String> {
    coords
        .as_array()
        .ok_or("coordinates must be an array")?
        .iter()
        .map(parse_point)
        .collect()
}

fn parse_rings(coords: &Value) -> Result<Vec<Vec<LngLat>>, String> {
    coords
        .as_array()
        .ok_or("Polygon coordinates must be an array of rings")?
        .iter()
        .map(parse_points)
        .collect()
}
