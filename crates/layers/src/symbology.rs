use geometry::mesh::{MarkerPaint, PointShape};
use gpu::{UniformValue, Uniforms};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::colors::{ColorError, Rgb, parse_rgb, parse_rgba};

// Fill shader.
pub const FILL_COLOR1: &str = "col1";
pub const FILL_COLOR2: &str = "col2";
pub const FILL_OPACITY: &str = "opacity";
pub const FILL_HASHED: &str = "hashed";
pub const FILL_HASH_DISP: &str = "hashDisp";
pub const FILL_HASH_WIDTH: &str = "hashWidth";

// Outline shader. `width` scales the baked normals.
pub const OUTLINE_COLOR: &str = "color";
pub const OUTLINE_WIDTH: &str = "width";

pub const DEFAULT_LINE_WIDTH: f64 = 0.15;
pub const DEFAULT_Z_INDEX: i64 = 10;
pub const POINT_Z_INDEX: i64 = 99_999;

/// Per-feature style returned by a host style callback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureStyle {
    pub line_color: String,
    pub line_width: f64,
    pub fill_color: Option<String>,
    pub fill_color2: Option<String>,
    pub fill_opacity: f64,
    pub hashed: bool,
    pub label_scale: Option<f64>,
    pub point_shape: Option<PointShape>,
}

impl Default for FeatureStyle {
    fn default() -> Self {
        Self {
            line_color: "#000000".to_string(),
            line_width: DEFAULT_LINE_WIDTH,
            fill_color: None,
            fill_color2: None,
            fill_opacity: 0.0,
            hashed: false,
            label_scale: None,
            point_shape: None,
        }
    }
}

impl FeatureStyle {
    pub fn line_rgb(&self) -> Result<Rgb, ColorError> {
        parse_rgb(&self.line_color)
    }

    /// Missing fill colors resolve to black, as the fill shader expects both.
    pub fn fill(&self) -> Result<FillStyle, ColorError> {
        let resolve = |c: &Option<String>| c.as_deref().map(parse_rgb).transpose();
        Ok(FillStyle {
            col1: resolve(&self.fill_color)?.unwrap_or_default(),
            col2: resolve(&self.fill_color2)?.unwrap_or_default(),
            opacity: self.fill_opacity as f32,
            hashed: self.hashed,
        })
    }

    pub fn shape(&self) -> PointShape {
        self.point_shape.clone().unwrap_or_default()
    }

    /// Marker colors; fill alpha is the fill opacity.
    pub fn marker_paint(&self, line_override: Option<[f32; 4]>) -> Result<MarkerPaint, ColorError> {
        let fill = match &self.fill_color {
            Some(c) => {
                let [r, g, b] = parse_rgb(c)?;
                [r, g, b, self.fill_opacity as f32]
            }
            None => [0.0, 0.0, 0.0, self.fill_opacity as f32],
        };
        let line = match line_override {
            Some(line) => line,
            None => parse_rgba(&self.line_color)?,
        };
        Ok(MarkerPaint {
            fill,
            line,
            line_width: self.line_width,
        })
    }
}

/// Label position tweak: offsets in degrees plus a rotation in degrees.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct LabelLocation {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub angle: Option<f64>,
}

impl LabelLocation {
    /// Reads `labelLocLat`, `labelLocLng` and `labelLocAngle` from a property bag.
    pub fn from_properties(properties: &Map<String, Value>) -> Self {
        let read = |key: &str| {
            properties
                .get(key)
                .and_then(Value::as_f64)
                .filter(|v| *v != 0.0)
        };
        Self {
            lat: read("labelLocLat"),
            lng: read("labelLocLng"),
            angle: read("labelLocAngle"),
        }
    }

    /// Fields set on `other` win.
    pub fn merged(self, other: LabelLocation) -> Self {
        Self {
            lat: other.lat.or(self.lat),
            lng: other.lng.or(self.lng),
            angle: other.angle.or(self.angle),
        }
    }

    pub fn moves_anchor(&self) -> bool {
        self.lat.is_some() || self.lng.is_some()
    }
}

/// Result of the host style callback for one feature.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureProps {
    pub id: Option<u64>,
    pub label: Option<String>,
    pub label_loc_lat: Option<f64>,
    pub label_loc_lng: Option<f64>,
    pub label_loc_angle: Option<f64>,
    pub style: FeatureStyle,
    pub additional_data: Option<Value>,
}

impl FeatureProps {
    pub fn with_style(style: FeatureStyle) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    pub fn label_location(&self) -> LabelLocation {
        LabelLocation {
            lat: self.label_loc_lat,
            lng: self.label_loc_lng,
            angle: self.label_loc_angle,
        }
    }
}

/// Uniform values of the polygon fill shader, minus the per-mesh hash phase.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FillStyle {
    pub col1: Rgb,
    pub col2: Rgb,
    pub opacity: f32,
    pub hashed: bool,
}

pub fn fill_uniforms(style: &FillStyle, hash_disp: f32, hash_width: f32) -> Uniforms {
    let mut u = Uniforms::new();
    u.insert(FILL_COLOR1, UniformValue::Vec3(style.col1));
    u.insert(FILL_COLOR2, UniformValue::Vec3(style.col2));
    u.insert(FILL_OPACITY, UniformValue::Float(style.opacity));
    u.insert(FILL_HASHED, UniformValue::Bool(style.hashed));
    u.insert(FILL_HASH_DISP, UniformValue::Float(hash_disp));
    u.insert(FILL_HASH_WIDTH, UniformValue::Float(hash_width));
    u
}

pub fn outline_uniforms(color: Rgb, width: f64) -> Uniforms {
    let mut u = Uniforms::new();
    u.insert(OUTLINE_COLOR, UniformValue::Vec3(color));
    u.insert(OUTLINE_WIDTH, UniformValue::Float(width as f32));
    u
}

/// Hash stripe phase in `[0, 10)`, fixed per mesh so redraws are stable.
pub fn hash_displacement(seed: u32) -> f32 {
    let mixed = seed.wrapping_add(1).wrapping_mul(0x9E37_79B9) >> 8;
    (mixed % 1000) as f32 / 100.0
}

#[cfg(test)]
mod tests {
    use super::{
        FILL_HASH_DISP, FILL_OPACITY, FeatureProps, FeatureStyle, LabelLocation, fill_uniforms,
        hash_displacement, outline_uniforms,
    };
    use geometry::mesh::PointShape;
    use gpu::UniformValue;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn props_deserialize_with_partial_style() {
        let props: FeatureProps = serde_json::from_value(json!({
            "label": "Block 34/10",
            "labelLocAngle": 30.0,
            "style": {
                "lineColor": "rgb(255, 0, 0)",
                "fillColor": "#00ff00",
                "fillOpacity": 0.5,
                "pointShape": { "shape": "circle", "radius": 3.0 }
            }
        }))
        .unwrap();
        assert_eq!(props.label.as_deref(), Some("Block 34/10"));
        assert_eq!(props.style.line_width, super::DEFAULT_LINE_WIDTH);
        assert_eq!(props.style.shape(), PointShape::Circle { radius: 3.0 });
        assert_eq!(props.label_location().angle, Some(30.0));

        let fill = props.style.fill().unwrap();
        assert_eq!(fill.col1, [0.0, 1.0, 0.0]);
        assert_eq!(fill.col2, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn marker_paint_uses_opacity_and_override() {
        let style = FeatureStyle {
            fill_color: Some("#ffffff".into()),
            fill_opacity: 0.25,
            ..FeatureStyle::default()
        };
        let paint = style.marker_paint(None).unwrap();
        assert_eq!(paint.fill, [1.0, 1.0, 1.0, 0.25]);
        assert_eq!(paint.line, [0.0, 0.0, 0.0, 1.0]);

        let cyan = [0.0, 1.0, 1.0, 1.0];
        assert_eq!(style.marker_paint(Some(cyan)).unwrap().line, cyan);
    }

    #[test]
    fn bad_colors_surface_as_errors() {
        let style = FeatureStyle {
            line_color: "not-a-color".into(),
            ..FeatureStyle::default()
        };
        assert!(style.line_rgb().is_err());
        assert!(style.marker_paint(None).is_err());
    }

    #[test]
    fn label_location_prefers_callback_values() {
        let from_feature = LabelLocation::from_properties(
            json!({ "labelLocLat": 0.1, "labelLocLng": 0.2 })
                .as_object()
                .unwrap(),
        );
        let from_props = LabelLocation {
            lat: Some(0.5),
            ..LabelLocation::default()
        };
        let merged = from_feature.merged(from_props);
        assert_eq!(merged.lat, Some(0.5));
        assert_eq!(merged.lng, Some(0.2));
        assert!(merged.moves_anchor());
        assert!(!LabelLocation::default().moves_anchor());
    }

    #[test]
    fn uniform_builders() {
        let style = FeatureStyle::default().fill().unwrap();
        let fill = fill_uniforms(&style, 2.5, 1.0);
        assert_eq!(fill.get(FILL_OPACITY), Some(&UniformValue::Float(0.0)));
        assert_eq!(fill.get(FILL_HASH_DISP), Some(&UniformValue::Float(2.5)));
        assert_eq!(outline_uniforms([1.0, 0.0, 0.0], 0.5).len(), 2);
    }

    #[test]
    fn hash_displacement_is_stable_and_bounded() {
        for seed in 0..500 {
            let d = hash_displacement(seed);
            assert!((0.0..10.0).contains(&d));
            assert_eq!(d, hash_displacement(seed));
        }
        assert_ne!(hash_displacement(0), hash_displacement(1));
    }
}
