use serde::{Deserialize, Serialize};

use crate::resize::{LabelResizeConfig, ResizeConfig};

pub const DEFAULT_LABEL_BASE_SCALE: f64 = 0.15;

/// Tiers of the point hit-test grid, finest to coarsest cell size.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointGridConfig {
    pub min_cell: f64,
    pub max_cell: f64,
    pub tiers: usize,
}

impl Default for PointGridConfig {
    fn default() -> Self {
        Self {
            min_cell: 100.0,
            max_cell: 500.0,
            tiers: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeoJsonConfig {
    pub initial_hash: f64,
    pub min_hash: f64,
    pub max_hash: Option<f64>,
    /// Without a curve, outline widths stay as styled.
    pub outline_resize: Option<ResizeConfig>,
    pub label_resize: Option<LabelResizeConfig>,
    pub label_color: u32,
    pub hit_cell_size: f64,
    pub line_hit_distance: f64,
    pub point_hit_distance: f64,
    pub point_grid: PointGridConfig,
}

impl Default for GeoJsonConfig {
    fn default() -> Self {
        Self {
            initial_hash: 1.0,
            min_hash: 0.0,
            max_hash: None,
            outline_resize: None,
            label_resize: None,
            label_color: 0x454545,
            hit_cell_size: 1.2,
            line_hit_distance: 2.0,
            point_hit_distance: 0.5,
            point_grid: PointGridConfig::default(),
        }
    }
}

impl GeoJsonConfig {
    pub fn hash_width(&self) -> f64 {
        let max = self.max_hash.unwrap_or(f64::INFINITY);
        self.initial_hash.clamp(self.min_hash, max.max(self.min_hash))
    }

    pub fn label_base_scale(&self) -> f64 {
        self.label_resize
            .map_or(DEFAULT_LABEL_BASE_SCALE, |r| r.base_scale)
    }

    /// Outline width at `zoom`, or `fallback` when no curve is configured.
    pub fn outline_width(&self, zoom: Option<f64>, fallback: f64) -> f64 {
        match (self.outline_resize, zoom) {
            (Some(resize), Some(zoom)) => resize.radius(zoom),
            (Some(resize), None) => resize.min.scale,
            (None, _) => fallback,
        }
    }

    pub fn label_scale(&self, zoom: Option<f64>) -> f64 {
        match (self.label_resize, zoom) {
            (Some(resize), Some(zoom)) => resize.radius(zoom),
            (Some(resize), None) => resize.min.scale,
            (None, _) => 1.0,
        }
    }

    pub fn hides_labels_at(&self, zoom: f64) -> bool {
        self.label_resize.is_some_and(|r| r.hides_at(zoom))
    }
}
