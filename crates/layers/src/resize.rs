use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomScale {
    pub zoom: f64,
    pub scale: f64,
}

impl ZoomScale {
    pub const fn new(zoom: f64, scale: f64) -> Self {
        Self { zoom, scale }
    }
}

/// Piecewise-linear zoom to scale curve, clamped outside `[min.zoom, max.zoom]`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizeConfig {
    pub min: ZoomScale,
    pub max: ZoomScale,
}

impl ResizeConfig {
    pub const fn new(min: ZoomScale, max: ZoomScale) -> Self {
        Self { min, max }
    }

    pub fn radius(&self, zoom: f64) -> f64 {
        get_radius(zoom, self)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelResizeConfig {
    pub min: ZoomScale,
    pub max: ZoomScale,
    /// Label scale when the curve yields 1.
    pub base_scale: f64,
    /// Labels are hidden at or below this zoom.
    #[serde(default)]
    pub threshold: Option<f64>,
}

impl LabelResizeConfig {
    pub fn curve(&self) -> ResizeConfig {
        ResizeConfig::new(self.min, self.max)
    }

    pub fn radius(&self, zoom: f64) -> f64 {
        get_radius(zoom, &self.curve())
    }

    pub fn hides_at(&self, zoom: f64) -> bool {
        self.threshold.is_some_and(|t| zoom <= t)
    }
}

pub fn get_radius(zoom: f64, config: &ResizeConfig) -> f64 {
    let ResizeConfig { min, max } = *config;
    let span = max.zoom - min.zoom;
    if span == 0.0 || !span.is_finite() {
        return if zoom <= min.zoom { min.scale } else { max.scale };
    }
    let t = ((zoom - min.zoom) / span).clamp(0.0, 1.0);
    min.scale + (max.scale - min.scale) * t
}
