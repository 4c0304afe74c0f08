use geometry::mesh::TickConfig;
use serde::{Deserialize, Serialize};

use crate::resize::{ResizeConfig, ZoomScale};

/// Optional single-pass simplification of projected paths before meshing.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathReduction {
    pub max_deviation: f64,
    #[serde(default)]
    pub distance_weight: f64,
}

/// Label sizing in projected units at scale 1.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WellboreLabelConfig {
    /// Line height used to stack labels under a root.
    pub height: f64,
    /// Gap between the root centre and the first stacked label.
    pub root_displacement: f64,
}

impl Default for WellboreLabelConfig {
    fn default() -> Self {
        Self {
            height: 13.0,
            root_displacement: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WellboreConfig {
    /// Reference width meshes are built at; the radius uniform rescales them.
    pub wellbore_width: f64,
    pub root_radius: f64,
    pub tick: TickConfig,
    /// Paths shorter than this collapse to a single point.
    pub point_threshold: f64,
    /// Roots closer than this are merged.
    pub root_merge_distance: f64,
    /// Maximum pointer distance to a path for it to count as hit.
    pub hit_distance: f64,
    pub reduction: Option<PathReduction>,
    pub wellbore_resize: ResizeConfig,
    pub root_resize: ResizeConfig,
    pub label_resize: ResizeConfig,
    pub label: WellboreLabelConfig,
    /// Groups whose sidetrack branches (`T<n>`) are raised above the main bore.
    pub sidetrack_group: String,
}

impl Default for WellboreConfig {
    fn default() -> Self {
        Self {
            wellbore_width: 0.2,
            root_radius: 0.5,
            tick: TickConfig::default(),
            point_threshold: 0.01,
            root_merge_distance: 0.0005,
            hit_distance: 0.5,
            reduction: None,
            wellbore_resize: ResizeConfig::new(ZoomScale::new(14.0, 0.2), ZoomScale::new(18.0, 0.015)),
            root_resize: ResizeConfig::new(ZoomScale::new(14.0, 0.5), ZoomScale::new(18.0, 0.05)),
            label_resize: ResizeConfig::new(ZoomScale::new(14.0, 0.07), ZoomScale::new(18.0, 0.0057)),
            label: WellboreLabelConfig::default(),
            sidetrack_group: "drilled".to_string(),
        }
    }
}
