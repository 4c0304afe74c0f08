//! Static spatial indices used for pointer hit-testing and render culling.
//!
//! Each dictionary assigns dense [`FeatureId`]s in insertion order and maps a
//! feature's footprint (triangles, segments or points) back to a lightweight
//! value. A feature may own several footprints (multi-part geometry); they
//! share one id. The dictionaries are rebuilt wholesale when features change.
//!
//! Ordering contract, shared by all three:
//! - ties (overlapping triangles, equidistant segments or points) resolve to
//!   the lower `FeatureId`, so the grid walk order never leaks into results;
//! - `query_aabb` returns ids in ascending order without duplicates;
//! - queries on an empty dictionary return `None` / an empty list.

pub mod grid;
pub mod line_dictionary;
pub mod point_dictionary;
pub mod triangle_dictionary;

pub use grid::*;
pub use line_dictionary::*;
pub use point_dictionary::*;
pub use triangle_dictionary::*;

use foundation::FeatureId;

/// Result of a dictionary query.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Hit<'a, V> {
    pub id: FeatureId,
    pub value: &'a V,
    /// Distance from the query point to the footprint; 0 inside polygons.
    pub distance: f64,
}

/// Keeps the best candidate under the shared tie-break rule.
#[derive(Debug, Copy, Clone)]
pub(crate) struct Nearest {
    best: Option<(f64, FeatureId)>,
}

impl Nearest {
    pub(crate) fn new() -> Self {
        Self { best: None }
    }

    pub(crate) fn offer(&mut self, distance: f64, id: FeatureId) {
        let better = match self.best {
            None => true,
            Some((d, best_id)) => distance < d || (distance == d && id < best_id),
        };
        if better {
            self.best = Some((distance, id));
        }
    }

    pub(crate) fn get(self) -> Option<(f64, FeatureId)> {
        self.best
    }
}
