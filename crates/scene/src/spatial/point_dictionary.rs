use foundation::FeatureId;
use foundation::bounds::Aabb2;
use foundation::math::Vec2;

use super::grid::UniformGrid;
use super::{Hit, Nearest};

/// Point proximity lookup over several grids of increasing cell size.
///
/// Every point is stored in every tier. A query with radius `r` runs on the
/// finest tier whose cells are at least `r` wide, so it inspects at most a
/// 3x3 block of cells; radii larger than the coarsest tier fall back to it.
#[derive(Debug, Clone)]
pub struct PointDictionary<V> {
    tiers: Vec<UniformGrid>,
    points: Vec<(FeatureId, Vec2)>,
    values: Vec<V>,
}

impl<V> PointDictionary<V> {
    /// `tiers` grids with cell sizes spaced geometrically from `min_cell` to
    /// `max_cell`.
    pub fn new(min_cell: f64, max_cell: f64, tiers: usize) -> Self {
        Self {
            tiers: tier_sizes(min_cell, max_cell, tiers)
                .into_iter()
                .map(UniformGrid::new)
                .collect(),
            points: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn insert(&mut self, value: V) -> FeatureId {
        let id = FeatureId::from_index(self.values.len());
        self.values.push(value);
        id
    }

    pub fn add(&mut self, p: Vec2, value: V) -> FeatureId {
        let id = self.insert(value);
        self.add_point(id, p);
        id
    }

    pub fn add_point(&mut self, id: FeatureId, p: Vec2) {
        debug_assert!(id.index() < self.values.len(), "unknown feature id {id}");
        let entry = self.points.len() as u32;
        self.points.push((id, p));
        let bounds = Aabb2::around(p, 0.0);
        for tier in &mut self.tiers {
            tier.insert(entry, &bounds);
        }
    }

    /// Cell size of every tier, finest first.
    pub fn tier_sizes(&self) -> Vec<f64> {
        self.tiers.iter().map(UniformGrid::cell_size).collect()
    }

    fn tier_for(&self, radius: f64) -> Option<&UniformGrid> {
        self.tiers
            .iter()
            .find(|t| t.cell_size() >= radius)
            .or_else(|| self.tiers.last())
    }

    /// Feature with the point nearest to `p`, if within `max_distance`.
    pub fn get_closest_under(&self, p: Vec2, max_distance: f64) -> Option<Hit<'_, V>> {
        let tier = self.tier_for(max_distance)?;
        let mut nearest = Nearest::new();
        for entry in tier.candidates(&Aabb2::around(p, max_distance)) {
            let (id, q) = self.points[entry as usize];
            let d = p.distance(q);
            if d <= max_distance {
                nearest.offer(d, id);
            }
        }
        let (distance, id) = nearest.get()?;
        Some(Hit {
            id,
            value: &self.values[id.index()],
            distance,
        })
    }

    pub fn query_aabb(&self, bounds: &Aabb2) -> Vec<FeatureId> {
        let Some(tier) = self.tiers.last() else {
            return Vec::new();
        };
        let mut ids: Vec<FeatureId> = tier
            .candidates(bounds)
            .into_iter()
            .map(|entry| self.points[entry as usize])
            .filter(|(_, q)| bounds.contains(*q))
            .map(|(id, _)| id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub fn get(&self, id: FeatureId) -> Option<&V> {
        self.values.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        for tier in &mut self.tiers {
            tier.clear();
        }
        self.points.clear();
        self.values.clear();
    }
}

fn tier_sizes(min_cell: f64, max_cell: f64, tiers: usize) -> Vec<f64> {
    let tiers = tiers.max(1);
    if tiers == 1 || max_cell <= min_cell {
        return vec![min_cell.max(max_cell)];
    }
    let ratio = (max_cell / min_cell).powf(1.0 / (tiers - 1) as f64);
    (0..tiers)
        .map(|i| if i + 1 == tiers { max_cell } else { min_cell * ratio.powi(i as i32) })
        .collect()
}
