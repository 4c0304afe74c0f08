use foundation::FeatureId;
use foundation::bounds::Aabb2;
use foundation::math::Vec2;

use super::grid::UniformGrid;
use super::{Hit, Nearest};

#[derive(Debug, Copy, Clone)]
struct Segment {
    id: FeatureId,
    a: Vec2,
    b: Vec2,
}

/// Polyline proximity lookup over a bucket grid.
#[derive(Debug, Clone)]
pub struct LineDictionary<V> {
    grid: UniformGrid,
    segments: Vec<Segment>,
    values: Vec<V>,
}

impl<V> LineDictionary<V> {
    pub fn new(cell_size: f64) -> Self {
        Self {
            grid: UniformGrid::new(cell_size),
            segments: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn insert(&mut self, value: V) -> FeatureId {
        let id = FeatureId::from_index(self.values.len());
        self.values.push(value);
        id
    }

    pub fn add(&mut self, points: &[Vec2], value: V) -> FeatureId {
        let id = self.insert(value);
        self.add_line(id, points);
        id
    }

    /// Add a polyline footprint for an existing feature. A single point is
    /// stored as a zero-length segment.
    pub fn add_line(&mut self, id: FeatureId, points: &[Vec2]) {
        debug_assert!(id.index() < self.values.len(), "unknown feature id {id}");
        match points {
            [] => {}
            [p] => self.push_segment(id, *p, *p),
            _ => {
                for w in points.windows(2) {
                    self.push_segment(id, w[0], w[1]);
                }
            }
        }
    }

    fn push_segment(&mut self, id: FeatureId, a: Vec2, b: Vec2) {
        let entry = self.segments.len() as u32;
        self.segments.push(Segment { id, a, b });
        self.grid.insert(entry, &Aabb2::from_points(&[a, b]));
    }

    /// Feature with the segment nearest to `p`, if within `max_distance`.
    pub fn get_closest(&self, p: Vec2, max_distance: f64) -> Option<Hit<'_, V>> {
        let mut nearest = Nearest::new();
        for entry in self.grid.candidates(&Aabb2::around(p, max_distance)) {
            let seg = &self.segments[entry as usize];
            let d = distance_to_segment(p, seg.a, seg.b);
            if d <= max_distance {
                nearest.offer(d, seg.id);
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
        let mut ids: Vec<FeatureId> = self
            .grid
            .candidates(bounds)
            .into_iter()
            .map(|entry| &self.segments[entry as usize])
            .filter(|s| Aabb2::from_points(&[s.a, s.b]).intersects(bounds))
            .map(|s| s.id)
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
        self.grid.clear();
        self.segments.clear();
        self.values.clear();
    }
}

pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f64 {
    let ab = b - a;
    let len2 = ab.dot(ab);
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
