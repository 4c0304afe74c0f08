use foundation::FeatureId;
use foundation::bounds::Aabb2;
use foundation::math::Vec2;

use super::grid::UniformGrid;
use super::{Hit, Nearest};

#[derive(Debug, Copy, Clone)]
struct Triangle {
    id: FeatureId,
    a: Vec2,
    b: Vec2,
    c: Vec2,
}

/// Polygon lookup by point-in-triangle over a bucket grid.
#[derive(Debug, Clone)]
pub struct TriangleDictionary<V> {
    grid: UniformGrid,
    triangles: Vec<Triangle>,
    values: Vec<V>,
}

impl<V> TriangleDictionary<V> {
    pub fn new(cell_size: f64) -> Self {
        Self {
            grid: UniformGrid::new(cell_size),
            triangles: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Register a feature without footprint; triangles are added with
    /// [`Self::add_triangles`].
    pub fn insert(&mut self, value: V) -> FeatureId {
        let id = FeatureId::from_index(self.values.len());
        self.values.push(value);
        id
    }

    /// Register a feature and its triangulated footprint in one call.
    pub fn add(&mut self, points: &[Vec2], triangles: &[u32], value: V) -> FeatureId {
        let id = self.insert(value);
        self.add_triangles(id, points, triangles);
        id
    }

    /// Add footprint triangles for an existing feature. `triangles` index
    /// into `points`; indices out of range are ignored.
    pub fn add_triangles(&mut self, id: FeatureId, points: &[Vec2], triangles: &[u32]) {
        debug_assert!(id.index() < self.values.len(), "unknown feature id {id}");
        for t in triangles.chunks_exact(3) {
            let (Some(&a), Some(&b), Some(&c)) = (
                points.get(t[0] as usize),
                points.get(t[1] as usize),
                points.get(t[2] as usize),
            ) else {
                continue;
            };
            let entry = self.triangles.len() as u32;
            self.triangles.push(Triangle { id, a, b, c });
            self.grid.insert(entry, &Aabb2::from_points(&[a, b, c]));
        }
    }

    /// Feature whose footprint contains `p` (edges inclusive).
    pub fn get_polygon_at(&self, p: Vec2) -> Option<Hit<'_, V>> {
        let mut nearest = Nearest::new();
        for entry in self.grid.at(p) {
            let tri = &self.triangles[entry as usize];
            if point_in_triangle(p, tri.a, tri.b, tri.c) {
                nearest.offer(0.0, tri.id);
            }
        }
        let (_, id) = nearest.get()?;
        Some(Hit {
            id,
            value: &self.values[id.index()],
            distance: 0.0,
        })
    }

    /// Ids of features with a triangle whose bounds intersect `bounds`.
    pub fn query_aabb(&self, bounds: &Aabb2) -> Vec<FeatureId> {
        let mut ids: Vec<FeatureId> = self
            .grid
            .candidates(bounds)
            .into_iter()
            .map(|entry| &self.triangles[entry as usize])
            .filter(|t| Aabb2::from_points(&[t.a, t.b, t.c]).intersects(bounds))
            .map(|t| t.id)
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
        self.triangles.clear();
        self.values.clear();
    }
}

/// Barycentric sign test, inclusive of edges, independent of winding.
pub fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d1 = (b - a).cross(p - a);
    let d2 = (c - b).cross(p - b);
    let d3 = (a - c).cross(p - c);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

#[cfg(test)]
mod tests {
    use super::{TriangleDictionary, point_in_triangle};
    use foundation::FeatureId;
    use foundation::bounds::Aabb2;
    use foundation::math::Vec2;

    fn square(x: f64, y: f64, size: f64) -> Vec<Vec2> {
        vec![
            Vec2::new(x, y),
            Vec2::new(x + size, y),
            Vec2::new(x + size, y + size),
            Vec2::new(x, y + size),
        ]
    }

    const QUAD: [u32; 6] = [0, 1, 2, 0, 2, 3];

    #[test]
    fn point_in_triangle_handles_both_windings() {
        let (a, b, c) = (Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0));
        assert!(point_in_triangle(Vec2::new(0.2, 0.2), a, b, c));
        assert!(point_in_triangle(Vec2::new(0.2, 0.2), a, c, b));
        assert!(point_in_triangle(Vec2::new(0.5, 0.5), a, b, c));
        assert!(!point_in_triangle(Vec2::new(0.6, 0.6), a, b, c));
    }

    #[test]
    fn finds_the_polygon_under_a_point() {
        let mut dict = TriangleDictionary::new(1.2);
        let a = dict.add(&square(0.0, 0.0, 2.0), &QUAD, "a");
        let b = dict.add(&square(5.0, 5.0, 3.0), &QUAD, "b");
        assert_eq!(dict.get_polygon_at(Vec2::new(1.0, 1.5)).map(|h| h.id), Some(a));
        assert_eq!(dict.get_polygon_at(Vec2::new(7.9, 6.0)).map(|h| *h.value), Some("b"));
        assert_eq!(dict.get_polygon_at(Vec2::new(6.0, 6.0)).map(|h| h.id), Some(b));
        assert!(dict.get_polygon_at(Vec2::new(3.5, 3.5)).is_none());
        assert!(dict.get_polygon_at(Vec2::new(-100.0, 40.0)).is_none());
    }

    #[test]
    fn empty_dictionary_misses() {
        let dict: TriangleDictionary<()> = TriangleDictionary::new(1.0);
        assert!(dict.get_polygon_at(Vec2::ZERO).is_none());
        assert!(dict.query_aabb(&Aabb2::around(Vec2::ZERO, 10.0)).is_empty());
    }

    #[test]
    fn overlaps_resolve_to_the_lower_id_regardless_of_insertion() {
        let mut forward = TriangleDictionary::new(1.0);
        let first = forward.insert("first");
        let second = forward.insert("second");
        forward.add_triangles(second, &square(1.0, 1.0, 2.0), &QUAD);
        forward.add_triangles(first, &square(0.0, 0.0, 2.0), &QUAD);

        let mut backward = TriangleDictionary::new(1.0);
        let first_b = backward.insert("first");
        let second_b = backward.insert("second");
        backward.add_triangles(first_b, &square(0.0, 0.0, 2.0), &QUAD);
        backward.add_triangles(second_b, &square(1.0, 1.0, 2.0), &QUAD);

        let p = Vec2::new(1.5, 1.5);
        assert_eq!(forward.get_polygon_at(p).map(|h| h.id), Some(FeatureId(0)));
        assert_eq!(backward.get_polygon_at(p).map(|h| h.id), Some(FeatureId(0)));
    }

    #[test]
    fn multi_part_features_share_one_id() {
        let mut dict = TriangleDictionary::new(2.0);
        let id = dict.insert(42);
        dict.add_triangles(id, &square(0.0, 0.0, 1.0), &QUAD);
        dict.add_triangles(id, &square(10.0, 10.0, 1.0), &QUAD);
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get_polygon_at(Vec2::new(10.5, 10.5)).map(|h| h.id), Some(id));
        assert_eq!(dict.query_aabb(&Aabb2::new([-1.0, -1.0], [20.0, 20.0])), vec![id]);
    }
}
