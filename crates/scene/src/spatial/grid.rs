use std::collections::HashMap;

use foundation::bounds::Aabb2;
use foundation::math::Vec2;

/// Most cells a single entry may be listed in. Larger entries are kept in a
/// side list that every query scans.
const MAX_ENTRY_CELLS: u64 = 1 << 16;

/// Cells in the inclusive range `(x0, y0)..=(x1, y1)`, saturating.
fn span(x0: i64, y0: i64, x1: i64, y1: i64) -> u64 {
    if x1 < x0 || y1 < y0 {
        return 0;
    }
    let w = x1.abs_diff(x0).saturating_add(1);
    let h = y1.abs_diff(y0).saturating_add(1);
    w.saturating_mul(h)
}

/// Uniform bucket grid over projected space.
///
/// Entries are stored by index into a caller-owned list; an entry whose
/// bounds straddle several cells is listed in each of them.
#[derive(Debug, Clone)]
pub struct UniformGrid {
    cell_size: f64,
    cells: HashMap<(i64, i64), Vec<u32>>,
    oversized: Vec<u32>,
}

impl UniformGrid {
    pub fn new(cell_size: f64) -> Self {
        debug_assert!(cell_size > 0.0, "grid cell size must be positive");
        Self {
            cell_size,
            cells: HashMap::new(),
            oversized: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Cell containing `p`. Coordinates beyond the `i64` range saturate.
    pub fn cell_of(&self, p: Vec2) -> (i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
        )
    }

    fn cell_range(&self, bounds: &Aabb2) -> (i64, i64, i64, i64) {
        let (x0, y0) = self.cell_of(Vec2::new(bounds.min[0], bounds.min[1]));
        let (x1, y1) = self.cell_of(Vec2::new(bounds.max[0], bounds.max[1]));
        (x0, y0, x1, y1)
    }

    pub fn insert(&mut self, entry: u32, bounds: &Aabb2) {
        let (x0, y0, x1, y1) = self.cell_range(bounds);
        if span(x0, y0, x1, y1) > MAX_ENTRY_CELLS {
            self.oversized.push(entry);
            return;
        }
        for x in x0..=x1 {
            for y in y0..=y1 {
                self.cells.entry((x, y)).or_default().push(entry);
            }
        }
    }

    /// Entries listed in the cell containing `p`, then the oversized ones.
    pub fn at(&self, p: Vec2) -> impl Iterator<Item = u32> + '_ {
        self.cells
            .get(&self.cell_of(p))
            .into_iter()
            .flatten()
            .chain(&self.oversized)
            .copied()
    }

    /// Entries listed in any cell touched by `bounds`, sorted and deduplicated.
    pub fn candidates(&self, bounds: &Aabb2) -> Vec<u32> {
        if self.is_empty() || bounds.is_empty() {
            return Vec::new();
        }
        let (x0, y0, x1, y1) = self.cell_range(bounds);

        let mut out = self.oversized.clone();
        if span(x0, y0, x1, y1) > self.cells.len() as u64 {
            // Query spans more cells than exist; walk the occupied ones instead.
            for (&(x, y), entries) in &self.cells {
                if x >= x0 && x <= x1 && y >= y0 && y <= y1 {
                    out.extend_from_slice(entries);
                }
            }
        } else {
            for x in x0..=x1 {
                for y in y0..=y1 {
                    if let Some(entries) = self.cells.get(&(x, y)) {
                        out.extend_from_slice(entries);
                    }
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.oversized.is_empty()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.oversized.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::UniformGrid;
    use foundation::bounds::Aabb2;
    use foundation::math::Vec2;

    #[test]
    fn entries_land_in_every_overlapped_cell() {
        let mut g = UniformGrid::new(1.0);
        g.insert(7, &Aabb2::new([0.5, 0.5], [1.5, 0.7]));
        assert_eq!(g.at(Vec2::new(0.9, 0.6)).collect::<Vec<_>>(), vec![7]);
        assert_eq!(g.at(Vec2::new(1.1, 0.6)).collect::<Vec<_>>(), vec![7]);
        assert_eq!(g.at(Vec2::new(0.5, 1.5)).count(), 0);
    }

    #[test]
    fn negative_coordinates_use_floor_cells() {
        let g = UniformGrid::new(2.0);
        assert_eq!(g.cell_of(Vec2::new(-0.1, -2.0)), (-1, -1));
        assert_eq!(g.cell_of(Vec2::new(0.0, 3.9)), (0, 1));
    }

    #[test]
    fn candidates_are_sorted_and_unique() {
        let mut g = UniformGrid::new(1.0);
        g.insert(3, &Aabb2::new([0.0, 0.0], [2.5, 0.5]));
        g.insert(1, &Aabb2::new([1.0, 0.0], [1.5, 0.5]));
        g.insert(2, &Aabb2::new([9.0, 9.0], [9.5, 9.5]));
        assert_eq!(g.candidates(&Aabb2::new([0.0, 0.0], [3.0, 1.0])), vec![1, 3]);
        assert_eq!(
            g.candidates(&Aabb2::new([-1.0e9, -1.0e9], [1.0e9, 1.0e9])),
            vec![1, 2, 3]
        );
        assert!(g.candidates(&Aabb2::empty()).is_empty());
    }

    #[test]
    fn unbounded_entries_and_queries_stay_finite() {
        let mut g = UniformGrid::new(1.0);
        g.insert(4, &Aabb2::new([0.0, 0.0], [0.5, 0.5]));
        g.insert(9, &Aabb2::new([f64::NEG_INFINITY, 0.0], [f64::INFINITY, 1.0]));
        g.insert(5, &Aabb2::new([-1.0e300, -1.0e300], [1.0e300, 1.0e300]));
        assert_eq!(g.at(Vec2::new(0.2, 0.2)).collect::<Vec<_>>(), vec![4, 9, 5]);
        assert_eq!(g.at(Vec2::new(50.0, -50.0)).collect::<Vec<_>>(), vec![9, 5]);

        let everywhere = Aabb2::new([f64::NEG_INFINITY; 2], [f64::INFINITY; 2]);
        assert_eq!(g.candidates(&everywhere), vec![4, 5, 9]);
        assert_eq!(g.candidates(&Aabb2::new([10.0, 10.0], [11.0, 11.0])), vec![5, 9]);

        g.clear();
        assert!(g.is_empty());
    }
}
