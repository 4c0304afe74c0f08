use crate::math::Vec2;

/// Axis-aligned bounding box in projected space.
///
/// An empty box has `min > max` and contains nothing; expanding it by a point
/// yields a degenerate box around that point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    pub fn empty() -> Self {
        Aabb2 {
            min: [f64::INFINITY, f64::INFINITY],
            max: [f64::NEG_INFINITY, f64::NEG_INFINITY],
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec2>) -> Self {
        let mut out = Self::empty();
        for p in points {
            out.expand_point(*p);
        }
        out
    }

    /// Box centred on `center` with half extent `radius` in both axes.
    pub fn around(center: Vec2, radius: f64) -> Self {
        Aabb2 {
            min: [center.x - radius, center.y - radius],
            max: [center.x + radius, center.y + radius],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1]
    }

    pub fn expand_point(&mut self, p: Vec2) {
        self.min[0] = self.min[0].min(p.x);
        self.min[1] = self.min[1].min(p.y);
        self.max[0] = self.max[0].max(p.x);
        self.max[1] = self.max[1].max(p.y);
    }

    pub fn union(&self, other: &Aabb2) -> Aabb2 {
        Aabb2 {
            min: [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            max: [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        }
    }

    pub fn inflate(&self, amount: f64) -> Aabb2 {
        Aabb2 {
            min: [self.min[0] - amount, self.min[1] - amount],
            max: [self.max[0] + amount, self.max[1] + amount],
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min[0] && p.x <= self.max[0] && p.y >= self.min[1] && p.y <= self.max[1]
    }

    pub fn intersects(&self, other: &Aabb2) -> bool {
        self.min[0] <= other.max[0]
            && self.max[0] >= other.min[0]
            && self.min[1] <= other.max[1]
            && self.max[1] >= other.min[1]
    }

    pub fn width(&self) -> f64 {
        (self.max[0] - self.min[0]).max(0.0)
    }

    pub fn height(&self) -> f64 {
        (self.max[1] - self.min[1]).max(0.0)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb2;
    use crate::math::Vec2;

    #[test]
    fn from_points_covers_all_points() {
        let pts = [Vec2::new(1.0, 5.0), Vec2::new(-2.0, 3.0), Vec2::new(4.0, -1.0)];
        let b = Aabb2::from_points(&pts);
        assert_eq!(b, Aabb2::new([-2.0, -1.0], [4.0, 5.0]));
        assert!(pts.iter().all(|p| b.contains(*p)));
        assert_eq!(b.center(), Vec2::new(1.0, 2.0));
    }

    #[test]
    fn empty_box_contains_nothing() {
        let b = Aabb2::empty();
        assert!(b.is_empty());
        assert!(!b.contains(Vec2::ZERO));
        assert_eq!(b.width(), 0.0);
    }

    #[test]
    fn intersection_is_inclusive_on_edges() {
        let a = Aabb2::new([0.0, 0.0], [1.0, 1.0]);
        let b = Aabb2::new([1.0, 1.0], [2.0, 2.0]);
        let c = Aabb2::new([1.5, 1.5], [2.0, 2.0]);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.inflate(0.5).intersects(&c));
    }
}
