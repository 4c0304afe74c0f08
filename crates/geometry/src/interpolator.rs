use foundation::math::Vec2;

use crate::error::GeometryError;

/// A sampled position along a path.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SegmentPoint {
    pub position: Vec2,
    /// Unit tangent of the segment the point falls on.
    pub direction: Vec2,
    /// Arc length from the start of the path, in projected units.
    pub distance: f64,
    /// `distance / length`, in `[0, 1]`.
    pub relative: f64,
}

/// Arc-length addressable polyline.
///
/// Consecutive duplicate vertices are dropped on construction so every stored
/// segment has a non-zero length. A path whose vertices all lie within
/// `point_threshold` of the first vertex is a single point; every query then
/// answers with that point and a zero direction.
#[derive(Debug, Clone)]
pub struct PathInterpolator {
    points: Vec<Vec2>,
    cumulative: Vec<f64>,
    length: f64,
    single_point: bool,
}

impl PathInterpolator {
    pub fn new(points: &[Vec2], point_threshold: f64) -> Result<Self, GeometryError> {
        let Some(&first) = points.first() else {
            return Err(GeometryError::EmptyPath);
        };
        if let Some(index) = points.iter().position(|p| !p.is_finite()) {
            return Err(GeometryError::NonFiniteCoordinate { index });
        }

        let mut kept: Vec<Vec2> = Vec::with_capacity(points.len());
        kept.push(first);
        for &p in &points[1..] {
            if kept.last() != Some(&p) {
                kept.push(p);
            }
        }

        let single_point =
            kept.len() == 1 || kept.iter().all(|p| p.distance(first) <= point_threshold);
        if single_point {
            return Ok(Self {
                points: vec![first],
                cumulative: vec![0.0],
                length: 0.0,
                single_point: true,
            });
        }

        let mut cumulative = Vec::with_capacity(kept.len());
        let mut acc = 0.0;
        cumulative.push(acc);
        for w in kept.windows(2) {
            acc += w[0].distance(w[1]);
            cumulative.push(acc);
        }

        Ok(Self {
            points: kept,
            cumulative,
            length: acc,
            single_point: false,
        })
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn first(&self) -> Vec2 {
        self.points[0]
    }

    pub fn last(&self) -> Vec2 {
        self.points[self.points.len() - 1]
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn is_single_point(&self) -> bool {
        self.single_point
    }

    /// Cumulative arc length at each stored vertex. Non-decreasing.
    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    /// Point at relative position `t` (clamped to `[0, 1]`).
    pub fn get_point(&self, t: f64) -> SegmentPoint {
        self.get_point_at_distance(t.clamp(0.0, 1.0) * self.length)
    }

    /// Point at absolute arc length `d` (clamped to `[0, length]`).
    pub fn get_point_at_distance(&self, d: f64) -> SegmentPoint {
        if self.single_point {
            return SegmentPoint {
                position: self.points[0],
                direction: Vec2::ZERO,
                distance: 0.0,
                relative: 0.0,
            };
        }

        let d = d.clamp(0.0, self.length);
        let last_segment = self.points.len() - 2;
        let i = self
            .cumulative
            .partition_point(|c| *c <= d)
            .saturating_sub(1)
            .min(last_segment);

        let a = self.points[i];
        let b = self.points[i + 1];
        let seg_len = self.cumulative[i + 1] - self.cumulative[i];
        let local = (d - self.cumulative[i]) / seg_len;
        let position = if local <= 0.0 {
            a
        } else if local >= 1.0 {
            b
        } else {
            a.lerp(b, local)
        };

        SegmentPoint {
            position,
            direction: (b - a).normalized(),
            distance: d,
            relative: d / self.length,
        }
    }

    /// Point `d` units before the end of the path.
    pub fn get_point_from_end(&self, d: f64) -> SegmentPoint {
        self.get_point_at_distance(self.length - d)
    }

    /// Sub-polyline between relative positions `t0` and `t1`.
    ///
    /// Starts and ends with synthesized points at exactly `t0` and `t1` and
    /// includes every stored vertex strictly between them. Always has at
    /// least two points; arguments given in reverse order are swapped.
    pub fn get_section(&self, t0: f64, t1: f64) -> Vec<SegmentPoint> {
        let (t0, t1) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
        let start = self.get_point(t0);
        let end = self.get_point(t1);
        if self.single_point {
            return vec![start, end];
        }

        let mut out = vec![start];
        for (i, &c) in self.cumulative.iter().enumerate() {
            if c <= start.distance {
                continue;
            }
            if c >= end.distance {
                break;
            }
            // Interior vertices carry the tangent of their outgoing segment.
            let direction = (self.points[i + 1] - self.points[i]).normalized();
            out.push(SegmentPoint {
                position: self.points[i],
                direction,
                distance: c,
                relative: c / self.length,
            });
        }
        out.push(end);
        out
    }

    /// Closest point on the path to `p`, as `(relative position, distance to path)`.
    pub fn project(&self, p: Vec2) -> (f64, f64) {
        if self.single_point {
            return (0.0, p.distance(self.points[0]));
        }

        let mut best = (0.0, f64::INFINITY);
        for (i, w) in self.points.windows(2).enumerate() {
            let (a, b) = (w[0], w[1]);
            let ab = b - a;
            let t = ((p - a).dot(ab) / ab.dot(ab)).clamp(0.0, 1.0);
            let dist = p.distance(a.lerp(b, t));
            if dist < best.1 {
                let along = self.cumulative[i] + t * (self.cumulative[i + 1] - self.cumulative[i]);
                best = (along / self.length, dist);
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::PathInterpolator;
    use crate::error::GeometryError;
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;

    fn l_path() -> PathInterpolator {
        // 3 units right, then 4 units up: total length 7.
        PathInterpolator::new(
            &[Vec2::new(0.0, 0.0), Vec2::new(3.0, 0.0), Vec2::new(3.0, 4.0)],
            0.0,
        )
        .unwrap()
    }

    #[test]
    fn empty_path_is_rejected() {
        assert_eq!(PathInterpolator::new(&[], 0.0).unwrap_err(), GeometryError::EmptyPath);
        let nan = [Vec2::new(0.0, 0.0), Vec2::new(f64::NAN, 1.0)];
        assert_eq!(
            PathInterpolator::new(&nan, 0.0).unwrap_err(),
            GeometryError::NonFiniteCoordinate { index: 1 }
        );
    }

    #[test]
    fn endpoints_match_first_and_last_vertex() {
        let path = l_path();
        assert_eq!(path.length(), 7.0);
        assert_eq!(path.get_point(0.0).position, Vec2::new(0.0, 0.0));
        assert_eq!(path.get_point(1.0).position, Vec2::new(3.0, 4.0));
        assert_eq!(path.get_point_at_distance(7.0).position, Vec2::new(3.0, 4.0));
        assert_eq!(path.get_point(-1.0).position, Vec2::new(0.0, 0.0));
        assert_eq!(path.get_point(2.0).relative, 1.0);
    }

    #[test]
    fn direction_is_the_unit_tangent_of_the_segment() {
        let path = l_path();
        let p = path.get_point_at_distance(1.5);
        assert_eq!(p.position, Vec2::new(1.5, 0.0));
        assert_eq!(p.direction, Vec2::new(1.0, 0.0));
        assert_eq!(p.distance, 1.5);

        let q = path.get_point_at_distance(5.0);
        assert_eq!(q.position, Vec2::new(3.0, 2.0));
        assert_eq!(q.direction, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn cumulative_distance_is_monotonic_and_skips_duplicates() {
        let path = PathInterpolator::new(
            &[
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(2.0, 0.0),
            ],
            0.0,
        )
        .unwrap();
        assert_eq!(path.points().len(), 3);
        assert_eq!(path.cumulative(), &[0.0, 1.0, 2.0]);
        assert!(path.cumulative().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn section_includes_interior_vertices_and_exact_endpoints() {
        let path = l_path();
        let full = path.get_section(0.0, 1.0);
        let pos: Vec<Vec2> = full.iter().map(|p| p.position).collect();
        assert_eq!(
            pos,
            vec![Vec2::new(0.0, 0.0), Vec2::new(3.0, 0.0), Vec2::new(3.0, 4.0)]
        );

        let part = path.get_section(1.0 / 7.0, 2.0 / 7.0);
        assert_eq!(part.len(), 2);
        assert!((part[0].position.x - 1.0).abs() < 1e-12);
        assert!((part[1].position.x - 2.0).abs() < 1e-12);

        let reversed = path.get_section(1.0, 0.0);
        assert_eq!(reversed.len(), 3);
    }

    #[test]
    fn single_point_paths_answer_with_the_point() {
        let path = PathInterpolator::new(
            &[Vec2::new(5.0, 5.0), Vec2::new(5.1, 5.0), Vec2::new(5.0, 5.05)],
            0.5,
        )
        .unwrap();
        assert!(path.is_single_point());
        assert_eq!(path.get_point(0.7).position, Vec2::new(5.0, 5.0));
        assert_eq!(path.get_point(0.7).direction, Vec2::ZERO);
        assert_eq!(path.get_section(0.0, 1.0).len(), 2);
        assert_eq!(path.get_point_from_end(1.0).position, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn point_from_end_measures_back_along_the_path() {
        let path = l_path();
        assert_eq!(path.get_point_from_end(1.0).position, Vec2::new(3.0, 3.0));
        assert_eq!(path.get_point_from_end(100.0).position, Vec2::new(0.0, 0.0));
    }

    #[test]
    fn project_finds_the_closest_relative_position() {
        let path = l_path();
        let (rel, dist) = path.project(Vec2::new(4.0, 3.5));
        assert!((rel - 6.5 / 7.0).abs() < 1e-12);
        assert!((dist - 1.0).abs() < 1e-12);
    }
}
