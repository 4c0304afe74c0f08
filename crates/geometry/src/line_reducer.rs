//! Forward-pass polyline simplification.
//!
//! This is not Douglas-Peucker: the reducer walks the path once and never
//! revisits a kept vertex, so the result depends on traversal order. It is
//! O(n) and good enough for survey paths, which are dense and smooth.

use foundation::math::Vec2;

/// Drop vertices that stay within a tolerance band around the current
/// reference segment.
///
/// The first two points are kept and form the reference segment. For every
/// later point `p` the displacement from the segment end is split into an
/// along-axis and a perpendicular component in the segment's local frame.
/// When the perpendicular component exceeds
/// `max_deviation + |along| * distance_weight`, `p` is kept and the reference
/// segment advances to `(end, p)`. Otherwise `p` is discarded and the
/// reference stays put. The last point is always kept.
///
/// The reference end is always the last emitted point. A zero-length
/// reference has no frame, so its end is replaced by `p` instead.
///
/// Inputs shorter than 3 points are returned unchanged.
pub fn reduce(points: &[Vec2], max_deviation: f64, distance_weight: f64) -> Vec<Vec2> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut out = Vec::with_capacity(points.len());
    out.extend_from_slice(&points[..2]);

    let mut start = points[0];
    let mut end = points[1];

    for &p in &points[2..] {
        let axis = end - start;
        let axis_len = axis.length();
        if axis_len == 0.0 {
            end = p;
            if let Some(last) = out.last_mut() {
                *last = p;
            }
            continue;
        }

        let u = axis.scale(1.0 / axis_len);
        let local = p - end;
        let along = local.dot(u);
        let perpendicular = u.cross(local).abs();

        if perpendicular > max_deviation + along.abs() * distance_weight {
            out.push(p);
            start = end;
            end = p;
        }
    }

    let last = points[points.len() - 1];
    if out.last() != Some(&last) {
        out.push(last);
    }
    out
}
