use foundation::math::Vec2;

use super::{MeshData, MeshNormalData};

/// Longest miter, relative to the unit normal, before a corner is clipped.
const MAX_MITER: f64 = 2.0;

/// Mitered per-vertex normals of a polyline.
///
/// Each normal is scaled so that an extrusion by `w` keeps both adjacent
/// edges at distance `w`, up to `MAX_MITER`. With `closed` the first and last
/// vertices are joined.
pub fn vertex_normals(points: &[Vec2], closed: bool) -> Vec<Vec2> {
    let n = points.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let prev = if i > 0 {
            Some(points[i - 1])
        } else if closed {
            Some(points[n - 1])
        } else {
            None
        };
        let next = if i + 1 < n {
            Some(points[i + 1])
        } else if closed {
            Some(points[0])
        } else {
            None
        };

        let n_in = prev.map(|p| (points[i] - p).normalized().rotate90());
        let n_out = next.map(|p| (p - points[i]).normalized().rotate90());
        out.push(join_normals(n_in, n_out));
    }
    out
}

pub(crate) fn join_normals(n_in: Option<Vec2>, n_out: Option<Vec2>) -> Vec2 {
    match (n_in, n_out) {
        (Some(a), Some(b)) => {
            let sum = a + b;
            if sum.length() < 1e-9 {
                // Path folds back on itself.
                return if b == Vec2::ZERO { a } else { b };
            }
            let n = sum.normalized();
            let reference = if b == Vec2::ZERO { a } else { b };
            let d = n.dot(reference);
            if d <= 0.0 {
                return n;
            }
            n.scale((1.0 / d).min(MAX_MITER))
        }
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => Vec2::ZERO,
    }
}

/// Open polyline with normals for shader-side extrusion.
///
/// Every point emits two vertices at the same position with opposite
/// normals; consecutive pairs are joined by two triangles.
pub fn simple_line(points: &[Vec2]) -> MeshNormalData {
    ribbon(points, &vertex_normals(points, false), false)
}

pub(crate) fn ribbon(points: &[Vec2], normals: &[Vec2], closed: bool) -> MeshNormalData {
    let n = points.len();
    let mut out = MeshNormalData::default();
    for (p, normal) in points.iter().zip(normals) {
        out.vertices.extend_from_slice(&p.to_f32());
        out.vertices.extend_from_slice(&p.to_f32());
        out.normals.extend_from_slice(&normal.to_f32());
        out.normals.extend_from_slice(&(-*normal).to_f32());
    }

    let edges = if closed { n } else { n.saturating_sub(1) };
    for i in 0..edges {
        let a = (i * 2) as u32;
        let b = (((i + 1) % n) * 2) as u32;
        out.triangles.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
    }
    out
}

/// Bake a stroke of total `width` around a polyline.
pub fn stroke(points: &[Vec2], closed: bool, width: f64) -> MeshData {
    ribbon(points, &vertex_normals(points, closed), closed).extrude(width * 0.5)
}
