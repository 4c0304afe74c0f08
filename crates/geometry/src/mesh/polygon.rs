use earcutr::earcut;
use foundation::math::Vec2;

use super::line::{ribbon, vertex_normals};
use super::{MeshData, MeshNormalData};
use crate::error::GeometryError;

/// Triangulate a polygon given as an outer ring plus optional holes.
///
/// A closing vertex equal to the first is dropped from every ring. Vertices
/// are emitted ring by ring, so triangle indices below the outer ring's
/// length refer to outer-ring vertices.
pub fn polygon(rings: &[Vec<Vec2>]) -> Result<MeshData, GeometryError> {
    let Some(outer) = rings.first() else {
        return Err(GeometryError::DegenerateRing { points: 0 });
    };
    let outer_len = open_ring(outer).len();
    if outer_len < 3 {
        return Err(GeometryError::DegenerateRing { points: outer_len });
    }

    let mut coords: Vec<f64> = Vec::new();
    let mut hole_indices: Vec<usize> = Vec::new();
    for (ring_i, ring) in rings.iter().enumerate() {
        let ring = open_ring(ring);
        if ring_i > 0 {
            if ring.len() < 3 {
                continue;
            }
            hole_indices.push(coords.len() / 2);
        }
        for p in ring {
            coords.push(p.x);
            coords.push(p.y);
        }
    }

    let indices = match earcut(&coords, &hole_indices, 2) {
        Ok(ix) => ix,
        Err(_) => return Err(GeometryError::Triangulation),
    };

    Ok(MeshData {
        vertices: coords.iter().map(|c| *c as f32).collect(),
        triangles: indices.into_iter().map(|i| i as u32).collect(),
    })
}

/// Closed outline of a ring with mitered normals for shader extrusion.
pub fn polygon_outline(ring: &[Vec2]) -> MeshNormalData {
    let ring = open_ring(ring);
    debug_assert!(ring.len() >= 3, "polygon_outline expects at least 3 points");
    ribbon(ring, &vertex_normals(ring, true), true)
}

/// The ring without a closing duplicate of its first vertex.
pub fn open_ring(ring: &[Vec2]) -> &[Vec2] {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() >= 2 && first.distance(*last) < 1e-9 => {
            &ring[..ring.len() - 1]
        }
        _ => ring,
    }
}
