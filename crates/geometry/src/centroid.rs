use foundation::math::Vec2;

use crate::mesh::MeshData;

/// Area-weighted centre of a triangulated polygon and its total area.
///
/// Returns the plain vertex average with zero mass when every triangle is
/// degenerate, and `None` for a mesh without vertices.
pub fn center_of_mass(mesh: &MeshData) -> Option<(Vec2, f64)> {
    if mesh.vertex_count() == 0 {
        return None;
    }

    let mut weighted = Vec2::ZERO;
    let mut mass = 0.0;
    for t in mesh.triangles.chunks_exact(3) {
        let a = mesh.vertex(t[0] as usize);
        let b = mesh.vertex(t[1] as usize);
        let c = mesh.vertex(t[2] as usize);
        let area = ((b - a).cross(c - a) * 0.5).abs();
        weighted = weighted + (a + b + c) * (area / 3.0);
        mass += area;
    }

    if mass > 0.0 {
        return Some((weighted * (1.0 / mass), mass));
    }

    let n = mesh.vertex_count();
    let sum = (0..n).fold(Vec2::ZERO, |acc, i| acc + mesh.vertex(i));
    Some((sum * (1.0 / n as f64), 0.0))
}
