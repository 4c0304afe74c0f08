//! Mesh builders.
//!
//! Every builder is a pure function of (geometry, style) and assumes
//! validated input: rings have at least 3 distinct points, paths are
//! non-empty. Positions are written as `f32` pairs; triangles index vertices.
//!
//! Thickness that changes with zoom is never baked: line and outline meshes
//! carry per-vertex normals and the renderer extrudes them with a width
//! uniform, so a resize touches one uniform instead of the topology.

pub mod line;
pub mod marker;
pub mod polygon;
pub mod wellbore;

pub use line::*;
pub use marker::*;
pub use polygon::*;
pub use wellbore::*;

use foundation::math::Vec2;

/// Plain triangle mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<f32>,
    pub triangles: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 2
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    pub fn push_vertex(&mut self, p: Vec2) -> u32 {
        let index = self.vertex_count() as u32;
        self.vertices.extend_from_slice(&p.to_f32());
        index
    }

    pub fn vertex(&self, index: usize) -> Vec2 {
        Vec2::new(
            self.vertices[index * 2] as f64,
            self.vertices[index * 2 + 1] as f64,
        )
    }

    /// Append `other`, offsetting its indices past the current vertices.
    pub fn append(&mut self, other: &MeshData) {
        let base = self.vertex_count() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.triangles.extend(other.triangles.iter().map(|t| t + base));
    }
}

/// Triangle mesh whose vertices are extruded along `normals` by a width
/// uniform at draw time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshNormalData {
    pub vertices: Vec<f32>,
    pub normals: Vec<f32>,
    pub triangles: Vec<u32>,
}

impl MeshNormalData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 2
    }

    pub fn normal(&self, index: usize) -> Vec2 {
        Vec2::new(
            self.normals[index * 2] as f64,
            self.normals[index * 2 + 1] as f64,
        )
    }

    /// Bake the extrusion for a fixed `half_width`.
    pub fn extrude(&self, half_width: f64) -> MeshData {
        let mut vertices = Vec::with_capacity(self.vertices.len());
        for i in 0..self.vertex_count() {
            let p = Vec2::new(self.vertices[i * 2] as f64, self.vertices[i * 2 + 1] as f64);
            vertices.extend_from_slice(&(p + self.normal(i) * half_width).to_f32());
        }
        MeshData {
            vertices,
            triangles: self.triangles.clone(),
        }
    }
}

/// Per-vertex coloured mesh used for markers that are redrawn rather than
/// re-uniformed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColoredMeshData {
    pub vertices: Vec<f32>,
    /// RGBA, four floats per vertex.
    pub colors: Vec<f32>,
    pub triangles: Vec<u32>,
}

impl ColoredMeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 2
    }

    pub fn append(&mut self, mesh: &MeshData, color: [f32; 4]) {
        let base = self.vertex_count() as u32;
        self.vertices.extend_from_slice(&mesh.vertices);
        for _ in 0..mesh.vertex_count() {
            self.colors.extend_from_slice(&color);
        }
        self.triangles.extend(mesh.triangles.iter().map(|t| t + base));
    }
}

/// Quad with `[0, 1]` UVs; the root shader turns it into a shaded disc.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuadMeshData {
    pub vertices: Vec<f32>,
    pub uvs: Vec<f32>,
    pub triangles: Vec<u32>,
}

/// Axis-aligned quad of half extent `radius` around `center`.
pub fn root_quad(center: Vec2, radius: f64) -> QuadMeshData {
    let corners = [
        Vec2::new(center.x - radius, center.y - radius),
        Vec2::new(center.x + radius, center.y - radius),
        Vec2::new(center.x - radius, center.y + radius),
        Vec2::new(center.x + radius, center.y + radius),
    ];
    let mut vertices = Vec::with_capacity(8);
    for c in corners {
        vertices.extend_from_slice(&c.to_f32());
    }
    QuadMeshData {
        vertices,
        uvs: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        triangles: vec![0, 1, 2, 1, 3, 2],
    }
}
