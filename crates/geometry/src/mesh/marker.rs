//! Point markers.
//!
//! Markers behave like immediate-mode graphics: colors are baked into the
//! vertices and emphasis redraws the marker. Image markers are sprites and
//! are emphasized with an outline filter instead.

use std::f64::consts::{FRAC_PI_2, TAU};

use foundation::math::Vec2;
use serde::{Deserialize, Serialize};

use super::line::stroke;
use super::{ColoredMeshData, MeshData};

pub const DEFAULT_POINT_SIZE: f64 = 4.0;
pub const DEFAULT_POLYGON_SIDES: u32 = 3;
pub const DEFAULT_INNER_RADIUS: f64 = 5.0;
pub const DEFAULT_OUTER_RADIUS: f64 = 15.0;
pub const DEFAULT_IMAGE_SCALE: f64 = 0.1;

/// Circles are tessellated as if they were this many times larger, then
/// scaled back, so small markers still get a smooth rim.
const CIRCLE_OVERSAMPLE: f64 = 10.0;
/// Target chord length on the oversampled circle.
const CIRCLE_CHORD: f64 = 8.0;
const CORNER_SEGMENTS: usize = 4;

/// Marker shape. Sizes are half extents / radii in projected units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum PointShape {
    Square {
        #[serde(default = "default_point_size")]
        size: f64,
    },
    Circle {
        #[serde(default = "default_point_size")]
        radius: f64,
    },
    #[serde(alias = "filletrect")]
    RoundedRect {
        #[serde(default = "default_point_size")]
        size: f64,
        #[serde(default = "default_fillet")]
        fillet: f64,
    },
    RegularPolygon {
        #[serde(default = "default_point_size")]
        radius: f64,
        #[serde(default = "default_sides")]
        sides: u32,
        #[serde(default)]
        rotation: f64,
    },
    Torus {
        #[serde(default = "default_inner_radius")]
        inner_radius: f64,
        #[serde(default = "default_outer_radius")]
        outer_radius: f64,
        #[serde(default)]
        start_arc: f64,
        #[serde(default = "default_end_arc")]
        end_arc: f64,
    },
    Image {
        image: String,
        #[serde(default = "default_image_scale")]
        scale: f64,
    },
}

impl Default for PointShape {
    fn default() -> Self {
        PointShape::Square {
            size: DEFAULT_POINT_SIZE,
        }
    }
}

fn default_point_size() -> f64 {
    DEFAULT_POINT_SIZE
}
fn default_fillet() -> f64 {
    1.0
}
fn default_sides() -> u32 {
    DEFAULT_POLYGON_SIDES
}
fn default_inner_radius() -> f64 {
    DEFAULT_INNER_RADIUS
}
fn default_outer_radius() -> f64 {
    DEFAULT_OUTER_RADIUS
}
fn default_end_arc() -> f64 {
    TAU
}
fn default_image_scale() -> f64 {
    DEFAULT_IMAGE_SCALE
}

/// Fill and stroke colors of a marker, RGBA in `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MarkerPaint {
    pub fill: [f32; 4],
    pub line: [f32; 4],
    pub line_width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub image: String,
    pub position: Vec2,
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Marker {
    Geometry(ColoredMeshData),
    Sprite(Sprite),
}

/// Build the marker for `shape` centred on `center`.
pub fn marker(center: Vec2, shape: &PointShape, paint: &MarkerPaint) -> Marker {
    let (fill, rings): (MeshData, Vec<Vec<Vec2>>) = match shape {
        PointShape::Square { size } => {
            let ring = rect_ring(center, *size, 0.0);
            (fan(&ring), vec![ring])
        }
        PointShape::Circle { radius } => {
            let ring = circle_ring(center, *radius);
            (fan(&ring), vec![ring])
        }
        PointShape::RoundedRect { size, fillet } => {
            let ring = rect_ring(center, *size, fillet.clamp(0.0, *size));
            (fan(&ring), vec![ring])
        }
        PointShape::RegularPolygon {
            radius,
            sides,
            rotation,
        } => {
            let ring = regular_polygon_ring(center, *radius, *sides, *rotation);
            (fan(&ring), vec![ring])
        }
        PointShape::Torus {
            inner_radius,
            outer_radius,
            start_arc,
            end_arc,
        } => torus(center, *inner_radius, *outer_radius, *start_arc, *end_arc),
        PointShape::Image { image, scale } => {
            return Marker::Sprite(Sprite {
                image: image.clone(),
                position: center,
                scale: *scale,
            });
        }
    };

    let mut out = ColoredMeshData::default();
    out.append(&fill, paint.fill);
    if paint.line_width > 0.0 {
        for ring in &rings {
            out.append(&stroke(ring, true, paint.line_width), paint.line);
        }
    }
    Marker::Geometry(out)
}

fn rect_ring(center: Vec2, half: f64, fillet: f64) -> Vec<Vec2> {
    if fillet <= 0.0 {
        return vec![
            Vec2::new(center.x - half, center.y - half),
            Vec2::new(center.x + half, center.y - half),
            Vec2::new(center.x + half, center.y + half),
            Vec2::new(center.x - half, center.y + half),
        ];
    }

    let inner = half - fillet;
    // Corner centres counter-clockwise from bottom-right, each with its arc start.
    let corners = [
        (Vec2::new(center.x + inner, center.y - inner), -FRAC_PI_2),
        (Vec2::new(center.x + inner, center.y + inner), 0.0),
        (Vec2::new(center.x - inner, center.y + inner), FRAC_PI_2),
        (Vec2::new(center.x - inner, center.y - inner), FRAC_PI_2 * 2.0),
    ];
    let mut ring = Vec::with_capacity(corners.len() * (CORNER_SEGMENTS + 1));
    for (c, start) in corners {
        for s in 0..=CORNER_SEGMENTS {
            let a = start + FRAC_PI_2 * s as f64 / CORNER_SEGMENTS as f64;
            ring.push(c + Vec2::new(a.cos(), a.sin()) * fillet);
        }
    }
    ring
}

pub fn circle_segments(radius: f64) -> usize {
    ((TAU * radius * CIRCLE_OVERSAMPLE / CIRCLE_CHORD).ceil() as usize).clamp(16, 256)
}

fn circle_ring(center: Vec2, radius: f64) -> Vec<Vec2> {
    circle_ring_with(center, radius, circle_segments(radius))
}

fn circle_ring_with(center: Vec2, radius: f64, n: usize) -> Vec<Vec2> {
    let big = radius * CIRCLE_OVERSAMPLE;
    (0..n)
        .map(|i| {
            let a = TAU * i as f64 / n as f64;
            center + Vec2::new(a.cos() * big, a.sin() * big) * (1.0 / CIRCLE_OVERSAMPLE)
        })
        .collect()
}

fn regular_polygon_ring(center: Vec2, radius: f64, sides: u32, rotation: f64) -> Vec<Vec2> {
    let sides = sides.max(3);
    let start = -FRAC_PI_2 + rotation;
    let delta = TAU / sides as f64;
    (0..sides)
        .map(|i| {
            let a = start + delta * i as f64;
            center + Vec2::new(a.cos(), a.sin()) * radius
        })
        .collect()
}

fn arc(center: Vec2, radius: f64, start: f64, end: f64, segments: usize) -> Vec<Vec2> {
    (0..=segments)
        .map(|i| {
            let a = start + (end - start) * i as f64 / segments as f64;
            center + Vec2::new(a.cos(), a.sin()) * radius
        })
        .collect()
}

fn torus(
    center: Vec2,
    inner_radius: f64,
    outer_radius: f64,
    start_arc: f64,
    end_arc: f64,
) -> (MeshData, Vec<Vec<Vec2>>) {
    let sweep = end_arc - start_arc;
    let full = sweep.abs() >= TAU;
    let n = circle_segments(outer_radius);

    let (outer, inner) = if full {
        (
            circle_ring_with(center, outer_radius, n),
            circle_ring_with(center, inner_radius, n),
        )
    } else {
        let segs = ((n as f64 * sweep.abs() / TAU).ceil() as usize).max(2);
        (
            arc(center, outer_radius, start_arc, end_arc, segs),
            arc(center, inner_radius, start_arc, end_arc, segs),
        )
    };

    let mut fill = MeshData::default();
    for (o, i) in outer.iter().zip(&inner) {
        fill.push_vertex(*o);
        fill.push_vertex(*i);
    }
    let count = outer.len();
    let bands = if full { count } else { count - 1 };
    for k in 0..bands {
        let a = (k * 2) as u32;
        let b = (((k + 1) % count) * 2) as u32;
        fill.triangles.extend_from_slice(&[a, b, a + 1, b, b + 1, a + 1]);
    }

    let rings = if full {
        vec![outer, inner]
    } else {
        let mut band = outer;
        band.extend(inner.into_iter().rev());
        vec![band]
    };
    (fill, rings)
}

/// Fan triangulation of a convex ring.
fn fan(ring: &[Vec2]) -> MeshData {
    let mut mesh = MeshData::default();
    for p in ring {
        mesh.push_vertex(*p);
    }
    for i in 1..ring.len().saturating_sub(1) {
        mesh.triangles
            .extend_from_slice(&[0, i as u32, (i + 1) as u32]);
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::{Marker, MarkerPaint, PointShape, circle_segments, marker};
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;
    use std::f64::consts::PI;

    const PAINT: MarkerPaint = MarkerPaint {
        fill: [1.0, 0.0, 0.0, 1.0],
        line: [0.0, 0.0, 0.0, 1.0],
        line_width: 0.0,
    };

    fn geometry(m: Marker) -> crate::mesh::ColoredMeshData {
        match m {
            Marker::Geometry(g) => g,
            Marker::Sprite(_) => panic!("expected geometry"),
        }
    }

    fn area(mesh: &crate::mesh::ColoredMeshData) -> f64 {
        let v = |i: u32| {
            Vec2::new(
                mesh.vertices[i as usize * 2] as f64,
                mesh.vertices[i as usize * 2 + 1] as f64,
            )
        };
        mesh.triangles
            .chunks(3)
            .map(|t| ((v(t[1]) - v(t[0])).cross(v(t[2]) - v(t[0])) * 0.5).abs())
            .sum()
    }

    #[test]
    fn square_is_two_triangles() {
        let g = geometry(marker(Vec2::new(1.0, 1.0), &PointShape::Square { size: 2.0 }, &PAINT));
        assert_eq!(g.vertex_count(), 4);
        assert_eq!(g.triangles, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(g.colors.len(), 16);
        assert!((area(&g) - 16.0).abs() < 1e-4);
    }

    #[test]
    fn circle_is_oversampled() {
        assert_eq!(circle_segments(4.0), 32);
        assert_eq!(circle_segments(0.01), 16);
        let g = geometry(marker(Vec2::ZERO, &PointShape::Circle { radius: 4.0 }, &PAINT));
        assert_eq!(g.vertex_count(), 32);
        assert!((area(&g) - PI * 16.0).abs() < 0.5);
    }

    #[test]
    fn regular_polygon_starts_at_negative_y() {
        let shape = PointShape::RegularPolygon {
            radius: 1.0,
            sides: 2,
            rotation: 0.0,
        };
        let g = geometry(marker(Vec2::ZERO, &shape, &PAINT));
        // Fewer than three sides are raised to a triangle.
        assert_eq!(g.vertex_count(), 3);
        assert!(g.vertices[0].abs() < 1e-6);
        assert!((g.vertices[1] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn full_torus_is_a_ring_with_a_hole() {
        let shape = PointShape::Torus {
            inner_radius: 1.0,
            outer_radius: 2.0,
            start_arc: 0.0,
            end_arc: 2.0 * PI,
        };
        let g = geometry(marker(Vec2::ZERO, &shape, &PAINT));
        assert!((area(&g) - PI * 3.0).abs() < 0.5);
    }

    #[test]
    fn partial_torus_covers_its_sweep() {
        let shape = PointShape::Torus {
            inner_radius: 1.0,
            outer_radius: 2.0,
            start_arc: 0.0,
            end_arc: PI,
        };
        let g = geometry(marker(Vec2::ZERO, &shape, &PAINT));
        assert!((area(&g) - PI * 1.5).abs() < 0.3);
    }

    #[test]
    fn stroke_is_appended_in_line_color() {
        let paint = MarkerPaint {
            line_width: 0.5,
            ..PAINT
        };
        let g = geometry(marker(Vec2::ZERO, &PointShape::Square { size: 1.0 }, &paint));
        assert_eq!(g.vertex_count(), 4 + 8);
        assert_eq!(&g.colors[16..20], &[0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn images_become_sprites() {
        let shape = PointShape::Image {
            image: "rig.png".to_string(),
            scale: 0.5,
        };
        match marker(Vec2::new(3.0, 4.0), &shape, &PAINT) {
            Marker::Sprite(s) => {
                assert_eq!(s.image, "rig.png");
                assert_eq!(s.position, Vec2::new(3.0, 4.0));
            }
            Marker::Geometry(_) => panic!("expected sprite"),
        }
    }

    #[test]
    fn shapes_deserialize_from_tagged_json() {
        let shape: PointShape =
            serde_json::from_value(serde_json::json!({ "shape": "regularpolygon", "sides": 6 }))
                .unwrap();
        assert_eq!(
            shape,
            PointShape::RegularPolygon {
                radius: 4.0,
                sides: 6,
                rotation: 0.0
            }
        );
        let fillet: PointShape =
            serde_json::from_value(serde_json::json!({ "shape": "filletrect", "fillet": 1.0 }))
                .unwrap();
        assert!(matches!(fillet, PointShape::RoundedRect { size, .. } if size == 4.0));
    }
}
