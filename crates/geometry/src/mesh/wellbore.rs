//! Wellbore path meshes.
//!
//! A wellbore is a thick line built at a reference radius. The renderer
//! widens or narrows it with a radius uniform along the per-vertex normal, so
//! zooming never re-tessellates. Completion intervals split the line into
//! typed sections; packers become short crosslines.

use foundation::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::interpolator::{PathInterpolator, SegmentPoint};
use crate::intervals::{CompressedInterval, IntervalKind, NO_LOG, ProcessedIntervals};

/// Gaps shorter than this (relative) take the style of the following interval.
pub const MIN_GAP: f64 = 0.01;

/// Per-vertex type tag read by the wellbore shader.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SegmentType {
    Normal = 0,
    Screen = 1,
    Tick = 2,
    Blank = 3,
    Log = 4,
}

impl SegmentType {
    pub fn code(self) -> f32 {
        self as i32 as f32
    }
}

impl From<IntervalKind> for SegmentType {
    fn from(kind: IntervalKind) -> Self {
        match kind {
            IntervalKind::Screen | IntervalKind::Perforation => SegmentType::Screen,
            IntervalKind::Blank => SegmentType::Blank,
            IntervalKind::Log => SegmentType::Log,
            IntervalKind::Packer => SegmentType::Tick,
            IntervalKind::Other => SegmentType::Normal,
        }
    }
}

/// Size of packer crosslines: `width` along the path, `height` across it.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            width: 0.02,
            height: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WellboreMeshData {
    pub vertices: Vec<f32>,
    pub triangles: Vec<u32>,
    /// Four floats per vertex: arc distance, side (0 lower, 1 upper), normal x, normal y.
    pub vertex_data: Vec<f32>,
    pub type_data: Vec<f32>,
    pub log_data: Vec<f32>,
}

impl WellboreMeshData {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 2
    }

    pub fn append(&mut self, other: WellboreMeshData) {
        let base = self.vertex_count() as u32;
        self.vertices.extend(other.vertices);
        self.triangles.extend(other.triangles.into_iter().map(|t| t + base));
        self.vertex_data.extend(other.vertex_data);
        self.type_data.extend(other.type_data);
        self.log_data.extend(other.log_data);
    }

    fn push_vertex(&mut self, p: Vec2, distance: f64, side: f32, normal: Vec2, kind: SegmentType, log: f64) {
        self.vertices.extend_from_slice(&p.to_f32());
        self.vertex_data.extend_from_slice(&[
            distance as f32,
            side,
            normal.x as f32,
            normal.y as f32,
        ]);
        self.type_data.push(kind.code());
        self.log_data.push(log as f32);
    }
}

/// Thick line through `section` with half width `radius`.
///
/// Each point emits a lower and an upper vertex. Interior points use the
/// bisector of the adjacent tangents.
pub fn wellbore_segment(
    section: &[SegmentPoint],
    radius: f64,
    kind: SegmentType,
    log: f64,
) -> WellboreMeshData {
    let mut out = WellboreMeshData::default();
    let n = section.len();
    for (i, sp) in section.iter().enumerate() {
        let mut tangent = sp.direction;
        if i > 0 && i + 1 < n {
            let joined = (section[i - 1].direction + sp.direction).normalized();
            if joined != Vec2::ZERO {
                tangent = joined;
            }
        }
        let normal = tangent.rotate90();
        out.push_vertex(sp.position - normal * radius, sp.distance, 0.0, -normal, kind, log);
        out.push_vertex(sp.position + normal * radius, sp.distance, 1.0, normal, kind, log);
    }

    for i in 0..n.saturating_sub(1) {
        let b = (i * 2) as u32;
        out.triangles.extend_from_slice(&[b, b + 1, b + 3, b, b + 3, b + 2]);
    }
    out
}

/// Perpendicular quad marking a packer at `p`.
///
/// Vertex order is lower-left, lower-right, upper-left, upper-right relative
/// to the path direction.
pub fn crossline(p: &SegmentPoint, tick: &TickConfig) -> WellboreMeshData {
    let along = p.direction * tick.width;
    let across = p.direction.rotate90() * tick.height;
    let unit = across.normalized();

    let mut out = WellboreMeshData::default();
    let corners = [
        (p.position - along - across, 0.0, -unit),
        (p.position + along - across, 0.0, -unit),
        (p.position - along + across, 1.0, unit),
        (p.position + along + across, 1.0, unit),
    ];
    for (pos, side, normal) in corners {
        out.push_vertex(pos, p.distance, side, normal, SegmentType::Tick, 0.0);
    }
    out.triangles.extend_from_slice(&[0, 2, 3, 0, 3, 1]);
    out
}

/// Builds the full wellbore mesh from a path and its processed intervals.
#[derive(Debug, Clone)]
pub struct WellboreMeshBuilder<'a> {
    interp: &'a PathInterpolator,
    radius: f64,
    tick: TickConfig,
}

impl<'a> WellboreMeshBuilder<'a> {
    pub fn new(interp: &'a PathInterpolator, radius: f64, tick: TickConfig) -> Self {
        Self {
            interp,
            radius,
            tick,
        }
    }

    /// Sections without an interval are `Normal` with no log value. A gap
    /// shorter than `MIN_GAP` before an interval takes that interval's type
    /// and log so no sliver of plain path shows between completions.
    pub fn generate(&self, intervals: &ProcessedIntervals) -> WellboreMeshData {
        debug_assert!(!self.interp.is_single_point());
        let mut out = WellboreMeshData::default();

        if intervals.ranges.is_empty() {
            self.append_section(&mut out, 0.0, 1.0, SegmentType::Normal, NO_LOG);
        } else {
            let mut p = 0.0;
            for range in &intervals.ranges {
                self.append_interval(&mut out, p, range);
                p = range.l2;
            }
            if p < 1.0 {
                self.append_section(&mut out, p, 1.0, SegmentType::Normal, NO_LOG);
            }
        }

        for [a, b] in &intervals.markers {
            let at = self.interp.get_point((a + b) * 0.5);
            out.append(crossline(&at, &self.tick));
        }
        out
    }

    fn append_interval(&self, out: &mut WellboreMeshData, p: f64, range: &CompressedInterval) {
        let kind = SegmentType::from(range.kind);
        let gap = range.l1 - p;
        if gap > 0.0 {
            let (gap_kind, gap_log) = if gap < MIN_GAP {
                (kind, range.log)
            } else {
                (SegmentType::Normal, NO_LOG)
            };
            self.append_section(out, p, range.l1, gap_kind, gap_log);
        }
        self.append_section(out, range.l1, range.l2, kind, range.log);
    }

    fn append_section(&self, out: &mut WellboreMeshData, t0: f64, t1: f64, kind: SegmentType, log: f64) {
        let section = self.interp.get_section(t0, t1);
        out.append(wellbore_segment(&section, self.radius, kind, log));
    }
}

#[cfg(test)]
mod tests {
    use super::{SegmentType, TickConfig, WellboreMeshBuilder, crossline, wellbore_segment};
    use crate::interpolator::PathInterpolator;
    use crate::intervals::{CompressedInterval, IntervalKind, NO_LOG, ProcessedIntervals};
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;

    fn straight() -> PathInterpolator {
        PathInterpolator::new(&[Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)], 0.0).unwrap()
    }

    fn range(l1: f64, l2: f64, log: f64, kind: IntervalKind) -> CompressedInterval {
        CompressedInterval { l1, l2, log, kind }
    }

    #[test]
    fn segment_offsets_by_radius_and_tags_vertices() {
        let path = straight();
        let mesh = wellbore_segment(&path.get_section(0.0, 1.0), 0.5, SegmentType::Screen, 3.0);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.vertices, vec![0.0, -0.5, 0.0, 0.5, 10.0, -0.5, 10.0, 0.5]);
        assert_eq!(mesh.triangles, vec![0, 1, 3, 0, 3, 2]);
        assert_eq!(mesh.type_data, vec![1.0; 4]);
        assert_eq!(mesh.log_data, vec![3.0; 4]);
        assert_eq!(&mesh.vertex_data[4..8], &[0.0, 1.0, -0.0, 1.0]);
        assert_eq!(mesh.vertex_data[8], 10.0);
    }

    #[test]
    fn crossline_is_a_quad_across_the_path() {
        let path = straight();
        let mesh = crossline(&path.get_point(0.5), &TickConfig { width: 0.1, height: 1.0 });
        assert_eq!(
            mesh.vertices,
            vec![4.9, -1.0, 5.1, -1.0, 4.9, 1.0, 5.1, 1.0]
        );
        assert_eq!(mesh.triangles, vec![0, 2, 3, 0, 3, 1]);
        assert_eq!(mesh.type_data, vec![2.0; 4]);
        assert_eq!(mesh.log_data, vec![0.0; 4]);
    }

    #[test]
    fn no_intervals_is_one_plain_section() {
        let path = straight();
        let mesh = WellboreMeshBuilder::new(&path, 0.5, TickConfig::default())
            .generate(&ProcessedIntervals::default());
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.type_data, vec![0.0; 4]);
        assert_eq!(mesh.log_data, vec![NO_LOG as f32; 4]);
    }

    #[test]
    fn intervals_split_the_path_into_typed_sections() {
        let path = straight();
        let intervals = ProcessedIntervals {
            ranges: vec![
                range(0.2, 0.4, 5.0, IntervalKind::Screen),
                range(0.405, 0.6, 6.0, IntervalKind::Blank),
            ],
            markers: vec![[0.7, 0.72]],
        };
        let mesh = WellboreMeshBuilder::new(&path, 0.5, TickConfig::default()).generate(&intervals);

        // gap, screen, short gap, blank, tail: 2 vertices per end, plus 4 for the tick.
        assert_eq!(mesh.vertex_count(), 5 * 4 + 4);
        let per_section: Vec<f32> = mesh.type_data.iter().step_by(4).copied().collect();
        assert_eq!(per_section, vec![0.0, 1.0, 3.0, 3.0, 0.0, 2.0]);
        let logs: Vec<f32> = mesh.log_data.iter().step_by(4).copied().collect();
        assert_eq!(logs, vec![NO_LOG as f32, 5.0, 6.0, 6.0, NO_LOG as f32, 0.0]);
        assert!(mesh.triangles.iter().all(|&t| (t as usize) < mesh.vertex_count()));
    }

    #[test]
    fn interval_reaching_the_end_adds_no_tail() {
        let path = straight();
        let intervals = ProcessedIntervals {
            ranges: vec![range(0.0, 1.0, 1.0, IntervalKind::Perforation)],
            markers: vec![],
        };
        let mesh = WellboreMeshBuilder::new(&path, 0.5, TickConfig::default()).generate(&intervals);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.type_data, vec![1.0; 4]);
    }
}
