//! Completion intervals along a wellbore path.
//!
//! Positions `l1`/`l2` are normalized to `[0, 1]` along the owning path.
//! Range-like intervals (screens, blanks, perforations, logs) become coloured
//! sub-ranges of the wellbore mesh; packers become crossline markers.

use serde::{Deserialize, Serialize};

use foundation::math::stable_total_cmp_f64;

/// Log value used for path sections without any interval.
pub const NO_LOG: f64 = -999.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntervalKind {
    Screen,
    Blank,
    Perforation,
    Packer,
    Log,
    #[serde(other)]
    Other,
}

impl IntervalKind {
    /// Packers are drawn as crosslines, everything else as ranges.
    pub fn is_marker(self) -> bool {
        matches!(self, IntervalKind::Packer)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    #[serde(rename = "type")]
    pub kind: IntervalKind,
    /// Real-world depth of the top of the interval.
    pub start: f64,
    /// Real-world depth of the bottom of the interval.
    pub end: f64,
    pub l1: f64,
    pub l2: f64,
    #[serde(default = "no_log")]
    pub log: f64,
}

fn no_log() -> f64 {
    NO_LOG
}

/// Interval as delivered by the data source: depths only.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInterval {
    #[serde(rename = "type")]
    pub kind: IntervalKind,
    pub start: f64,
    pub end: f64,
    #[serde(default = "no_log")]
    pub log: f64,
}

impl RawInterval {
    /// Normalize depths against the measured-depth range `[md_top, md_bottom]`
    /// of the owning path. `depth_reference` is added to the raw depths first.
    /// Results are clamped to `[0, 1]`; a zero-length range maps to 0.
    pub fn normalize(&self, md_top: f64, md_bottom: f64, depth_reference: f64) -> Interval {
        let span = md_bottom - md_top;
        let rel = |depth: f64| {
            if span > 0.0 {
                ((depth + depth_reference - md_top) / span).clamp(0.0, 1.0)
            } else {
                0.0
            }
        };
        let (l1, l2) = (rel(self.start), rel(self.end));
        Interval {
            kind: self.kind,
            start: self.start,
            end: self.end,
            l1: l1.min(l2),
            l2: l1.max(l2),
            log: self.log,
        }
    }
}

/// A merged range ready for meshing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CompressedInterval {
    pub l1: f64,
    pub l2: f64,
    pub log: f64,
    pub kind: IntervalKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessedIntervals {
    /// Sorted, pairwise non-overlapping ranges.
    pub ranges: Vec<CompressedInterval>,
    /// `[l1, l2]` of every packer, sorted by `l1`.
    pub markers: Vec<[f64; 2]>,
}

impl ProcessedIntervals {
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty() && self.markers.is_empty()
    }
}

/// Merge overlapping ranges in a single pass.
///
/// Precondition: `sorted` is ascending by `l1`. A range whose `l1` is strictly
/// below the running `l2` is absorbed and may extend it; the merged range
/// keeps the log and kind of the first range in the run. Ranges that only
/// touch (`next.l1 == running.l2`) stay separate.
pub fn compress_intervals(sorted: &[CompressedInterval]) -> Vec<CompressedInterval> {
    debug_assert!(
        sorted.windows(2).all(|w| w[0].l1 <= w[1].l1),
        "compress_intervals expects input sorted by l1"
    );

    let Some(&first) = sorted.first() else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut prev = first;
    for &cur in &sorted[1..] {
        if cur.l1 < prev.l2 {
            if cur.l2 > prev.l2 {
                prev.l2 = cur.l2;
            }
        } else {
            out.push(prev);
            prev = cur;
        }
    }
    out.push(prev);
    out
}

/// Split intervals into ranges and markers, sort both by `l1` and compress
/// the ranges.
///
/// Sorting is stable, so intervals with equal `l1` keep their input order and
/// the first of them supplies log and kind for the merged range.
pub fn process_intervals(intervals: &[Interval]) -> ProcessedIntervals {
    let mut ranges: Vec<CompressedInterval> = intervals
        .iter()
        .filter(|i| !i.kind.is_marker())
        .map(|i| CompressedInterval {
            l1: i.l1,
            l2: i.l2,
            log: i.log,
            kind: i.kind,
        })
        .collect();
    ranges.sort_by(|a, b| stable_total_cmp_f64(a.l1, b.l1));

    let mut markers: Vec<[f64; 2]> = intervals
        .iter()
        .filter(|i| i.kind.is_marker())
        .map(|i| [i.l1, i.l2])
        .collect();
    markers.sort_by(|a, b| stable_total_cmp_f64(a[0], b[0]));

    ProcessedIntervals {
        ranges: compress_intervals(&ranges),
        markers,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CompressedInterval, Interval, IntervalKind, NO_LOG, RawInterval, compress_intervals,
        process_intervals,
    };
    use pretty_assertions::assert_eq;

    fn r(l1: f64, l2: f64) -> CompressedInterval {
        CompressedInterval {
            l1,
            l2,
            log: 0.0,
            kind: IntervalKind::Screen,
        }
    }

    fn interval(kind: IntervalKind, l1: f64, l2: f64, log: f64) -> Interval {
        Interval {
            kind,
            start: l1 * 1000.0,
            end: l2 * 1000.0,
            l1,
            l2,
            log,
        }
    }

    fn spans(v: &[CompressedInterval]) -> Vec<[f64; 2]> {
        v.iter().map(|i| [i.l1, i.l2]).collect()
    }

    #[test]
    fn merges_overlapping_ranges() {
        let out = compress_intervals(&[r(0.1, 0.3), r(0.2, 0.4), r(0.6, 0.7)]);
        assert_eq!(spans(&out), vec![[0.1, 0.4], [0.6, 0.7]]);
    }

    #[test]
    fn contained_ranges_do_not_shrink_the_run() {
        let out = compress_intervals(&[r(0.1, 0.5), r(0.2, 0.3), r(0.45, 0.55)]);
        assert_eq!(spans(&out), vec![[0.1, 0.55]]);
    }

    #[test]
    fn touching_ranges_stay_separate() {
        let out = compress_intervals(&[r(0.1, 0.3), r(0.3, 0.4)]);
        assert_eq!(spans(&out), vec![[0.1, 0.3], [0.3, 0.4]]);
    }

    #[test]
    fn compression_is_idempotent() {
        let once = compress_intervals(&[r(0.0, 0.2), r(0.1, 0.25), r(0.5, 0.6), r(0.55, 0.9)]);
        let twice = compress_intervals(&once);
        assert_eq!(once, twice);
        assert!(once.windows(2).all(|w| w[0].l2 <= w[1].l1));
    }

    #[test]
    fn empty_and_single_inputs() {
        assert_eq!(compress_intervals(&[]), vec![]);
        assert_eq!(compress_intervals(&[r(0.2, 0.3)]), vec![r(0.2, 0.3)]);
        assert!(process_intervals(&[]).is_empty());
    }

    #[test]
    fn process_separates_packers_and_sorts() {
        let input = vec![
            interval(IntervalKind::Blank, 0.6, 0.7, 2.0),
            interval(IntervalKind::Packer, 0.55, 0.56, 0.0),
            interval(IntervalKind::Screen, 0.1, 0.3, 1.0),
            interval(IntervalKind::Packer, 0.05, 0.06, 0.0),
            interval(IntervalKind::Screen, 0.2, 0.4, 3.0),
        ];
        let out = process_intervals(&input);
        assert_eq!(out.markers, vec![[0.05, 0.06], [0.55, 0.56]]);
        assert_eq!(
            out.ranges,
            vec![
                CompressedInterval { l1: 0.1, l2: 0.4, log: 1.0, kind: IntervalKind::Screen },
                CompressedInterval { l1: 0.6, l2: 0.7, log: 2.0, kind: IntervalKind::Blank },
            ]
        );
    }

    #[test]
    fn equal_starts_keep_input_order() {
        let input = vec![
            interval(IntervalKind::Blank, 0.2, 0.3, 7.0),
            interval(IntervalKind::Screen, 0.2, 0.5, 8.0),
        ];
        let out = process_intervals(&input);
        assert_eq!(out.ranges.len(), 1);
        assert_eq!(out.ranges[0].kind, IntervalKind::Blank);
        assert_eq!(out.ranges[0].l2, 0.5);
    }

    #[test]
    fn raw_intervals_normalize_with_depth_reference() {
        let raw = RawInterval {
            kind: IntervalKind::Screen,
            start: 1200.0,
            end: 1100.0,
            log: NO_LOG,
        };
        let i = raw.normalize(1000.0, 2000.0, 100.0);
        assert_eq!((i.l1, i.l2), (0.2, 0.3));
        assert_eq!(i.start, 1200.0);

        let clamped = raw.normalize(1500.0, 2000.0, 0.0);
        assert_eq!((clamped.l1, clamped.l2), (0.0, 0.0));
        assert_eq!(raw.normalize(5.0, 5.0, 0.0).l2, 0.0);
    }

    #[test]
    fn intervals_deserialize_with_unknown_kinds() {
        let json = serde_json::json!([
            { "type": "Screen", "start": 1.0, "end": 2.0, "l1": 0.1, "l2": 0.2, "log": 3.0 },
            { "type": "Gravel", "start": 1.0, "end": 2.0, "l1": 0.1, "l2": 0.2 }
        ]);
        let parsed: Vec<Interval> = serde_json::from_value(json).unwrap();
        assert_eq!(parsed[0].kind, IntervalKind::Screen);
        assert_eq!(parsed[1].kind, IntervalKind::Other);
        assert_eq!(parsed[1].log, NO_LOG);
    }
}
