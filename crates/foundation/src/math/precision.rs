//! Precision policies.
//!
//! Feature ordering (z-index ties, interval sorting, distance ties in the
//! spatial dictionaries) must not depend on float edge cases, so every float
//! comparison used for sorting goes through this module.

use core::cmp::Ordering;

/// Canonicalize a floating-point value for deterministic ordering.
///
/// Rules:
/// - `-0.0` becomes `0.0`
/// - all NaNs become a single canonical NaN
fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        // Handles +0.0 and -0.0.
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// Deterministic total ordering for floats.
///
/// Prefer this any time you sort floats or use them in ordered keys.
pub fn stable_total_cmp_f64(a: f64, b: f64) -> Ordering {
    canonical_f64(a).total_cmp(&canonical_f64(b))
}

#[cfg(test)]
mod tests {
    use super::{canonical_f64, stable_total_cmp_f64};
    use core::cmp::Ordering;

    #[test]
    fn canonicalizes_negative_zero() {
        assert_eq!(canonical_f64(-0.0), 0.0);
        assert_eq!(canonical_f64(0.0), 0.0);
        assert_eq!(stable_total_cmp_f64(-0.0, 0.0), Ordering::Equal);
    }

    #[test]
    fn stable_cmp_is_total_and_deterministic() {
        assert_eq!(stable_total_cmp_f64(1.0, 2.0), Ordering::Less);
        assert_eq!(stable_total_cmp_f64(f64::NAN, f64::NAN), Ordering::Equal);
        assert_eq!(stable_total_cmp_f64(f64::NAN, -f64::NAN), Ordering::Equal);
    }

    #[test]
    fn sorting_with_stable_keys_keeps_equal_runs_in_input_order() {
        let mut v = vec![(0.5, 'a'), (0.1, 'b'), (0.5, 'c'), (-0.0, 'd'), (0.0, 'e')];
        v.sort_by(|a, b| stable_total_cmp_f64(a.0, b.0));
        let order: Vec<char> = v.iter().map(|(_, c)| *c).collect();
        assert_eq!(order, vec!['d', 'e', 'b', 'a', 'c']);
    }
}
