//! Host-side reference computation and result comparison.
//!
//! This is the external collaborator the pipeline is checked against, not
//! part of the dispatch core itself.

/// Absolute tolerance used when comparing device output to the host
/// reference.
pub const MATCH_TOLERANCE: f32 = 1.525_878_91e-5;

/// Builds the default input arrays: `a[i] = i`, `b[i] = len/2 - i`.
pub fn scenario_inputs(len: usize) -> (Vec<f32>, Vec<f32>) {
    let half = (len / 2) as i64;
    let a = (0..len).map(|i| i as f32).collect();
    let b = (0..len).map(|i| (half - i as i64) as f32).collect();
    (a, b)
}

/// Computes the expected output on the host.
///
/// The `max(i-1, 0)` neighbour index makes element 0 depend on itself;
/// kept exactly as the kernel computes it.
pub fn reference_output(a: &[f32], b: &[f32]) -> Vec<f32> {
    assert_eq!(a.len(), b.len());
    (0..a.len())
        .map(|i| {
            let j = i.saturating_sub(1);
            b[i] * (b[i] + a[j]) + a[i] * (a[i] + b[j])
        })
        .collect()
}

/// Counts elements of `actual` within `tolerance` of `expected`.
pub fn count_matches(actual: &[f32], expected: &[f32], tolerance: f32) -> usize {
    actual
        .iter()
        .zip(expected)
        .filter(|(x, y)| (*x - *y).abs() < tolerance)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_inputs_shape() {
        let (a, b) = scenario_inputs(100);
        assert_eq!(a.len(), 100);
        assert_eq!(b.len(), 100);
        assert_eq!(a[0], 0.0);
        assert_eq!(a[99], 99.0);
        assert_eq!(b[0], 50.0);
        assert_eq!(b[50], 0.0);
        assert_eq!(b[99], -49.0);
    }

    #[test]
    fn test_reference_output_spot_values() {
        let (a, b) = scenario_inputs(100);
        let out = reference_output(&a, &b);

        // i = 0: b=50, a=0, neighbour index 0 -> 50*(50+0) + 0*(0+50)
        assert_eq!(out[0], 2500.0);
        // i = 1: b=49, a=1, neighbour index 0 -> 49*(49+0) + 1*(1+50)
        assert_eq!(out[1], 2452.0);
        // i = 2: b=48, a=2, neighbour index 1 -> 48*(48+1) + 2*(2+49)
        assert_eq!(out[2], 2454.0);
    }

    #[test]
    fn test_count_matches_tolerance_boundary() {
        let expected = [1.0f32, 2.0, 3.0];
        let within = [1.0 + MATCH_TOLERANCE * 0.5, 2.0, 3.0];
        assert_eq!(count_matches(&within, &expected, MATCH_TOLERANCE), 3);

        // The comparison is strict: exactly-at-tolerance does not match.
        let at = [1.0 + MATCH_TOLERANCE * 2.0, 2.0, 3.0];
        assert_eq!(count_matches(&at, &expected, MATCH_TOLERANCE), 2);
    }

    #[test]
    fn test_count_matches_empty() {
        assert_eq!(count_matches(&[], &[], MATCH_TOLERANCE), 0);
    }
}
