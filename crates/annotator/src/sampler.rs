// Copyright 2021-2024 SecureDNA Stiftung (SecureDNA Foundation) <licensing@securedna.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

use rand::Rng;

/// Draw an index with probability proportional to its weight.
///
/// Weights need not sum to one. A uniform draw in `[0, sum)` is compared
/// against the running sum; the first positive-weight index whose cumulative
/// weight reaches the draw wins. Zero weights are never chosen, even for a
/// draw of exactly zero. If floating point rounding lets the draw slip past the
/// final cumulative value, the last positive-weight index is returned.
///
/// `weights` must be non-empty with a positive sum. That is checked in debug
/// builds only; violating it is a bug in the caller.
pub fn choose<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    debug_assert!(!weights.is_empty(), "choose() needs at least one weight");
    let total: f64 = weights.iter().sum();
    debug_assert!(total > 0.0, "choose() needs a positive total weight");

    let draw = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w;
        if *w > 0.0 && draw <= cumulative {
            return i;
        }
    }
    weights.iter().rposition(|w| *w > 0.0).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn degenerate_weights_are_deterministic() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            assert_eq!(choose(&[1.0, 0.0, 0.0], &mut rng), 0);
            assert_eq!(choose(&[0.0, 0.0, 1.0], &mut rng), 2);
            assert_eq!(choose(&[0.0, 3.5, 0.0], &mut rng), 1);
        }
    }

    #[test]
    fn zero_draw_skips_zero_weights() {
        // a constant-zero source makes every draw exactly 0.0
        let mut rng = StepRng::new(0, 0);
        assert_eq!(choose(&[0.0, 0.0, 1.0], &mut rng), 2);
        assert_eq!(choose(&[0.0, 2.0, 1.0], &mut rng), 1);
        assert_eq!(choose(&[0.5, 0.0, 0.5], &mut rng), 0);
    }

    #[test]
    fn single_weight_always_wins() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(choose(&[0.25], &mut rng), 0);
        }
    }

    #[test]
    fn frequencies_follow_weights() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut counts = [0usize; 3];
        let n = 20_000;
        for _ in 0..n {
            counts[choose(&[0.45, 0.35, 0.20], &mut rng)] += 1;
        }
        let freq: Vec<f64> = counts.iter().map(|c| *c as f64 / n as f64).collect();
        assert!((freq[0] - 0.45).abs() < 0.03, "{freq:?}");
        assert!((freq[1] - 0.35).abs() < 0.03, "{freq:?}");
        assert!((freq[2] - 0.20).abs() < 0.03, "{freq:?}");
    }

    #[test]
    fn unnormalized_weights_are_fine() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut counts = [0usize; 2];
        for _ in 0..10_000 {
            counts[choose(&[9.0, 1.0], &mut rng)] += 1;
        }
        assert!(counts[0] > counts[1] * 5, "{counts:?}");
    }
}
