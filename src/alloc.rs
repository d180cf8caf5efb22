//! Allocation helpers (probabilities, softmax, categorical sampling).
//!
//! These are deterministic utilities for turning per-action scores into a
//! probability distribution in a stable (reproducible) way, and for drawing
//! from that distribution with a single uniform variate.

/// Compute a stable softmax distribution over `scores`.
///
/// - `scale` multiplies every logit before exponentiation (the policy
///   "temperature" of the softmax policies; must be finite, otherwise `1.0`).
/// - Uses the standard max-trick for numerical stability.
/// - Returns a distribution that sums to 1 (or empty if input is empty).
pub fn softmax(scores: &[f64], scale: f64) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }
    let s = if scale.is_finite() { scale } else { 1.0 };

    let max_logit = scores
        .iter()
        .map(|&v| s * v)
        .fold(f64::NEG_INFINITY, f64::max);
    let mut out: Vec<f64> = Vec::with_capacity(scores.len());
    let mut denom = 0.0;
    for &v in scores {
        let x = (s * v - max_logit).exp();
        denom += x;
        out.push(x);
    }
    if denom <= 0.0 || !denom.is_finite() {
        // Degenerate fallback: uniform.
        let n = scores.len() as f64;
        return vec![1.0 / n; scores.len()];
    }

    for v in out.iter_mut() {
        *v /= denom;
    }
    out
}

/// Outcome of an inverse-CDF draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoricalDraw {
    pub index: usize,
    /// The cumulative mass never exceeded the draw (round-off), so the last
    /// index was returned.
    pub fell_back_to_last: bool,
}

/// Inverse-CDF sampling against one uniform draw `u` in `[0, 1)`.
///
/// Walks the cumulative mass and returns the first index whose cumulative
/// mass exceeds `u`. Falls back to the last index when floating-point
/// round-off leaves residual mass unconsumed. Returns `None` on empty input.
pub fn sample_index(probs: &[f64], u: f64) -> Option<CategoricalDraw> {
    let last = probs.len().checked_sub(1)?;
    let mut total = 0.0;
    for (i, &p) in probs.iter().enumerate() {
        total += p;
        if u < total {
            return Some(CategoricalDraw {
                index: i,
                fell_back_to_last: false,
            });
        }
    }
    Some(CategoricalDraw {
        index: last,
        fell_back_to_last: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn softmax_sums_to_one() {
        let p = softmax(&[0.0, 1.0, -2.0], 1.0);
        let s: f64 = p.iter().sum();
        assert!((s - 1.0).abs() < 1e-9, "sum={}", s);
        assert!(p[1] > p[0] && p[0] > p[2]);
    }

    #[test]
    fn softmax_scale_sharpens() {
        let soft = softmax(&[0.0, 1.0], 1.0);
        let sharp = softmax(&[0.0, 1.0], 10.0);
        assert!(sharp[1] > soft[1]);
    }

    #[test]
    fn softmax_huge_logits_do_not_overflow() {
        let p = softmax(&[1.0e308, 0.0], 10.0);
        assert!(p.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn sample_index_walks_cumulative_mass() {
        let p = [0.2, 0.5, 0.3];
        assert_eq!(sample_index(&p, 0.0).unwrap().index, 0);
        assert_eq!(sample_index(&p, 0.19).unwrap().index, 0);
        assert_eq!(sample_index(&p, 0.2).unwrap().index, 1);
        assert_eq!(sample_index(&p, 0.69).unwrap().index, 1);
        assert_eq!(sample_index(&p, 0.71).unwrap().index, 2);
    }

    #[test]
    fn sample_index_falls_back_to_last() {
        // Mass sums to slightly less than one.
        let p = [0.3, 0.3, 0.3999999];
        let d = sample_index(&p, 0.99999999).unwrap();
        assert_eq!(d.index, 2);
        assert!(d.fell_back_to_last);
        assert!(sample_index(&[], 0.5).is_none());
    }

    proptest! {
        #[test]
        fn softmax_is_a_distribution(
            // Keep bounded: small vectors, bounded magnitudes.
            scores in proptest::collection::vec(-1.0e6f64..1.0e6f64, 0..20),
            scale in prop_oneof![Just(f64::NAN), Just(0.0), Just(-1.0), 1.0e-6f64..1.0e3f64],
        ) {
            let p = softmax(&scores, scale);

            // Deterministic.
            let p2 = softmax(&scores, scale);
            prop_assert_eq!(&p, &p2);

            prop_assert_eq!(p.len(), scores.len());
            if !scores.is_empty() {
                let sum: f64 = p.iter().sum();
                prop_assert!((sum - 1.0).abs() < 1e-9, "sum={}", sum);
                for &v in &p {
                    prop_assert!(v.is_finite());
                    prop_assert!(v >= 0.0);
                    prop_assert!(v <= 1.0);
                }
            }
        }

        #[test]
        fn sample_index_is_in_range(
            scores in proptest::collection::vec(-50.0f64..50.0, 1..10),
            u in 0.0f64..1.0,
        ) {
            let p = softmax(&scores, 1.0);
            let d = sample_index(&p, u).unwrap();
            prop_assert!(d.index < p.len());
        }
    }
}
