//! Weighted discrete choice by cumulative-sum inversion in log space.
//!
//! Every random decision in the samplers has the same shape: a finite list of
//! candidates with [`LogProb`] weights, one of which is picked with probability
//! proportional to its weight. We draw `x` uniformly below the total and take
//! the first candidate whose running sum exceeds `x`.

use rand::Rng;

use crate::lognum::LogProb;

/// Running sums of `weights`.
pub fn cumulative(weights: impl IntoIterator<Item = LogProb>) -> Vec<LogProb> {
    let mut acc = LogProb::zero();
    weights
        .into_iter()
        .map(|w| {
            acc += w;
            acc
        })
        .collect()
}

/// Picks an index into `cumulative` (running sums of the candidate weights).
///
/// Returns `None` only if the total weight is zero. A candidate whose weight
/// is zero is never returned.
pub fn choose_cumulative<R: Rng + ?Sized>(cumulative: &[LogProb], rng: &mut R) -> Option<usize> {
    let total = *cumulative.last()?;
    if total.is_zero() {
        return None;
    }
    let target = LogProb::uniform_below(total, rng);
    if let Some(i) = cumulative.iter().position(|&c| c > target) {
        return Some(i);
    }
    // The draw landed exactly on the total.
    last_weighted(cumulative)
}

/// Last candidate that actually carries weight.
fn last_weighted(cumulative: &[LogProb]) -> Option<usize> {
    (0..cumulative.len()).rev().find(|&i| {
        let before = if i == 0 { LogProb::zero() } else { cumulative[i - 1] };
        cumulative[i] > before
    })
}

/// Picks an index into `weights` with probability proportional to its weight.
pub fn choose_index<R: Rng + ?Sized>(weights: &[LogProb], rng: &mut R) -> Option<usize> {
    choose_cumulative(&cumulative(weights.iter().copied()), rng)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn test_cumulative() {
        let c = cumulative([1.0, 2.0, 3.0].map(LogProb::from_real));
        let reals: Vec<f64> = c.iter().map(|x| x.to_real()).collect();
        assert!((reals[0] - 1.0).abs() < 1e-12);
        assert!((reals[1] - 3.0).abs() < 1e-12);
        assert!((reals[2] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_choose_empty_or_zero() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(choose_index(&[], &mut rng), None);
        assert_eq!(choose_index(&[LogProb::zero(), LogProb::zero()], &mut rng), None);
    }

    #[test]
    fn test_choose_skips_zero_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let weights = [LogProb::zero(), LogProb::one(), LogProb::zero(), LogProb::one(), LogProb::zero()];
        for _ in 0..1000 {
            let i = choose_index(&weights, &mut rng).unwrap();
            assert!(i == 1 || i == 3, "picked zero-weight index {}", i);
        }
    }

    #[test]
    fn test_choose_fallback_at_total() {
        let c = cumulative([LogProb::one(), LogProb::one(), LogProb::zero()]);
        assert_eq!(last_weighted(&c), Some(1));
        let c = cumulative([LogProb::one(), LogProb::zero()]);
        assert_eq!(last_weighted(&c), Some(0));
        assert_eq!(last_weighted(&[LogProb::zero()]), None);
    }

    #[test]
    fn test_choose_frequencies() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let weights = [1.0, 2.0, 7.0].map(LogProb::from_real);
        let mut counts = [0usize; 3];
        let trials = 100_000;
        for _ in 0..trials {
            counts[choose_index(&weights, &mut rng).unwrap()] += 1;
        }
        for (i, &expected) in [0.1, 0.2, 0.7].iter().enumerate() {
            let freq = counts[i] as f64 / trials as f64;
            assert!((freq - expected).abs() < 0.01, "index {}: {} vs {}", i, freq, expected);
        }
    }
}
