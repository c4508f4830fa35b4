//! Provenance factor estimation (Normal mean with pseudo-observations)
//!
//! `C` pseudo-observations at the Named Collector baseline are blended into
//! the real sample before both the mean and the variance are taken. When a
//! short record disagrees with the baseline, the pseudo-observations inflate
//! the variance as well as shrinking the mean, so the lower bound is pulled
//! down harder than mean-only shrinkage would. Both effects are required.

use crate::elite::Z_LOWER_95;
use crate::ScoringError;

/// Number of pseudo-observations (`C`)
pub const PSEUDO_OBSERVATIONS: f64 = 20.0;

/// Prior mean prestige (`m`), the Named Collector baseline
pub const PRIOR_MEAN: f64 = 2.0;

/// Relative slack when checking `sum_sq >= sum^2 / n` on stored floats
pub const AGGREGATE_TOLERANCE: f64 = 1e-9;

/// Real observations blended with the pseudo-observations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AugmentedSample {
    /// Total weight `N = C + n`
    pub weight: f64,
    /// Augmented mean
    pub mean: f64,
    /// Augmented (population) variance, never negative
    pub variance: f64,
}

impl AugmentedSample {
    /// Blend `n` observations summarised by `sum` and `sum_sq` with the prior
    pub fn new(n: u64, sum: f64, sum_sq: f64) -> Self {
        let weight = PSEUDO_OBSERVATIONS + n as f64;
        let mean = (PSEUDO_OBSERVATIONS * PRIOR_MEAN + sum) / weight;
        let second_moment = (PSEUDO_OBSERVATIONS * PRIOR_MEAN * PRIOR_MEAN + sum_sq) / weight;
        // Cancellation can leave a tiny negative remainder when all scores are equal
        let variance = (second_moment - mean * mean).max(0.0);
        Self {
            weight,
            mean,
            variance,
        }
    }

    /// Standard error of the augmented mean
    pub fn standard_error(&self) -> f64 {
        (self.variance / self.weight).sqrt()
    }

    /// One-sided 95% lower bound, clamped at zero
    pub fn lower_bound(&self) -> f64 {
        (self.mean - Z_LOWER_95 * self.standard_error()).max(0.0)
    }
}

/// Score of an artisan with no documented owners
///
/// The prior reduced by its own width, `m - z * sqrt(m^2 / C)`.
pub fn prior_lower_bound() -> f64 {
    (PRIOR_MEAN - Z_LOWER_95 * (PRIOR_MEAN * PRIOR_MEAN / PSEUDO_OBSERVATIONS).sqrt()).max(0.0)
}

/// Reject aggregates no real multiset of non-negative scores could produce
pub fn validate_aggregate(n: u64, sum: f64, sum_sq: f64) -> Result<(), ScoringError> {
    let inconsistent = || ScoringError::InconsistentAggregate { n, sum, sum_sq };

    if !sum.is_finite() || !sum_sq.is_finite() || sum < 0.0 || sum_sq < 0.0 {
        return Err(inconsistent());
    }
    if n == 0 {
        if sum != 0.0 || sum_sq != 0.0 {
            return Err(inconsistent());
        }
        return Ok(());
    }

    // Cauchy-Schwarz: n * sum_sq >= sum^2
    let lhs = n as f64 * sum_sq;
    let rhs = sum * sum;
    if lhs < rhs - AGGREGATE_TOLERANCE * rhs.max(1.0) {
        return Err(inconsistent());
    }
    Ok(())
}

/// Compute the provenance factor from an artisan's aggregate
///
/// `n` is the multiset size, `sum` and `sum_sq` the sums of prestige scores
/// and their squares. `n = 0` returns [`prior_lower_bound`].
pub fn provenance_factor(n: u64, sum: f64, sum_sq: f64) -> Result<f64, ScoringError> {
    validate_aggregate(n, sum, sum_sq)?;
    if n == 0 {
        return Ok(prior_lower_bound());
    }
    Ok(AugmentedSample::new(n, sum, sum_sq).lower_bound())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn observations() -> impl Strategy<Value = Vec<(f64, u32)>> {
        proptest::collection::vec((2.0f64..=10.0, 1u32..20), 0..40)
    }

    fn aggregate(obs: &[(f64, u32)]) -> (u64, f64, f64) {
        obs.iter().fold((0, 0.0, 0.0), |(n, s, q), &(score, count)| {
            let w = f64::from(count);
            (n + u64::from(count), s + w * score, q + w * score * score)
        })
    }

    proptest! {
        /// Property: any real multiset yields a finite score inside the prestige scale
        #[test]
        fn test_finite_and_bounded(obs in observations()) {
            let (n, sum, sum_sq) = aggregate(&obs);
            let score = provenance_factor(n, sum, sum_sq).unwrap();
            prop_assert!(score.is_finite());
            prop_assert!(score >= 0.0 && score < 10.0);
        }

        /// Property: the bound never exceeds the augmented mean
        #[test]
        fn test_bound_below_augmented_mean(obs in observations()) {
            let (n, sum, sum_sq) = aggregate(&obs);
            prop_assume!(n > 0);
            let sample = AugmentedSample::new(n, sum, sum_sq);
            prop_assert!(provenance_factor(n, sum, sum_sq).unwrap() <= sample.mean);
        }

        /// Property: observation order does not change the result beyond rounding
        #[test]
        fn test_order_independent(obs in observations()) {
            let (n, sum, sum_sq) = aggregate(&obs);
            let mut reversed = obs.clone();
            reversed.reverse();
            let (rn, rsum, rsum_sq) = aggregate(&reversed);
            let a = provenance_factor(n, sum, sum_sq).unwrap();
            let b = provenance_factor(rn, rsum, rsum_sq).unwrap();
            prop_assert!((a - b).abs() < 1e-9);
        }
    }
}
