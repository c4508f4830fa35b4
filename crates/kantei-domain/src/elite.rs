//! Elite factor estimation (Beta-Binomial)
//!
//! The elite factor is the 5th-percentile lower bound of the posterior over an
//! artisan's elite-designation rate. One lucky item cannot outrank a lifetime
//! of work because the prior drags thin evidence toward the base rate and the
//! posterior width pulls the bound further down.

use crate::ScoringError;

/// Prior alpha (pseudo elite works)
///
/// NOTE: the Normal approximation used by [`BetaPosterior::lower_bound`] is only
/// trustworthy for `alpha >= 1` and `beta >= 1`. With `ALPHA_0 = 1` and
/// `BETA_0 = 9` every valid `(e, n)` keeps both parameters at or above one.
/// Changing either prior constant requires re-deriving that guarantee.
pub const ALPHA_0: f64 = 1.0;

/// Prior beta (pseudo non-elite works). See the note on [`ALPHA_0`].
pub const BETA_0: f64 = 9.0;

/// One-sided 95% z-score (5th percentile lower bound)
pub const Z_LOWER_95: f64 = 1.645;

/// Posterior Beta distribution over the elite rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetaPosterior {
    /// Alpha parameter (prior + elite works)
    pub alpha: f64,
    /// Beta parameter (prior + non-elite works)
    pub beta: f64,
}

impl BetaPosterior {
    /// Posterior after observing `elite` elite works out of `total`
    pub fn from_counts(elite: u64, total: u64) -> Result<Self, ScoringError> {
        if elite > total {
            return Err(ScoringError::EliteExceedsTotal { elite, total });
        }
        Ok(Self {
            alpha: ALPHA_0 + elite as f64,
            beta: BETA_0 + (total - elite) as f64,
        })
    }

    /// Posterior mean `alpha / (alpha + beta)`
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// Posterior standard deviation
    pub fn std_dev(&self) -> f64 {
        let sum = self.alpha + self.beta;
        (self.alpha * self.beta / (sum * sum * (sum + 1.0))).sqrt()
    }

    /// Normal-approximation lower bound, clamped at zero
    pub fn lower_bound(&self) -> f64 {
        (self.mean() - Z_LOWER_95 * self.std_dev()).max(0.0)
    }
}

/// Compute the elite factor for `elite` elite works out of `total` designated works
///
/// Returns a value in `[0, 1]`. `elite > total` is rejected. Zero designated
/// works is valid and returns the prior's own lower bound.
///
/// The result depends only on `(elite, total)`, so batch and targeted
/// recomputes agree bit for bit.
pub fn elite_factor(elite: u64, total: u64) -> Result<f64, ScoringError> {
    Ok(BetaPosterior::from_counts(elite, total)?.lower_bound())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ef(e: u64, n: u64) -> f64 {
        elite_factor(e, n).unwrap()
    }

    #[test]
    fn test_worked_values() {
        assert!((ef(29, 30) - 0.6388).abs() < 5e-5);
        assert!((ef(59, 93) - 0.5030).abs() < 5e-5);
        assert!((ef(17, 75) - 0.1393).abs() < 5e-5);
    }

    #[test]
    fn test_single_elite_work_clamps_to_zero() {
        assert_eq!(ef(1, 1), 0.0);
    }

    #[test]
    fn test_no_designated_works() {
        let score = ef(0, 0);
        assert!(score.is_finite());
        // Prior Beta(1, 9): mean 0.1, sd ~0.0905, lower bound below zero
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_rejects_elite_over_total() {
        assert_eq!(
            elite_factor(3, 2),
            Err(ScoringError::EliteExceedsTotal { elite: 3, total: 2 })
        );
    }

    #[test]
    fn test_posterior_parameters() {
        let posterior = BetaPosterior::from_counts(29, 30).unwrap();
        assert_eq!(posterior.alpha, 30.0);
        assert_eq!(posterior.beta, 10.0);
        assert!((posterior.mean() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_converges_from_below() {
        let mut previous = 0.0;
        for n in [10u64, 20, 40, 80, 160, 320, 640, 1280] {
            let score = ef(n / 2, n);
            assert!(score > previous, "n={} score={} previous={}", n, score, previous);
            assert!(score < 0.5);
            previous = score;
        }
        assert!((ef(500_000, 1_000_000) - 0.5).abs() < 0.005);
    }

    #[test]
    fn test_non_elite_addition_lowers_score() {
        assert!(ef(29, 31) < ef(29, 30));
        assert!(ef(59, 94) < ef(59, 93));
    }

    #[test]
    fn test_identical_inputs_are_bit_identical() {
        assert_eq!(ef(59, 93).to_bits(), ef(59, 93).to_bits());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn counts() -> impl Strategy<Value = (u64, u64)> {
        (0u64..5000).prop_flat_map(|n| (0..=n, Just(n)))
    }

    proptest! {
        /// Property: the elite factor is always a finite value in [0, 1]
        #[test]
        fn test_range((e, n) in counts()) {
            let score = elite_factor(e, n).unwrap();
            prop_assert!(score.is_finite());
            prop_assert!((0.0..=1.0).contains(&score));
        }

        /// Property: one more elite work never lowers the score, and raises it
        /// strictly once it is off the zero clamp
        #[test]
        fn test_elite_addition_increases((e, n) in counts()) {
            let before = elite_factor(e, n).unwrap();
            let after = elite_factor(e + 1, n + 1).unwrap();
            prop_assert!(after >= before);
            if after > 0.0 {
                prop_assert!(after > before, "({}, {}) -> {} vs {}", e, n, before, after);
            }
        }

        /// Property: converting a non-elite work to elite (n fixed) raises the score
        #[test]
        fn test_elite_swap_increases((e, n) in counts()) {
            prop_assume!(e < n);
            let before = elite_factor(e, n).unwrap();
            let after = elite_factor(e + 1, n).unwrap();
            prop_assert!(after >= before);
            if after > 0.0 {
                prop_assert!(after > before);
            }
        }

        /// Property: one more non-elite work never raises the score
        #[test]
        fn test_non_elite_addition_decreases((e, n) in counts()) {
            let before = elite_factor(e, n).unwrap();
            let after = elite_factor(e, n + 1).unwrap();
            prop_assert!(after <= before);
            if before > 0.0 {
                prop_assert!(after < before);
            }
        }

        /// Property: the bound never exceeds the posterior mean
        #[test]
        fn test_bound_below_mean((e, n) in counts()) {
            let posterior = BetaPosterior::from_counts(e, n).unwrap();
            prop_assert!(posterior.lower_bound() <= posterior.mean());
            prop_assert!(posterior.alpha >= 1.0 && posterior.beta >= 1.0);
        }
    }
}
