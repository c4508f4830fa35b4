//! Provenance observations and their per-artisan aggregate

use crate::provenance_factor::provenance_factor;
use crate::ScoringError;

/// One documented ownership fact as delivered by upstream
///
/// `owner` is already normalized; `count` is how many of the artisan's works
/// share that owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipEntry {
    /// Normalized owner identity or category identifier
    pub owner: String,

    /// Number of works with this owner
    pub count: u32,
}

impl OwnershipEntry {
    /// Create an ownership entry
    pub fn new(owner: impl Into<String>, count: u32) -> Self {
        Self {
            owner: owner.into(),
            count,
        }
    }
}

/// An ownership entry with its resolved prestige score
#[derive(Debug, Clone, PartialEq)]
pub struct ProvenanceObservation {
    /// Normalized owner identity
    pub owner: String,

    /// Prestige score from the tier resolver
    pub prestige_score: f64,

    /// Multiplicity (works sharing this owner)
    pub count: u32,
}

/// Cached aggregate of an artisan's provenance observations
///
/// Sums run over the multiset of observations, so an owner with `count = 3`
/// contributes its score three times.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtisanProvenanceSummary {
    /// Number of observations (sum of multiplicities)
    pub n: u64,

    /// Sum of prestige scores
    pub sum: f64,

    /// Sum of squared prestige scores
    pub sum_sq: f64,

    /// Highest observed prestige score; display only
    pub apex: Option<f64>,

    /// Lower credible bound on the mean prestige score
    pub provenance_factor: f64,
}

impl ArtisanProvenanceSummary {
    /// Aggregate observations and compute the factor
    pub fn from_observations(observations: &[ProvenanceObservation]) -> Result<Self, ScoringError> {
        let mut n = 0u64;
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut apex: Option<f64> = None;

        for obs in observations {
            if obs.count == 0 {
                return Err(ScoringError::ZeroMultiplicity {
                    owner: obs.owner.clone(),
                });
            }
            let weight = f64::from(obs.count);
            n += u64::from(obs.count);
            sum += weight * obs.prestige_score;
            sum_sq += weight * obs.prestige_score * obs.prestige_score;
            apex = Some(apex.map_or(obs.prestige_score, |a| a.max(obs.prestige_score)));
        }

        Self::from_aggregates(n, sum, sum_sq, apex)
    }

    /// Build from stored aggregates, validating them first
    pub fn from_aggregates(n: u64, sum: f64, sum_sq: f64, apex: Option<f64>) -> Result<Self, ScoringError> {
        let provenance_factor = provenance_factor(n, sum, sum_sq)?;
        Ok(Self {
            n,
            sum,
            sum_sq,
            apex: if n == 0 { None } else { apex },
            provenance_factor,
        })
    }

    /// Mean of the real observations (no prior), `None` when empty
    pub fn empirical_mean(&self) -> Option<f64> {
        if self.n == 0 {
            None
        } else {
            Some(self.sum / self.n as f64)
        }
    }
}
