//! Per-artisan recompute result
//!
//! [`ScoreUpdate::compute`] is the single pure function behind every recompute
//! path. Batch and targeted recomputes both call it, so identical inputs give
//! identical stored values.

use crate::prestige::TierResolver;
use crate::provenance::{ArtisanProvenanceSummary, OwnershipEntry};
use crate::{ArtisanRecord, ScoringError};
use std::fmt;

/// Decimal places kept for the elite factor
pub const ELITE_DECIMALS: i32 = 4;

/// Decimal places kept for the provenance factor
pub const PROVENANCE_DECIMALS: i32 = 2;

/// Which of the two independent scores to read or rank
///
/// The two are separate opinions about an artisan and are never combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScoreKind {
    /// Beta-Binomial elite designation factor
    Elite,
    /// Normal pseudo-observation provenance factor
    Provenance,
}

impl ScoreKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreKind::Elite => "elite",
            ScoreKind::Provenance => "provenance",
        }
    }

    /// Parse a kind from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "elite" => Some(ScoreKind::Elite),
            "provenance" => Some(ScoreKind::Provenance),
            _ => None,
        }
    }
}

impl fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Freshly computed scores for one artisan, ready to be written atomically
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreUpdate {
    /// Artisan code
    pub code: String,

    /// Elite factor rounded to [`ELITE_DECIMALS`]
    pub elite_factor: f64,

    /// Provenance aggregate with its factor rounded to [`PROVENANCE_DECIMALS`]
    pub provenance: ArtisanProvenanceSummary,
}

impl ScoreUpdate {
    /// Compute both scores for an artisan
    ///
    /// The two estimators run independently of each other. If either input is
    /// rejected the whole update is rejected, with the artisan code attached,
    /// so a corrupted record is never half-written.
    pub fn compute(
        record: &ArtisanRecord,
        ownership: &[OwnershipEntry],
        resolver: &TierResolver,
    ) -> Result<Self, ScoringError> {
        let elite_factor = record.compute_elite_factor()?;
        let mut provenance = resolver
            .summarize(ownership)
            .map_err(|e| e.for_artisan(&record.code))?;
        provenance.provenance_factor = round_to(provenance.provenance_factor, PROVENANCE_DECIMALS);

        Ok(Self {
            code: record.code.clone(),
            elite_factor: round_to(elite_factor, ELITE_DECIMALS),
            provenance,
        })
    }

    /// The score of the requested kind
    pub fn score(&self, kind: ScoreKind) -> f64 {
        match kind {
            ScoreKind::Elite => self.elite_factor,
            ScoreKind::Provenance => self.provenance.provenance_factor,
        }
    }
}
