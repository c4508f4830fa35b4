//! Error taxonomy for the estimators
//!
//! Only invariant violations are errors. Degenerate-but-valid inputs (no
//! observations, zero designated works), unknown owners and tiny populations
//! all have well-defined results and never surface here.

use thiserror::Error;

/// Rejected input to one of the estimators
///
/// These indicate a corrupted aggregate upstream. The engine refuses the input
/// instead of clamping it so the bad counter stays visible.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    /// More elite works than designated works
    #[error("elite_count {elite} exceeds total_count {total}")]
    EliteExceedsTotal {
        /// Offending elite counter
        elite: u64,
        /// Offending total counter
        total: u64,
    },

    /// Provenance sums that no real multiset of scores could produce
    #[error("inconsistent provenance aggregate: n={n}, sum={sum}, sum_sq={sum_sq}")]
    InconsistentAggregate {
        /// Number of observations (multiset size)
        n: u64,
        /// Sum of prestige scores
        sum: f64,
        /// Sum of squared prestige scores
        sum_sq: f64,
    },

    /// An ownership entry claiming zero works
    #[error("ownership entry for '{owner}' has zero multiplicity")]
    ZeroMultiplicity {
        /// Owner identity of the empty entry
        owner: String,
    },

    /// A score that is NaN or infinite reached the ranking service
    #[error("non-finite score {score} for artisan {code}")]
    NonFiniteScore {
        /// Artisan code carrying the bad score
        code: String,
        /// The offending value
        score: f64,
    },

    /// The same artisan code was submitted under two domains
    #[error("artisan {code} appears in both {first} and {second}")]
    ConflictingDomain {
        /// Artisan code
        code: String,
        /// Domain seen first
        first: String,
        /// Domain seen second
        second: String,
    },

    /// The same artisan code was submitted twice for one ranking
    #[error("artisan {code} submitted more than once")]
    DuplicateArtisan {
        /// Repeated artisan code
        code: String,
    },

    /// Any of the above, attributed to an artisan
    #[error("artisan {code}: {source}")]
    Artisan {
        /// Artisan code the input belongs to
        code: String,
        /// Underlying violation
        #[source]
        source: Box<ScoringError>,
    },
}

impl ScoringError {
    /// Attach an artisan code so upstream can locate the corrupted record
    ///
    /// Already-attributed errors are returned unchanged.
    pub fn for_artisan(self, code: impl Into<String>) -> Self {
        match self {
            ScoringError::Artisan { .. } => self,
            other => ScoringError::Artisan {
                code: code.into(),
                source: Box::new(other),
            },
        }
    }

    /// The artisan code this error is attributed to, if any
    pub fn artisan_code(&self) -> Option<&str> {
        match self {
            ScoringError::Artisan { code, .. } => Some(code),
            ScoringError::NonFiniteScore { code, .. } => Some(code),
            ScoringError::ConflictingDomain { code, .. } => Some(code),
            ScoringError::DuplicateArtisan { code } => Some(code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_artisan_attaches_code() {
        let err = ScoringError::EliteExceedsTotal { elite: 5, total: 3 }.for_artisan("MAS590");
        assert_eq!(err.artisan_code(), Some("MAS590"));
        assert_eq!(
            err.to_string(),
            "artisan MAS590: elite_count 5 exceeds total_count 3"
        );
    }

    #[test]
    fn test_for_artisan_is_not_nested_twice() {
        let err = ScoringError::EliteExceedsTotal { elite: 5, total: 3 }
            .for_artisan("MAS590")
            .for_artisan("OTHER");
        assert_eq!(err.artisan_code(), Some("MAS590"));
    }
}
