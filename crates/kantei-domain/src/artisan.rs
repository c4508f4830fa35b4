//! Artisan module - the unit being ranked

use crate::elite::elite_factor;
use crate::provenance::ArtisanProvenanceSummary;
use crate::ScoringError;
use std::fmt;

/// Ranking domain of an artisan
///
/// Domains are mutually exclusive populations. Percentiles are only ever
/// computed within one domain because elite rates differ structurally between
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Domain {
    /// Swordsmiths
    Smith,

    /// Makers of sword fittings
    FittingMaker,
}

impl Domain {
    /// Every domain, in a fixed order
    pub const ALL: [Domain; 2] = [Domain::Smith, Domain::FittingMaker];

    /// Get the domain name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Smith => "smith",
            Domain::FittingMaker => "fitting-maker",
        }
    }

    /// Parse a domain from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "smith" => Some(Domain::Smith),
            "fitting-maker" | "fitting_maker" => Some(Domain::FittingMaker),
            _ => None,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid domain: {}", s))
    }
}

/// An artisan with its designation counters and cached derived scores
///
/// Counters are owned by the upstream aggregation; `elite_factor` and
/// `provenance` are caches that the recompute service refreshes after any
/// counter or observation change.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtisanRecord {
    /// Unique artisan code
    pub code: String,

    /// Population this artisan is ranked in
    pub domain: Domain,

    /// Works holding an elite designation
    pub elite_count: u64,

    /// All designated works, elite or not
    pub total_count: u64,

    /// Cached elite factor (4 decimal places), `None` until first computed
    pub elite_factor: Option<f64>,

    /// Cached provenance summary, `None` until first computed
    pub provenance: Option<ArtisanProvenanceSummary>,
}

impl ArtisanRecord {
    /// Create a record with counters and no cached scores
    pub fn new(code: impl Into<String>, domain: Domain, elite_count: u64, total_count: u64) -> Self {
        Self {
            code: code.into(),
            domain,
            elite_count,
            total_count,
            elite_factor: None,
            provenance: None,
        }
    }

    /// Check the counter invariant `elite_count <= total_count`
    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.elite_count > self.total_count {
            return Err(ScoringError::EliteExceedsTotal {
                elite: self.elite_count,
                total: self.total_count,
            }
            .for_artisan(&self.code));
        }
        Ok(())
    }

    /// Compute the elite factor from the current counters (full precision)
    ///
    /// Errors carry the artisan code.
    pub fn compute_elite_factor(&self) -> Result<f64, ScoringError> {
        elite_factor(self.elite_count, self.total_count).map_err(|e| e.for_artisan(&self.code))
    }

    /// Cached provenance factor, if computed
    pub fn provenance_factor(&self) -> Option<f64> {
        self.provenance.as_ref().map(|p| p.provenance_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_parse() {
        assert_eq!(Domain::parse("smith"), Some(Domain::Smith));
        assert_eq!(Domain::parse("Fitting-Maker"), Some(Domain::FittingMaker));
        assert_eq!(Domain::parse("fitting_maker"), Some(Domain::FittingMaker));
        assert_eq!(Domain::parse("painter"), None);
        assert!("painter".parse::<Domain>().is_err());
    }

    #[test]
    fn test_domain_roundtrip_strings() {
        for domain in Domain::ALL {
            assert_eq!(Domain::parse(domain.as_str()), Some(domain));
            assert_eq!(domain.to_string(), domain.as_str());
        }
    }

    #[test]
    fn test_validate_rejects_elite_over_total() {
        let record = ArtisanRecord::new("KUN123", Domain::Smith, 4, 3);
        let err = record.validate().unwrap_err();
        assert_eq!(err.artisan_code(), Some("KUN123"));
    }

    #[test]
    fn test_compute_elite_factor_attaches_code() {
        let record = ArtisanRecord::new("KUN123", Domain::Smith, 4, 3);
        let err = record.compute_elite_factor().unwrap_err();
        assert!(err.to_string().contains("KUN123"));

        let record = ArtisanRecord::new("KUN124", Domain::Smith, 29, 30);
        assert!((record.compute_elite_factor().unwrap() - 0.6388).abs() < 1e-4);
    }
}
