//! Percentile and rank service
//!
//! Ranks one domain's population of scores. Domains are never mixed:
//! [`PercentileService::rank`] takes a single domain's scores and
//! [`PercentileService::rank_partitioned`] splits mixed input by domain before
//! ranking each part on its own.

use crate::{Domain, ScoringError};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Coarse letter grade derived from a percentile
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Grade {
    /// Percentile >= 95
    S,
    /// Percentile >= 80
    A,
    /// Percentile >= 60
    B,
    /// Percentile >= 40
    C,
    /// Everything below
    D,
}

impl Grade {
    /// Grade for a percentile in `[0, 100]`
    pub fn from_percentile(percentile: f64) -> Self {
        if percentile >= 95.0 {
            Grade::S
        } else if percentile >= 80.0 {
            Grade::A
        } else if percentile >= 60.0 {
            Grade::B
        } else if percentile >= 40.0 {
            Grade::C
        } else {
            Grade::D
        }
    }

    /// Letter as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::S => "S",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How tied scores are placed on the percentile scale
///
/// Either way, tied scores always share one percentile. The default is the
/// strictly-below share, so a tie group sits at the percentile of its lowest
/// position; `Fractional` is the standard average-rank placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiePolicy {
    /// `100 * (#scores strictly below) / (N - 1)`
    #[default]
    StrictlyBelow,

    /// Fractional (average) rank of the tie group, `100 * (r - 1) / (N - 1)`
    Fractional,
}

/// One artisan's standing within its domain
#[derive(Debug, Clone, PartialEq)]
pub struct RankedArtisan {
    /// Artisan code
    pub code: String,
    /// Score that was ranked
    pub score: f64,
    /// Percentile in `[0, 100]`
    pub percentile: f64,
    /// Dense 1-based rank, ties share the better rank
    pub rank: usize,
    /// Letter grade from the percentile
    pub grade: Grade,
}

/// Ranking of one domain's population
///
/// Entries are ordered best first; equal scores are listed by code.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentileSnapshot {
    domain: Domain,
    entries: Vec<RankedArtisan>,
    index: HashMap<String, usize>,
}

impl PercentileSnapshot {
    /// Domain this snapshot ranks
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Standing of one artisan
    pub fn get(&self, code: &str) -> Option<&RankedArtisan> {
        self.index.get(code).map(|&i| &self.entries[i])
    }

    /// All entries, best first
    pub fn entries(&self) -> &[RankedArtisan] {
        &self.entries
    }

    /// Population size
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the domain had no scores
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A score tagged with its domain, for mixed-population input
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredArtisan {
    /// Artisan code
    pub code: String,
    /// Artisan's domain
    pub domain: Domain,
    /// Score to rank
    pub score: f64,
}

/// Stateless percentile/rank computation
#[derive(Debug, Clone, Copy, Default)]
pub struct PercentileService {
    tie_policy: TiePolicy,
}

impl PercentileService {
    /// Service with the given tie policy
    pub fn new(tie_policy: TiePolicy) -> Self {
        Self { tie_policy }
    }

    /// Tie policy in use
    pub fn tie_policy(&self) -> TiePolicy {
        self.tie_policy
    }

    /// Rank one domain's scores
    ///
    /// Non-finite scores and repeated codes are rejected. Populations of
    /// zero or one member need no comparison: a lone artisan sits at
    /// percentile 100, rank 1.
    pub fn rank<I, S>(&self, domain: Domain, scores: I) -> Result<PercentileSnapshot, ScoringError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut codes: HashSet<String> = HashSet::new();
        let mut sorted: Vec<(String, f64)> = Vec::new();
        for (code, score) in scores {
            let code = code.into();
            if !score.is_finite() {
                return Err(ScoringError::NonFiniteScore { code, score });
            }
            if !codes.insert(code.clone()) {
                return Err(ScoringError::DuplicateArtisan { code });
            }
            sorted.push((code, score));
        }

        // Best first; equal scores by code so the listing is reproducible
        sorted.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let total = sorted.len();
        let mut entries = Vec::with_capacity(total);

        if total <= 1 {
            for (code, score) in sorted {
                entries.push(RankedArtisan {
                    code,
                    score,
                    percentile: 100.0,
                    rank: 1,
                    grade: Grade::from_percentile(100.0),
                });
            }
        } else {
            let denominator = (total - 1) as f64;
            let mut start = 0;
            let mut rank = 0;
            while start < total {
                let score = sorted[start].1;
                let end = start + sorted[start..].iter().take_while(|(_, s)| *s == score).count();
                rank += 1;

                let percentile = match self.tie_policy {
                    TiePolicy::StrictlyBelow => 100.0 * (total - end) as f64 / denominator,
                    TiePolicy::Fractional => {
                        // Ascending positions of this tie group are total-end+1 ..= total-start
                        let average_rank = (2 * total - end - start + 1) as f64 / 2.0;
                        100.0 * (average_rank - 1.0) / denominator
                    }
                };

                for (code, score) in &sorted[start..end] {
                    entries.push(RankedArtisan {
                        code: code.clone(),
                        score: *score,
                        percentile,
                        rank,
                        grade: Grade::from_percentile(percentile),
                    });
                }
                start = end;
            }
        }

        let index = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.code.clone(), i))
            .collect();

        Ok(PercentileSnapshot {
            domain,
            entries,
            index,
        })
    }

    /// Split a mixed population by domain and rank each part separately
    ///
    /// A code submitted under two different domains is rejected, as is a
    /// code repeated within one domain.
    pub fn rank_partitioned<I>(&self, artisans: I) -> Result<BTreeMap<Domain, PercentileSnapshot>, ScoringError>
    where
        I: IntoIterator<Item = ScoredArtisan>,
    {
        let mut seen: HashMap<String, Domain> = HashMap::new();
        let mut partitions: BTreeMap<Domain, Vec<(String, f64)>> = BTreeMap::new();

        for artisan in artisans {
            if let Some(&first) = seen.get(&artisan.code) {
                if first != artisan.domain {
                    return Err(ScoringError::ConflictingDomain {
                        code: artisan.code,
                        first: first.to_string(),
                        second: artisan.domain.to_string(),
                    });
                }
                return Err(ScoringError::DuplicateArtisan { code: artisan.code });
            }
            seen.insert(artisan.code.clone(), artisan.domain);
            partitions
                .entry(artisan.domain)
                .or_default()
                .push((artisan.code, artisan.score));
        }

        partitions
            .into_iter()
            .map(|(domain, scores)| Ok((domain, self.rank(domain, scores)?)))
            .collect()
    }
}

/// Grade for a percentile using the fixed cut points
pub fn grade(percentile: f64) -> Grade {
    Grade::from_percentile(percentile)
}
