//! Prestige tiers and owner resolution
//!
//! Resolution is a two-level exact lookup: a flat override map for individual
//! family members, then the group/category table, then the Named Collector
//! default. Family inheritance is resolved once when the table is built, so
//! lookups never walk a hierarchy.

use crate::provenance::{ArtisanProvenanceSummary, OwnershipEntry, ProvenanceObservation};
use crate::ScoringError;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Lowest prestige score any owner can carry
pub const MIN_PRESTIGE: f64 = 2.0;

/// Highest prestige score any owner can carry
pub const MAX_PRESTIGE: f64 = 10.0;

/// Owner category, ordered from most to least prestigious
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrestigeTier {
    /// Imperial house
    Imperial,
    /// Shogunal houses
    Shogunal,
    /// The great domain lords
    PremierDaimyo,
    /// Major domain lords
    MajorDaimyo,
    /// All other domain lords
    OtherDaimyo,
    /// Industrial conglomerate families
    Zaibatsu,
    /// Museums, shrines and temples, societies
    Institution,
    /// Any named private collector (the default)
    NamedCollector,
}

impl PrestigeTier {
    /// Every tier, highest first
    pub const ALL: [PrestigeTier; 8] = [
        PrestigeTier::Imperial,
        PrestigeTier::Shogunal,
        PrestigeTier::PremierDaimyo,
        PrestigeTier::MajorDaimyo,
        PrestigeTier::OtherDaimyo,
        PrestigeTier::Zaibatsu,
        PrestigeTier::Institution,
        PrestigeTier::NamedCollector,
    ];

    /// Numeric prestige score of the tier
    pub fn score(&self) -> f64 {
        match self {
            PrestigeTier::Imperial => 10.0,
            PrestigeTier::Shogunal => 9.0,
            PrestigeTier::PremierDaimyo => 8.0,
            PrestigeTier::MajorDaimyo => 6.0,
            PrestigeTier::OtherDaimyo => 4.0,
            PrestigeTier::Zaibatsu => 3.5,
            PrestigeTier::Institution => 3.0,
            PrestigeTier::NamedCollector => 2.0,
        }
    }

    /// Category identifier, also accepted as an owner identity
    pub fn as_str(&self) -> &'static str {
        match self {
            PrestigeTier::Imperial => "imperial",
            PrestigeTier::Shogunal => "shogunal",
            PrestigeTier::PremierDaimyo => "premier-daimyo",
            PrestigeTier::MajorDaimyo => "major-daimyo",
            PrestigeTier::OtherDaimyo => "other-daimyo",
            PrestigeTier::Zaibatsu => "zaibatsu",
            PrestigeTier::Institution => "institution",
            PrestigeTier::NamedCollector => "named-collector",
        }
    }

    /// Parse a category identifier
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.as_str() == s)
    }
}

impl std::str::FromStr for PrestigeTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid prestige tier: {}", s))
    }
}

/// Problems found while building a tier table
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TierTableError {
    /// A member inherits from a group that is not in the table
    #[error("member '{member}' inherits from unknown group '{group}'")]
    UnknownGroup {
        /// Member identity
        member: String,
        /// Missing group identity
        group: String,
    },

    /// An override outside the prestige scale
    #[error("override for '{identity}' is {score}, outside the prestige scale [2, 10]")]
    ScoreOutOfRange {
        /// Overridden identity
        identity: String,
        /// Offending score
        score: f64,
    },
}

/// Immutable owner → prestige lookup table
///
/// Build one with [`PrestigeTierTable::builder`] or use
/// [`PrestigeTierTable::standard`]. Share it between resolvers with an `Arc`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrestigeTierTable {
    overrides: HashMap<String, f64>,
    groups: HashMap<String, PrestigeTier>,
}

impl PrestigeTierTable {
    /// Start an empty table builder
    pub fn builder() -> PrestigeTierTableBuilder {
        PrestigeTierTableBuilder::default()
    }

    /// Table with no entries; everything resolves by category id or default
    pub fn empty() -> Self {
        Self::default()
    }

    /// The shipped hierarchy of historical owner groups
    pub fn standard() -> Self {
        Self::standard_builder()
            .build()
            .unwrap_or_else(|e| unreachable!("standard tier table is consistent: {}", e))
    }

    /// Builder pre-loaded with the shipped hierarchy, ready for extension
    pub fn standard_builder() -> PrestigeTierTableBuilder {
        use PrestigeTier::*;

        let mut builder = Self::builder();
        for (group, tier) in [
            ("imperial-family", Imperial),
            ("imperial-household-agency", Imperial),
            ("tokugawa-shogunate", Shogunal),
            ("ashikaga-shogunate", Shogunal),
            ("owari-tokugawa", PremierDaimyo),
            ("kii-tokugawa", PremierDaimyo),
            ("mito-tokugawa", PremierDaimyo),
            ("maeda", PremierDaimyo),
            ("shimazu", PremierDaimyo),
            ("date", PremierDaimyo),
            ("hosokawa", PremierDaimyo),
            ("kuroda", PremierDaimyo),
            ("asano", PremierDaimyo),
            ("mori", PremierDaimyo),
            ("nabeshima", PremierDaimyo),
            ("ii", MajorDaimyo),
            ("ikeda", MajorDaimyo),
            ("hachisuka", MajorDaimyo),
            ("yamauchi", MajorDaimyo),
            ("todo", MajorDaimyo),
            ("uesugi", MajorDaimyo),
            ("satake", MajorDaimyo),
            ("sakai", MajorDaimyo),
            ("arima", OtherDaimyo),
            ("sanada", OtherDaimyo),
            ("nambu", OtherDaimyo),
            ("tsugaru", OtherDaimyo),
            ("inaba", OtherDaimyo),
            ("mitsui", Zaibatsu),
            ("iwasaki", Zaibatsu),
            ("sumitomo", Zaibatsu),
            ("yasuda", Zaibatsu),
            ("tokyo-national-museum", Institution),
            ("nbthk", Institution),
            ("atsuta-jingu", Institution),
            ("kasuga-taisha", Institution),
            ("sano-art-museum", Institution),
        ] {
            builder = builder.group(group, tier);
        }

        for (member, group) in [
            ("emperor-meiji", "imperial-family"),
            ("tokugawa-ieyasu", "tokugawa-shogunate"),
            ("tokugawa-iemitsu", "tokugawa-shogunate"),
            ("tokugawa-yoshimune", "tokugawa-shogunate"),
            ("ashikaga-yoshimitsu", "ashikaga-shogunate"),
            ("maeda-toshiie", "maeda"),
            ("date-masamune", "date"),
            ("hosokawa-tadaoki", "hosokawa"),
            ("kuroda-nagamasa", "kuroda"),
            ("iwasaki-yataro", "iwasaki"),
        ] {
            builder = builder.member(member, group);
        }

        // Unifiers who held shogun-equivalent power without a shogunal house
        builder = builder
            .override_score("oda-nobunaga", PrestigeTier::Shogunal.score())
            .override_score("toyotomi-hideyoshi", PrestigeTier::Shogunal.score())
            // Branch-family member ranked with the main house, not the branch
            .override_score("tokugawa-mitsukuni", PrestigeTier::Shogunal.score());

        builder
    }

    /// Score from the member override map
    pub fn override_for(&self, identity: &str) -> Option<f64> {
        self.overrides.get(identity).copied()
    }

    /// Tier from the group table, falling back to category identifiers
    pub fn group_tier(&self, identity: &str) -> Option<PrestigeTier> {
        self.groups
            .get(identity)
            .copied()
            .or_else(|| PrestigeTier::parse(identity))
    }

    /// Number of member overrides (inherited and explicit)
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }

    /// Number of groups
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

/// Builder for [`PrestigeTierTable`]
#[derive(Debug, Clone, Default)]
pub struct PrestigeTierTableBuilder {
    groups: HashMap<String, PrestigeTier>,
    members: Vec<(String, String)>,
    overrides: HashMap<String, f64>,
}

impl PrestigeTierTableBuilder {
    /// Register an owner group at a tier
    pub fn group(mut self, identity: impl Into<String>, tier: PrestigeTier) -> Self {
        self.groups.insert(identity.into(), tier);
        self
    }

    /// Register a family member that inherits its group's score
    pub fn member(mut self, identity: impl Into<String>, group: impl Into<String>) -> Self {
        self.members.push((identity.into(), group.into()));
        self
    }

    /// Give an identity an explicit score, winning over inheritance
    pub fn override_score(mut self, identity: impl Into<String>, score: f64) -> Self {
        self.overrides.insert(identity.into(), score);
        self
    }

    /// Flatten inheritance into the override map and freeze the table
    pub fn build(self) -> Result<PrestigeTierTable, TierTableError> {
        for (identity, &score) in &self.overrides {
            if !(MIN_PRESTIGE..=MAX_PRESTIGE).contains(&score) {
                return Err(TierTableError::ScoreOutOfRange {
                    identity: identity.clone(),
                    score,
                });
            }
        }

        let mut flattened = HashMap::with_capacity(self.members.len() + self.overrides.len());
        for (member, group) in self.members {
            let tier = self
                .groups
                .get(&group)
                .copied()
                .or_else(|| PrestigeTier::parse(&group))
                .ok_or_else(|| TierTableError::UnknownGroup {
                    member: member.clone(),
                    group: group.clone(),
                })?;
            flattened.insert(member, tier.score());
        }
        // Explicit overrides take precedence over inheritance
        flattened.extend(self.overrides);

        Ok(PrestigeTierTable {
            overrides: flattened,
            groups: self.groups,
        })
    }
}

/// Where a resolved score came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolutionSource {
    /// Member override map
    Override,
    /// Group or category table
    Group(PrestigeTier),
    /// Unknown identity, Named Collector floor
    Default,
}

/// A resolved owner identity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// Prestige score
    pub score: f64,
    /// Which lookup level produced it
    pub source: ResolutionSource,
}

/// Deterministic owner identity → prestige score resolver
///
/// Inputs must already be normalized (casing, diacritics, aliases). Unknown
/// identities are not errors; they resolve to the Named Collector score.
#[derive(Debug, Clone)]
pub struct TierResolver {
    table: Arc<PrestigeTierTable>,
}

impl TierResolver {
    /// Create a resolver over an injected table
    pub fn new(table: Arc<PrestigeTierTable>) -> Self {
        Self { table }
    }

    /// Resolver over [`PrestigeTierTable::standard`]
    pub fn standard() -> Self {
        Self::new(Arc::new(PrestigeTierTable::standard()))
    }

    /// The table this resolver reads
    pub fn table(&self) -> &PrestigeTierTable {
        &self.table
    }

    /// Resolve an identity and report which level matched
    pub fn explain(&self, owner: &str) -> Resolution {
        if let Some(score) = self.table.override_for(owner) {
            return Resolution {
                score,
                source: ResolutionSource::Override,
            };
        }
        if let Some(tier) = self.table.group_tier(owner) {
            return Resolution {
                score: tier.score(),
                source: ResolutionSource::Group(tier),
            };
        }
        Resolution {
            score: PrestigeTier::NamedCollector.score(),
            source: ResolutionSource::Default,
        }
    }

    /// Resolve an identity to its prestige score
    pub fn resolve(&self, owner: &str) -> f64 {
        self.explain(owner).score
    }

    /// Tier of an identity matched through the group or category table
    pub fn resolve_tier(&self, owner: &str) -> Option<PrestigeTier> {
        match self.explain(owner).source {
            ResolutionSource::Group(tier) => Some(tier),
            _ => None,
        }
    }

    /// Attach prestige scores to ownership entries
    ///
    /// Entries with zero multiplicity are rejected.
    pub fn observe(&self, entries: &[OwnershipEntry]) -> Result<Vec<ProvenanceObservation>, ScoringError> {
        entries
            .iter()
            .map(|entry| {
                if entry.count == 0 {
                    return Err(ScoringError::ZeroMultiplicity {
                        owner: entry.owner.clone(),
                    });
                }
                Ok(ProvenanceObservation {
                    owner: entry.owner.clone(),
                    prestige_score: self.resolve(&entry.owner),
                    count: entry.count,
                })
            })
            .collect()
    }

    /// Resolve and aggregate an artisan's ownership entries
    pub fn summarize(&self, entries: &[OwnershipEntry]) -> Result<ArtisanProvenanceSummary, ScoringError> {
        ArtisanProvenanceSummary::from_observations(&self.observe(entries)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> TierResolver {
        TierResolver::standard()
    }

    #[test]
    fn test_tier_ordering() {
        let scores: Vec<f64> = PrestigeTier::ALL.iter().map(|t| t.score()).collect();
        assert!(scores.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(scores.first(), Some(&MAX_PRESTIGE));
        assert_eq!(scores.last(), Some(&MIN_PRESTIGE));
    }

    #[test]
    fn test_resolve_tier() {
        let r = resolver();
        assert_eq!(r.resolve_tier("maeda"), Some(PrestigeTier::PremierDaimyo));
        assert_eq!(r.resolve_tier("zaibatsu"), Some(PrestigeTier::Zaibatsu));
        // Overrides and unknowns carry no tier
        assert_eq!(r.resolve_tier("oda-nobunaga"), None);
        assert_eq!(r.resolve_tier("nobody-in-particular"), None);
    }

    #[test]
    fn test_group_lookup() {
        let r = resolver();
        assert_eq!(r.resolve("imperial-family"), 10.0);
        assert_eq!(r.resolve("tokugawa-shogunate"), 9.0);
        assert_eq!(r.resolve("maeda"), 8.0);
        assert_eq!(r.resolve("ii"), 6.0);
        assert_eq!(r.resolve("sanada"), 4.0);
        assert_eq!(r.resolve("mitsui"), 3.5);
        assert_eq!(r.resolve("tokyo-national-museum"), 3.0);
    }

    #[test]
    fn test_category_identifiers_resolve() {
        let r = TierResolver::new(Arc::new(PrestigeTierTable::empty()));
        for tier in PrestigeTier::ALL {
            assert_eq!(r.resolve(tier.as_str()), tier.score());
        }
    }

    #[test]
    fn test_member_inherits_group_score() {
        let r = resolver();
        assert_eq!(r.resolve("date-masamune"), r.resolve("date"));
        assert_eq!(r.explain("date-masamune").source, ResolutionSource::Override);
    }

    #[test]
    fn test_override_beats_inheritance() {
        let table = PrestigeTierTable::builder()
            .group("mito-tokugawa", PrestigeTier::PremierDaimyo)
            .member("tokugawa-mitsukuni", "mito-tokugawa")
            .override_score("tokugawa-mitsukuni", 9.0)
            .build()
            .unwrap();
        let r = TierResolver::new(Arc::new(table));
        assert_eq!(r.resolve("tokugawa-mitsukuni"), 9.0);
        assert_eq!(r.resolve("mito-tokugawa"), 8.0);
    }

    #[test]
    fn test_unknown_owner_defaults() {
        let r = resolver();
        let resolution = r.explain("suzuki-taro");
        assert_eq!(resolution.score, 2.0);
        assert_eq!(resolution.source, ResolutionSource::Default);
    }

    #[test]
    fn test_no_fuzzy_matching() {
        let r = resolver();
        assert_eq!(r.resolve("Maeda"), 2.0);
        assert_eq!(r.resolve("maeda "), 2.0);
    }

    #[test]
    fn test_substituted_table() {
        let table = PrestigeTierTable::builder()
            .group("test-house", PrestigeTier::Imperial)
            .build()
            .unwrap();
        let r = TierResolver::new(Arc::new(table));
        assert_eq!(r.resolve("test-house"), 10.0);
        assert_eq!(r.resolve("maeda"), 2.0);
    }

    #[test]
    fn test_build_rejects_unknown_group() {
        let result = PrestigeTierTable::builder()
            .member("someone", "missing-house")
            .build();
        assert!(matches!(result, Err(TierTableError::UnknownGroup { .. })));
    }

    #[test]
    fn test_build_rejects_out_of_range_override() {
        let result = PrestigeTierTable::builder()
            .override_score("someone", 11.0)
            .build();
        assert!(matches!(result, Err(TierTableError::ScoreOutOfRange { .. })));
    }

    #[test]
    fn test_member_may_inherit_from_category() {
        let table = PrestigeTierTable::builder()
            .member("collector-x", "zaibatsu")
            .build()
            .unwrap();
        assert_eq!(table.override_for("collector-x"), Some(3.5));
    }

    #[test]
    fn test_observe_resolves_and_rejects_zero_count() {
        let r = resolver();
        let observations = r
            .observe(&[OwnershipEntry::new("maeda", 2), OwnershipEntry::new("nobody", 1)])
            .unwrap();
        assert_eq!(observations[0].prestige_score, 8.0);
        assert_eq!(observations[0].count, 2);
        assert_eq!(observations[1].prestige_score, 2.0);

        let err = r.observe(&[OwnershipEntry::new("maeda", 0)]).unwrap_err();
        assert!(matches!(err, ScoringError::ZeroMultiplicity { .. }));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let r = resolver();
        let first: Vec<f64> = ["maeda", "nobody", "emperor-meiji"].iter().map(|o| r.resolve(o)).collect();
        let second: Vec<f64> = ["maeda", "nobody", "emperor-meiji"].iter().map(|o| r.resolve(o)).collect();
        assert_eq!(first, second);
    }
}
