//! Kantei Domain Layer
//!
//! This crate contains the ranking engine itself: pure, stateless estimators
//! that turn sparse, noisy evidence about historical artisans into
//! conservative scores, plus the percentile service that places those scores
//! within a population. It performs no I/O.
//!
//! ## Key Concepts
//!
//! - **Elite factor**: Beta-Binomial lower credible bound on the rate of elite designations
//! - **Provenance factor**: lower credible bound on mean owner prestige, regularised by pseudo-observations
//! - **Prestige tier**: owner category mapped to a fixed score by an injected lookup table
//! - **Domain**: population partition; percentiles are never computed across domains
//!
//! ## Architecture
//!
//! - Pure computation only, safe to fan out across threads
//! - Storage lives behind the [`traits::ArtisanStore`] trait
//! - Invariant violations are rejected with [`ScoringError`], never clamped

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod artisan;
pub mod elite;
pub mod error;
pub mod percentile;
pub mod prestige;
pub mod provenance;
pub mod provenance_factor;
pub mod score;
pub mod traits;

// Re-exports for convenience
pub use artisan::{ArtisanRecord, Domain};
pub use elite::elite_factor;
pub use error::ScoringError;
pub use percentile::{grade, Grade, PercentileService, PercentileSnapshot, RankedArtisan, ScoredArtisan, TiePolicy};
pub use prestige::{PrestigeTier, PrestigeTierTable, TierResolver};
pub use provenance::{ArtisanProvenanceSummary, OwnershipEntry, ProvenanceObservation};
pub use provenance_factor::provenance_factor;
pub use score::{ScoreKind, ScoreUpdate};
