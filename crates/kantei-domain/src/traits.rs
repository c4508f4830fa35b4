//! Trait definitions for external interactions
//!
//! The record store is the engine's only collaborator with state. It is
//! implemented by the infrastructure layer (kantei-store) and mocked in tests.

use crate::provenance::OwnershipEntry;
use crate::score::{ScoreKind, ScoreUpdate};
use crate::{ArtisanRecord, Domain};

/// Trait for reading aggregates and writing derived scores
///
/// Implementations must make [`ArtisanStore::write_scores`] atomic per
/// artisan: either every derived field of the update lands or none does.
/// Concurrent writers of the same code may race; last writer wins, which is
/// safe because recompute is deterministic.
pub trait ArtisanStore {
    /// Error type for store operations
    type Error;

    /// Create an artisan or update its domain and counters
    ///
    /// Cached scores are left untouched until the next recompute.
    fn upsert_artisan(&mut self, record: &ArtisanRecord) -> Result<(), Self::Error>;

    /// Get an artisan with its cached scores
    fn get_artisan(&self, code: &str) -> Result<Option<ArtisanRecord>, Self::Error>;

    /// List artisan codes in ascending order
    fn list_codes(&self, query: &ArtisanQuery) -> Result<Vec<String>, Self::Error>;

    /// Replace an artisan's whole set of ownership entries
    fn replace_ownership(&mut self, code: &str, entries: &[OwnershipEntry]) -> Result<(), Self::Error>;

    /// Get an artisan's ownership entries
    fn get_ownership(&self, code: &str) -> Result<Vec<OwnershipEntry>, Self::Error>;

    /// Atomically write both derived scores of one artisan
    fn write_scores(&mut self, update: &ScoreUpdate) -> Result<(), Self::Error>;

    /// Computed scores of one kind for every artisan in a domain
    ///
    /// Artisans that have never been recomputed are omitted.
    fn domain_scores(&self, domain: Domain, kind: ScoreKind) -> Result<Vec<(String, f64)>, Self::Error>;

    /// Checkpoint left by an interrupted full recompute
    fn load_checkpoint(&self) -> Result<Option<RecomputeCheckpoint>, Self::Error>;

    /// Persist a full-recompute checkpoint, replacing any previous one
    fn save_checkpoint(&mut self, checkpoint: &RecomputeCheckpoint) -> Result<(), Self::Error>;

    /// Drop the checkpoint once a full recompute completes
    fn clear_checkpoint(&mut self) -> Result<(), Self::Error>;
}

/// Query criteria for listing artisan codes
#[derive(Debug, Clone, Default)]
pub struct ArtisanQuery {
    /// Filter by domain
    pub domain: Option<Domain>,

    /// Only codes strictly greater than this one (resume point)
    pub after: Option<String>,

    /// Maximum results to return
    pub limit: Option<usize>,
}

/// Resume point of an interrupted full recompute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecomputeCheckpoint {
    /// Domain filter the interrupted run was using
    pub domain: Option<Domain>,

    /// Last artisan code whose scores were fully written
    pub last_code: String,
}
