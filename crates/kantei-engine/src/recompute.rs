//! Full-population and targeted recompute

use crate::cancellation::Cancellable;
use crate::{EngineConfig, EngineError, EngineMetrics};
use kantei_domain::traits::{ArtisanQuery, ArtisanStore, RecomputeCheckpoint};
use kantei_domain::{ArtisanRecord, Domain, OwnershipEntry, ScoreUpdate, ScoringError, TierResolver};
use rayon::prelude::*;
use std::fmt::Display;
use std::time::Instant;

/// An artisan whose inputs an estimator refused
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedArtisan {
    /// Artisan code to correct upstream
    pub code: String,
    /// Why it was refused
    pub error: ScoringError,
}

/// How a recompute run ended
#[derive(Debug, Clone, PartialEq)]
pub enum RecomputeStatus {
    /// Every selected artisan was processed
    Completed,
    /// Stopped by cancellation; `last_code` is the resume point, if any
    Interrupted {
        /// Last artisan code processed before stopping
        last_code: Option<String>,
    },
}

/// Outcome of a recompute run
#[derive(Debug, Clone, PartialEq)]
pub struct RecomputeReport {
    /// Artisans whose scores were written (or would be, in dry-run)
    pub written: usize,
    /// Artisans refused by an estimator; nothing was written for them
    pub rejected: Vec<RejectedArtisan>,
    /// Requested codes absent from the store (targeted runs only)
    pub missing: Vec<String>,
    /// Run status
    pub status: RecomputeStatus,
}

impl RecomputeReport {
    fn new() -> Self {
        Self {
            written: 0,
            rejected: Vec::new(),
            missing: Vec::new(),
            status: RecomputeStatus::Completed,
        }
    }

    /// True when the run completed
    pub fn is_complete(&self) -> bool {
        self.status == RecomputeStatus::Completed
    }
}

/// Recompute service: loads aggregates, fans out the estimators, writes scores back
///
/// Records are loaded in chunks of `chunk_size`, each chunk is computed in
/// parallel on rayon, and the results are written one artisan at a time so
/// every write is its own store transaction.
///
/// # Examples
///
/// ```no_run
/// use kantei_engine::{CancellationToken, EngineConfig, Recomputer};
/// use kantei_domain::TierResolver;
/// use kantei_store::SqliteStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut store = SqliteStore::new("kantei.db")?;
/// let mut recomputer = Recomputer::new(EngineConfig::default(), TierResolver::standard())?;
///
/// let report = recomputer.recompute_all(&mut store, None, false, &CancellationToken::new())?;
/// println!("{} written, {} rejected", report.written, report.rejected.len());
/// # Ok(())
/// # }
/// ```
pub struct Recomputer {
    config: EngineConfig,
    resolver: TierResolver,
    metrics: EngineMetrics,
}

impl Recomputer {
    /// Create a new Recomputer with the given configuration and resolver
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` when the configuration is invalid.
    pub fn new(config: EngineConfig, resolver: TierResolver) -> Result<Self, EngineError> {
        config.validate()?;

        // Configure thread pool if specified
        if config.worker_threads > 0 {
            if let Err(e) = rayon::ThreadPoolBuilder::new()
                .num_threads(config.worker_threads)
                .build_global()
            {
                tracing::debug!("Keeping existing rayon pool ({} threads requested): {}", config.worker_threads, e);
            }
        }

        Ok(Self::with_valid_config(config, resolver))
    }

    /// Create a Recomputer with default configuration and the shipped tier table
    pub fn default_config() -> Self {
        Self::with_valid_config(EngineConfig::default(), TierResolver::standard())
    }

    fn with_valid_config(config: EngineConfig, resolver: TierResolver) -> Self {
        Self {
            config,
            resolver,
            metrics: EngineMetrics::new(),
        }
    }

    /// Get a reference to the current metrics
    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Reset metrics counters
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    /// The configuration in use
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The resolver in use
    pub fn resolver(&self) -> &TierResolver {
        &self.resolver
    }

    /// Recompute every artisan, optionally within one domain
    ///
    /// Codes are visited in ascending order. The token is checked between
    /// codes; on cancellation the last processed code is saved as a
    /// checkpoint (unless disabled or in dry-run). With `resume`, a run
    /// picks up after a checkpoint left by an interrupted run over the same
    /// domain filter.
    pub fn recompute_all<S, C>(
        &mut self,
        store: &mut S,
        domain: Option<Domain>,
        resume: bool,
        cancel: &C,
    ) -> Result<RecomputeReport, EngineError>
    where
        S: ArtisanStore,
        S::Error: Display,
        C: Cancellable,
    {
        let start = Instant::now();
        let persist = self.config.use_checkpoint && !self.config.dry_run;
        let mut cursor = if resume { self.resume_point(store, domain)? } else { None };
        let mut report = RecomputeReport::new();

        tracing::info!(
            "Recompute started (domain: {}, resume after: {})",
            domain.map(|d| d.as_str()).unwrap_or("all"),
            cursor.as_deref().unwrap_or("-")
        );

        'chunks: loop {
            let codes = store
                .list_codes(&ArtisanQuery {
                    domain,
                    after: cursor.clone(),
                    limit: Some(self.config.chunk_size),
                })
                .map_err(EngineError::store)?;

            if codes.is_empty() {
                break;
            }

            let inputs = Self::load(store, &codes)?;
            tracing::debug!("Computing chunk of {} artisans from {}", inputs.len(), codes[0]);
            let results = self.compute(&inputs);

            for ((record, _), result) in inputs.iter().zip(results) {
                if cancel.is_cancelled() {
                    report.status = RecomputeStatus::Interrupted {
                        last_code: cursor.clone(),
                    };
                    break 'chunks;
                }
                self.apply(store, record, result, &mut report)?;
                cursor = Some(record.code.clone());
            }

            // Codes deleted between listing and loading still advance the cursor
            if let Some(last) = codes.last() {
                cursor = Some(last.clone());
            }
            if persist {
                if let Some(last_code) = &cursor {
                    store
                        .save_checkpoint(&RecomputeCheckpoint {
                            domain,
                            last_code: last_code.clone(),
                        })
                        .map_err(EngineError::store)?;
                }
            }

            if codes.len() < self.config.chunk_size {
                break;
            }
        }

        match &report.status {
            RecomputeStatus::Completed => {
                if persist {
                    store.clear_checkpoint().map_err(EngineError::store)?;
                }
                self.metrics.record_sweep();
                tracing::info!(
                    "Recompute completed: {} written, {} rejected",
                    report.written,
                    report.rejected.len()
                );
            }
            RecomputeStatus::Interrupted { last_code } => {
                if persist {
                    if let Some(last_code) = last_code {
                        store
                            .save_checkpoint(&RecomputeCheckpoint {
                                domain,
                                last_code: last_code.clone(),
                            })
                            .map_err(EngineError::store)?;
                    }
                }
                self.metrics.record_interrupted();
                tracing::warn!(
                    "Recompute interrupted after {}: {} written, {} rejected",
                    last_code.as_deref().unwrap_or("-"),
                    report.written,
                    report.rejected.len()
                );
            }
        }

        self.metrics.total_runtime_ms += start.elapsed().as_millis();
        Ok(report)
    }

    /// Recompute a specific set of artisans
    ///
    /// Used when upstream data for those codes changed. Produces the same
    /// scores a full recompute would. Unknown codes are reported as missing.
    pub fn recompute_codes<S>(&mut self, store: &mut S, codes: &[String]) -> Result<RecomputeReport, EngineError>
    where
        S: ArtisanStore,
        S::Error: Display,
    {
        let start = Instant::now();
        let mut report = RecomputeReport::new();

        let mut unique: Vec<String> = codes.to_vec();
        unique.sort();
        unique.dedup();

        for chunk in unique.chunks(self.config.chunk_size) {
            let inputs = Self::load(store, chunk)?;
            if inputs.len() < chunk.len() {
                for code in chunk {
                    if !inputs.iter().any(|(record, _)| &record.code == code) {
                        tracing::warn!("Artisan {} not found, skipping", code);
                        report.missing.push(code.clone());
                    }
                }
            }

            let results = self.compute(&inputs);
            for ((record, _), result) in inputs.iter().zip(results) {
                self.apply(store, record, result, &mut report)?;
            }
        }

        self.metrics.total_runtime_ms += start.elapsed().as_millis();
        tracing::info!(
            "Targeted recompute of {} codes: {} written, {} rejected, {} missing",
            unique.len(),
            report.written,
            report.rejected.len(),
            report.missing.len()
        );
        Ok(report)
    }

    /// Recompute one artisan synchronously and return its new scores
    pub fn recompute_one<S>(&mut self, store: &mut S, code: &str) -> Result<ScoreUpdate, EngineError>
    where
        S: ArtisanStore,
        S::Error: Display,
    {
        let record = store
            .get_artisan(code)
            .map_err(EngineError::store)?
            .ok_or_else(|| EngineError::NotFound(code.to_string()))?;
        let ownership = store.get_ownership(code).map_err(EngineError::store)?;

        match ScoreUpdate::compute(&record, &ownership, &self.resolver) {
            Ok(update) => {
                if !self.config.dry_run {
                    store.write_scores(&update).map_err(EngineError::store)?;
                }
                self.metrics.record_written(record.domain);
                Ok(update)
            }
            Err(error) => {
                self.metrics.record_rejected(record.domain);
                Err(EngineError::Invariant {
                    code: code.to_string(),
                    source: error,
                })
            }
        }
    }

    fn resume_point<S>(&self, store: &S, domain: Option<Domain>) -> Result<Option<String>, EngineError>
    where
        S: ArtisanStore,
        S::Error: Display,
    {
        match store.load_checkpoint().map_err(EngineError::store)? {
            Some(checkpoint) if checkpoint.domain == domain => Ok(Some(checkpoint.last_code)),
            Some(checkpoint) => {
                tracing::warn!(
                    "Ignoring checkpoint for domain {}; starting from the beginning",
                    checkpoint.domain.map(|d| d.as_str()).unwrap_or("all")
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Read records and ownership sequentially; the store is single-threaded
    fn load<S>(store: &S, codes: &[String]) -> Result<Vec<(ArtisanRecord, Vec<OwnershipEntry>)>, EngineError>
    where
        S: ArtisanStore,
        S::Error: Display,
    {
        let mut inputs = Vec::with_capacity(codes.len());
        for code in codes {
            let Some(record) = store.get_artisan(code).map_err(EngineError::store)? else {
                continue;
            };
            let ownership = store.get_ownership(code).map_err(EngineError::store)?;
            inputs.push((record, ownership));
        }
        Ok(inputs)
    }

    fn compute(&self, inputs: &[(ArtisanRecord, Vec<OwnershipEntry>)]) -> Vec<Result<ScoreUpdate, ScoringError>> {
        let resolver = &self.resolver;
        inputs
            .par_iter()
            .map(|(record, ownership)| ScoreUpdate::compute(record, ownership, resolver))
            .collect()
    }

    fn apply<S>(
        &mut self,
        store: &mut S,
        record: &ArtisanRecord,
        result: Result<ScoreUpdate, ScoringError>,
        report: &mut RecomputeReport,
    ) -> Result<(), EngineError>
    where
        S: ArtisanStore,
        S::Error: Display,
    {
        match result {
            Ok(update) => {
                if !self.config.dry_run {
                    store.write_scores(&update).map_err(EngineError::store)?;
                }
                report.written += 1;
                self.metrics.record_written(record.domain);
            }
            Err(error) => {
                tracing::warn!("Rejected artisan {}: {}", record.code, error);
                report.rejected.push(RejectedArtisan {
                    code: record.code.clone(),
                    error,
                });
                self.metrics.record_rejected(record.domain);
            }
        }
        Ok(())
    }
}
