//! Background worker for scheduled full recomputes

use crate::cancellation::Cancellable;
use crate::{CancellationToken, EngineConfig, EngineError, EngineMetrics, Recomputer};
use kantei_domain::traits::ArtisanStore;
use kantei_domain::TierResolver;
use std::fmt::Display;
use tokio::time::{interval, Duration};

/// Background worker that runs a full recompute on a schedule
///
/// Each cycle resumes from a checkpoint left by an interrupted cycle. Ctrl+C
/// cancels the running recompute between artisans, so the checkpoint is
/// written before the worker exits.
///
/// # Examples
///
/// ```no_run
/// use kantei_engine::{EngineConfig, RecomputeWorker};
/// use kantei_domain::TierResolver;
/// use kantei_store::SqliteStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut store = SqliteStore::new("kantei.db")?;
///     let mut worker = RecomputeWorker::new(EngineConfig::default(), TierResolver::standard())?;
///
///     // Run indefinitely (until Ctrl+C)
///     worker.run(&mut store).await?;
///     Ok(())
/// }
/// ```
pub struct RecomputeWorker {
    recomputer: Recomputer,
    interval: Duration,
    cancel: CancellationToken,
}

impl RecomputeWorker {
    /// Create a new background worker with the given configuration
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` when the configuration is invalid.
    pub fn new(config: EngineConfig, resolver: TierResolver) -> Result<Self, EngineError> {
        let interval = config.sweep_interval();
        Ok(Self {
            recomputer: Recomputer::new(config, resolver)?,
            interval,
            cancel: CancellationToken::new(),
        })
    }

    /// Create a worker with default configuration
    pub fn default_config() -> Self {
        let config = EngineConfig::default();
        Self {
            interval: config.sweep_interval(),
            recomputer: Recomputer::default_config(),
            cancel: CancellationToken::new(),
        }
    }

    /// Override the schedule interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Token that stops the worker; clone it to shut down from elsewhere
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the worker until Ctrl+C or cancellation
    ///
    /// Cancelling the token from elsewhere stops the worker without waiting
    /// for the next tick. Failed cycles are logged and retried on the next
    /// tick.
    pub async fn run<S>(&mut self, store: &mut S) -> Result<(), EngineError>
    where
        S: ArtisanStore,
        S::Error: Display,
    {
        let mut ticker = interval(self.interval);
        let cancel = self.cancel.clone();

        let token = self.cancel.clone();
        let signal = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received, stopping recompute worker");
                    token.cancel();
                }
                Err(e) => tracing::warn!("Cannot listen for Ctrl+C: {}", e),
            }
        });

        tracing::info!("Recompute worker started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if cancel.is_cancelled() {
                        break;
                    }
                    tracing::debug!("Starting scheduled recompute");

                    if let Err(e) = self.cycle(store) {
                        tracing::error!("Scheduled recompute failed: {}", e);
                    }
                }
            }
        }

        signal.abort();
        tracing::info!("Recompute worker stopped. Final metrics:\n{}", self.metrics().summary());
        Ok(())
    }

    /// Run for a specific number of cycles (useful for testing)
    pub async fn run_cycles<S>(&mut self, store: &mut S, cycles: usize) -> Result<(), EngineError>
    where
        S: ArtisanStore,
        S::Error: Display,
    {
        let mut ticker = interval(self.interval);

        tracing::info!(
            "Recompute worker started for {} cycles (interval: {:?})",
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            ticker.tick().await;
            if self.cancel.is_cancelled() {
                break;
            }

            tracing::debug!("Starting recompute cycle {}/{}", cycle + 1, cycles);
            if let Err(e) = self.cycle(store) {
                tracing::error!("Recompute {}/{} failed: {}", cycle + 1, cycles, e);
                return Err(e);
            }
        }

        tracing::info!(
            "Recompute worker finished {} cycles. Final metrics:\n{}",
            cycles,
            self.metrics().summary()
        );
        Ok(())
    }

    fn cycle<S>(&mut self, store: &mut S) -> Result<(), EngineError>
    where
        S: ArtisanStore,
        S::Error: Display,
    {
        let resume = self.recomputer.config().use_checkpoint;
        let report = self.recomputer.recompute_all(store, None, resume, &self.cancel)?;
        tracing::info!(
            "Scheduled recompute: {} written, {} rejected",
            report.written,
            report.rejected.len()
        );
        Ok(())
    }

    /// Get a reference to the current metrics
    pub fn metrics(&self) -> &EngineMetrics {
        self.recomputer.metrics()
    }

    /// Reset the metrics counters
    pub fn reset_metrics(&mut self) {
        self.recomputer.reset_metrics();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kantei_domain::traits::{ArtisanQuery, RecomputeCheckpoint};
    use kantei_domain::{ArtisanRecord, Domain, OwnershipEntry, ScoreKind, ScoreUpdate};

    // Mock store for testing
    struct MockStore {
        records: Vec<ArtisanRecord>,
        fail_listing: bool,
    }

    impl MockStore {
        fn new() -> Self {
            Self {
                records: vec![
                    ArtisanRecord::new("A-01", Domain::Smith, 3, 10),
                    ArtisanRecord::new("B-01", Domain::FittingMaker, 0, 4),
                ],
                fail_listing: false,
            }
        }
    }

    impl ArtisanStore for MockStore {
        type Error = String;

        fn upsert_artisan(&mut self, record: &ArtisanRecord) -> Result<(), Self::Error> {
            self.records.push(record.clone());
            Ok(())
        }

        fn get_artisan(&self, code: &str) -> Result<Option<ArtisanRecord>, Self::Error> {
            Ok(self.records.iter().find(|r| r.code == code).cloned())
        }

        fn list_codes(&self, query: &ArtisanQuery) -> Result<Vec<String>, Self::Error> {
            if self.fail_listing {
                return Err("database is locked".to_string());
            }
            Ok(self
                .records
                .iter()
                .filter(|r| query.after.as_ref().map_or(true, |a| &r.code > a))
                .map(|r| r.code.clone())
                .collect())
        }

        fn replace_ownership(&mut self, _code: &str, _entries: &[OwnershipEntry]) -> Result<(), Self::Error> {
            Ok(())
        }

        fn get_ownership(&self, _code: &str) -> Result<Vec<OwnershipEntry>, Self::Error> {
            Ok(Vec::new())
        }

        fn write_scores(&mut self, update: &ScoreUpdate) -> Result<(), Self::Error> {
            if let Some(record) = self.records.iter_mut().find(|r| r.code == update.code) {
                record.elite_factor = Some(update.elite_factor);
            }
            Ok(())
        }

        fn domain_scores(&self, _domain: Domain, _kind: ScoreKind) -> Result<Vec<(String, f64)>, Self::Error> {
            Ok(Vec::new())
        }

        fn load_checkpoint(&self) -> Result<Option<RecomputeCheckpoint>, Self::Error> {
            Ok(None)
        }

        fn save_checkpoint(&mut self, _checkpoint: &RecomputeCheckpoint) -> Result<(), Self::Error> {
            Ok(())
        }

        fn clear_checkpoint(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    fn fast_worker() -> RecomputeWorker {
        RecomputeWorker::default_config().with_interval(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_worker_creation() {
        let worker = RecomputeWorker::default_config();
        assert_eq!(worker.metrics().sweep_count, 0);
    }

    #[tokio::test]
    async fn test_run_cycles() {
        let mut store = MockStore::new();
        let mut worker = fast_worker();

        worker.run_cycles(&mut store, 2).await.unwrap();

        assert_eq!(worker.metrics().sweep_count, 2);
        assert_eq!(worker.metrics().total_written(), 4);
        assert!(store.records.iter().all(|r| r.elite_factor.is_some()));
    }

    #[tokio::test]
    async fn test_cycle_error_propagates() {
        let mut store = MockStore::new();
        store.fail_listing = true;
        let mut worker = fast_worker();

        let result = worker.run_cycles(&mut store, 1).await;
        assert!(matches!(result, Err(EngineError::Store(_))));
    }

    #[tokio::test]
    async fn test_cancelled_worker_stops() {
        let mut store = MockStore::new();
        let mut worker = fast_worker();
        worker.cancellation_token().cancel();

        worker.run_cycles(&mut store, 3).await.unwrap();
        assert_eq!(worker.metrics().sweep_count, 0);
    }

    #[tokio::test]
    async fn test_external_cancellation_stops_run() {
        let mut store = MockStore::new();
        let mut worker = RecomputeWorker::default_config().with_interval(Duration::from_secs(30));
        let token = worker.cancellation_token();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            token.cancel();
        });

        let result = tokio::time::timeout(Duration::from_secs(3), worker.run(&mut store)).await;
        assert!(matches!(result, Ok(Ok(()))));
        // Only the immediate first tick ran
        assert_eq!(worker.metrics().sweep_count, 1);
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = EngineConfig {
            sweep_interval_minutes: 0,
            ..EngineConfig::default()
        };
        assert!(RecomputeWorker::new(config, TierResolver::standard()).is_err());
    }

    #[tokio::test]
    async fn test_reset_metrics() {
        let mut store = MockStore::new();
        let mut worker = fast_worker();

        worker.run_cycles(&mut store, 1).await.unwrap();
        assert_eq!(worker.metrics().sweep_count, 1);

        worker.reset_metrics();
        assert_eq!(worker.metrics().sweep_count, 0);
    }
}
