//! Kantei Recompute Engine
//!
//! Drives the pure estimators in `kantei-domain` over a record store.
//!
//! # Overview
//!
//! The engine is responsible for:
//! - **Full recompute**: every artisan (or one domain), in chunks, resumable after interruption
//! - **Targeted recompute**: only the codes whose upstream data changed
//! - **Percentile snapshots**: ranking a domain from stored scores
//! - **Scheduling**: a tokio worker running full recomputes on an interval
//!
//! # Architecture
//!
//! Records are read sequentially from the store, computed in parallel with
//! rayon, then written back one artisan per transaction. A rejected artisan
//! is reported with its code and never written, so the previous scores stay
//! in place until the upstream counters are corrected.
//!
//! | Step | Where | Parallel |
//! |------|-------|----------|
//! | List codes, load records and ownership | store | no |
//! | Resolve tiers, compute both factors | rayon | yes |
//! | Write scores | store, one transaction per artisan | no |
//! | Save checkpoint | store, per chunk and on cancellation | no |
//!
//! # Usage
//!
//! ## One-time Recompute
//!
//! ```no_run
//! use kantei_engine::{CancellationToken, Recomputer};
//! use kantei_store::SqliteStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = SqliteStore::new("kantei.db")?;
//! let mut recomputer = Recomputer::default_config();
//!
//! let report = recomputer.recompute_all(&mut store, None, false, &CancellationToken::new())?;
//! println!("{}", recomputer.metrics().summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Background Worker
//!
//! ```no_run
//! use kantei_engine::{EngineConfig, RecomputeWorker};
//! use kantei_domain::TierResolver;
//! use kantei_store::SqliteStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut store = SqliteStore::new("kantei.db")?;
//!     let mut worker = RecomputeWorker::new(EngineConfig::default(), TierResolver::standard())?;
//!
//!     // Run indefinitely (until Ctrl+C)
//!     worker.run(&mut store).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [engine]
//! chunk_size = 500
//! worker_threads = 0
//! sweep_interval_minutes = 60
//! dry_run = false
//! use_checkpoint = true
//! ```

#![warn(missing_docs)]

mod cancellation;
mod config;
mod error;
mod metrics;
mod ranking;
mod recompute;
mod worker;

pub use cancellation::{Cancellable, CancellationToken};
pub use config::{EngineConfig, TierTableConfig};
pub use error::EngineError;
pub use metrics::EngineMetrics;
pub use ranking::rank_domain;
pub use recompute::{RecomputeReport, RecomputeStatus, Recomputer, RejectedArtisan};
pub use worker::RecomputeWorker;
