//! Error types for recompute operations

use kantei_domain::ScoringError;
use thiserror::Error;

/// Errors that can occur during recompute operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Artisan not present in the store
    #[error("Artisan not found: {0}")]
    NotFound(String),

    /// An artisan's inputs were rejected by an estimator
    #[error("Rejected artisan {code}: {source}")]
    Invariant {
        /// Artisan code to correct upstream
        code: String,
        /// Underlying estimator error
        #[source]
        source: ScoringError,
    },
}

impl EngineError {
    /// Wrap a store error
    pub(crate) fn store<E: std::fmt::Display>(e: E) -> Self {
        EngineError::Store(e.to_string())
    }
}

impl From<ScoringError> for EngineError {
    fn from(source: ScoringError) -> Self {
        EngineError::Invariant {
            code: source.artisan_code().unwrap_or("-").to_string(),
            source,
        }
    }
}
