//! Configuration for recompute operations
//!
//! Engine settings (chunking, parallelism, schedule) and the optional
//! prestige tier table file.

use crate::EngineError;
use kantei_domain::{PrestigeTier, PrestigeTierTable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Configuration for the recompute service
///
/// # Examples
///
/// ```
/// use kantei_engine::EngineConfig;
///
/// // Default configuration (balanced)
/// let config = EngineConfig::default();
/// assert_eq!(config.chunk_size, 500);
///
/// // Large chunks, frequent sweeps
/// let config = EngineConfig::thorough();
/// assert_eq!(config.chunk_size, 2000);
///
/// // Small chunks, rare sweeps
/// let config = EngineConfig::light();
/// assert_eq!(config.chunk_size, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Artisans loaded and computed per chunk
    /// Default: 500
    pub chunk_size: usize,

    /// Threads for the compute fan-out (0 = rayon's default)
    /// Default: 0
    pub worker_threads: usize,

    /// How often the scheduled worker runs a full recompute (in minutes)
    /// Default: every 60 minutes
    pub sweep_interval_minutes: u64,

    /// Dry-run mode: compute and report without writing scores
    /// Default: false
    pub dry_run: bool,

    /// Persist a checkpoint when a full recompute is interrupted
    /// Default: true
    pub use_checkpoint: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            worker_threads: 0,
            sweep_interval_minutes: 60,
            dry_run: false,
            use_checkpoint: true,
        }
    }
}

impl EngineConfig {
    /// Large chunks and a short sweep interval
    ///
    /// Suitable when the store is local and scores should track data closely.
    pub fn thorough() -> Self {
        Self {
            chunk_size: 2000,
            sweep_interval_minutes: 15,
            ..Self::default()
        }
    }

    /// Small chunks, two threads and a long sweep interval
    ///
    /// Suitable for shared machines.
    pub fn light() -> Self {
        Self {
            chunk_size: 100,
            worker_threads: 2,
            sweep_interval_minutes: 360,
            ..Self::default()
        }
    }

    /// Preset by name: `default`, `thorough` or `light`
    pub fn preset(name: &str) -> Result<Self, EngineError> {
        match name {
            "default" => Ok(Self::default()),
            "thorough" => Ok(Self::thorough()),
            "light" => Ok(Self::light()),
            other => Err(EngineError::Config(format!("unknown preset '{}'", other))),
        }
    }

    /// Parse the `[engine]` table of a TOML document
    ///
    /// A document without an `[engine]` table yields the defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, EngineError> {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(default)]
            engine: Option<EngineConfig>,
        }

        let wrapper: Wrapper = toml::from_str(content).map_err(|e| EngineError::Config(e.to_string()))?;
        let config = wrapper.engine.unwrap_or_default();
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the recompute service cannot run with
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.chunk_size == 0 {
            return Err(EngineError::Config("chunk_size must be at least 1".to_string()));
        }
        if self.sweep_interval_minutes == 0 {
            return Err(EngineError::Config("sweep_interval_minutes must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Get sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_minutes * 60)
    }
}

/// Prestige tier table as written in a TOML file
///
/// ```toml
/// extend_standard = true
///
/// [groups]
/// "matsudaira" = "major-daimyo"
///
/// [members]
/// "matsudaira-sadanobu" = "matsudaira"
///
/// [overrides]
/// "sen-no-rikyu" = 7.5
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierTableConfig {
    /// Start from the shipped table instead of an empty one
    #[serde(default)]
    pub extend_standard: bool,

    /// Group identity → tier name
    #[serde(default)]
    pub groups: BTreeMap<String, String>,

    /// Member identity → group identity
    #[serde(default)]
    pub members: BTreeMap<String, String>,

    /// Identity → explicit score
    #[serde(default)]
    pub overrides: BTreeMap<String, f64>,
}

impl TierTableConfig {
    /// Parse a tier table document
    pub fn from_toml_str(content: &str) -> Result<Self, EngineError> {
        toml::from_str(content).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Read and parse a tier table file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Freeze into an immutable table
    pub fn build(&self) -> Result<PrestigeTierTable, EngineError> {
        let mut builder = if self.extend_standard {
            PrestigeTierTable::standard_builder()
        } else {
            PrestigeTierTable::builder()
        };

        for (group, tier) in &self.groups {
            let tier = PrestigeTier::parse(tier)
                .ok_or_else(|| EngineError::Config(format!("group '{}' has unknown tier '{}'", group, tier)))?;
            builder = builder.group(group.clone(), tier);
        }
        for (member, group) in &self.members {
            builder = builder.member(member.clone(), group.clone());
        }
        for (identity, &score) in &self.overrides {
            builder = builder.override_score(identity.clone(), score);
        }

        builder.build().map_err(|e| EngineError::Config(e.to_string()))
    }
}
