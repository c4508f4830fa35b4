//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use kantei_domain::TierResolver;
use kantei_engine::{EngineConfig, TierTableConfig};
use kantei_store::SqliteStore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database file
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Optional prestige tier table file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier_table: Option<PathBuf>,

    /// Recompute engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Directory holding the configuration and default database.
    pub fn dir() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".kantei"))
    }

    /// Get the configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::dir()?.join("config.toml"))
    }

    /// Load configuration from the default location, or defaults if absent.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::path()?)
    }

    /// Load configuration from a file, or defaults if it does not exist.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            config.engine.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Open (creating if needed) the configured database.
    pub fn open_store(&self) -> Result<SqliteStore> {
        if let Some(parent) = self.database.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        tracing::debug!("Opening database {}", self.database.display());
        Ok(SqliteStore::new(&self.database)?)
    }

    /// Tier resolver over the configured table, or the shipped one.
    pub fn resolver(&self) -> Result<TierResolver> {
        match &self.tier_table {
            Some(path) => {
                let table = TierTableConfig::load(path)?.build()?;
                tracing::debug!(
                    "Loaded tier table {} ({} groups, {} overrides)",
                    path.display(),
                    table.group_count(),
                    table.override_count()
                );
                Ok(TierResolver::new(Arc::new(table)))
            }
            None => Ok(TierResolver::standard()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            tier_table: None,
            engine: EngineConfig::default(),
            settings: Settings::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_database() -> PathBuf {
    Config::dir()
        .map(|dir| dir.join("kantei.db"))
        .unwrap_or_else(|_| PathBuf::from("kantei.db"))
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.database.ends_with("kantei.db"));
        assert!(config.tier_table.is_none());
        assert!(config.settings.color);
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn test_written_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.database = dir.path().join("test.db");
        config.engine.chunk_size = 42;
        config.settings.format = OutputFormat::Json;
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "database = \"/tmp/k.db\"\n\n[engine]\ndry_run = true\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.database, PathBuf::from("/tmp/k.db"));
        assert!(loaded.engine.dry_run);
        assert_eq!(loaded.engine.chunk_size, 500);
        assert_eq!(loaded.settings.format, OutputFormat::Table);
    }

    #[test]
    fn test_invalid_engine_settings_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[engine]\nchunk_size = 0\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_resolver_from_tier_table_file() {
        let dir = tempfile::tempdir().unwrap();
        let table = dir.path().join("tiers.toml");
        fs::write(&table, "extend_standard = true\n[overrides]\n\"sen-no-rikyu\" = 7.5\n").unwrap();

        let config = Config {
            tier_table: Some(table),
            ..Config::default()
        };
        let resolver = config.resolver().unwrap();
        assert_eq!(resolver.resolve("sen-no-rikyu"), 7.5);
        assert_eq!(resolver.resolve("imperial-family"), 10.0);
    }

    #[test]
    fn test_open_store_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            database: dir.path().join("data").join("kantei.db"),
            ..Config::default()
        };
        assert!(config.open_store().is_ok());
        assert!(dir.path().join("data").join("kantei.db").exists());
    }
}
