//! Import command implementation.

use crate::cli::ImportArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use kantei_domain::{ArtisanRecord, Domain, OwnershipEntry};
use kantei_engine::{RecomputeReport, Recomputer};
use kantei_store::SqliteStore;
use serde::Deserialize;
use std::fs;
use std::io::{self, Read};

/// Execute the import command.
///
/// Returns the report of the follow-up recompute, if one ran.
pub fn execute_import(args: ImportArgs, config: &Config, formatter: &Formatter) -> Result<Option<RecomputeReport>> {
    // Read the document from file or stdin
    let json_data = if args.stdin {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else if let Some(file_path) = args.file {
        fs::read_to_string(file_path)?
    } else {
        return Err(CliError::InvalidInput(
            "Must specify either a file or --stdin".to_string(),
        ));
    };

    let document: ImportFile = serde_json::from_str(&json_data)?;
    if document.artisans.is_empty() {
        return Err(CliError::InvalidInput("No artisans provided".to_string()));
    }

    let mut store = config.open_store()?;
    let codes = import_document(&mut store, document)?;
    println!("{}", formatter.import_result(codes.len()));

    if args.no_recompute {
        return Ok(None);
    }

    let mut recomputer = Recomputer::new(config.engine.clone(), config.resolver()?)?;
    let report = recomputer.recompute_codes(&mut store, &codes)?;
    println!("{}", formatter.format_report(&report)?);
    Ok(Some(report))
}

/// Store every artisan of a document and return the imported codes.
///
/// Counters are stored as given; inconsistent ones are logged here and
/// rejected at recompute.
pub fn import_document(store: &mut SqliteStore, document: ImportFile) -> Result<Vec<String>> {
    // Validate everything before touching the store
    let mut parsed = Vec::with_capacity(document.artisans.len());
    for artisan in document.artisans {
        if artisan.code.trim().is_empty() {
            return Err(CliError::InvalidInput("Artisan code cannot be empty".to_string()));
        }
        let domain = Domain::parse(&artisan.domain).ok_or_else(|| {
            CliError::InvalidInput(format!(
                "Unknown domain '{}' for artisan {}",
                artisan.domain, artisan.code
            ))
        })?;
        parsed.push((domain, artisan));
    }

    let mut batch = Vec::with_capacity(parsed.len());
    for (domain, artisan) in parsed {
        let record = ArtisanRecord::new(artisan.code, domain, artisan.elite_count, artisan.total_count);
        if let Err(e) = record.validate() {
            tracing::warn!("Storing {} as given: {}", record.code, e);
        }

        let entries: Vec<OwnershipEntry> = artisan
            .owners
            .into_iter()
            .map(|o| OwnershipEntry::new(o.owner, o.count))
            .collect();
        tracing::debug!("Importing {} ({} owners)", record.code, entries.len());
        batch.push((record, entries));
    }

    // One transaction for the whole document
    store.import_artisans(&batch)?;
    Ok(batch.into_iter().map(|(record, _)| record.code).collect())
}

/// Import document.
#[derive(Debug, Deserialize)]
pub struct ImportFile {
    /// Artisans to create or update
    pub artisans: Vec<ArtisanImport>,
}

/// One artisan in an import document.
#[derive(Debug, Deserialize)]
pub struct ArtisanImport {
    /// Artisan code
    pub code: String,
    /// `smith` or `fitting-maker`
    pub domain: String,
    /// Works with an elite designation
    pub elite_count: u64,
    /// All designated works
    pub total_count: u64,
    /// Documented owners
    #[serde(default)]
    pub owners: Vec<OwnerImport>,
}

/// One ownership entry in an import document.
#[derive(Debug, Deserialize)]
pub struct OwnerImport {
    /// Normalized owner identity
    pub owner: String,
    /// Works attributed to this owner
    pub count: u32,
}
