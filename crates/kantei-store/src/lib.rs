//! Kantei Storage Layer
//!
//! Implements the ArtisanStore trait on SQLite.
//!
//! # Architecture
//!
//! - `artisans` holds identity, domain, designation counters and the cached elite factor
//! - `ownership` holds the (owner, count) entries per artisan
//! - `provenance_summaries` caches the provenance aggregate and factor
//! - `recompute_checkpoint` holds at most one resume point for full recomputes
//!
//! # Examples
//!
//! ```no_run
//! use kantei_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for artisan operations
//! ```

#![warn(missing_docs)]

use kantei_domain::traits::{ArtisanQuery, ArtisanStore, RecomputeCheckpoint};
use kantei_domain::{ArtisanProvenanceSummary, ArtisanRecord, Domain, OwnershipEntry, ScoreKind, ScoreUpdate};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Artisan not found
    #[error("Artisan not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of ArtisanStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// SqliteStore instance; the recompute service computes in parallel but writes
/// through a single store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use kantei_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("kantei.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// In-memory store
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::new(":memory:")
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Number of artisans, optionally within one domain
    pub fn artisan_count(&self, domain: Option<Domain>) -> Result<usize, StoreError> {
        let count: i64 = match domain {
            Some(d) => self.conn.query_row(
                "SELECT COUNT(*) FROM artisans WHERE domain = ?1",
                params![d.as_str()],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM artisans", [], |row| row.get(0))?,
        };
        Ok(count as usize)
    }

    /// Create or update several artisans and their ownership in one transaction
    ///
    /// Either the whole batch is stored or, on any error, none of it.
    pub fn import_artisans(&mut self, batch: &[(ArtisanRecord, Vec<OwnershipEntry>)]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        for (record, entries) in batch {
            Self::upsert_in(&tx, record)?;
            Self::write_ownership(&tx, &record.code, entries)?;
        }
        tx.commit()?;

        tracing::debug!("Imported {} artisans", batch.len());
        Ok(())
    }

    fn upsert_in(conn: &Connection, record: &ArtisanRecord) -> Result<(), StoreError> {
        let elite = i64::try_from(record.elite_count)
            .map_err(|_| StoreError::InvalidData(format!("elite_count overflow for {}", record.code)))?;
        let total = i64::try_from(record.total_count)
            .map_err(|_| StoreError::InvalidData(format!("total_count overflow for {}", record.code)))?;

        conn.execute(
            "INSERT INTO artisans (code, domain, elite_count, total_count)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(code) DO UPDATE SET
             domain = excluded.domain,
             elite_count = excluded.elite_count,
             total_count = excluded.total_count",
            params![&record.code, record.domain.as_str(), elite, total],
        )?;
        Ok(())
    }

    fn write_ownership(conn: &Connection, code: &str, entries: &[OwnershipEntry]) -> Result<(), StoreError> {
        conn.execute("DELETE FROM ownership WHERE code = ?1", params![code])?;
        // Repeated owners in one submission accumulate
        let mut insert = conn.prepare(
            "INSERT INTO ownership (code, owner, count) VALUES (?1, ?2, ?3)
             ON CONFLICT(code, owner) DO UPDATE SET count = count + excluded.count",
        )?;
        for entry in entries {
            insert.execute(params![code, &entry.owner, entry.count])?;
        }
        Ok(())
    }

    /// Convert a stored counter to u64, rejecting negatives
    fn counter(value: i64, column: &str, code: &str) -> Result<u64, StoreError> {
        u64::try_from(value).map_err(|_| {
            StoreError::InvalidData(format!("negative {} ({}) for artisan {}", column, value, code))
        })
    }

    /// Convert a stored domain string
    fn parse_domain(value: &str, code: &str) -> Result<Domain, StoreError> {
        Domain::parse(value)
            .ok_or_else(|| StoreError::InvalidData(format!("unknown domain '{}' for artisan {}", value, code)))
    }

    fn conversion_error(column: usize, e: StoreError) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Integer, Box::new(e))
    }

    fn exists(&self, code: &str) -> Result<bool, StoreError> {
        Ok(self
            .conn
            .query_row("SELECT 1 FROM artisans WHERE code = ?1", params![code], |_| Ok(true))
            .optional()?
            .unwrap_or(false))
    }

    fn get_summary(&self, code: &str) -> Result<Option<ArtisanProvenanceSummary>, StoreError> {
        let summary = self
            .conn
            .query_row(
                "SELECT n, sum_score, sum_sq_score, apex, provenance_factor
                 FROM provenance_summaries WHERE code = ?1",
                params![code],
                |row| {
                    let n = Self::counter(row.get(0)?, "n", code).map_err(|e| Self::conversion_error(0, e))?;
                    Ok(ArtisanProvenanceSummary {
                        n,
                        sum: row.get(1)?,
                        sum_sq: row.get(2)?,
                        apex: row.get(3)?,
                        provenance_factor: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(summary)
    }
}

impl ArtisanStore for SqliteStore {
    type Error = StoreError;

    fn upsert_artisan(&mut self, record: &ArtisanRecord) -> Result<(), Self::Error> {
        Self::upsert_in(&self.conn, record)
    }

    fn get_artisan(&self, code: &str) -> Result<Option<ArtisanRecord>, Self::Error> {
        let row = self
            .conn
            .query_row(
                "SELECT domain, elite_count, total_count, elite_factor FROM artisans WHERE code = ?1",
                params![code],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, Option<f64>>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((domain, elite, total, elite_factor)) = row else {
            return Ok(None);
        };

        Ok(Some(ArtisanRecord {
            code: code.to_string(),
            domain: Self::parse_domain(&domain, code)?,
            elite_count: Self::counter(elite, "elite_count", code)?,
            total_count: Self::counter(total, "total_count", code)?,
            elite_factor,
            provenance: self.get_summary(code)?,
        }))
    }

    fn list_codes(&self, query: &ArtisanQuery) -> Result<Vec<String>, Self::Error> {
        let mut sql = String::from("SELECT code FROM artisans WHERE 1=1");
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(domain) = query.domain {
            sql.push_str(" AND domain = ?");
            params.push(Box::new(domain.as_str()));
        }

        if let Some(after) = &query.after {
            sql.push_str(" AND code > ?");
            params.push(Box::new(after.clone()));
        }

        sql.push_str(" ORDER BY code ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let codes = stmt
            .query_map(&param_refs[..], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(codes)
    }

    fn replace_ownership(&mut self, code: &str, entries: &[OwnershipEntry]) -> Result<(), Self::Error> {
        if !self.exists(code)? {
            return Err(StoreError::NotFound(code.to_string()));
        }

        let tx = self.conn.transaction()?;
        Self::write_ownership(&tx, code, entries)?;
        tx.commit()?;

        tracing::debug!("Replaced ownership for {} ({} entries)", code, entries.len());
        Ok(())
    }

    fn get_ownership(&self, code: &str) -> Result<Vec<OwnershipEntry>, Self::Error> {
        // Fixed order keeps the float sums reproducible
        let mut stmt = self
            .conn
            .prepare("SELECT owner, count FROM ownership WHERE code = ?1 ORDER BY owner ASC")?;

        let entries = stmt
            .query_map(params![code], |row| {
                let count: i64 = row.get(1)?;
                let count = u32::try_from(count).map_err(|_| {
                    Self::conversion_error(
                        1,
                        StoreError::InvalidData(format!("ownership count {} out of range for {}", count, code)),
                    )
                })?;
                Ok(OwnershipEntry {
                    owner: row.get(0)?,
                    count,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    fn write_scores(&mut self, update: &ScoreUpdate) -> Result<(), Self::Error> {
        let n = i64::try_from(update.provenance.n)
            .map_err(|_| StoreError::InvalidData(format!("observation count overflow for {}", update.code)))?;

        let tx = self.conn.transaction()?;
        let updated = tx.execute(
            "UPDATE artisans SET elite_factor = ?2 WHERE code = ?1",
            params![&update.code, update.elite_factor],
        )?;
        if updated == 0 {
            // Dropping the transaction rolls it back
            return Err(StoreError::NotFound(update.code.clone()));
        }
        tx.execute(
            "INSERT INTO provenance_summaries (code, n, sum_score, sum_sq_score, apex, provenance_factor)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(code) DO UPDATE SET
             n = excluded.n,
             sum_score = excluded.sum_score,
             sum_sq_score = excluded.sum_sq_score,
             apex = excluded.apex,
             provenance_factor = excluded.provenance_factor",
            params![
                &update.code,
                n,
                update.provenance.sum,
                update.provenance.sum_sq,
                update.provenance.apex,
                update.provenance.provenance_factor,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn domain_scores(&self, domain: Domain, kind: ScoreKind) -> Result<Vec<(String, f64)>, Self::Error> {
        let sql = match kind {
            ScoreKind::Elite => {
                "SELECT code, elite_factor FROM artisans
                 WHERE domain = ?1 AND elite_factor IS NOT NULL
                 ORDER BY code ASC"
            }
            ScoreKind::Provenance => {
                "SELECT a.code, p.provenance_factor FROM artisans a
                 JOIN provenance_summaries p ON p.code = a.code
                 WHERE a.domain = ?1
                 ORDER BY a.code ASC"
            }
        };

        let mut stmt = self.conn.prepare(sql)?;
        let scores = stmt
            .query_map(params![domain.as_str()], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<(String, f64)>, _>>()?;

        Ok(scores)
    }

    fn load_checkpoint(&self) -> Result<Option<RecomputeCheckpoint>, Self::Error> {
        let row = self
            .conn
            .query_row(
                "SELECT domain, last_code FROM recompute_checkpoint WHERE id = 1",
                [],
                |row| Ok((row.get::<_, Option<String>>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let Some((domain, last_code)) = row else {
            return Ok(None);
        };

        let domain = match domain {
            Some(d) => Some(
                Domain::parse(&d).ok_or_else(|| StoreError::InvalidData(format!("unknown checkpoint domain '{}'", d)))?,
            ),
            None => None,
        };

        Ok(Some(RecomputeCheckpoint { domain, last_code }))
    }

    fn save_checkpoint(&mut self, checkpoint: &RecomputeCheckpoint) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT INTO recompute_checkpoint (id, domain, last_code) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET domain = excluded.domain, last_code = excluded.last_code",
            params![checkpoint.domain.map(|d| d.as_str()), &checkpoint.last_code],
        )?;
        Ok(())
    }

    fn clear_checkpoint(&mut self) -> Result<(), Self::Error> {
        self.conn.execute("DELETE FROM recompute_checkpoint", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_rejects_negative() {
        assert!(SqliteStore::counter(-1, "elite_count", "X").is_err());
        assert_eq!(SqliteStore::counter(7, "elite_count", "X").unwrap(), 7);
    }

    #[test]
    fn test_parse_domain_rejects_unknown() {
        assert!(SqliteStore::parse_domain("painter", "X").is_err());
        assert_eq!(SqliteStore::parse_domain("smith", "X").unwrap(), Domain::Smith);
    }

    #[test]
    fn test_negative_counter_in_database_is_rejected() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO artisans (code, domain, elite_count, total_count) VALUES ('NEG', 'smith', -1, 3)",
                [],
            )
            .unwrap();
        let result = store.get_artisan("NEG");
        assert!(matches!(result, Err(StoreError::InvalidData(_))));
    }
}
