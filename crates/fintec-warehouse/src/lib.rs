//! # Fintec Warehouse
//!
//! DuckDB-backed local storage for daily exchange-rate snapshots.
//!
//! ## Overview
//!
//! Each rate source (BCV official, Binance P2P) owns one table keyed by calendar day.
//! Writes are upserts guarded by a non-clobber rule: an observation labelled as a
//! fallback never replaces a real observation already stored for the same day.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fintec_warehouse::{HistoryTable, RateHistoryRecord, Warehouse};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warehouse = Warehouse::open_default()?;
//!     let record = RateHistoryRecord {
//!         id: "0b7c6a1e".to_string(),
//!         date: "2025-03-09".to_string(),
//!         usd: 64.61,
//!         eur: Some(69.97),
//!         timestamp: "2025-03-09T14:00:00Z".to_string(),
//!         source: "BCV".to_string(),
//!     };
//!     warehouse.upsert_rate(HistoryTable::BcvRateHistory, &record)?;
//!
//!     let latest = warehouse.latest_rate(HistoryTable::BcvRateHistory)?;
//!     println!("{latest:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `bcv_rate_history` | Daily BCV USD/EUR to VES rates |
//! | `binance_rate_history` | Daily Binance P2P USD to VES rates |
//! | `schema_migrations` | Applied migration versions |

pub mod duckdb;
pub mod migrations;
pub mod records;

use std::env;
use std::fs;
use std::path::PathBuf;

use ::duckdb::{Connection, ToSql};
use thiserror::Error;

pub use duckdb::{DuckDbConnectionManager, PooledConnection};
pub use records::{is_fallback_source, HistoryTable, RateHistoryRecord, UpsertOutcome};

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Record rejected before reaching the database.
    #[error("invalid rate record: {0}")]
    InvalidRecord(String),
}

/// Configuration for the warehouse database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Root directory for fintec data.
    pub fintec_home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections kept in the pool.
    pub max_pool_size: usize,
}

impl WarehouseConfig {
    /// Configuration rooted at an explicit home directory.
    pub fn with_home(fintec_home: impl Into<PathBuf>) -> Self {
        let fintec_home = fintec_home.into();
        let db_path = fintec_home.join("rates").join("history.duckdb");
        Self {
            fintec_home,
            db_path,
            max_pool_size: 4,
        }
    }
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self::with_home(resolve_fintec_home())
    }
}

/// Local rate-history store.
#[derive(Clone)]
pub struct Warehouse {
    manager: DuckDbConnectionManager,
}

const RECORD_COLUMNS: &str = "id, date, usd, eur, timestamp, source";

impl Warehouse {
    /// Open a warehouse with default configuration.
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    /// Open a warehouse with the specified configuration.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let manager = DuckDbConnectionManager::open(config.db_path, config.max_pool_size)?;
        let warehouse = Self { manager };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Open a throwaway in-memory warehouse.
    pub fn open_in_memory() -> Result<Self, WarehouseError> {
        let manager = DuckDbConnectionManager::open_in_memory(2)?;
        let warehouse = Self { manager };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Apply pending schema migrations.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.manager.acquire()?;
        migrations::apply_migrations(&connection)?;
        Ok(())
    }

    /// Path to the database file, `None` when in memory.
    pub fn db_path(&self) -> Option<&std::path::Path> {
        self.manager.db_path()
    }

    /// Insert or update the record for `record.date`.
    ///
    /// A fallback-labelled record never replaces a stored non-fallback record for the
    /// same day; such writes are dropped and reported as [`UpsertOutcome::SkippedFallback`].
    /// Updates keep the stored record id.
    pub fn upsert_rate(
        &self,
        table: HistoryTable,
        record: &RateHistoryRecord,
    ) -> Result<UpsertOutcome, WarehouseError> {
        validate_record(record)?;

        let connection = self.manager.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<UpsertOutcome, WarehouseError> {
            let select = format!("SELECT id, source FROM {table} WHERE date = ?");
            let params: [&dyn ToSql; 1] = [&record.date];
            let mut statement = connection.prepare(&select)?;
            let mut rows = statement.query(params.as_slice())?;
            let existing = match rows.next()? {
                Some(row) => Some((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
                None => None,
            };

            let (id, outcome) = match existing {
                Some((_, existing_source))
                    if record.is_fallback() && !is_fallback_source(&existing_source) =>
                {
                    return Ok(UpsertOutcome::SkippedFallback);
                }
                Some((existing_id, _)) => (existing_id, UpsertOutcome::Updated),
                None => (record.id.clone(), UpsertOutcome::Inserted),
            };

            let is_fallback = record.is_fallback();
            let params: [&dyn ToSql; 8] = [
                &record.date,
                &id,
                &record.usd,
                &record.eur,
                &record.timestamp,
                &record.timestamp,
                &record.source,
                &is_fallback,
            ];
            connection.execute(
                &format!(
                    "INSERT OR REPLACE INTO {table} \
                     (date, id, usd, eur, timestamp, observed_at, source, is_fallback, updated_at) \
                     VALUES (?, ?, ?, ?, ?, TRY_CAST(? AS TIMESTAMP), ?, ?, CURRENT_TIMESTAMP)"
                ),
                params.as_slice(),
            )?;

            Ok(outcome)
        })();

        finalize_transaction(&connection, result)
    }

    /// Record stored for one calendar day.
    pub fn rate_for_date(
        &self,
        table: HistoryTable,
        date: &str,
    ) -> Result<Option<RateHistoryRecord>, WarehouseError> {
        let connection = self.manager.acquire()?;
        let params: [&dyn ToSql; 1] = [&date];
        let records = query_records(
            &connection,
            &format!("SELECT {RECORD_COLUMNS} FROM {table} WHERE date = ?"),
            params.as_slice(),
        )?;
        Ok(records.into_iter().next())
    }

    /// Most recent observation by timestamp, across all days.
    pub fn latest_rate(
        &self,
        table: HistoryTable,
    ) -> Result<Option<RateHistoryRecord>, WarehouseError> {
        let connection = self.manager.acquire()?;
        let records = query_records(
            &connection,
            &format!(
                "SELECT {RECORD_COLUMNS} FROM {table} \
                 ORDER BY observed_at DESC NULLS LAST, timestamp DESC, date DESC LIMIT 1"
            ),
            &[],
        )?;
        Ok(records.into_iter().next())
    }

    /// Records with `from <= date <= to`, oldest first.
    pub fn rates_between(
        &self,
        table: HistoryTable,
        from: &str,
        to: &str,
    ) -> Result<Vec<RateHistoryRecord>, WarehouseError> {
        let connection = self.manager.acquire()?;
        let params: [&dyn ToSql; 2] = [&from, &to];
        query_records(
            &connection,
            &format!(
                "SELECT {RECORD_COLUMNS} FROM {table} \
                 WHERE date >= ? AND date <= ? ORDER BY date ASC"
            ),
            params.as_slice(),
        )
    }

    /// Delete records dated strictly before `cutoff`; returns the deleted count.
    pub fn delete_before(&self, table: HistoryTable, cutoff: &str) -> Result<usize, WarehouseError> {
        if !records::is_day_key(cutoff) {
            return Err(WarehouseError::InvalidRecord(format!(
                "cutoff must be YYYY-MM-DD: '{cutoff}'"
            )));
        }

        let connection = self.manager.acquire()?;
        let params: [&dyn ToSql; 1] = [&cutoff];
        let deleted = connection.execute(
            &format!("DELETE FROM {table} WHERE date < ?"),
            params.as_slice(),
        )?;
        Ok(deleted)
    }

    /// Remove every record from `table`; returns the deleted count.
    pub fn clear(&self, table: HistoryTable) -> Result<usize, WarehouseError> {
        let connection = self.manager.acquire()?;
        let deleted = connection.execute(&format!("DELETE FROM {table}"), [])?;
        Ok(deleted)
    }

    /// Number of stored days.
    pub fn count(&self, table: HistoryTable) -> Result<usize, WarehouseError> {
        let connection = self.manager.acquire()?;
        let count: i64 =
            connection.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

fn validate_record(record: &RateHistoryRecord) -> Result<(), WarehouseError> {
    if !records::is_day_key(&record.date) {
        return Err(WarehouseError::InvalidRecord(format!(
            "date must be YYYY-MM-DD: '{}'",
            record.date
        )));
    }
    if !record.usd.is_finite() || record.usd <= 0.0 {
        return Err(WarehouseError::InvalidRecord(format!(
            "usd must be a positive finite number: {}",
            record.usd
        )));
    }
    if let Some(eur) = record.eur {
        if !eur.is_finite() || eur <= 0.0 {
            return Err(WarehouseError::InvalidRecord(format!(
                "eur must be a positive finite number: {eur}"
            )));
        }
    }
    if record.source.trim().is_empty() {
        return Err(WarehouseError::InvalidRecord(String::from(
            "source label cannot be empty",
        )));
    }
    Ok(())
}

fn query_records(
    connection: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> Result<Vec<RateHistoryRecord>, WarehouseError> {
    let mut statement = connection.prepare(sql)?;
    let rows = statement.query_map(params, read_record)?;
    let mut records = Vec::new();
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}

fn read_record(row: &::duckdb::Row<'_>) -> Result<RateHistoryRecord, ::duckdb::Error> {
    Ok(RateHistoryRecord {
        id: row.get(0)?,
        date: row.get(1)?,
        usd: row.get(2)?,
        eur: row.get(3)?,
        timestamp: row.get(4)?,
        source: row.get(5)?,
    })
}

/// Finalize a transaction, committing on success or rolling back on failure.
fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

/// Resolve the fintec home directory from environment or default.
fn resolve_fintec_home() -> PathBuf {
    if let Some(path) = env::var_os("FINTEC_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".fintec");
    }

    PathBuf::from(".fintec")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(date: &str, usd: f64, timestamp: &str, source: &str) -> RateHistoryRecord {
        RateHistoryRecord {
            id: format!("id-{date}-{source}"),
            date: date.to_string(),
            usd,
            eur: Some(usd + 5.0),
            timestamp: timestamp.to_string(),
            source: source.to_string(),
        }
    }

    fn open_temp() -> (tempfile::TempDir, Warehouse) {
        let temp = tempdir().expect("tempdir");
        let warehouse =
            Warehouse::open(WarehouseConfig::with_home(temp.path().join("fintec-home")))
                .expect("warehouse open");
        (temp, warehouse)
    }

    #[test]
    fn initializes_history_tables_on_disk() {
        let (temp, warehouse) = open_temp();

        let path = warehouse.db_path().expect("file backed");
        assert!(path.starts_with(temp.path()));
        assert!(path.exists());
        for table in HistoryTable::ALL {
            assert_eq!(warehouse.count(table).expect("count"), 0);
        }
    }

    #[test]
    fn reopening_does_not_reapply_migrations() {
        let temp = tempdir().expect("tempdir");
        let config = WarehouseConfig::with_home(temp.path().join("home"));

        let first = Warehouse::open(config.clone()).expect("first open");
        first
            .upsert_rate(
                HistoryTable::BcvRateHistory,
                &record("2025-03-01", 60.0, "2025-03-01T12:00:00Z", "BCV"),
            )
            .expect("insert");
        drop(first);

        let second = Warehouse::open(config).expect("second open");
        assert_eq!(second.count(HistoryTable::BcvRateHistory).expect("count"), 1);
    }

    #[test]
    fn upsert_inserts_then_updates_the_same_day() {
        let warehouse = Warehouse::open_in_memory().expect("open");
        let table = HistoryTable::BcvRateHistory;

        let first = warehouse
            .upsert_rate(table, &record("2025-03-01", 60.0, "2025-03-01T12:00:00Z", "BCV"))
            .expect("insert");
        let second = warehouse
            .upsert_rate(table, &record("2025-03-01", 61.5, "2025-03-01T18:00:00Z", "BCV API"))
            .expect("update");

        assert_eq!(first, UpsertOutcome::Inserted);
        assert_eq!(second, UpsertOutcome::Updated);
        let stored = warehouse
            .rate_for_date(table, "2025-03-01")
            .expect("read")
            .expect("present");
        assert_eq!(stored.usd, 61.5);
        assert_eq!(stored.source, "BCV API");
        assert_eq!(stored.id, "id-2025-03-01-BCV");
        assert_eq!(warehouse.count(table).expect("count"), 1);
    }

    #[test]
    fn fallback_write_never_replaces_a_real_observation() {
        let warehouse = Warehouse::open_in_memory().expect("open");
        let table = HistoryTable::BinanceRateHistory;
        warehouse
            .upsert_rate(table, &record("2025-03-01", 60.0, "2025-03-01T12:00:00Z", "Binance P2P"))
            .expect("insert");

        let outcome = warehouse
            .upsert_rate(
                table,
                &record("2025-03-01", 57.5, "2025-03-01T13:00:00Z", "Binance P2P (fallback - static)"),
            )
            .expect("skip");

        assert_eq!(outcome, UpsertOutcome::SkippedFallback);
        let stored = warehouse
            .rate_for_date(table, "2025-03-01")
            .expect("read")
            .expect("present");
        assert_eq!(stored.usd, 60.0);
        assert_eq!(stored.source, "Binance P2P");
    }

    #[test]
    fn real_observation_replaces_an_earlier_fallback() {
        let warehouse = Warehouse::open_in_memory().expect("open");
        let table = HistoryTable::BcvRateHistory;
        warehouse
            .upsert_rate(
                table,
                &record("2025-03-01", 57.5, "2025-03-01T08:00:00Z", "BCV (fallback - static)"),
            )
            .expect("insert");

        let outcome = warehouse
            .upsert_rate(table, &record("2025-03-01", 62.0, "2025-03-01T09:00:00Z", "BCV"))
            .expect("update");

        assert_eq!(outcome, UpsertOutcome::Updated);
        let stored = warehouse
            .rate_for_date(table, "2025-03-01")
            .expect("read")
            .expect("present");
        assert_eq!(stored.usd, 62.0);
    }

    #[test]
    fn latest_rate_orders_by_timestamp_not_by_date() {
        let warehouse = Warehouse::open_in_memory().expect("open");
        let table = HistoryTable::BcvRateHistory;
        warehouse
            .upsert_rate(table, &record("2025-03-02", 61.0, "2025-03-02T09:00:00Z", "BCV"))
            .expect("insert");
        warehouse
            .upsert_rate(table, &record("2025-03-01", 60.0, "2025-03-03T09:00:00Z", "BCV"))
            .expect("insert");

        let latest = warehouse.latest_rate(table).expect("latest").expect("present");
        assert_eq!(latest.date, "2025-03-01");
    }

    #[test]
    fn range_reads_are_sorted_and_tables_are_isolated() {
        let warehouse = Warehouse::open_in_memory().expect("open");
        for (date, usd) in [("2025-03-03", 63.0), ("2025-03-01", 61.0), ("2025-03-02", 62.0)] {
            warehouse
                .upsert_rate(
                    HistoryTable::BcvRateHistory,
                    &record(date, usd, &format!("{date}T12:00:00Z"), "BCV"),
                )
                .expect("insert");
        }

        let window = warehouse
            .rates_between(HistoryTable::BcvRateHistory, "2025-03-02", "2025-03-03")
            .expect("range");
        let dates: Vec<&str> = window.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-03-02", "2025-03-03"]);
        assert!(warehouse
            .latest_rate(HistoryTable::BinanceRateHistory)
            .expect("latest")
            .is_none());
    }

    #[test]
    fn delete_before_prunes_old_days_only() {
        let warehouse = Warehouse::open_in_memory().expect("open");
        let table = HistoryTable::BinanceRateHistory;
        for date in ["2024-11-30", "2024-12-01", "2025-03-01"] {
            warehouse
                .upsert_rate(table, &record(date, 60.0, &format!("{date}T12:00:00Z"), "Binance P2P"))
                .expect("insert");
        }

        let deleted = warehouse.delete_before(table, "2024-12-01").expect("delete");

        assert_eq!(deleted, 1);
        assert_eq!(warehouse.count(table).expect("count"), 2);
        assert!(warehouse.delete_before(table, "yesterday").is_err());
    }

    #[test]
    fn source_labels_are_bound_as_parameters() {
        let warehouse = Warehouse::open_in_memory().expect("open");
        let table = HistoryTable::BcvRateHistory;
        let dangerous = r#"BCV'; DROP TABLE bcv_rate_history; --"#;
        warehouse
            .upsert_rate(table, &record("2025-03-01", 60.0, "2025-03-01T12:00:00Z", dangerous))
            .expect("insert");

        let stored = warehouse
            .rate_for_date(table, "2025-03-01")
            .expect("read")
            .expect("present");
        assert_eq!(stored.source, dangerous);
    }

    #[test]
    fn invalid_records_are_rejected_before_writing() {
        let warehouse = Warehouse::open_in_memory().expect("open");
        let table = HistoryTable::BcvRateHistory;

        let bad_date = record("03/01/2025", 60.0, "2025-03-01T12:00:00Z", "BCV");
        let bad_rate = record("2025-03-01", f64::NAN, "2025-03-01T12:00:00Z", "BCV");

        assert!(matches!(
            warehouse.upsert_rate(table, &bad_date),
            Err(WarehouseError::InvalidRecord(_))
        ));
        assert!(matches!(
            warehouse.upsert_rate(table, &bad_rate),
            Err(WarehouseError::InvalidRecord(_))
        ));
        assert_eq!(warehouse.count(table).expect("count"), 0);
    }

    #[test]
    fn clear_empties_one_table() {
        let warehouse = Warehouse::open_in_memory().expect("open");
        warehouse
            .upsert_rate(
                HistoryTable::BcvRateHistory,
                &record("2025-03-01", 60.0, "2025-03-01T12:00:00Z", "BCV"),
            )
            .expect("insert");

        assert_eq!(warehouse.clear(HistoryTable::BcvRateHistory).expect("clear"), 1);
        assert_eq!(warehouse.count(HistoryTable::BcvRateHistory).expect("count"), 0);
    }
}
