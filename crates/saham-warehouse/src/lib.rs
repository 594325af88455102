//! # Saham Warehouse
//!
//! DuckDB-backed local store for saham.
//!
//! ## Overview
//!
//! The warehouse holds the same two tables as the hosted store and implements
//! [`StockStore`], so a [`StockRepository`](saham_core::StockRepository) runs
//! unchanged against a local database file.
//!
//! - **Parameterized SQL**: filter values are always bound, never interpolated
//! - **Connection pooling**: connections are cloned from one root database
//! - **Versioned migrations**: tracked in `schema_migrations`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use saham_core::{HistoryFilter, StockRepository};
//! use saham_warehouse::{Warehouse, WarehouseConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let warehouse = Warehouse::open(WarehouseConfig::default())?;
//! let repository = StockRepository::new(Arc::new(warehouse));
//!
//! let page = repository.fetch_history(&HistoryFilter::default()).await?;
//! println!("{} rows", page.total_count);
//! # Ok(())
//! # }
//! ```
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `stock_queries` | One analysis result per (from_date, emiten) |
//! | `session` | Key/value pairs with update timestamps |

pub mod duckdb;
pub mod migrations;
pub mod query;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::types::{Type, Value as DuckValue};
use ::duckdb::{params_from_iter, OptionalExt, Row};
use saham_core::{
    Emiten, HistoryPage, HistoryQuery, SessionEntry, StockQueryRecord, StockStore, StoreError,
    StoreFuture, TradeDate, UtcDateTime, ValidationError, STATUS_SUCCESS,
};
use thiserror::Error;
use tracing::{debug, info};

pub use duckdb::DuckDbConnectionManager;

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An update matched no row.
    #[error("no row for {0}")]
    NotFound(String),
}

impl WarehouseError {
    fn into_read_error(self) -> StoreError {
        match self {
            Self::DuckDb(::duckdb::Error::FromSqlConversionFailure(_, _, err)) => {
                StoreError::Decode(err.to_string())
            }
            Self::NotFound(key) => StoreError::NotFound(key),
            other => StoreError::Query(other.to_string()),
        }
    }

    fn into_write_error(self) -> StoreError {
        match self {
            Self::NotFound(key) => StoreError::NotFound(key),
            other => StoreError::Write(other.to_string()),
        }
    }
}

/// Configuration for the warehouse database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Root directory for saham data.
    pub saham_home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections kept in the pool.
    pub max_pool_size: usize,
}

impl WarehouseConfig {
    /// Config rooted at `saham_home`, with the database at `<home>/warehouse.duckdb`.
    pub fn at(saham_home: impl Into<PathBuf>) -> Self {
        let saham_home = saham_home.into();
        let db_path = saham_home.join("warehouse.duckdb");
        Self {
            saham_home,
            db_path,
            max_pool_size: 4,
        }
    }
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self::at(resolve_saham_home())
    }
}

/// Local [`StockStore`] over a `DuckDB` file.
#[derive(Clone)]
pub struct Warehouse {
    config: WarehouseConfig,
    manager: DuckDbConnectionManager,
}

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

        let manager = DuckDbConnectionManager::open(config.db_path.clone(), config.max_pool_size)?;
        let warehouse = Self { config, manager };
        warehouse.initialize()?;
        info!(path = %warehouse.db_path().display(), "warehouse opened");
        Ok(warehouse)
    }

    /// Apply pending schema migrations.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        self.manager.with_connection(|connection| {
            migrations::apply_migrations(connection)?;
            Ok::<_, WarehouseError>(())
        })
    }

    pub fn config(&self) -> &WarehouseConfig {
        &self.config
    }

    /// Get the path to the database file.
    pub fn db_path(&self) -> &Path {
        self.manager.db_path()
    }

    /// Run a history plan and count its unpaginated matches.
    pub fn query_history(&self, query: &HistoryQuery) -> Result<HistoryPage, WarehouseError> {
        let sql = query::render_history(query);

        let (rows, total_count) = self.manager.with_connection(|connection| {
            let total_count: i64 = connection.query_row(
                sql.count.as_str(),
                params_from_iter(sql.params.iter()),
                |row| row.get(0),
            )?;

            let mut statement = connection.prepare(sql.select.as_str())?;
            let rows = statement
                .query_map(params_from_iter(sql.params.iter()), decode_record)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok::<_, WarehouseError>((rows, total_count))
        })?;

        debug!(rows = rows.len(), total = total_count, "warehouse history read");
        Ok(HistoryPage {
            rows,
            total_count: usize::try_from(total_count).unwrap_or_default(),
        })
    }

    /// Insert `record`, or overwrite every non-key column of the row sharing its key.
    pub fn save_record(&self, record: &StockQueryRecord) -> Result<(), WarehouseError> {
        let values = vec![
            DuckValue::Text(record.from_date.format_iso()),
            DuckValue::Text(record.emiten.to_string()),
            text(record.sector.as_deref()),
            text(record.to_date.map(TradeDate::format_iso).as_deref()),
            text(record.bandar.as_deref()),
            double(record.barang_bandar),
            double(record.rata_rata_bandar),
            double(record.harga),
            double(record.ara),
            double(record.arb),
            double(record.fraksi),
            double(record.total_bid),
            double(record.total_offer),
            double(record.total_papan),
            double(record.rata_rata_bid_ofer),
            double(record.a),
            double(record.p),
            double(record.target_realistis),
            double(record.target_max),
            DuckValue::Text(record.status.clone()),
            text(record.error_message.as_deref()),
            double(record.real_harga),
        ];

        self.manager.with_connection(|connection| {
            connection.execute(upsert_record_sql().as_str(), params_from_iter(values))?;
            Ok::<_, WarehouseError>(())
        })?;
        debug!(emiten = %record.emiten, from_date = %record.from_date, "warehouse record saved");
        Ok(())
    }

    /// Most recent successful record for `emiten`, optionally strictly before `before`.
    pub fn latest_success_record(
        &self,
        emiten: &Emiten,
        before: Option<TradeDate>,
    ) -> Result<Option<StockQueryRecord>, WarehouseError> {
        let mut params = vec![
            DuckValue::Text(emiten.to_string()),
            DuckValue::Text(String::from(STATUS_SUCCESS)),
        ];
        let mut sql = format!(
            "SELECT {} FROM stock_queries WHERE emiten = ? AND status = ?",
            query::select_list()
        );
        if let Some(before) = before {
            sql.push_str(" AND from_date < ?");
            params.push(DuckValue::Text(before.format_iso()));
        }
        sql.push_str(" ORDER BY from_date DESC LIMIT 1");

        self.manager.with_connection(|connection| {
            let record = connection
                .query_row(sql.as_str(), params_from_iter(params), decode_record)
                .optional()?;
            Ok::<_, WarehouseError>(record)
        })
    }

    /// Set `real_harga` on the row keyed by (`from_date`, `emiten`) and return it.
    pub fn update_real_price(
        &self,
        emiten: &Emiten,
        from_date: TradeDate,
        price: f64,
    ) -> Result<StockQueryRecord, WarehouseError> {
        let key = [
            DuckValue::Text(emiten.to_string()),
            DuckValue::Text(from_date.format_iso()),
        ];
        let select = format!(
            "SELECT {} FROM stock_queries WHERE emiten = ? AND from_date = ?",
            query::select_list()
        );

        self.manager.with_connection(|connection| {
            let updated = connection.execute(
                "UPDATE stock_queries SET real_harga = ? WHERE emiten = ? AND from_date = ?",
                params_from_iter(
                    std::iter::once(DuckValue::Double(price)).chain(key.iter().cloned()),
                ),
            )?;
            if updated == 0 {
                return Err(WarehouseError::NotFound(format!("{emiten} on {from_date}")));
            }

            let record =
                connection.query_row(select.as_str(), params_from_iter(key), decode_record)?;
            Ok(record)
        })
    }

    pub fn load_session(&self, key: &str) -> Result<Option<SessionEntry>, WarehouseError> {
        self.manager.with_connection(|connection| {
            let entry = connection
                .query_row(
                    "SELECT key, value, updated_at FROM session WHERE key = ?",
                    [key],
                    decode_session,
                )
                .optional()?;
            Ok::<_, WarehouseError>(entry)
        })
    }

    pub fn save_session(&self, entry: &SessionEntry) -> Result<(), WarehouseError> {
        let updated_at = entry.updated_at.format_rfc3339();
        self.manager.with_connection(|connection| {
            connection.execute(
                "INSERT INTO session (key, value, updated_at) VALUES (?, ?, ?) \
                 ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at",
                [entry.key.as_str(), entry.value.as_str(), updated_at.as_str()],
            )?;
            Ok::<_, WarehouseError>(())
        })
    }
}

impl StockStore for Warehouse {
    fn name(&self) -> &'static str {
        "warehouse"
    }

    fn fetch_history<'a>(&'a self, query: &'a HistoryQuery) -> StoreFuture<'a, HistoryPage> {
        Box::pin(async move {
            self.query_history(query)
                .map_err(WarehouseError::into_read_error)
        })
    }

    fn upsert_record<'a>(&'a self, record: &'a StockQueryRecord) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.save_record(record)
                .map_err(WarehouseError::into_write_error)
        })
    }

    fn latest_success<'a>(
        &'a self,
        emiten: &'a Emiten,
        before: Option<TradeDate>,
    ) -> StoreFuture<'a, Option<StockQueryRecord>> {
        Box::pin(async move {
            self.latest_success_record(emiten, before)
                .map_err(WarehouseError::into_read_error)
        })
    }

    fn set_real_price<'a>(
        &'a self,
        emiten: &'a Emiten,
        from_date: TradeDate,
        price: f64,
    ) -> StoreFuture<'a, StockQueryRecord> {
        Box::pin(async move {
            self.update_real_price(emiten, from_date, price)
                .map_err(WarehouseError::into_write_error)
        })
    }

    fn session<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<SessionEntry>> {
        Box::pin(async move { self.load_session(key).map_err(WarehouseError::into_read_error) })
    }

    fn upsert_session<'a>(&'a self, entry: &'a SessionEntry) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.save_session(entry)
                .map_err(WarehouseError::into_write_error)
        })
    }
}

fn upsert_record_sql() -> String {
    let columns: Vec<&str> = query::RECORD_COLUMNS
        .iter()
        .map(|column| column.as_str())
        .filter(|column| *column != "id")
        .collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    let updates: Vec<String> = columns
        .iter()
        .filter(|column| !matches!(**column, "from_date" | "emiten"))
        .map(|column| format!("{column} = EXCLUDED.{column}"))
        .collect();

    format!(
        "INSERT INTO stock_queries ({}) VALUES ({placeholders}) \
         ON CONFLICT (from_date, emiten) DO UPDATE SET {}",
        columns.join(", "),
        updates.join(", ")
    )
}

fn text(value: Option<&str>) -> DuckValue {
    value.map_or(DuckValue::Null, |value| DuckValue::Text(value.to_owned()))
}

fn double(value: Option<f64>) -> DuckValue {
    value.map_or(DuckValue::Null, DuckValue::Double)
}

fn decode_field<T>(
    index: usize,
    raw: &str,
    parse: impl FnOnce(&str) -> Result<T, ValidationError>,
) -> ::duckdb::Result<T> {
    parse(raw).map_err(|err| ::duckdb::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err)))
}

/// Decode a row selected with [`query::select_list`].
fn decode_record(row: &Row<'_>) -> ::duckdb::Result<StockQueryRecord> {
    let from_date: String = row.get(0)?;
    let emiten: String = row.get(1)?;
    let to_date: Option<String> = row.get(3)?;

    Ok(StockQueryRecord {
        from_date: decode_field(0, &from_date, TradeDate::parse)?,
        emiten: decode_field(1, &emiten, Emiten::parse)?,
        sector: row.get(2)?,
        to_date: to_date
            .map(|value| decode_field(3, &value, TradeDate::parse))
            .transpose()?,
        bandar: row.get(4)?,
        barang_bandar: row.get(5)?,
        rata_rata_bandar: row.get(6)?,
        harga: row.get(7)?,
        ara: row.get(8)?,
        arb: row.get(9)?,
        fraksi: row.get(10)?,
        total_bid: row.get(11)?,
        total_offer: row.get(12)?,
        total_papan: row.get(13)?,
        rata_rata_bid_ofer: row.get(14)?,
        a: row.get(15)?,
        p: row.get(16)?,
        target_realistis: row.get(17)?,
        target_max: row.get(18)?,
        status: row.get(19)?,
        error_message: row.get(20)?,
        real_harga: row.get(21)?,
        id: row.get(22)?,
    })
}

fn decode_session(row: &Row<'_>) -> ::duckdb::Result<SessionEntry> {
    let updated_at: String = row.get(2)?;
    Ok(SessionEntry {
        key: row.get(0)?,
        value: row.get(1)?,
        updated_at: decode_field(2, &updated_at, UtcDateTime::parse)?,
    })
}

fn resolve_saham_home() -> PathBuf {
    if let Some(path) = env::var_os("SAHAM_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".saham");
    }

    PathBuf::from(".saham")
}
