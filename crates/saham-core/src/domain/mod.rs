//! # Domain Models
//!
//! Typed rows of the two tables this crate reads and writes.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`StockQueryRecord`] | One analysis result per (from_date, emiten) |
//! | [`SessionEntry`] | Key/value pair with an update timestamp |
//! | [`Emiten`] | Validated issuer ticker |
//! | [`TradeDate`] | ISO `YYYY-MM-DD` trading date |
//! | [`UtcDateTime`] | RFC3339 UTC timestamp |
//! | [`StockColumn`] | Closed set of `stock_queries` columns |
//!
//! Construction validates invariants, so a record read back from the store
//! with a malformed ticker or date fails to decode rather than leaking through.

mod column;
mod emiten;
mod models;
mod timestamp;

pub use column::StockColumn;
pub use emiten::Emiten;
pub use models::{SessionEntry, StockQueryRecord, STATUS_SUCCESS};
pub use timestamp::{TradeDate, UtcDateTime};
