//! Backend contract for the two tables.
//!
//! Every backend reports failures through [`StoreError`] and returns
//! `Ok(None)` for a lookup that matched nothing, so "absent" and "failed"
//! stay distinct at this seam. Collapsing the two is left to
//! [`StockRepository`](crate::StockRepository).

use std::future::Future;
use std::pin::Pin;

use crate::{
    Emiten, HistoryPage, HistoryQuery, SessionEntry, StockQueryRecord, StoreError, TradeDate,
};

/// Boxed future returned by [`StockStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Table access shared by the hosted REST store and the local warehouse.
pub trait StockStore: Send + Sync {
    /// Short backend name used in log fields.
    fn name(&self) -> &'static str;

    /// Run a composed history plan, returning the page and the unpaginated count.
    fn fetch_history<'a>(&'a self, query: &'a HistoryQuery) -> StoreFuture<'a, HistoryPage>;

    /// Insert or overwrite the row keyed on (`from_date`, `emiten`).
    fn upsert_record<'a>(&'a self, record: &'a StockQueryRecord) -> StoreFuture<'a, ()>;

    /// Most recent successful row for `emiten`, optionally strictly before `before`.
    fn latest_success<'a>(
        &'a self,
        emiten: &'a Emiten,
        before: Option<TradeDate>,
    ) -> StoreFuture<'a, Option<StockQueryRecord>>;

    /// Set `real_harga` on one row and return the updated row.
    ///
    /// Fails with [`StoreError::NotFound`] when no row has that key.
    fn set_real_price<'a>(
        &'a self,
        emiten: &'a Emiten,
        from_date: TradeDate,
        price: f64,
    ) -> StoreFuture<'a, StockQueryRecord>;

    fn session<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<SessionEntry>>;

    fn upsert_session<'a>(&'a self, entry: &'a SessionEntry) -> StoreFuture<'a, ()>;
}
