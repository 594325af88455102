//! Operations the rest of the application calls.
//!
//! Each operation has a tagged form returning `Result`, plus, where callers
//! historically treated failure as "nothing there", a lenient form that logs
//! a failed lookup and returns `None`. Failed writes are always returned.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::store::StockStore;
use crate::{
    Emiten, HistoryFilter, HistoryPage, HistoryQuery, SessionEntry, StockQueryRecord, StoreError,
    TradeDate, ValidationError,
};

/// Result of [`StockRepository::try_patch_prior_day_price`].
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOutcome {
    /// The prior successful record now carries the price.
    Patched(StockQueryRecord),
    /// No successful record exists before the given date; nothing was written.
    NoPriorRecord,
}

/// Facade over a [`StockStore`] backend.
#[derive(Clone)]
pub struct StockRepository {
    store: Arc<dyn StockStore>,
}

impl StockRepository {
    pub fn new(store: Arc<dyn StockStore>) -> Self {
        Self { store }
    }

    pub fn backend(&self) -> &'static str {
        self.store.name()
    }

    /// Filtered, sorted, paginated history with the unpaginated match count.
    pub async fn fetch_history(&self, filter: &HistoryFilter) -> Result<HistoryPage, StoreError> {
        debug!(backend = self.backend(), ?filter, "fetching history");
        let query = HistoryQuery::compose(filter)?;
        let page = self.store.fetch_history(&query).await?;
        debug!(
            rows = page.rows.len(),
            total = page.total_count,
            "history fetched"
        );
        Ok(page)
    }

    /// Insert or overwrite the record on its (`from_date`, `emiten`) key.
    pub async fn upsert_record(&self, record: &StockQueryRecord) -> Result<(), StoreError> {
        self.store.upsert_record(record).await.map_err(|err| {
            error!(
                emiten = %record.emiten,
                from_date = %record.from_date,
                error = %err,
                "failed to save stock query"
            );
            err
        })
    }

    /// Most recent successful record for `emiten`.
    pub async fn find_latest(&self, emiten: &Emiten) -> Result<Option<StockQueryRecord>, StoreError> {
        self.store.latest_success(emiten, None).await
    }

    /// Lenient [`find_latest`](Self::find_latest): a failed lookup is logged and reads as `None`.
    pub async fn get_latest(&self, emiten: &Emiten) -> Option<StockQueryRecord> {
        match self.find_latest(emiten).await {
            Ok(record) => record,
            Err(err) => {
                warn!(emiten = %emiten, error = %err, "latest lookup failed");
                None
            }
        }
    }

    /// Write `price` as `real_harga` on the latest successful record strictly before `current_date`.
    pub async fn try_patch_prior_day_price(
        &self,
        emiten: &Emiten,
        current_date: TradeDate,
        price: f64,
    ) -> Result<PatchOutcome, StoreError> {
        let Some(prior) = self.store.latest_success(emiten, Some(current_date)).await? else {
            debug!(emiten = %emiten, %current_date, "no prior record to patch");
            return Ok(PatchOutcome::NoPriorRecord);
        };
        let patched = self.write_real_price(&prior, price).await?;
        Ok(PatchOutcome::Patched(patched))
    }

    /// Lenient [`try_patch_prior_day_price`](Self::try_patch_prior_day_price).
    ///
    /// A failed prior-record lookup is logged and reads as `Ok(None)`, as
    /// does having nothing to patch. A failed write is returned.
    pub async fn patch_prior_day_price(
        &self,
        emiten: &Emiten,
        current_date: TradeDate,
        price: f64,
    ) -> Result<Option<StockQueryRecord>, StoreError> {
        let prior = match self.store.latest_success(emiten, Some(current_date)).await {
            Ok(Some(prior)) => prior,
            Ok(None) => {
                debug!(emiten = %emiten, %current_date, "no prior record to patch");
                return Ok(None);
            }
            Err(err) => {
                warn!(emiten = %emiten, %current_date, error = %err, "prior record lookup failed");
                return Ok(None);
            }
        };
        self.write_real_price(&prior, price).await.map(Some)
    }

    async fn write_real_price(
        &self,
        prior: &StockQueryRecord,
        price: f64,
    ) -> Result<StockQueryRecord, StoreError> {
        let patched = self
            .store
            .set_real_price(&prior.emiten, prior.from_date, price)
            .await
            .map_err(|err| {
                error!(
                    emiten = %prior.emiten,
                    from_date = %prior.from_date,
                    error = %err,
                    "failed to patch prior day price"
                );
                err
            })?;
        info!(
            emiten = %patched.emiten,
            from_date = %patched.from_date,
            real_harga = price,
            "patched prior day price"
        );
        Ok(patched)
    }

    pub async fn find_session_value(&self, key: &str) -> Result<Option<String>, StoreError> {
        if key.trim().is_empty() {
            return Err(ValidationError::EmptySessionKey.into());
        }
        let entry = self.store.session(key).await?;
        Ok(entry.map(|entry| entry.value))
    }

    /// Lenient [`find_session_value`](Self::find_session_value).
    pub async fn get_session_value(&self, key: &str) -> Option<String> {
        match self.find_session_value(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "session lookup failed");
                None
            }
        }
    }

    /// Create or replace a session entry, stamping `updated_at` with the current time.
    pub async fn set_session_value(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let entry = SessionEntry::new(key, value)?;
        self.store.upsert_session(&entry).await.map_err(|err| {
            error!(key, error = %err, "failed to save session value");
            err
        })
    }
}

impl std::fmt::Debug for StockRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockRepository")
            .field("backend", &self.store.name())
            .finish()
    }
}
