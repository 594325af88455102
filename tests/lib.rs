// Shared fixtures for behavior tests
pub use saham_core::{
    Emiten, HistoryFilter, HistoryPage, PatchOutcome, SortBy, SortOrder, StockQueryRecord,
    StockRepository, StockStore, StoreError, TradeDate, ValidationError,
};
pub use saham_warehouse::{Warehouse, WarehouseConfig};
pub use std::sync::Arc;

use tempfile::TempDir;

/// Tickers seeded by [`seed_market`], with their sectors.
pub const MARKET: [(&str, &str); 4] = [
    ("AAAA", "Finance"),
    ("BBBB", "Finance"),
    ("CCCC", "Energy"),
    ("DDDD", "Energy"),
];

/// Trading days seeded per ticker by [`seed_market`].
pub const MARKET_DAYS: u32 = 20;

/// A repository over a fresh warehouse in a temporary directory.
pub struct Fixture {
    pub warehouse: Arc<Warehouse>,
    pub repository: StockRepository,
    // Dropped last, after every connection is closed.
    _temp: TempDir,
}

pub fn fixture() -> Fixture {
    let temp = tempfile::tempdir().expect("tempdir");
    let warehouse =
        Arc::new(Warehouse::open(WarehouseConfig::at(temp.path())).expect("warehouse open"));
    let repository = StockRepository::new(warehouse.clone());
    Fixture {
        warehouse,
        repository,
        _temp: temp,
    }
}

pub fn emiten(value: &str) -> Emiten {
    Emiten::parse(value).expect("valid emiten")
}

pub fn date(value: &str) -> TradeDate {
    TradeDate::parse(value).expect("valid date")
}

pub fn record(ticker: &str, from_date: &str) -> StockQueryRecord {
    StockQueryRecord::new(emiten(ticker), date(from_date))
}

pub fn market_day(day: u32) -> String {
    format!("2024-02-{day:02}")
}

/// Seed every ticker in [`MARKET`] for days 1..=[`MARKET_DAYS`] of February 2024.
///
/// Every fifth day is recorded as a failed analysis.
pub async fn seed_market(repository: &StockRepository) {
    for (ticker, sector) in MARKET {
        for day in 1..=MARKET_DAYS {
            let mut row = if day % 5 == 0 {
                StockQueryRecord::failed(emiten(ticker), date(&market_day(day)), "feed timeout")
            } else {
                record(ticker, &market_day(day))
            };
            row.sector = Some(String::from(sector));
            row.harga = Some(f64::from(1000 + day));
            repository.upsert_record(&row).await.expect("seed row");
        }
    }
}

/// (`emiten`, `from_date`) of each row, in page order.
pub fn keys(page: &HistoryPage) -> Vec<(String, String)> {
    page.rows
        .iter()
        .map(|row| (row.emiten.to_string(), row.from_date.to_string()))
        .collect()
}

pub async fn fetch_all(repository: &StockRepository) -> HistoryPage {
    repository
        .fetch_history(&HistoryFilter::default())
        .await
        .expect("history should load")
}
