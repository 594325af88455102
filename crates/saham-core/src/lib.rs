//! # Saham Core
//!
//! Persistence layer for daily stock analyses.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Typed rows** for the `stock_queries` and `session` tables
//! - **History query composition**: filters, sorting and pagination resolved
//!   into a backend-independent plan
//! - **A store contract** ([`StockStore`]) with a hosted REST implementation
//! - **A repository facade** with the operations the application calls
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Store endpoint and key from the environment |
//! | [`domain`] | Domain models (StockQueryRecord, SessionEntry, Emiten) |
//! | [`error`] | Core error types |
//! | [`history`] | History filters and query plans |
//! | [`http_client`] | HTTP client abstraction |
//! | [`repository`] | Application-facing operations |
//! | [`store`] | Backend contract |
//! | [`supabase`] | Hosted REST backend |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use saham_core::{HistoryFilter, StockRepository, StoreConfig, SupabaseStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SupabaseStore::new(StoreConfig::from_env()?);
//!     let repository = StockRepository::new(Arc::new(store));
//!
//!     let filter = HistoryFilter {
//!         emiten: Some(String::from("BBCA TLKM")),
//!         limit: Some(10),
//!         ..HistoryFilter::default()
//!     };
//!     let page = repository.fetch_history(&filter).await?;
//!     println!("{} of {} rows", page.rows.len(), page.total_count);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Tagged operations return [`StoreError`], keeping "no row" (`Ok(None)`)
//! apart from "store failed" (`Err`):
//!
//! ```rust
//! use saham_core::StoreError;
//!
//! fn describe(error: &StoreError) -> &'static str {
//!     match error {
//!         StoreError::Validation(_) => "bad request",
//!         StoreError::NotFound(_) => "no such row",
//!         _ => "store unavailable",
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - The store key is read from the environment only and is redacted from `Debug` output
//! - Filter values are always URL-encoded or bound as parameters

pub mod config;
pub mod domain;
pub mod error;
pub mod history;
pub mod http_client;
pub mod repository;
pub mod store;
pub mod supabase;

// Configuration
pub use config::{StoreConfig, STORE_KEY_VAR, STORE_URL_VAR};

// Domain models
pub use domain::{
    Emiten, SessionEntry, StockColumn, StockQueryRecord, TradeDate, UtcDateTime, STATUS_SUCCESS,
};

// Error types
pub use error::{ConfigError, StoreError, ValidationError};

// History queries
pub use history::{
    HistoryFilter, HistoryPage, HistoryQuery, OrderKey, Predicate, SortBy, SortOrder, Window,
    DEFAULT_PAGE_SIZE,
};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};

// Repository
pub use repository::{PatchOutcome, StockRepository};

// Store backends
pub use store::{StockStore, StoreFuture};
pub use supabase::SupabaseStore;
