//! History query composition.
//!
//! [`HistoryFilter`] is the loosely-typed input a request handler receives;
//! [`HistoryQuery::compose`] resolves it into a backend-independent plan of
//! AND-combined predicates, ordered sort keys, and an optional row window.
//! Store backends only render plans, so every backend sorts and pages the
//! same way.
//!
//! # Sort resolution
//!
//! | `sort_by` | Keys |
//! |-----------|------|
//! | `combined` | `from_date` then `emiten`, both in the requested direction |
//! | `emiten` | `emiten` in the requested direction, then `from_date` ascending |
//! | any column | that column in the requested direction |
//!
//! # Pagination
//!
//! An `offset` always produces an inclusive range
//! `[offset, offset + (limit or 50) - 1]`; a bare `limit` caps the result.

use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{Emiten, StockColumn, StockQueryRecord, TradeDate, ValidationError};

/// Window size used when an offset is given without a limit.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ValidationError::InvalidSortOrder {
                value: input.to_owned(),
            }),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub const fn is_ascending(self) -> bool {
        matches!(self, Self::Asc)
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for SortOrder {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SortOrder> for &'static str {
    fn from(value: SortOrder) -> Self {
        value.as_str()
    }
}

/// Requested ordering of history rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SortBy {
    /// Date first, ticker second.
    Combined,
    /// Ticker first, then date ascending inside each ticker.
    Emiten,
    Column(StockColumn),
}

impl Default for SortBy {
    fn default() -> Self {
        Self::Column(StockColumn::FromDate)
    }
}

impl SortBy {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim() {
            "combined" => Ok(Self::Combined),
            "emiten" => Ok(Self::Emiten),
            other => StockColumn::parse(other).map(Self::Column),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Combined => "combined",
            Self::Emiten => "emiten",
            Self::Column(column) => column.as_str(),
        }
    }
}

impl TryFrom<String> for SortBy {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SortBy> for String {
    fn from(value: SortBy) -> Self {
        value.as_str().to_owned()
    }
}

/// Optional, independently combinable history filters.
///
/// Deserializes from request parameters; the camelCase spellings used by
/// browser clients are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HistoryFilter {
    /// Whitespace-separated tickers; matches any of them.
    pub emiten: Option<String>,
    pub sector: Option<String>,
    #[serde(alias = "fromDate", deserialize_with = "optional_date")]
    pub from_date: Option<TradeDate>,
    #[serde(alias = "toDate", deserialize_with = "optional_date")]
    pub to_date: Option<TradeDate>,
    pub status: Option<String>,
    #[serde(alias = "sortBy")]
    pub sort_by: SortBy,
    #[serde(alias = "sortOrder")]
    pub sort_order: SortOrder,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// A single filter condition on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    In {
        column: StockColumn,
        values: Vec<String>,
    },
    Eq {
        column: StockColumn,
        value: String,
    },
    Gte {
        column: StockColumn,
        value: String,
    },
    Lte {
        column: StockColumn,
        value: String,
    },
}

impl Predicate {
    pub const fn column(&self) -> StockColumn {
        match self {
            Self::In { column, .. }
            | Self::Eq { column, .. }
            | Self::Gte { column, .. }
            | Self::Lte { column, .. } => *column,
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderKey {
    pub column: StockColumn,
    pub direction: SortOrder,
}

impl OrderKey {
    pub const fn new(column: StockColumn, direction: SortOrder) -> Self {
        Self { column, direction }
    }
}

/// Row window applied after filtering and sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// First `n` rows.
    Limit(usize),
    /// Rows `start..=end`, zero-based.
    Range { start: usize, end: usize },
}

impl Window {
    pub const fn offset(self) -> usize {
        match self {
            Self::Limit(_) => 0,
            Self::Range { start, .. } => start,
        }
    }

    pub const fn len(self) -> usize {
        match self {
            Self::Limit(limit) => limit,
            Self::Range { start, end } => end - start + 1,
        }
    }

    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }
}

/// Backend-independent plan for a history read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub predicates: Vec<Predicate>,
    pub order: Vec<OrderKey>,
    pub window: Option<Window>,
}

impl HistoryQuery {
    pub fn compose(filter: &HistoryFilter) -> Result<Self, ValidationError> {
        let mut predicates = Vec::new();

        if let Some(raw) = filter.emiten.as_deref() {
            if let Some(tickers) = Emiten::parse_list(raw)? {
                predicates.push(Predicate::In {
                    column: StockColumn::Emiten,
                    values: tickers.into_iter().map(String::from).collect(),
                });
            }
        }

        if let Some(sector) = non_blank(filter.sector.as_deref()) {
            predicates.push(Predicate::Eq {
                column: StockColumn::Sector,
                value: sector.to_owned(),
            });
        }

        if let Some(from_date) = filter.from_date {
            predicates.push(Predicate::Gte {
                column: StockColumn::FromDate,
                value: from_date.format_iso(),
            });
        }

        if let Some(to_date) = filter.to_date {
            predicates.push(Predicate::Lte {
                column: StockColumn::FromDate,
                value: to_date.format_iso(),
            });
        }

        if let Some(status) = non_blank(filter.status.as_deref()) {
            predicates.push(Predicate::Eq {
                column: StockColumn::Status,
                value: status.to_owned(),
            });
        }

        Ok(Self {
            predicates,
            order: resolve_order(filter.sort_by, filter.sort_order),
            window: resolve_window(filter.limit, filter.offset)?,
        })
    }
}

/// Expand a requested ordering into concrete sort keys.
pub fn resolve_order(sort_by: SortBy, direction: SortOrder) -> Vec<OrderKey> {
    match sort_by {
        SortBy::Combined => vec![
            OrderKey::new(StockColumn::FromDate, direction),
            OrderKey::new(StockColumn::Emiten, direction),
        ],
        SortBy::Emiten => vec![
            OrderKey::new(StockColumn::Emiten, direction),
            OrderKey::new(StockColumn::FromDate, SortOrder::Asc),
        ],
        SortBy::Column(column) => vec![OrderKey::new(column, direction)],
    }
}

/// Resolve `limit`/`offset` into a row window.
pub fn resolve_window(
    limit: Option<usize>,
    offset: Option<usize>,
) -> Result<Option<Window>, ValidationError> {
    if limit == Some(0) {
        return Err(ValidationError::ZeroLimit);
    }

    Ok(match (limit, offset) {
        (limit, Some(start)) => {
            let size = limit.unwrap_or(DEFAULT_PAGE_SIZE);
            Some(Window::Range {
                start,
                end: start.saturating_add(size - 1),
            })
        }
        (Some(limit), None) => Some(Window::Limit(limit)),
        (None, None) => None,
    })
}

/// One page of history rows plus the unpaginated match count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPage {
    pub rows: Vec<StockQueryRecord>,
    pub total_count: usize,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn optional_date<'de, D>(deserializer: D) -> Result<Option<TradeDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match non_blank(value.as_deref()) {
        Some(value) => TradeDate::parse(value).map(Some).map_err(D::Error::custom),
        None => Ok(None),
    }
}
