use thiserror::Error;

/// Validation and contract errors exposed by `saham-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("emiten cannot be empty")]
    EmptyEmiten,
    #[error("emiten length {len} exceeds max {max}")]
    EmitenTooLong { len: usize, max: usize },
    #[error("emiten must start with an ASCII letter: '{ch}'")]
    EmitenInvalidStart { ch: char },
    #[error("emiten contains invalid character '{ch}' at index {index}")]
    EmitenInvalidChar { ch: char, index: usize },

    #[error("date must be ISO YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("timestamp must be RFC3339 UTC: '{value}'")]
    TimestampNotUtc { value: String },

    #[error("unknown column '{value}'")]
    UnknownColumn { value: String },
    #[error("invalid sort order '{value}', expected one of asc, desc")]
    InvalidSortOrder { value: String },
    #[error("limit must be greater than zero")]
    ZeroLimit,

    #[error("session key cannot be empty")]
    EmptySessionKey,
}

/// Failure classes surfaced by every [`StockStore`](crate::StockStore) backend.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    /// A read against the store failed.
    #[error("query failed: {0}")]
    Query(String),

    /// An upsert or update against the store failed.
    #[error("write failed: {0}")]
    Write(String),

    /// No row matched a lookup that required one.
    #[error("not found: {0}")]
    NotFound(String),

    /// The store answered, but the payload could not be decoded.
    #[error("could not decode store response: {0}")]
    Decode(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl StoreError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Startup configuration errors. Any of these is fatal at process init.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("store url must start with http:// or https://: '{0}'")]
    InvalidUrl(String),
}
