use serde::{Deserialize, Serialize};

use crate::{Emiten, TradeDate, UtcDateTime, ValidationError};

/// Status value written for analyses that completed.
pub const STATUS_SUCCESS: &str = "success";

/// One analysis result row, unique per (`from_date`, `emiten`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockQueryRecord {
    pub from_date: TradeDate,
    pub emiten: Emiten,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub to_date: Option<TradeDate>,
    /// Dominant broker for the window.
    #[serde(default)]
    pub bandar: Option<String>,
    /// Lots accumulated by the dominant broker.
    #[serde(default)]
    pub barang_bandar: Option<f64>,
    #[serde(default)]
    pub rata_rata_bandar: Option<f64>,
    #[serde(default)]
    pub harga: Option<f64>,
    #[serde(default)]
    pub ara: Option<f64>,
    #[serde(default)]
    pub arb: Option<f64>,
    #[serde(default)]
    pub fraksi: Option<f64>,
    #[serde(default)]
    pub total_bid: Option<f64>,
    #[serde(default)]
    pub total_offer: Option<f64>,
    #[serde(default)]
    pub total_papan: Option<f64>,
    #[serde(default)]
    pub rata_rata_bid_ofer: Option<f64>,
    #[serde(default)]
    pub a: Option<f64>,
    #[serde(default)]
    pub p: Option<f64>,
    #[serde(default)]
    pub target_realistis: Option<f64>,
    #[serde(default)]
    pub target_max: Option<f64>,
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    /// Next session's actual price, filled in once it is known.
    #[serde(default)]
    pub real_harga: Option<f64>,
    /// Store-assigned row id. Never sent on upsert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl StockQueryRecord {
    /// A successful record with every analysis output unset.
    pub fn new(emiten: Emiten, from_date: TradeDate) -> Self {
        Self {
            from_date,
            emiten,
            sector: None,
            to_date: None,
            bandar: None,
            barang_bandar: None,
            rata_rata_bandar: None,
            harga: None,
            ara: None,
            arb: None,
            fraksi: None,
            total_bid: None,
            total_offer: None,
            total_papan: None,
            rata_rata_bid_ofer: None,
            a: None,
            p: None,
            target_realistis: None,
            target_max: None,
            status: String::from(STATUS_SUCCESS),
            error_message: None,
            real_harga: None,
            id: None,
        }
    }

    /// A failed analysis: status `error` with the diagnostic attached.
    pub fn failed(emiten: Emiten, from_date: TradeDate, message: impl Into<String>) -> Self {
        Self {
            status: String::from("error"),
            error_message: Some(message.into()),
            ..Self::new(emiten, from_date)
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Natural key used for upsert conflict resolution.
    pub fn key(&self) -> (TradeDate, &Emiten) {
        (self.from_date, &self.emiten)
    }
}

/// Key/value pair in the `session` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub key: String,
    pub value: String,
    pub updated_at: UtcDateTime,
}

impl SessionEntry {
    /// Build an entry stamped with the current time.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ValidationError::EmptySessionKey);
        }

        Ok(Self {
            key,
            value: value.into(),
            updated_at: UtcDateTime::now(),
        })
    }
}
