use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Columns of the `stock_queries` table.
///
/// Sort keys and filters are only ever rendered from this enumeration, never
/// from caller-supplied text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockColumn {
    FromDate,
    Emiten,
    Sector,
    ToDate,
    Bandar,
    BarangBandar,
    RataRataBandar,
    Harga,
    Ara,
    Arb,
    Fraksi,
    TotalBid,
    TotalOffer,
    TotalPapan,
    RataRataBidOfer,
    A,
    P,
    TargetRealistis,
    TargetMax,
    Status,
    ErrorMessage,
    RealHarga,
    Id,
}

impl StockColumn {
    pub const ALL: [Self; 23] = [
        Self::FromDate,
        Self::Emiten,
        Self::Sector,
        Self::ToDate,
        Self::Bandar,
        Self::BarangBandar,
        Self::RataRataBandar,
        Self::Harga,
        Self::Ara,
        Self::Arb,
        Self::Fraksi,
        Self::TotalBid,
        Self::TotalOffer,
        Self::TotalPapan,
        Self::RataRataBidOfer,
        Self::A,
        Self::P,
        Self::TargetRealistis,
        Self::TargetMax,
        Self::Status,
        Self::ErrorMessage,
        Self::RealHarga,
        Self::Id,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FromDate => "from_date",
            Self::Emiten => "emiten",
            Self::Sector => "sector",
            Self::ToDate => "to_date",
            Self::Bandar => "bandar",
            Self::BarangBandar => "barang_bandar",
            Self::RataRataBandar => "rata_rata_bandar",
            Self::Harga => "harga",
            Self::Ara => "ara",
            Self::Arb => "arb",
            Self::Fraksi => "fraksi",
            Self::TotalBid => "total_bid",
            Self::TotalOffer => "total_offer",
            Self::TotalPapan => "total_papan",
            Self::RataRataBidOfer => "rata_rata_bid_ofer",
            Self::A => "a",
            Self::P => "p",
            Self::TargetRealistis => "target_realistis",
            Self::TargetMax => "target_max",
            Self::Status => "status",
            Self::ErrorMessage => "error_message",
            Self::RealHarga => "real_harga",
            Self::Id => "id",
        }
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let needle = input.trim();
        Self::ALL
            .into_iter()
            .find(|column| column.as_str() == needle)
            .ok_or_else(|| ValidationError::UnknownColumn {
                value: input.to_owned(),
            })
    }
}

impl Display for StockColumn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockColumn {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
