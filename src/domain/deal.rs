use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Position id the terminal assigns to non-trading ledger operations
/// (balance, credit, bonus, ...).
pub const NON_TRADING_POSITION_ID: u64 = 0;

/// Deal type as reported by the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealType {
    Buy,
    Sell,
    /// Any non-trading type code (balance, credit, charge, ...)
    NonTrading(u32),
}

impl DealType {
    pub fn from_code(code: u32) -> Self {
        match code {
            0 => DealType::Buy,
            1 => DealType::Sell,
            other => DealType::NonTrading(other),
        }
    }
}

impl std::fmt::Display for DealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DealType::Buy => write!(f, "BUY"),
            DealType::Sell => write!(f, "SELL"),
            DealType::NonTrading(code) => write!(f, "NON_TRADING({code})"),
        }
    }
}

/// Whether a fill opens or closes exposure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealEntry {
    In,
    Out,
    /// Reversal: closes and reopens in the opposite direction
    InOut,
    /// Closed by an opposite position
    OutBy,
}

impl DealEntry {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(DealEntry::In),
            1 => Some(DealEntry::Out),
            2 => Some(DealEntry::InOut),
            3 => Some(DealEntry::OutBy),
            _ => None,
        }
    }

    pub fn is_closing(&self) -> bool {
        matches!(self, DealEntry::Out | DealEntry::OutBy)
    }
}

/// A single fill reported by the trading terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub ticket: u64,
    pub position_id: u64,
    pub time: DateTime<Utc>,
    pub symbol: String,
    pub deal_type: DealType,
    pub entry: DealEntry,
    pub price: Decimal,
    pub volume: Decimal,
    pub profit: Decimal,
    pub swap: Decimal,
    pub commission: Decimal,
}

impl Deal {
    pub fn is_trading(&self) -> bool {
        self.position_id != NON_TRADING_POSITION_ID
    }

    /// profit + swap + commission
    pub fn net_result(&self) -> Decimal {
        self.profit + self.swap + self.commission
    }
}
