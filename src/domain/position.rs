use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trade direction, taken from the first fill of a position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionStatus {
    Open,
    Closed,
}

impl PositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Open => "OPEN",
            PositionStatus::Closed => "CLOSED",
        }
    }
}

impl std::fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exit data only exists once a position is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionState {
    Open,
    Closed { exit_price: Decimal, net_pnl: Decimal },
}

/// Natural key of a stored position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionKey {
    pub account_id: Uuid,
    pub external_position_id: u64,
}

/// One position derived from the deal history of an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub account_id: Uuid,
    pub external_position_id: u64,
    pub user_id: Uuid,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: Decimal,
    pub size: Decimal,
    pub state: PositionState,
    pub opened_at: DateTime<Utc>,
}

impl Position {
    pub fn key(&self) -> PositionKey {
        PositionKey {
            account_id: self.account_id,
            external_position_id: self.external_position_id,
        }
    }

    pub fn status(&self) -> PositionStatus {
        match self.state {
            PositionState::Open => PositionStatus::Open,
            PositionState::Closed { .. } => PositionStatus::Closed,
        }
    }

    pub fn exit_price(&self) -> Option<Decimal> {
        match self.state {
            PositionState::Open => None,
            PositionState::Closed { exit_price, .. } => Some(exit_price),
        }
    }

    pub fn net_pnl(&self) -> Option<Decimal> {
        match self.state {
            PositionState::Open => None,
            PositionState::Closed { net_pnl, .. } => Some(net_pnl),
        }
    }
}
