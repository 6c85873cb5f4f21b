//! Trading history sync worker
//!
//! Reconciles the deal history held by a trading terminal with the `trades`
//! table of a Postgres database, one account at a time, on a fixed interval.

pub mod adapters;
pub mod config;
pub mod coordination;
pub mod domain;
pub mod error;
pub mod logging;
pub mod sync;
pub mod terminal;

pub use adapters::PostgresStore;
pub use config::AppConfig;
pub use coordination::{GracefulShutdown, ShutdownSignal};
pub use domain::{Account, Credentials, Deal, DealEntry, DealType, Direction, Position, PositionStatus};
pub use error::{ConnectError, Result, SyncError};
pub use sync::{
    aggregate_deals, AccountCatalog, AccountOutcome, CycleReport, PositionStore, Scheduler,
    SkipReason, SyncOrchestrator, SyncSettings,
};
pub use terminal::{BridgeTerminal, ErrorCategory, TerminalError, TerminalSession, TradingTerminal};
