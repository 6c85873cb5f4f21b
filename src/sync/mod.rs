//! Reconciliation pipeline
//!
//! Terminal deal history in, idempotently upserted positions out.

pub mod aggregator;
pub mod orchestrator;
pub mod report;
pub mod scheduler;
pub mod traits;

pub use aggregator::{aggregate_deals, group_by_key};
pub use orchestrator::{SyncOrchestrator, SyncSettings};
pub use report::{AccountOutcome, AccountReport, CycleReport, SkipReason};
pub use scheduler::Scheduler;
pub use traits::{AccountCatalog, PositionStore};
