//! Storage seams of the sync cycle

use async_trait::async_trait;

use crate::domain::{Account, Position};
use crate::error::Result;

/// Read side: the accounts that have terminal credentials configured
#[async_trait]
pub trait AccountCatalog: Send + Sync {
    /// All accounts with a terminal login set
    async fn fetch_accounts(&self) -> Result<Vec<Account>>;
}

/// Upsert Gateway
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Insert or fully replace positions keyed by
    /// (account id, external position id) as one atomic batch.
    /// Returns the number of positions written; empty input writes nothing.
    async fn upsert_positions(&self, positions: &[Position]) -> Result<usize>;
}

#[async_trait]
impl<T: AccountCatalog + ?Sized> AccountCatalog for std::sync::Arc<T> {
    async fn fetch_accounts(&self) -> Result<Vec<Account>> {
        (**self).fetch_accounts().await
    }
}

#[async_trait]
impl<T: PositionStore + ?Sized> PositionStore for std::sync::Arc<T> {
    async fn upsert_positions(&self, positions: &[Position]) -> Result<usize> {
        (**self).upsert_positions(positions).await
    }
}
