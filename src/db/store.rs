use async_trait::async_trait;

use crate::error::WatcherResult;
use crate::models::PoolRecord;

/// Outcome of an idempotent insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOutcome {
    pub inserted: bool,
}

/// Lookup keys supported by `find_one`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchlistQuery {
    Signature(String),
    PoolAddress(String),
    Creator(String),
}

/// Append-only store of discovered pools, keyed on the creation signature
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Insert the record unless one with the same signature exists
    async fn insert_if_absent(&self, record: &PoolRecord) -> WatcherResult<InsertOutcome>;

    /// Remove every record, returning how many were deleted
    async fn delete_all(&self) -> WatcherResult<u64>;

    async fn find_one(&self, query: &WatchlistQuery) -> WatcherResult<Option<PoolRecord>>;
}
