use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vigil_domain::{Check, CheckId, Host, HostId, HistoryEntry, Pair, Status};

use crate::error::StoreError;

/// Durable counts and size exposed by the store's `stats` operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    pub host_count: u64,
    pub check_count: u64,
    pub status_count: u64,
    pub history_count: u64,
    pub oldest_history: Option<DateTime<Utc>>,
    pub newest_history: Option<DateTime<Utc>>,
}

/// The abstract persistence contract; only this trait is specified, not the
/// backend behind it.
///
/// `upsert_host`/`upsert_check` collapse separate create/update operations
/// into one call — the store can always tell create from update by whether a
/// prior record existed.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    async fn get_host(&self, id: &HostId) -> Result<Option<Host>, StoreError>;
    async fn list_hosts(&self) -> Result<Vec<Host>, StoreError>;
    async fn upsert_host(&self, host: &Host) -> Result<(), StoreError>;
    async fn delete_host(&self, id: &HostId) -> Result<(), StoreError>;

    async fn get_check(&self, id: &CheckId) -> Result<Option<Check>, StoreError>;
    async fn list_checks(&self) -> Result<Vec<Check>, StoreError>;
    async fn upsert_check(&self, check: &Check) -> Result<(), StoreError>;
    async fn delete_check(&self, id: &CheckId) -> Result<(), StoreError>;

    async fn get_status(&self, pair: &Pair) -> Result<Option<Status>, StoreError>;
    async fn list_statuses(&self) -> Result<Vec<Status>, StoreError>;
    async fn upsert_status(&self, status: &Status) -> Result<(), StoreError>;
    async fn delete_status(&self, pair: &Pair) -> Result<(), StoreError>;

    async fn append_history(&self, entry: &HistoryEntry) -> Result<(), StoreError>;

    async fn list_history(
        &self,
        pair: &Pair,
        since: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>, StoreError>;

    async fn delete_history(&self, pair: &Pair) -> Result<(), StoreError>;

    /// Deletes every history entry (for any pair) older than `cutoff`.
    /// Returns the number of entries removed.
    async fn delete_history_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;

    async fn stats(&self) -> Result<StoreStats, StoreError>;

    /// Exclusive maintenance operation: copy-to-shadow-file + atomic rename
    /// for on-disk backends; a no-op for in-memory ones.
    async fn compact(&self) -> Result<(), StoreError>;
}
