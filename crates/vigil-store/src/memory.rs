use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use vigil_domain::{Check, CheckId, Host, HostId, HistoryEntry, Pair, Status};

use crate::error::StoreError;
use crate::store::{Store, StoreStats};

#[derive(Debug, Default)]
struct Inner {
    hosts: HashMap<HostId, Host>,
    checks: HashMap<CheckId, Check>,
    statuses: HashMap<Pair, Status>,
    history: HashMap<Pair, Vec<HistoryEntry>>,
}

/// In-memory implementation of [`Store`].
///
/// All data is lost on process exit. Used for tests and `-validate` runs
/// that never touch disk.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_host(&self, id: &HostId) -> Result<Option<Host>, StoreError> {
        Ok(self.inner.read().await.hosts.get(id).cloned())
    }

    async fn list_hosts(&self) -> Result<Vec<Host>, StoreError> {
        Ok(self.inner.read().await.hosts.values().cloned().collect())
    }

    async fn upsert_host(&self, host: &Host) -> Result<(), StoreError> {
        self.inner.write().await.hosts.insert(host.id.clone(), host.clone());
        Ok(())
    }

    async fn delete_host(&self, id: &HostId) -> Result<(), StoreError> {
        self.inner.write().await.hosts.remove(id);
        Ok(())
    }

    async fn get_check(&self, id: &CheckId) -> Result<Option<Check>, StoreError> {
        Ok(self.inner.read().await.checks.get(id).cloned())
    }

    async fn list_checks(&self) -> Result<Vec<Check>, StoreError> {
        Ok(self.inner.read().await.checks.values().cloned().collect())
    }

    async fn upsert_check(&self, check: &Check) -> Result<(), StoreError> {
        self.inner.write().await.checks.insert(check.id.clone(), check.clone());
        Ok(())
    }

    async fn delete_check(&self, id: &CheckId) -> Result<(), StoreError> {
        self.inner.write().await.checks.remove(id);
        Ok(())
    }

    async fn get_status(&self, pair: &Pair) -> Result<Option<Status>, StoreError> {
        Ok(self.inner.read().await.statuses.get(pair).cloned())
    }

    async fn list_statuses(&self) -> Result<Vec<Status>, StoreError> {
        Ok(self.inner.read().await.statuses.values().cloned().collect())
    }

    async fn upsert_status(&self, status: &Status) -> Result<(), StoreError> {
        let pair = Pair::new(status.host_id.clone(), status.check_id.clone());
        self.inner.write().await.statuses.insert(pair, status.clone());
        Ok(())
    }

    async fn delete_status(&self, pair: &Pair) -> Result<(), StoreError> {
        self.inner.write().await.statuses.remove(pair);
        Ok(())
    }

    async fn append_history(&self, entry: &HistoryEntry) -> Result<(), StoreError> {
        let pair = Pair::new(entry.host_id.clone(), entry.check_id.clone());
        self.inner
            .write()
            .await
            .history
            .entry(pair)
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn list_history(
        &self,
        pair: &Pair,
        since: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        let guard = self.inner.read().await;
        let Some(entries) = guard.history.get(pair) else {
            return Ok(Vec::new());
        };
        let filtered: Vec<HistoryEntry> = entries
            .iter()
            .filter(|e| since.map_or(true, |cutoff| e.timestamp >= cutoff))
            .cloned()
            .collect();
        let start = filtered.len().saturating_sub(limit as usize);
        Ok(filtered[start..].to_vec())
    }

    async fn delete_history(&self, pair: &Pair) -> Result<(), StoreError> {
        self.inner.write().await.history.remove(pair);
        Ok(())
    }

    async fn delete_history_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut guard = self.inner.write().await;
        let mut removed = 0u64;
        for entries in guard.history.values_mut() {
            let before = entries.len();
            entries.retain(|e| e.timestamp >= cutoff);
            removed += (before - entries.len()) as u64;
        }
        Ok(removed)
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let guard = self.inner.read().await;
        let mut oldest = None;
        let mut newest = None;
        let mut history_count = 0u64;
        for entries in guard.history.values() {
            history_count += entries.len() as u64;
            for e in entries {
                oldest = Some(oldest.map_or(e.timestamp, |o: DateTime<Utc>| o.min(e.timestamp)));
                newest = Some(newest.map_or(e.timestamp, |n: DateTime<Utc>| n.max(e.timestamp)));
            }
        }
        Ok(StoreStats {
            host_count: guard.hosts.len() as u64,
            check_count: guard.checks.len() as u64,
            status_count: guard.statuses.len() as u64,
            history_count,
            oldest_history: oldest,
            newest_history: newest,
        })
    }

    async fn compact(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as StdHashMap;
    use vigil_domain::ExitCode;

    fn host(id: &str) -> Host {
        Host {
            id: HostId::new(id),
            name: id.to_string(),
            display_name: None,
            ipv4: None,
            hostname: Some(format!("{id}.example.com")),
            group: "default".into(),
            enabled: true,
            tags: StdHashMap::new(),
            created_at: None,
            updated_at: None,
        }
    }

    fn status(host_id: &str, check_id: &str) -> Status {
        Status {
            host_id: HostId::new(host_id),
            check_id: CheckId::new(check_id),
            exit_code: ExitCode::OK,
            output: "ok".into(),
            long_output: None,
            perf_data: None,
            duration_ms: 10,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn upsert_and_get_host() {
        let store = InMemoryStore::new();
        store.upsert_host(&host("h1")).await.unwrap();
        let got = store.get_host(&HostId::new("h1")).await.unwrap();
        assert_eq!(got.unwrap().id.as_str(), "h1");
    }

    #[tokio::test]
    async fn delete_host_removes_it() {
        let store = InMemoryStore::new();
        store.upsert_host(&host("h1")).await.unwrap();
        store.delete_host(&HostId::new("h1")).await.unwrap();
        assert!(store.get_host(&HostId::new("h1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn status_and_history_round_trip() {
        let store = InMemoryStore::new();
        let pair = Pair::new(HostId::new("h1"), CheckId::new("c1"));
        store.upsert_status(&status("h1", "c1")).await.unwrap();
        store
            .append_history(&status("h1", "c1").into())
            .await
            .unwrap();

        assert!(store.get_status(&pair).await.unwrap().is_some());
        let history = store.list_history(&pair, None, 10).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn delete_history_older_than_prunes_across_pairs() {
        let store = InMemoryStore::new();
        let mut old = status("h1", "c1");
        old.timestamp = Utc::now() - chrono::Duration::days(40);
        store.append_history(&old.into()).await.unwrap();
        store.append_history(&status("h1", "c1").into()).await.unwrap();

        let removed = store
            .delete_history_older_than(Utc::now() - chrono::Duration::days(30))
            .await
            .unwrap();
        assert_eq!(removed, 1);
    }
}
