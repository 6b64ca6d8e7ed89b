use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, TableDefinition};
use tokio::sync::RwLock;
use vigil_domain::{Check, CheckId, Host, HostId, HistoryEntry, Pair, Status};

use crate::error::StoreError;
use crate::store::{Store, StoreStats};

const HOSTS: TableDefinition<&str, &[u8]> = TableDefinition::new("hosts");
const CHECKS: TableDefinition<&str, &[u8]> = TableDefinition::new("checks");
const STATUSES: TableDefinition<&str, &[u8]> = TableDefinition::new("statuses");
const HISTORY: TableDefinition<u64, &[u8]> = TableDefinition::new("history");
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

fn internal<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Internal(e.to_string())
}

fn pair_key(pair: &Pair) -> String {
    format!("{}/{}", pair.host_id, pair.check_id)
}

fn open_with_tables(path: &Path) -> Result<Database, StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(internal)?;
        }
    }
    let db = Database::create(path).map_err(internal)?;
    {
        let wtxn = db.begin_write().map_err(internal)?;
        wtxn.open_table(HOSTS).map_err(internal)?;
        wtxn.open_table(CHECKS).map_err(internal)?;
        wtxn.open_table(STATUSES).map_err(internal)?;
        wtxn.open_table(HISTORY).map_err(internal)?;
        wtxn.open_table(META).map_err(internal)?;
        wtxn.commit().map_err(internal)?;
    }
    Ok(db)
}

/// Apply schema migrations by ensuring every table exists. The store has no
/// versioned schema — every value is a self-describing JSON blob — so this
/// is idempotent and safe to call repeatedly; it backs the CLI's `--migrate`.
pub fn migrate(path: &Path) -> Result<(), StoreError> {
    open_with_tables(path)?;
    Ok(())
}

/// Persistent [`Store`] backed by a redb database file.
///
/// Readers and writers proceed concurrently through redb's own internal
/// locking; `compact` takes the outer `RwLock` exclusively and performs a
/// copy-to-shadow-file-then-atomic-rename swap.
#[derive(Clone)]
pub struct RedbStore {
    path: PathBuf,
    db: Arc<RwLock<Arc<Database>>>,
}

impl RedbStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let db = open_with_tables(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            db: Arc::new(RwLock::new(Arc::new(db))),
        })
    }

    async fn snapshot(&self) -> Arc<Database> {
        self.db.read().await.clone()
    }
}

#[async_trait]
impl Store for RedbStore {
    async fn get_host(&self, id: &HostId) -> Result<Option<Host>, StoreError> {
        let db = self.snapshot().await;
        let rtxn = db.begin_read().map_err(internal)?;
        let table = rtxn.open_table(HOSTS).map_err(internal)?;
        match table.get(id.as_str()).map_err(internal)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    async fn list_hosts(&self) -> Result<Vec<Host>, StoreError> {
        let db = self.snapshot().await;
        let rtxn = db.begin_read().map_err(internal)?;
        let table = rtxn.open_table(HOSTS).map_err(internal)?;
        let mut out = Vec::new();
        for entry in table.iter().map_err(internal)? {
            let (_k, v) = entry.map_err(internal)?;
            out.push(serde_json::from_slice(v.value())?);
        }
        Ok(out)
    }

    async fn upsert_host(&self, host: &Host) -> Result<(), StoreError> {
        let db = self.snapshot().await;
        let bytes = serde_json::to_vec(host)?;
        let wtxn = db.begin_write().map_err(internal)?;
        {
            let mut table = wtxn.open_table(HOSTS).map_err(internal)?;
            table.insert(host.id.as_str(), bytes.as_slice()).map_err(internal)?;
        }
        wtxn.commit().map_err(internal)?;
        Ok(())
    }

    async fn delete_host(&self, id: &HostId) -> Result<(), StoreError> {
        let db = self.snapshot().await;
        let wtxn = db.begin_write().map_err(internal)?;
        {
            let mut table = wtxn.open_table(HOSTS).map_err(internal)?;
            table.remove(id.as_str()).map_err(internal)?;
        }
        wtxn.commit().map_err(internal)?;
        Ok(())
    }

    async fn get_check(&self, id: &CheckId) -> Result<Option<Check>, StoreError> {
        let db = self.snapshot().await;
        let rtxn = db.begin_read().map_err(internal)?;
        let table = rtxn.open_table(CHECKS).map_err(internal)?;
        match table.get(id.as_str()).map_err(internal)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    async fn list_checks(&self) -> Result<Vec<Check>, StoreError> {
        let db = self.snapshot().await;
        let rtxn = db.begin_read().map_err(internal)?;
        let table = rtxn.open_table(CHECKS).map_err(internal)?;
        let mut out = Vec::new();
        for entry in table.iter().map_err(internal)? {
            let (_k, v) = entry.map_err(internal)?;
            out.push(serde_json::from_slice(v.value())?);
        }
        Ok(out)
    }

    async fn upsert_check(&self, check: &Check) -> Result<(), StoreError> {
        let db = self.snapshot().await;
        let bytes = serde_json::to_vec(check)?;
        let wtxn = db.begin_write().map_err(internal)?;
        {
            let mut table = wtxn.open_table(CHECKS).map_err(internal)?;
            table.insert(check.id.as_str(), bytes.as_slice()).map_err(internal)?;
        }
        wtxn.commit().map_err(internal)?;
        Ok(())
    }

    async fn delete_check(&self, id: &CheckId) -> Result<(), StoreError> {
        let db = self.snapshot().await;
        let wtxn = db.begin_write().map_err(internal)?;
        {
            let mut table = wtxn.open_table(CHECKS).map_err(internal)?;
            table.remove(id.as_str()).map_err(internal)?;
        }
        wtxn.commit().map_err(internal)?;
        Ok(())
    }

    async fn get_status(&self, pair: &Pair) -> Result<Option<Status>, StoreError> {
        let db = self.snapshot().await;
        let rtxn = db.begin_read().map_err(internal)?;
        let table = rtxn.open_table(STATUSES).map_err(internal)?;
        match table.get(pair_key(pair).as_str()).map_err(internal)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    async fn list_statuses(&self) -> Result<Vec<Status>, StoreError> {
        let db = self.snapshot().await;
        let rtxn = db.begin_read().map_err(internal)?;
        let table = rtxn.open_table(STATUSES).map_err(internal)?;
        let mut out = Vec::new();
        for entry in table.iter().map_err(internal)? {
            let (_k, v) = entry.map_err(internal)?;
            out.push(serde_json::from_slice(v.value())?);
        }
        Ok(out)
    }

    async fn upsert_status(&self, status: &Status) -> Result<(), StoreError> {
        let db = self.snapshot().await;
        let pair = Pair::new(status.host_id.clone(), status.check_id.clone());
        let bytes = serde_json::to_vec(status)?;
        let wtxn = db.begin_write().map_err(internal)?;
        {
            let mut table = wtxn.open_table(STATUSES).map_err(internal)?;
            table.insert(pair_key(&pair).as_str(), bytes.as_slice()).map_err(internal)?;
        }
        wtxn.commit().map_err(internal)?;
        Ok(())
    }

    async fn delete_status(&self, pair: &Pair) -> Result<(), StoreError> {
        let db = self.snapshot().await;
        let wtxn = db.begin_write().map_err(internal)?;
        {
            let mut table = wtxn.open_table(STATUSES).map_err(internal)?;
            table.remove(pair_key(pair).as_str()).map_err(internal)?;
        }
        wtxn.commit().map_err(internal)?;
        Ok(())
    }

    async fn append_history(&self, entry: &HistoryEntry) -> Result<(), StoreError> {
        let db = self.snapshot().await;
        let bytes = serde_json::to_vec(entry)?;
        let wtxn = db.begin_write().map_err(internal)?;
        {
            let mut meta = wtxn.open_table(META).map_err(internal)?;
            let seq = meta.get("history_seq").map_err(internal)?.map(|g| g.value()).unwrap_or(0);
            let next = seq + 1;
            meta.insert("history_seq", next).map_err(internal)?;

            let mut history = wtxn.open_table(HISTORY).map_err(internal)?;
            history.insert(next, bytes.as_slice()).map_err(internal)?;
        }
        wtxn.commit().map_err(internal)?;
        Ok(())
    }

    async fn list_history(
        &self,
        pair: &Pair,
        since: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        let db = self.snapshot().await;
        let rtxn = db.begin_read().map_err(internal)?;
        let table = rtxn.open_table(HISTORY).map_err(internal)?;
        let mut matching = Vec::new();
        for entry in table.iter().map_err(internal)? {
            let (_k, v) = entry.map_err(internal)?;
            let history_entry: HistoryEntry = serde_json::from_slice(v.value())?;
            if history_entry.host_id != pair.host_id || history_entry.check_id != pair.check_id {
                continue;
            }
            if let Some(cutoff) = since {
                if history_entry.timestamp < cutoff {
                    continue;
                }
            }
            matching.push(history_entry);
        }
        let start = matching.len().saturating_sub(limit as usize);
        Ok(matching[start..].to_vec())
    }

    async fn delete_history(&self, pair: &Pair) -> Result<(), StoreError> {
        let db = self.snapshot().await;
        let wtxn = db.begin_write().map_err(internal)?;
        {
            let mut table = wtxn.open_table(HISTORY).map_err(internal)?;
            let keys_to_remove: Vec<u64> = {
                let mut keys = Vec::new();
                for entry in table.iter().map_err(internal)? {
                    let (k, v) = entry.map_err(internal)?;
                    let history_entry: HistoryEntry = serde_json::from_slice(v.value())?;
                    if history_entry.host_id == pair.host_id && history_entry.check_id == pair.check_id {
                        keys.push(k.value());
                    }
                }
                keys
            };
            for key in keys_to_remove {
                table.remove(key).map_err(internal)?;
            }
        }
        wtxn.commit().map_err(internal)?;
        Ok(())
    }

    async fn delete_history_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let db = self.snapshot().await;
        let wtxn = db.begin_write().map_err(internal)?;
        let removed;
        {
            let mut table = wtxn.open_table(HISTORY).map_err(internal)?;
            let keys_to_remove: Vec<u64> = {
                let mut keys = Vec::new();
                for entry in table.iter().map_err(internal)? {
                    let (k, v) = entry.map_err(internal)?;
                    let history_entry: HistoryEntry = serde_json::from_slice(v.value())?;
                    if history_entry.timestamp < cutoff {
                        keys.push(k.value());
                    }
                }
                keys
            };
            removed = keys_to_remove.len() as u64;
            for key in keys_to_remove {
                table.remove(key).map_err(internal)?;
            }
        }
        wtxn.commit().map_err(internal)?;
        Ok(removed)
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let db = self.snapshot().await;
        let rtxn = db.begin_read().map_err(internal)?;

        let host_count = rtxn.open_table(HOSTS).map_err(internal)?.len().map_err(internal)?;
        let check_count = rtxn.open_table(CHECKS).map_err(internal)?.len().map_err(internal)?;
        let status_count = rtxn.open_table(STATUSES).map_err(internal)?.len().map_err(internal)?;

        let history_table = rtxn.open_table(HISTORY).map_err(internal)?;
        let mut oldest = None;
        let mut newest = None;
        let mut history_count = 0u64;
        for entry in history_table.iter().map_err(internal)? {
            let (_k, v) = entry.map_err(internal)?;
            let history_entry: HistoryEntry = serde_json::from_slice(v.value())?;
            history_count += 1;
            oldest = Some(oldest.map_or(history_entry.timestamp, |o: DateTime<Utc>| o.min(history_entry.timestamp)));
            newest = Some(newest.map_or(history_entry.timestamp, |n: DateTime<Utc>| n.max(history_entry.timestamp)));
        }

        Ok(StoreStats {
            host_count,
            check_count,
            status_count,
            history_count,
            oldest_history: oldest,
            newest_history: newest,
        })
    }

    async fn compact(&self) -> Result<(), StoreError> {
        let mut guard = self.db.write().await;
        let old_db = guard.clone();
        let path = self.path.clone();
        let shadow_path = path.with_extension("redb.compact");

        let shadow_path_for_blocking = shadow_path.clone();
        let new_db = tokio::task::spawn_blocking(move || -> Result<Database, StoreError> {
            let new_db = open_with_tables(&shadow_path_for_blocking)?;
            copy_str_table(&old_db, &new_db, HOSTS)?;
            copy_str_table(&old_db, &new_db, CHECKS)?;
            copy_str_table(&old_db, &new_db, STATUSES)?;
            copy_u64_table(&old_db, &new_db, HISTORY)?;
            copy_meta(&old_db, &new_db)?;
            Ok(new_db)
        })
        .await
        .map_err(internal)??;

        drop(new_db);
        std::fs::rename(&shadow_path, &path).map_err(internal)?;
        let reopened = Database::open(&path).map_err(internal)?;
        *guard = Arc::new(reopened);
        Ok(())
    }
}

fn copy_str_table(
    src: &Database,
    dst: &Database,
    table_def: TableDefinition<&str, &[u8]>,
) -> Result<(), StoreError> {
    let rtxn = src.begin_read().map_err(internal)?;
    let src_table = rtxn.open_table(table_def).map_err(internal)?;
    let wtxn = dst.begin_write().map_err(internal)?;
    {
        let mut dst_table = wtxn.open_table(table_def).map_err(internal)?;
        for entry in src_table.iter().map_err(internal)? {
            let (k, v) = entry.map_err(internal)?;
            dst_table.insert(k.value(), v.value()).map_err(internal)?;
        }
    }
    wtxn.commit().map_err(internal)?;
    Ok(())
}

fn copy_u64_table(
    src: &Database,
    dst: &Database,
    table_def: TableDefinition<u64, &[u8]>,
) -> Result<(), StoreError> {
    let rtxn = src.begin_read().map_err(internal)?;
    let src_table = rtxn.open_table(table_def).map_err(internal)?;
    let wtxn = dst.begin_write().map_err(internal)?;
    {
        let mut dst_table = wtxn.open_table(table_def).map_err(internal)?;
        for entry in src_table.iter().map_err(internal)? {
            let (k, v) = entry.map_err(internal)?;
            dst_table.insert(k.value(), v.value()).map_err(internal)?;
        }
    }
    wtxn.commit().map_err(internal)?;
    Ok(())
}

fn copy_meta(src: &Database, dst: &Database) -> Result<(), StoreError> {
    let rtxn = src.begin_read().map_err(internal)?;
    let src_table = rtxn.open_table(META).map_err(internal)?;
    let wtxn = dst.begin_write().map_err(internal)?;
    {
        let mut dst_table = wtxn.open_table(META).map_err(internal)?;
        for entry in src_table.iter().map_err(internal)? {
            let (k, v) = entry.map_err(internal)?;
            dst_table.insert(k.value(), v.value()).map_err(internal)?;
        }
    }
    wtxn.commit().map_err(internal)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;
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
            tags: HashMap::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn upsert_and_get_host() {
        let dir = TempDir::new().unwrap();
        let store = RedbStore::open(&dir.path().join("vigil.redb")).unwrap();
        store.upsert_host(&host("h1")).await.unwrap();
        let got = store.get_host(&HostId::new("h1")).await.unwrap();
        assert_eq!(got.unwrap().id.as_str(), "h1");
    }

    #[tokio::test]
    async fn persistence_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vigil.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            store.upsert_host(&host("persistent")).await.unwrap();
        }
        {
            let store = RedbStore::open(&path).unwrap();
            let got = store.get_host(&HostId::new("persistent")).await.unwrap();
            assert!(got.is_some());
        }
    }

    #[tokio::test]
    async fn compact_preserves_data() {
        let dir = TempDir::new().unwrap();
        let store = RedbStore::open(&dir.path().join("vigil.redb")).unwrap();
        store.upsert_host(&host("h1")).await.unwrap();
        store.upsert_host(&host("h2")).await.unwrap();

        store.compact().await.unwrap();

        let hosts = store.list_hosts().await.unwrap();
        assert_eq!(hosts.len(), 2);
    }

    #[tokio::test]
    async fn history_older_than_cutoff_is_pruned() {
        let dir = TempDir::new().unwrap();
        let store = RedbStore::open(&dir.path().join("vigil.redb")).unwrap();
        let pair = Pair::new(HostId::new("h1"), CheckId::new("c1"));

        let mut old = Status {
            host_id: HostId::new("h1"),
            check_id: CheckId::new("c1"),
            exit_code: ExitCode::OK,
            output: "ok".into(),
            long_output: None,
            perf_data: None,
            duration_ms: 5,
            timestamp: Utc::now() - chrono::Duration::days(40),
        };
        store.append_history(&old.clone().into()).await.unwrap();
        old.timestamp = Utc::now();
        store.append_history(&old.into()).await.unwrap();

        let removed = store
            .delete_history_older_than(Utc::now() - chrono::Duration::days(30))
            .await
            .unwrap();
        assert_eq!(removed, 1);

        let remaining = store.list_history(&pair, None, 10).await.unwrap();
        assert_eq!(remaining.len(), 1);
    }
}
