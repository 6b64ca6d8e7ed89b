use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use vigil_store::Store;

/// Periodic, cooperative upkeep: history retention and store compaction.
/// Runs independently of the scheduler/worker pool — a slow or failed
/// maintenance pass never blocks a probe cycle.
pub struct Maintenance {
    store: Arc<dyn Store>,
    cleanup_interval: Duration,
    compact_interval: Duration,
    retention_horizon: chrono::Duration,
}

impl Maintenance {
    pub fn new(
        store: Arc<dyn Store>,
        cleanup_interval: Duration,
        compact_interval: Duration,
        retention_horizon: Duration,
    ) -> Self {
        Self {
            store,
            cleanup_interval,
            compact_interval,
            retention_horizon: chrono::Duration::from_std(retention_horizon)
                .unwrap_or(chrono::Duration::zero()),
        }
    }

    pub async fn run(self, cancel: CancellationToken) {
        let mut cleanup_tick = tokio::time::interval(self.cleanup_interval);
        let mut compact_tick = tokio::time::interval(self.compact_interval);
        cleanup_tick.tick().await; // first tick fires immediately; skip it
        compact_tick.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("maintenance loop stopping");
                    return;
                }
                _ = cleanup_tick.tick() => self.run_cleanup().await,
                _ = compact_tick.tick() => self.run_compact().await,
            }
        }
    }

    async fn run_cleanup(&self) {
        let cutoff = chrono::Utc::now() - self.retention_horizon;
        match self.store.delete_history_older_than(cutoff).await {
            Ok(removed) => info!(removed, %cutoff, "history retention sweep complete"),
            Err(e) => error!(error = %e, "history retention sweep failed, next cycle retries"),
        }
    }

    async fn run_compact(&self) {
        match self.store.compact().await {
            Ok(()) => info!("store compaction complete"),
            Err(e) => error!(error = %e, "store compaction failed, next cycle retries"),
        }
    }
}
