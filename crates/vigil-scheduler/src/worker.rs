use std::sync::{Arc, RwLock};

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};
use vigil_domain::{MonitoringConfig, StateChange, Status};
use vigil_probe::ProbeRegistry;
use vigil_state::Tracker;
use vigil_store::Store;

use crate::job::Job;
use crate::scheduler::{next_schedule, Scheduler};

/// Everything a worker needs to turn a [`Job`] into a persisted [`Status`]
/// and, on a reported-state transition, a [`StateChange`].
pub struct WorkerContext {
    pub store: Arc<dyn Store>,
    pub probes: Arc<ProbeRegistry>,
    pub tracker: Arc<Tracker>,
    pub scheduler: Arc<Scheduler>,
    pub monitoring: Arc<RwLock<MonitoringConfig>>,
    pub state_changes: mpsc::Sender<StateChange>,
}

/// Spawns `worker_count` tasks consuming `rx`, sharing `ctx`.
///
/// Returns the join handles so the caller can await clean shutdown; workers
/// exit as soon as `rx` is closed and drained, which happens when the
/// dispatcher stops sending and drops its `tx`.
pub fn spawn(
    worker_count: usize,
    rx: mpsc::Receiver<Job>,
    ctx: Arc<WorkerContext>,
) -> Vec<tokio::task::JoinHandle<()>> {
    let rx = Arc::new(tokio::sync::Mutex::new(rx));
    (0..worker_count.max(1))
        .map(|id| {
            let rx = rx.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move { worker_loop(id, rx, ctx).await })
        })
        .collect()
}

async fn worker_loop(id: usize, rx: Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>, ctx: Arc<WorkerContext>) {
    loop {
        let job = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        let Some(job) = job else {
            debug!(worker = id, "worker channel closed, exiting");
            return;
        };
        run_job(&ctx, job).await;
    }
}

async fn run_job(ctx: &WorkerContext, job: Job) {
    let pair = job.pair;

    let host = match ctx.store.get_host(&pair.host_id).await {
        Ok(Some(host)) if host.enabled => host,
        Ok(_) => return, // disabled or deleted since the job was enqueued
        Err(e) => {
            error!(host_id = %pair.host_id, error = %e, "failed to load host for scheduled job");
            return;
        }
    };
    let check = match ctx.store.get_check(&pair.check_id).await {
        Ok(Some(check)) if check.enabled => check,
        Ok(_) => return,
        Err(e) => {
            error!(check_id = %pair.check_id, error = %e, "failed to load check for scheduled job");
            return;
        }
    };

    let outcome = ctx.probes.execute(&host, &check).await;
    let now = Utc::now();

    let soft_fail_enabled =
        check.soft_fail_enabled.unwrap_or_else(|| ctx.monitoring.read().expect("monitoring config lock poisoned").soft_fail_enabled);

    let tracked = ctx.tracker.record(pair.clone(), outcome.exit_code, soft_fail_enabled, check.threshold, now);

    let (output, long_output) = if tracked.soft_fail {
        let prefix = tracked.output_prefix().unwrap_or_default();
        let annotation = format!(
            "suppressed: {} of {} consecutive non-ok results",
            tracked.consecutive_non_ok_count, tracked.threshold
        );
        let long_output = match outcome.long_output {
            Some(lo) => Some(format!("{lo}\n{annotation}")),
            None => Some(annotation),
        };
        (format!("{prefix}{}", outcome.output), long_output)
    } else {
        (outcome.output.clone(), outcome.long_output.clone())
    };

    let status = Status {
        host_id: pair.host_id.clone(),
        check_id: pair.check_id.clone(),
        exit_code: tracked.reported,
        output,
        long_output,
        perf_data: outcome.perf_data,
        duration_ms: outcome.duration.as_millis() as u64,
        timestamp: now,
    };

    if let Err(e) = ctx.store.upsert_status(&status).await {
        error!(pair = %pair, error = %e, "failed to persist status");
    }
    let history_entry: vigil_domain::HistoryEntry = status.clone().into();
    if let Err(e) = ctx.store.append_history(&history_entry).await {
        error!(pair = %pair, error = %e, "failed to append history");
    }

    if tracked.changed {
        let change = StateChange {
            pair: pair.clone(),
            previous: tracked.previous,
            current: tracked.reported,
            output: status.output.clone(),
            soft_fail: tracked.soft_fail,
            is_realert: false,
            at: now,
        };
        if ctx.state_changes.send(change).await.is_err() {
            warn!(pair = %pair, "state-change channel closed, dropping transition event");
        }
    }

    let (due_at, interval) = next_schedule(&check.intervals, tracked.reported, tracked.soft_fail, now);
    ctx.scheduler.reschedule(pair, due_at, interval);
}
