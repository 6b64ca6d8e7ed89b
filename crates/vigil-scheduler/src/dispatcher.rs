use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::job::Job;
use crate::scheduler::Scheduler;

/// Upper bound on how long the dispatcher sleeps with nothing scheduled —
/// keeps it responsive to a freshly `enable`d pair even if the `Notify` wake
/// were somehow missed.
const IDLE_POLL: Duration = Duration::from_secs(3600);

/// Waits on the earliest due entry and pushes ready jobs onto `tx`.
///
/// Exits promptly when `cancel` fires or `tx` is closed, per the "must return
/// within 100ms" cancellation requirement — the only blocking point is the
/// bounded `tx.send`, which is itself raced against `cancel`.
pub async fn run(scheduler: Arc<Scheduler>, tx: mpsc::Sender<Job>, cancel: CancellationToken) {
    loop {
        let now = Utc::now();
        let ready = scheduler.queue().drain_ready(now);

        for entry in ready {
            let lag = now.signed_duration_since(entry.due_at);
            if lag.to_std().map(|l| l > entry.interval).unwrap_or(false) {
                warn!(
                    host_id = %entry.pair.host_id,
                    check_id = %entry.pair.check_id,
                    lag_ms = lag.num_milliseconds(),
                    "check dispatch is more than one interval late"
                );
            }

            let job = Job { pair: entry.pair };
            tokio::select! {
                _ = cancel.cancelled() => return,
                send_result = tx.send(job) => {
                    if send_result.is_err() {
                        return;
                    }
                }
            }
        }

        let wait = match scheduler.queue().next_due_at() {
            Some(due_at) => (due_at - Utc::now()).to_std().unwrap_or(Duration::ZERO),
            None => IDLE_POLL,
        };

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(wait) => {},
            _ = scheduler.notified() => {},
        }
    }
}
