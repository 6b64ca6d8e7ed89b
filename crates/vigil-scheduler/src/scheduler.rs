use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use vigil_domain::{ExitCode, Pair, StateIntervals};

use crate::queue::PriorityQueue;

/// Minimum next-run interval while a soft-fail is in progress, regardless of
/// how short the check's configured interval is.
pub const MIN_SOFT_FAIL_INTERVAL: Duration = Duration::from_secs(30);

/// Shared due-time queue plus the wake-up signal the dispatcher blocks on.
///
/// `enable`/`disable`/`reschedule` are called from the reconciler (on
/// config apply) and the worker pool (after every job); `Dispatcher::run`
/// drains whatever is due and wakes immediately whenever an earlier entry
/// is enabled while it's sleeping.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: PriorityQueue,
    notify: Notify,
}

impl Scheduler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn enable(&self, pair: Pair, due_at: DateTime<Utc>, interval: Duration) {
        self.queue.enable(pair, due_at, interval);
        self.notify.notify_one();
    }

    pub fn disable(&self, pair: &Pair) {
        self.queue.disable(pair);
    }

    pub fn reschedule(&self, pair: Pair, due_at: DateTime<Utc>, interval: Duration) {
        self.queue.reschedule(pair, due_at, interval);
        self.notify.notify_one();
    }

    pub fn contains(&self, pair: &Pair) -> bool {
        self.queue.contains(pair)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn queue(&self) -> &PriorityQueue {
        &self.queue
    }

    pub(crate) async fn notified(&self) {
        self.notify.notified().await;
    }
}

/// Computes the next `(due_at, interval)` for a pair after a result, per
/// §4.4's adaptive-interval policy: a third of the base interval (never below
/// 30s) while a soft-fail is in progress, otherwise the full base interval
/// for the reported state.
pub fn next_schedule(
    intervals: &StateIntervals,
    reported: ExitCode,
    soft_fail_in_progress: bool,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, Duration) {
    let base = intervals.get(reported);
    let interval = if soft_fail_in_progress {
        (base / 3).max(MIN_SOFT_FAIL_INTERVAL)
    } else {
        base
    };
    let due_at = now + chrono::Duration::from_std(interval).unwrap_or(chrono::Duration::zero());
    (due_at, interval)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intervals() -> StateIntervals {
        StateIntervals {
            ok: Duration::from_secs(60),
            warning: Duration::from_secs(30),
            critical: Duration::from_secs(30),
            unknown: Duration::from_secs(30),
        }
    }

    #[test]
    fn soft_fail_in_progress_shortens_interval_with_floor() {
        let (_, interval) = next_schedule(&intervals(), ExitCode::OK, true, Utc::now());
        assert_eq!(interval, MIN_SOFT_FAIL_INTERVAL);
    }

    #[test]
    fn confirmed_state_uses_full_base_interval() {
        let (_, interval) = next_schedule(&intervals(), ExitCode::CRITICAL, false, Utc::now());
        assert_eq!(interval, Duration::from_secs(30));
    }
}
