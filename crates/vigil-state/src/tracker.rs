use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use vigil_domain::{ExitCode, Pair, SoftFailState};

use crate::result::TrackedResult;

/// Per-pair soft-fail state machine.
///
/// One `Tracker` is shared across the worker pool; `record` is the only
/// mutating entry point and is safe to call concurrently for distinct pairs.
/// State for a pair is plain in-memory — it is rebuilt from scratch (all
/// pairs starting `reported_state == 0`) on every process restart, since
/// §3's invariant only constrains it while held, not its durability.
#[derive(Debug, Default)]
pub struct Tracker {
    states: RwLock<HashMap<Pair, SoftFailState>>,
}

impl Tracker {
    pub fn new() -> Self {
        Self { states: RwLock::new(HashMap::new()) }
    }

    /// Fold one raw probe result into the pair's soft-fail state and return
    /// the reported outcome.
    ///
    /// `soft_fail_enabled` and `threshold` are the effective, already-resolved
    /// settings for this pair (check override, threshold > 1 required for
    /// suppression to apply).
    pub fn record(
        &self,
        pair: Pair,
        raw: ExitCode,
        soft_fail_enabled: bool,
        threshold: u32,
        now: DateTime<Utc>,
    ) -> TrackedResult {
        let mut states = self.states.write().expect("soft-fail state lock poisoned");
        let state = states.entry(pair.clone()).or_default();
        let old_reported = state.reported_state;

        state.pending_state = raw;

        if raw.is_ok() {
            state.reported_state = ExitCode::OK;
            state.consecutive_non_ok_count = 0;
            state.first_non_ok_at = None;

            return TrackedResult {
                pair,
                raw,
                previous: old_reported,
                reported: ExitCode::OK,
                soft_fail: false,
                consecutive_non_ok_count: 0,
                threshold,
                changed: old_reported != ExitCode::OK,
            };
        }

        state.consecutive_non_ok_count += 1;
        if state.first_non_ok_at.is_none() {
            state.first_non_ok_at = Some(now);
        }

        if soft_fail_enabled && threshold > 1 && state.consecutive_non_ok_count < threshold {
            state.reported_state = old_reported;
            TrackedResult {
                pair,
                raw,
                previous: old_reported,
                reported: old_reported,
                soft_fail: true,
                consecutive_non_ok_count: state.consecutive_non_ok_count,
                threshold,
                changed: false,
            }
        } else {
            state.reported_state = raw;
            TrackedResult {
                pair,
                raw,
                previous: old_reported,
                reported: raw,
                soft_fail: false,
                consecutive_non_ok_count: state.consecutive_non_ok_count,
                threshold,
                changed: old_reported != raw,
            }
        }
    }

    pub fn get(&self, pair: &Pair) -> Option<SoftFailState> {
        self.states.read().expect("soft-fail state lock poisoned").get(pair).cloned()
    }

    /// Drop state for pairs no longer in the valid (host,check) set — called
    /// by the reconciler alongside its store-side orphan purge.
    pub fn retain(&self, mut keep: impl FnMut(&Pair) -> bool) {
        self.states.write().expect("soft-fail state lock poisoned").retain(|pair, _| keep(pair));
    }

    pub fn len(&self) -> usize {
        self.states.read().expect("soft-fail state lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pair() -> Pair {
        Pair::new(vigil_domain::HostId::new("h1"), vigil_domain::CheckId::new("c1"))
    }

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn soft_fail_suppresses_until_threshold() {
        let tracker = Tracker::new();
        let p = pair();

        let r1 = tracker.record(p.clone(), ExitCode::CRITICAL, true, 3, t(0));
        assert!(r1.soft_fail);
        assert_eq!(r1.reported, ExitCode::OK);
        assert_eq!(r1.consecutive_non_ok_count, 1);

        let r2 = tracker.record(p.clone(), ExitCode::CRITICAL, true, 3, t(30));
        assert!(r2.soft_fail);
        assert_eq!(r2.reported, ExitCode::OK);

        let r3 = tracker.record(p.clone(), ExitCode::CRITICAL, true, 3, t(60));
        assert!(!r3.soft_fail);
        assert_eq!(r3.reported, ExitCode::CRITICAL);
        assert!(r3.changed);
    }

    #[test]
    fn recovery_is_immediate_no_hysteresis() {
        let tracker = Tracker::new();
        let p = pair();

        tracker.record(p.clone(), ExitCode::CRITICAL, true, 3, t(0));
        tracker.record(p.clone(), ExitCode::CRITICAL, true, 3, t(30));

        let recovered = tracker.record(p.clone(), ExitCode::OK, true, 3, t(60));
        assert!(!recovered.soft_fail);
        assert_eq!(recovered.reported, ExitCode::OK);
        assert_eq!(recovered.consecutive_non_ok_count, 0);

        let state = tracker.get(&p).unwrap();
        assert_eq!(state.reported_state, ExitCode::OK);
        assert_eq!(state.consecutive_non_ok_count, 0);
    }

    #[test]
    fn threshold_one_disables_soft_fail() {
        let tracker = Tracker::new();
        let p = pair();

        let r1 = tracker.record(p.clone(), ExitCode::CRITICAL, true, 1, t(0));
        assert!(!r1.soft_fail);
        assert_eq!(r1.reported, ExitCode::CRITICAL);
    }

    #[test]
    fn soft_fail_disabled_reports_immediately_even_below_threshold() {
        let tracker = Tracker::new();
        let p = pair();

        let r1 = tracker.record(p.clone(), ExitCode::CRITICAL, false, 3, t(0));
        assert!(!r1.soft_fail);
        assert_eq!(r1.reported, ExitCode::CRITICAL);
    }

    #[test]
    fn retain_drops_orphaned_pairs() {
        let tracker = Tracker::new();
        let p = pair();
        tracker.record(p.clone(), ExitCode::CRITICAL, true, 3, t(0));
        assert_eq!(tracker.len(), 1);

        tracker.retain(|_| false);
        assert!(tracker.is_empty());
    }
}
