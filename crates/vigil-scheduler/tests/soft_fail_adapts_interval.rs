use std::time::Duration;

use chrono::Utc;
use vigil_domain::{CheckId, ExitCode, HostId, Pair, StateIntervals};
use vigil_scheduler::next_schedule;
use vigil_state::Tracker;

/// Scenario 6: interval.ok=5m, threshold=3. After the first CRIT at t=0,
/// next_due must land at or before t=100s (5m/3), not at t=5m.
#[test]
fn first_failure_shortens_the_next_due_time() {
    let tracker = Tracker::new();
    let pair = Pair::new(HostId::new("h1"), CheckId::new("c1"));
    let intervals = StateIntervals {
        ok: Duration::from_secs(300),
        warning: Duration::from_secs(300),
        critical: Duration::from_secs(300),
        unknown: Duration::from_secs(300),
    };
    let now = Utc::now();

    let tracked = tracker.record(pair, ExitCode::CRITICAL, true, 3, now);
    assert!(tracked.soft_fail, "first of three failures should still be suppressed");
    assert_eq!(tracked.reported, ExitCode::OK);

    let (due_at, interval) = next_schedule(&intervals, tracked.reported, tracked.soft_fail, now);

    assert!(interval <= Duration::from_secs(100), "interval was {interval:?}");
    assert!(due_at <= now + chrono::Duration::seconds(100));
}
