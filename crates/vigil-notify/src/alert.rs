use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use vigil_domain::{ExitCode, Pair, SentAlertRecord};

use crate::effective::ResolvedSettings;

/// What a transition or realert tick decided should go out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Problem,
    Realert,
    Recovery,
}

/// The sent-alert bookkeeping map, keyed by pair, guarded by its own lock
/// independent of the soft-fail tracker's.
///
/// Two entry points drive it: [`AlertBook::on_transition`] fires on a
/// reported-state change (problem start, severity change, or recovery);
/// [`AlertBook::maybe_realert`] is polled on a timer for pairs that remain
/// unresolved between transitions.
#[derive(Debug, Default)]
pub struct AlertBook {
    records: Mutex<HashMap<Pair, SentAlertRecord>>,
}

impl AlertBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pair: &Pair) -> Option<SentAlertRecord> {
        self.records.lock().expect("alert book lock poisoned").get(pair).cloned()
    }

    pub fn retain(&self, mut keep: impl FnMut(&Pair) -> bool) {
        self.records.lock().expect("alert book lock poisoned").retain(|pair, _| keep(pair));
    }

    /// Pairs with an open, unresolved alert — what the realert timer polls.
    pub fn unresolved_pairs(&self) -> Vec<Pair> {
        self.records
            .lock()
            .expect("alert book lock poisoned")
            .iter()
            .filter(|(_, record)| !record.resolved)
            .map(|(pair, _)| pair.clone())
            .collect()
    }

    /// Called once per reported-state transition. `previous`/`current` must
    /// differ — the caller (the worker pool's `StateChange`) only emits on
    /// an actual change.
    pub fn on_transition(
        &self,
        pair: &Pair,
        current: ExitCode,
        settings: &ResolvedSettings,
        now: DateTime<Utc>,
    ) -> Option<Notification> {
        let mut records = self.records.lock().expect("alert book lock poisoned");

        if current.is_ok() {
            let record = records.get_mut(pair)?;
            if record.resolved {
                return None;
            }
            record.resolved = true;
            return settings.send_recovery.then_some(Notification::Recovery);
        }

        match records.get_mut(pair) {
            Some(record) if !record.resolved => {
                record.severity = current;
                if !settings.enabled {
                    return None;
                }
                let elapsed = now.signed_duration_since(record.last_sent);
                let interval = chrono::Duration::from_std(settings.realert_interval).ok()?;
                if elapsed < interval {
                    return None;
                }
                if settings.max_realerts != 0 && record.send_count >= settings.max_realerts {
                    return None;
                }
                record.last_sent = now;
                record.send_count += 1;
                Some(Notification::Problem)
            }
            _ => {
                records.insert(
                    pair.clone(),
                    SentAlertRecord {
                        severity: current,
                        first_sent: now,
                        last_sent: now,
                        send_count: 1,
                        resolved: false,
                    },
                );
                settings.enabled.then_some(Notification::Problem)
            }
        }
    }

    /// Polled for every still-open alert on a timer. Returns `Some(Realert)`
    /// if `settings.realert_interval` has elapsed since the last send and the
    /// realert cap (0 = unlimited) hasn't been hit yet.
    pub fn maybe_realert(
        &self,
        pair: &Pair,
        settings: &ResolvedSettings,
        now: DateTime<Utc>,
    ) -> Option<Notification> {
        if !settings.enabled {
            return None;
        }
        let mut records = self.records.lock().expect("alert book lock poisoned");
        let record = records.get_mut(pair)?;
        if record.resolved {
            return None;
        }

        let elapsed = now.signed_duration_since(record.last_sent);
        let interval = chrono::Duration::from_std(settings.realert_interval).ok()?;
        if elapsed < interval {
            return None;
        }
        if settings.max_realerts != 0 && record.send_count >= settings.max_realerts {
            return None;
        }

        record.send_count += 1;
        record.last_sent = now;
        Some(Notification::Realert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;
    use vigil_domain::{CheckId, HostId};

    fn pair() -> Pair {
        Pair::new(HostId::new("h1"), CheckId::new("c1"))
    }

    fn t(hours: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap() + chrono::Duration::hours(hours)
    }

    fn settings() -> ResolvedSettings {
        ResolvedSettings {
            enabled: true,
            realert_interval: Duration::from_secs(3600),
            max_realerts: 3,
            send_recovery: true,
            quiet_hours: None,
        }
    }

    /// Scenario 5: realert_interval=1h, max_realerts=3, send_recovery=true.
    #[test]
    fn realert_and_recovery_sequence() {
        let book = AlertBook::new();
        let p = pair();
        let s = settings();

        let problem = book.on_transition(&p, ExitCode::CRITICAL, &s, t(0));
        assert_eq!(problem, Some(Notification::Problem));

        assert_eq!(book.maybe_realert(&p, &s, t(0) + chrono::Duration::minutes(30)), None);

        let realert1 = book.maybe_realert(&p, &s, t(1));
        assert_eq!(realert1, Some(Notification::Realert));

        let realert2 = book.maybe_realert(&p, &s, t(2));
        assert_eq!(realert2, Some(Notification::Realert));

        let capped = book.maybe_realert(&p, &s, t(3));
        assert_eq!(capped, None, "cap of 3 total sends already reached");

        let recovery = book.on_transition(&p, ExitCode::OK, &s, t(3) + chrono::Duration::minutes(30));
        assert_eq!(recovery, Some(Notification::Recovery));

        let record = book.get(&p).unwrap();
        assert!(record.resolved);
        assert_eq!(record.send_count, 3);
    }

    /// A severity change while an alert is already open is still a "problem
    /// delivery" for realert-interval purposes — it must not bypass the
    /// interval just because the severity, not just the clock, changed.
    #[test]
    fn flapping_severity_within_realert_window_sends_only_once() {
        let book = AlertBook::new();
        let p = pair();
        let s = settings(); // realert_interval=1h, max_realerts=3

        let first = book.on_transition(&p, ExitCode::CRITICAL, &s, t(0));
        assert_eq!(first, Some(Notification::Problem));

        // WARNING, 20 minutes later: severity changed but well inside the window.
        let flap_down = book.on_transition(&p, ExitCode::WARNING, &s, t(0) + chrono::Duration::minutes(20));
        assert_eq!(flap_down, None, "severity change inside the realert window must not send");

        // CRITICAL again, 40 minutes later (still < 1h since the first send).
        let flap_up = book.on_transition(&p, ExitCode::CRITICAL, &s, t(0) + chrono::Duration::minutes(40));
        assert_eq!(flap_up, None, "still inside the realert window");

        let record = book.get(&p).unwrap();
        assert_eq!(record.send_count, 1, "only the initial problem counted as a send");
        assert_eq!(record.severity, ExitCode::CRITICAL, "severity tracks the latest report even when suppressed");

        // Past the interval, a further severity change sends again.
        let after_window = book.on_transition(&p, ExitCode::WARNING, &s, t(1) + chrono::Duration::minutes(1));
        assert_eq!(after_window, Some(Notification::Problem));
        assert_eq!(book.get(&p).unwrap().send_count, 2);
    }

    #[test]
    fn disabled_settings_suppress_problem_and_realert() {
        let book = AlertBook::new();
        let p = pair();
        let mut s = settings();
        s.enabled = false;

        assert_eq!(book.on_transition(&p, ExitCode::CRITICAL, &s, t(0)), None);
        assert_eq!(book.maybe_realert(&p, &s, t(1)), None);
    }

    #[test]
    fn recovery_without_send_recovery_flag_still_resolves_silently() {
        let book = AlertBook::new();
        let p = pair();
        let mut s = settings();
        s.send_recovery = false;

        book.on_transition(&p, ExitCode::CRITICAL, &s, t(0));
        let recovery = book.on_transition(&p, ExitCode::OK, &s, t(1));
        assert_eq!(recovery, None);
        assert!(book.get(&p).unwrap().resolved);
    }
}
