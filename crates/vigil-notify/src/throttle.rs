use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use vigil_domain::{HostId, ThrottleConfig};

/// Caps the rate of alerts that actually go out, applied as a filter *after*
/// the realert engine has already decided a notification should fire — it
/// never influences whether a pair is considered alerting, only whether this
/// particular send is allowed through right now.
///
/// Tracks a sliding window of send timestamps per host and globally; a send
/// is allowed only if both the host's count and the global count within
/// `window` are still under their caps.
#[derive(Debug, Default)]
pub struct Throttle {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    per_host: HashMap<HostId, VecDeque<DateTime<Utc>>>,
    global: VecDeque<DateTime<Utc>>,
}

impl Throttle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a send for `host_id` at `now` is allowed under
    /// `config`, and records it as sent if so. A missing `config` means
    /// throttling is disabled and every call is allowed.
    pub fn allow(&self, config: Option<&ThrottleConfig>, host_id: &HostId, now: DateTime<Utc>) -> bool {
        let Some(config) = config else { return true };
        let mut inner = self.inner.lock().expect("throttle lock poisoned");

        let cutoff = now - chrono::Duration::from_std(config.window).unwrap_or(chrono::Duration::zero());
        inner.global.retain(|t| *t > cutoff);
        let host_window = inner.per_host.entry(host_id.clone()).or_default();
        host_window.retain(|t| *t > cutoff);

        if inner.global.len() as u32 >= config.global_cap || host_window.len() as u32 >= config.per_host_cap {
            return false;
        }

        inner.global.push_back(now);
        inner.per_host.entry(host_id.clone()).or_default().push_back(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(per_host_cap: u32, global_cap: u32) -> ThrottleConfig {
        ThrottleConfig { window: Duration::from_secs(3600), per_host_cap, global_cap }
    }

    #[test]
    fn allows_sends_under_the_cap() {
        let throttle = Throttle::new();
        let host = HostId::new("h1");
        let now = Utc::now();
        let cfg = config(2, 10);

        assert!(throttle.allow(Some(&cfg), &host, now));
        assert!(throttle.allow(Some(&cfg), &host, now));
        assert!(!throttle.allow(Some(&cfg), &host, now));
    }

    #[test]
    fn global_cap_applies_across_hosts() {
        let throttle = Throttle::new();
        let now = Utc::now();
        let cfg = config(10, 1);

        assert!(throttle.allow(Some(&cfg), &HostId::new("h1"), now));
        assert!(!throttle.allow(Some(&cfg), &HostId::new("h2"), now));
    }

    #[test]
    fn no_config_means_unthrottled() {
        let throttle = Throttle::new();
        let host = HostId::new("h1");
        let now = Utc::now();
        for _ in 0..50 {
            assert!(throttle.allow(None, &host, now));
        }
    }
}
