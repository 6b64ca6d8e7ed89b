use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use vigil_domain::{Check, CheckType, Host};

use crate::probe::{Probe, ProbeOutcome};

/// Dispatches a check to the [`Probe`] registered for its [`CheckType`].
///
/// Keyed by check type rather than by cloud target: there is exactly one
/// probe per type, always registered at startup.
pub struct ProbeRegistry {
    probes: HashMap<CheckType, Arc<dyn Probe>>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self { probes: HashMap::new() }
    }

    pub fn register(&mut self, probe: Arc<dyn Probe>) -> &mut Self {
        self.probes.insert(probe.check_type(), probe);
        self
    }

    /// Resolve and run the probe for `check.check_type`, timing the call.
    ///
    /// No probe registered for the type is itself a probe-internal failure
    /// (exit_code 3), not a panic — the registry is built once at startup with
    /// all four types registered, so this only fires under a wiring bug.
    pub async fn execute(&self, host: &Host, check: &Check) -> ProbeOutcome {
        let start = Instant::now();
        match self.probes.get(&check.check_type) {
            Some(probe) => probe.execute(host, check).await,
            None => ProbeOutcome::unknown(
                format!("no probe registered for check type '{}'", check.check_type),
                start.elapsed(),
            ),
        }
    }
}

impl Default for ProbeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
