use std::time::Duration;

use async_trait::async_trait;
use vigil_domain::{Check, CheckType, ExitCode, Host};

/// Outcome of one probe execution — the raw material for a [`vigil_domain::Status`].
///
/// Never an `Err`: a probe that cannot reach its target, resolve a name, or
/// otherwise fails internally reports that as `ExitCode::UNKNOWN` with a
/// human-readable `output`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub exit_code: ExitCode,
    pub output: String,
    pub long_output: Option<String>,
    pub perf_data: Option<String>,
    pub duration: Duration,
}

impl ProbeOutcome {
    pub fn unknown(message: impl Into<String>, duration: Duration) -> Self {
        Self {
            exit_code: ExitCode::UNKNOWN,
            output: message.into(),
            long_output: None,
            perf_data: None,
            duration,
        }
    }
}

/// A typed check probe. One implementation per [`CheckType`], dispatched by
/// [`crate::registry::ProbeRegistry`].
#[async_trait]
pub trait Probe: Send + Sync + 'static {
    fn check_type(&self) -> CheckType;

    /// Execute against `host` using `check`'s options and timeout. Implementations
    /// must bound their own work to `check.timeout` and never panic.
    async fn execute(&self, host: &Host, check: &Check) -> ProbeOutcome;
}
