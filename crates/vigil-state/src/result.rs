use vigil_domain::{ExitCode, Pair};

/// What the state tracker hands to the scheduler and notification engine after
/// folding in one raw probe result.
///
/// `reported` is the exit code that gets persisted and notified on; during
/// soft-fail suppression it lags behind the raw result until the failure is
/// confirmed or recovers.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedResult {
    pub pair: Pair,
    pub raw: ExitCode,
    pub previous: ExitCode,
    pub reported: ExitCode,
    pub soft_fail: bool,
    pub consecutive_non_ok_count: u32,
    pub threshold: u32,
    pub changed: bool,
}

impl TrackedResult {
    /// Output prefix applied while a result is suppressed under soft-fail, per
    /// the "SOFT FAIL (count/threshold) - " convention.
    pub fn output_prefix(&self) -> Option<String> {
        self.soft_fail
            .then(|| format!("SOFT FAIL ({}/{}) - ", self.consecutive_non_ok_count, self.threshold))
    }
}
