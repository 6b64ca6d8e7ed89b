use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

// ── Identifiers ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HostId(pub String);

impl HostId {
    pub fn new(s: impl Into<String>) -> Self {
        HostId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CheckId(pub String);

impl CheckId {
    pub fn new(s: impl Into<String>) -> Self {
        CheckId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CheckId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A (host, check) pair — the unit the scheduler and state tracker key on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pair {
    pub host_id: HostId,
    pub check_id: CheckId,
}

impl Pair {
    pub fn new(host_id: HostId, check_id: CheckId) -> Self {
        Self { host_id, check_id }
    }
}

impl std::fmt::Display for Pair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.host_id, self.check_id)
    }
}

// ── Check type ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckType {
    Ping,
    Tcp,
    Http,
    External,
}

impl std::fmt::Display for CheckType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckType::Ping => write!(f, "ping"),
            CheckType::Tcp => write!(f, "tcp"),
            CheckType::Http => write!(f, "http"),
            CheckType::External => write!(f, "external"),
        }
    }
}

// ── Exit code ─────────────────────────────────────────────────────────────────

/// Check result code: 0=ok, 1=warning, 2=critical, 3=unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExitCode(pub u8);

impl ExitCode {
    pub const OK: ExitCode = ExitCode(0);
    pub const WARNING: ExitCode = ExitCode(1);
    pub const CRITICAL: ExitCode = ExitCode(2);
    pub const UNKNOWN: ExitCode = ExitCode(3);

    pub fn is_ok(&self) -> bool {
        self.0 == 0
    }

    /// The interval-map key this code resolves to: "ok"|"warning"|"critical"|"unknown".
    pub fn state_name(&self) -> &'static str {
        match self.0 {
            0 => "ok",
            1 => "warning",
            2 => "critical",
            _ => "unknown",
        }
    }

    /// Clamp an arbitrary code (e.g. an external plugin's raw exit status) to
    /// the four known states; anything outside 0..=2 maps to unknown.
    pub fn from_raw(code: i32) -> ExitCode {
        match code {
            0 => ExitCode::OK,
            1 => ExitCode::WARNING,
            2 => ExitCode::CRITICAL,
            _ => ExitCode::UNKNOWN,
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Per-state interval map ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateIntervals {
    pub ok: Duration,
    pub warning: Duration,
    pub critical: Duration,
    pub unknown: Duration,
}

impl StateIntervals {
    pub fn get(&self, exit_code: ExitCode) -> Duration {
        match exit_code.state_name() {
            "ok" => self.ok,
            "warning" => self.warning,
            "critical" => self.critical,
            _ => self.unknown,
        }
    }

    /// All four durations are required to be positive.
    pub fn validate(&self, check_id: &str) -> Result<(), DomainError> {
        for (name, d) in [
            ("ok", self.ok),
            ("warning", self.warning),
            ("critical", self.critical),
            ("unknown", self.unknown),
        ] {
            if d.is_zero() {
                return Err(DomainError::NonPositiveInterval {
                    check: check_id.to_string(),
                    state: name.to_string(),
                });
            }
        }
        Ok(())
    }
}

// ── Host ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub id: HostId,
    pub name: String,
    pub display_name: Option<String>,
    pub ipv4: Option<std::net::Ipv4Addr>,
    pub hostname: Option<String>,
    pub group: String,
    pub enabled: bool,
    #[serde(default)]
    pub tags: HashMap<String, String>,
    /// Set by the store on first upsert; `None` for a freshly loaded,
    /// not-yet-reconciled config entry.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Host {
    /// A network-address-requiring probe (ping/tcp/http) needs at least one
    /// of ipv4 or hostname populated.
    pub fn has_network_address(&self) -> bool {
        self.ipv4.is_some() || self.hostname.is_some()
    }

    /// Address string used by network probes: prefers ipv4, falls back to hostname.
    pub fn address(&self) -> Option<String> {
        self.ipv4
            .map(|ip| ip.to_string())
            .or_else(|| self.hostname.clone())
    }
}

// ── Check ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub id: CheckId,
    pub name: String,
    #[serde(rename = "type")]
    pub check_type: CheckType,
    pub hosts: Vec<HostId>,
    pub intervals: StateIntervals,
    pub threshold: u32,
    pub timeout: Duration,
    pub enabled: bool,
    #[serde(default)]
    pub options: HashMap<String, String>,
    /// Overrides `monitoring.soft_fail_enabled` for this check when set.
    pub soft_fail_enabled: Option<bool>,
}

impl Check {
    /// threshold=1 disables soft-fail entirely: every non-ok result alerts immediately.
    pub fn soft_fail_possible(&self) -> bool {
        self.threshold > 1
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }
}

// ── Status ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub host_id: HostId,
    pub check_id: CheckId,
    pub exit_code: ExitCode,
    pub output: String,
    pub long_output: Option<String>,
    pub perf_data: Option<String>,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub host_id: HostId,
    pub check_id: CheckId,
    pub exit_code: ExitCode,
    pub output: String,
    pub long_output: Option<String>,
    pub perf_data: Option<String>,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl From<Status> for HistoryEntry {
    fn from(s: Status) -> Self {
        HistoryEntry {
            host_id: s.host_id,
            check_id: s.check_id,
            exit_code: s.exit_code,
            output: s.output,
            long_output: s.long_output,
            perf_data: s.perf_data,
            duration_ms: s.duration_ms,
            timestamp: s.timestamp,
        }
    }
}

// ── State change event ───────────────────────────────────────────────────────

/// Emitted by the state tracker whenever a reported exit code transitions,
/// or a realert interval fires for an unresolved non-OK pair. The unit the
/// notification engine consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub pair: Pair,
    pub previous: ExitCode,
    pub current: ExitCode,
    pub output: String,
    pub soft_fail: bool,
    pub is_realert: bool,
    pub at: DateTime<Utc>,
}

// ── Soft-fail state ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftFailState {
    pub reported_state: ExitCode,
    pub pending_state: ExitCode,
    pub consecutive_non_ok_count: u32,
    pub first_non_ok_at: Option<DateTime<Utc>>,
}

impl Default for SoftFailState {
    fn default() -> Self {
        Self {
            reported_state: ExitCode::OK,
            pending_state: ExitCode::OK,
            consecutive_non_ok_count: 0,
            first_non_ok_at: None,
        }
    }
}

// ── Sent-alert record ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentAlertRecord {
    pub severity: ExitCode,
    pub first_sent: DateTime<Utc>,
    pub last_sent: DateTime<Utc>,
    pub send_count: u32,
    pub resolved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_state_name_maps_known_codes() {
        assert_eq!(ExitCode::OK.state_name(), "ok");
        assert_eq!(ExitCode::WARNING.state_name(), "warning");
        assert_eq!(ExitCode::CRITICAL.state_name(), "critical");
        assert_eq!(ExitCode::UNKNOWN.state_name(), "unknown");
    }

    #[test]
    fn exit_code_from_raw_clamps_unknown() {
        assert_eq!(ExitCode::from_raw(7), ExitCode::UNKNOWN);
        assert_eq!(ExitCode::from_raw(-1), ExitCode::UNKNOWN);
        assert_eq!(ExitCode::from_raw(2), ExitCode::CRITICAL);
    }

    #[test]
    fn state_intervals_rejects_zero_duration() {
        let intervals = StateIntervals {
            ok: Duration::from_secs(60),
            warning: Duration::from_secs(0),
            critical: Duration::from_secs(30),
            unknown: Duration::from_secs(30),
        };
        assert!(intervals.validate("c1").is_err());
    }

    #[test]
    fn host_requires_ipv4_or_hostname_for_network_address() {
        let host = Host {
            id: HostId::new("h1"),
            name: "h1".into(),
            display_name: None,
            ipv4: None,
            hostname: None,
            group: "default".into(),
            enabled: true,
            tags: HashMap::new(),
            created_at: None,
            updated_at: None,
        };
        assert!(!host.has_network_address());
    }
}
