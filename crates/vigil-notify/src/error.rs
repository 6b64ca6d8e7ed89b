use thiserror::Error;

/// Notification transport and rule-matching failures.
///
/// Transport errors never abort a pending alert outright — see
/// [`crate::engine::NotificationEngine::on_state_change`] for the retry
/// semantics. `InvalidPattern` is a configuration-time concern the rule
/// resolver surfaces eagerly rather than silently skipping the rule.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid host/check pattern '{0}': {1}")]
    InvalidPattern(String, regex::Error),

    #[error("push transport not configured (no webhook url)")]
    NotConfigured,

    #[error("push transport request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("push transport returned status {0}")]
    TransportStatus(reqwest::StatusCode),
}
