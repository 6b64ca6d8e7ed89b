use thiserror::Error;

/// Domain-level validation errors.
///
/// Corresponds to "Configuration error" category when raised
/// during config conversion; the reconciler maps these to fatal startup
/// errors or logged warnings depending on when they occur.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid host id: {0}")]
    InvalidHostId(String),

    #[error("invalid check id: {0}")]
    InvalidCheckId(String),

    #[error("duplicate host id: {0}")]
    DuplicateHostId(String),

    #[error("duplicate check id: {0}")]
    DuplicateCheckId(String),

    #[error("check '{check}' references unknown host '{host}'")]
    UnknownHostReference { check: String, host: String },

    #[error("check '{check}' has non-positive interval for state '{state}'")]
    NonPositiveInterval { check: String, state: String },

    #[error("check '{check}' has threshold {threshold} (must be >= 1)")]
    InvalidThreshold { check: String, threshold: i64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
