use thiserror::Error;

/// Internal probe failures. None of these ever propagate to the worker pool's
/// caller — every [`Probe::execute`](crate::probe::Probe::execute) collapses
/// its own failures into an `ExitCode::UNKNOWN` outcome.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("dns/resolver error: {0}")]
    Resolver(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("missing required option '{0}'")]
    MissingOption(String),
}
