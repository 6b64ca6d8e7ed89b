use thiserror::Error;
use vigil_domain::{CheckId, HostId};

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("check '{check}' references unknown host '{host}'")]
    DanglingHostReference { check: CheckId, host: HostId },

    #[error("multiple errors")]
    Multiple(Vec<GraphError>),
}
