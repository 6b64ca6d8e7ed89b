use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("host not found: {0}")]
    HostNotFound(String),

    #[error("check not found: {0}")]
    CheckNotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal store error: {0}")]
    Internal(String),
}
