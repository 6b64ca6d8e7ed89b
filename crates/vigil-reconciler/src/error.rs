use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("config error: {0}")]
    Config(#[from] vigil_config::ConfigError),

    #[error("graph validation error: {0}")]
    Graph(#[from] vigil_graph::GraphError),

    #[error("store error: {0}")]
    Store(#[from] vigil_store::StoreError),
}
