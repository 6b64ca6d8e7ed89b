use std::fmt;

/// Maps a failure to the process exit code that reports its category to
/// whatever invoked the binary: 1 for a bad configuration, 2 for anything
/// else that goes wrong during startup, 3 for a store failure.
pub enum CliError {
    Config(vigil_config::ConfigError),
    Graph(vigil_graph::GraphError),
    Store(vigil_store::StoreError),
    Other(anyhow::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::Graph(_) => 1,
            CliError::Store(_) => 3,
            CliError::Other(_) => 2,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "configuration error: {e}"),
            CliError::Graph(e) => write!(f, "host/check graph error: {e}"),
            CliError::Store(e) => write!(f, "store error: {e}"),
            CliError::Other(e) => write!(f, "{e}"),
        }
    }
}

impl From<vigil_config::ConfigError> for CliError {
    fn from(e: vigil_config::ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<vigil_graph::GraphError> for CliError {
    fn from(e: vigil_graph::GraphError) -> Self {
        CliError::Graph(e)
    }
}

impl From<vigil_store::StoreError> for CliError {
    fn from(e: vigil_store::StoreError) -> Self {
        CliError::Store(e)
    }
}

impl From<vigil_reconciler::ReconcileError> for CliError {
    fn from(e: vigil_reconciler::ReconcileError) -> Self {
        match e {
            vigil_reconciler::ReconcileError::Graph(g) => CliError::Graph(g),
            vigil_reconciler::ReconcileError::Store(s) => CliError::Store(s),
            vigil_reconciler::ReconcileError::Config(c) => CliError::Config(c),
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(e: anyhow::Error) -> Self {
        CliError::Other(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Other(e.into())
    }
}
