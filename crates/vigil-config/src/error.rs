use thiserror::Error;

/// All variants are fatal at startup, surfaced with file+location where
/// available.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("yaml parse error in {path}: {source}")]
    YamlParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("conversion error in {path}: {message}")]
    Conversion { path: String, message: String },

    #[error("include directory '{0}' does not exist")]
    MissingIncludeDirectory(String),

    #[error("include pattern '{0}' must not contain path separators")]
    UnsafeIncludePattern(String),

    #[error("duplicate host id '{0}' across config files")]
    DuplicateHost(String),

    #[error("full check '{0}' defined more than once across config files")]
    DuplicateFullCheck(String),

    #[error("partial check entry for unknown id '{0}'")]
    UnknownPartialCheck(String),

    #[error("domain error: {0}")]
    Domain(#[from] vigil_domain::DomainError),
}
