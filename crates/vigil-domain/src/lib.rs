pub mod config;
pub mod error;
pub mod types;

pub use config::{
    Configuration, DatabaseConfig, IncludeConfig, LoggingConfig, MonitoringConfig,
    NotificationConfig, NotificationRule, NotificationSettings, PrometheusConfig,
    PushTransportConfig, ServerConfig, ThrottleConfig, WebConfig,
};
pub use error::DomainError;
pub use types::{
    Check, CheckId, CheckType, ExitCode, HistoryEntry, Host, HostId, Pair, SentAlertRecord,
    SoftFailState, StateChange, StateIntervals, Status,
};
