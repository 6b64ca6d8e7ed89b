use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{Check, Host};

/// The full, validated configuration snapshot.
///
/// Built once by `vigil-config` and then handed around as `Arc<Configuration>`.
/// Never mutated in place — a reload produces a brand new snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub server: ServerConfig,
    pub web: WebConfig,
    pub database: DatabaseConfig,
    pub prometheus: PrometheusConfig,
    pub monitoring: MonitoringConfig,
    pub notification: NotificationConfig,
    pub logging: LoggingConfig,
    pub include: IncludeConfig,
    pub hosts: Vec<Host>,
    pub checks: Vec<Check>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "0.0.0.0".into(), port: 8080 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WebConfig {
    pub enabled: bool,
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: PathBuf::from("vigil.redb") }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PrometheusConfig {
    pub enabled: bool,
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub workers: usize,
    pub soft_fail_enabled: bool,
    pub cleanup_interval: Duration,
    pub compact_interval: Duration,
    pub retention_horizon: Duration,
    pub purge_on_startup: bool,
    pub purge_on_reload: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            soft_fail_enabled: true,
            cleanup_interval: Duration::from_secs(6 * 3600),
            compact_interval: Duration::from_secs(7 * 24 * 3600),
            retention_horizon: Duration::from_secs(30 * 24 * 3600),
            purge_on_startup: false,
            purge_on_reload: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NotificationConfig {
    pub defaults: NotificationSettings,
    #[serde(default)]
    pub rules: Vec<NotificationRule>,
    #[serde(default)]
    pub host_overrides: HashMap<String, NotificationSettings>,
    #[serde(default)]
    pub check_overrides: HashMap<String, NotificationSettings>,
    #[serde(default)]
    pub throttle: Option<ThrottleConfig>,
    pub title_template: Option<String>,
    pub body_template: Option<String>,
    #[serde(default)]
    pub transport: PushTransportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NotificationRule {
    pub name: String,
    pub host_pattern: Option<String>,
    pub check_pattern: Option<String>,
    pub settings: NotificationSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NotificationSettings {
    pub enabled: Option<bool>,
    pub realert_interval: Option<Duration>,
    pub max_realerts: Option<u32>,
    pub send_recovery: Option<bool>,
    pub quiet_hours_start: Option<u8>,
    pub quiet_hours_end: Option<u8>,
    pub quiet_hours_tz: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    pub window: Duration,
    pub per_host_cap: u32,
    pub global_cap: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushTransportConfig {
    pub url: Option<String>,
    pub token: Option<String>,
}

impl Default for PushTransportConfig {
    fn default() -> Self {
        Self { url: None, token: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncludeConfig {
    pub enabled: bool,
    pub directory: Option<PathBuf>,
    pub pattern: String,
}

impl Default for IncludeConfig {
    fn default() -> Self {
        Self { enabled: false, directory: None, pattern: "*.yaml".into() }
    }
}
