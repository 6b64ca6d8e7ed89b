use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Top-level shape of one YAML document (primary or include file).
///
/// Every section is optional so an include file can carry just a `hosts:`
/// list, just a `checks:` list, or a scalar section override — the merge
/// rules in `loader.rs` decide what "present" means for each.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RawDocument {
    pub server: Option<RawServer>,
    pub web: Option<RawWeb>,
    pub database: Option<RawDatabase>,
    pub prometheus: Option<RawPrometheus>,
    pub monitoring: Option<RawMonitoring>,
    #[serde(alias = "pushover")]
    pub notification: Option<RawNotification>,
    pub logging: Option<RawLogging>,
    pub include: Option<RawInclude>,
    #[serde(default)]
    pub hosts: Vec<RawHost>,
    #[serde(default)]
    pub checks: Vec<serde_yaml::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawInclude {
    #[serde(default)]
    pub enabled: bool,
    pub directory: Option<String>,
    #[serde(default = "default_pattern")]
    pub pattern: String,
}

fn default_pattern() -> String {
    "*.yaml".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawHost {
    pub id: String,
    pub name: String,
    pub display_name: Option<String>,
    pub ipv4: Option<String>,
    pub hostname: Option<String>,
    #[serde(default = "default_group")]
    pub group: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

fn default_group() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

/// A full check entry — everything beyond just `id` and `hosts`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawCheck {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub check_type: String,
    #[serde(default)]
    pub hosts: Vec<String>,
    pub interval: RawIntervals,
    pub threshold: Option<u32>,
    pub timeout: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub options: HashMap<String, String>,
    pub soft_fail_enabled: Option<bool>,
}

/// A partial check entry — exactly `id` and `hosts`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawPartialCheck {
    pub id: String,
    #[serde(default)]
    pub hosts: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawIntervals {
    pub ok: String,
    pub warning: String,
    pub critical: String,
    pub unknown: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServer {
    pub bind: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawWeb {
    pub enabled: Option<bool>,
    pub files: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawDatabase {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawPrometheus {
    pub enabled: Option<bool>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawMonitoring {
    pub workers: Option<usize>,
    pub soft_fail_enabled: Option<bool>,
    pub cleanup_interval: Option<String>,
    pub compact_interval: Option<String>,
    pub retention_horizon: Option<String>,
    pub purge_on_startup: Option<bool>,
    pub purge_on_reload: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawNotification {
    pub defaults: Option<RawNotificationSettings>,
    pub rules: Option<Vec<RawNotificationRule>>,
    pub hosts: Option<HashMap<String, RawNotificationSettings>>,
    pub checks: Option<HashMap<String, RawNotificationSettings>>,
    pub throttle: Option<RawThrottle>,
    pub title_template: Option<String>,
    pub body_template: Option<String>,
    pub transport: Option<RawTransport>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawNotificationSettings {
    pub enabled: Option<bool>,
    pub realert_interval: Option<String>,
    pub max_realerts: Option<u32>,
    pub send_recovery: Option<bool>,
    pub quiet_hours_start: Option<u8>,
    pub quiet_hours_end: Option<u8>,
    pub quiet_hours_tz: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawNotificationRule {
    pub name: String,
    pub host_pattern: Option<String>,
    pub check_pattern: Option<String>,
    #[serde(flatten)]
    pub settings: RawNotificationSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawThrottle {
    pub window: String,
    pub per_host_cap: u32,
    pub global_cap: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawTransport {
    pub url: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawLogging {
    pub level: Option<String>,
    pub format: Option<String>,
}
