use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use vigil_domain::{
    Check, CheckId, CheckType, Configuration, DatabaseConfig, Host, HostId, IncludeConfig,
    LoggingConfig, MonitoringConfig, NotificationConfig, NotificationRule, NotificationSettings,
    PrometheusConfig, PushTransportConfig, ServerConfig, StateIntervals, ThrottleConfig, WebConfig,
};

use crate::duration::parse_duration;
use crate::error::ConfigError;
use crate::raw::{
    RawCheck, RawDatabase, RawDocument, RawHost, RawIntervals, RawLogging, RawMonitoring,
    RawNotification, RawNotificationRule, RawNotificationSettings, RawPartialCheck, RawPrometheus,
    RawServer, RawWeb,
};

/// Load the primary document at `path`, fold in its includes (if enabled),
/// and return a fully validated [`Configuration`].
///
/// Reads the primary document, enumerates includes in sorted order, merges
/// each into an accumulator, then converts and validates once at the end.
pub fn load(path: &Path) -> Result<Configuration, ConfigError> {
    let primary = read_document(path)?;
    let mut acc = Accumulator::default();

    let include_directive = primary.include.clone();
    merge_document(&mut acc, primary, path)?;

    if let Some(include) = include_directive {
        if include.enabled {
            let dir = include
                .directory
                .as_ref()
                .ok_or_else(|| ConfigError::MissingIncludeDirectory("<unset>".to_string()))?;
            let dir = PathBuf::from(dir);
            if !dir.is_dir() {
                return Err(ConfigError::MissingIncludeDirectory(dir.display().to_string()));
            }
            if include.pattern.contains('/') || include.pattern.contains('\\') {
                return Err(ConfigError::UnsafeIncludePattern(include.pattern.clone()));
            }
            for file in enumerate_includes(&dir, &include.pattern)? {
                let doc = read_document(&file)?;
                merge_document(&mut acc, doc, &file)?;
            }
        }
    }

    finalize(acc)
}

fn read_document(path: &Path) -> Result<RawDocument, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| ConfigError::YamlParse {
        path: path.display().to_string(),
        source,
    })
}

/// Lexical, byte-wise sort by filename so merge order never depends on
/// directory listing order.
fn enumerate_includes(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, ConfigError> {
    let glob_pattern = dir.join(pattern);
    let glob_pattern = glob_pattern.to_string_lossy().to_string();
    let mut matches: Vec<PathBuf> = glob::glob(&glob_pattern)
        .map_err(|e| ConfigError::UnsafeIncludePattern(e.to_string()))?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();
    matches.sort_by(|a, b| {
        a.file_name()
            .unwrap_or_default()
            .cmp(b.file_name().unwrap_or_default())
    });
    Ok(matches)
}

#[derive(Default)]
struct Accumulator {
    server: Option<RawServer>,
    web: Option<RawWeb>,
    database: Option<RawDatabase>,
    prometheus: Option<RawPrometheus>,
    monitoring: Option<RawMonitoring>,
    notification: Option<RawNotification>,
    logging: Option<RawLogging>,
    host_ids: HashSet<String>,
    hosts: Vec<RawHost>,
    check_order: Vec<String>,
    checks: HashMap<String, RawCheck>,
}

fn merge_document(acc: &mut Accumulator, doc: RawDocument, path: &Path) -> Result<(), ConfigError> {
    let label = path.display().to_string();

    acc.server = merge_server(acc.server.take(), doc.server);
    acc.web = merge_web(acc.web.take(), doc.web);
    acc.database = merge_database(acc.database.take(), doc.database);
    acc.prometheus = merge_prometheus(acc.prometheus.take(), doc.prometheus);
    acc.monitoring = merge_monitoring(acc.monitoring.take(), doc.monitoring);
    acc.notification = merge_notification(acc.notification.take(), doc.notification);
    acc.logging = merge_logging(acc.logging.take(), doc.logging);

    for host in doc.hosts {
        if !acc.host_ids.insert(host.id.clone()) {
            return Err(ConfigError::DuplicateHost(host.id));
        }
        acc.hosts.push(host);
    }

    for raw in doc.checks {
        merge_check_entry(acc, raw, &label)?;
    }

    Ok(())
}

fn merge_check_entry(
    acc: &mut Accumulator,
    value: serde_yaml::Value,
    label: &str,
) -> Result<(), ConfigError> {
    let keys = mapping_keys(&value);
    let is_partial = keys.len() == 2 && keys.contains("id") && keys.contains("hosts");

    if is_partial {
        let partial: RawPartialCheck =
            serde_yaml::from_value(value).map_err(|source| ConfigError::YamlParse {
                path: label.to_string(),
                source,
            })?;
        let existing = acc
            .checks
            .get_mut(&partial.id)
            .ok_or_else(|| ConfigError::UnknownPartialCheck(partial.id.clone()))?;
        for host_id in partial.hosts {
            if !existing.hosts.contains(&host_id) {
                existing.hosts.push(host_id);
            }
        }
    } else {
        let full: RawCheck =
            serde_yaml::from_value(value).map_err(|source| ConfigError::YamlParse {
                path: label.to_string(),
                source,
            })?;
        if acc.checks.contains_key(&full.id) {
            return Err(ConfigError::DuplicateFullCheck(full.id));
        }
        acc.check_order.push(full.id.clone());
        acc.checks.insert(full.id.clone(), full);
    }
    Ok(())
}

fn mapping_keys(value: &serde_yaml::Value) -> HashSet<String> {
    match value {
        serde_yaml::Value::Mapping(m) => m
            .keys()
            .filter_map(|k| k.as_str().map(str::to_string))
            .collect(),
        _ => HashSet::new(),
    }
}

// ── Section merges: field present in a later document replaces; absent is
// preserved, ───────────────────────────────────────────────

fn merge_server(base: Option<RawServer>, incoming: Option<RawServer>) -> Option<RawServer> {
    let Some(inc) = incoming else { return base };
    let mut out = base.unwrap_or_default();
    if inc.bind.is_some() {
        out.bind = inc.bind;
    }
    if inc.port.is_some() {
        out.port = inc.port;
    }
    Some(out)
}

fn merge_web(base: Option<RawWeb>, incoming: Option<RawWeb>) -> Option<RawWeb> {
    let Some(inc) = incoming else { return base };
    let mut out = base.unwrap_or_default();
    if inc.enabled.is_some() {
        out.enabled = inc.enabled;
    }
    if inc.files.is_some() {
        out.files = inc.files;
    }
    Some(out)
}

fn merge_database(base: Option<RawDatabase>, incoming: Option<RawDatabase>) -> Option<RawDatabase> {
    let Some(inc) = incoming else { return base };
    let mut out = base.unwrap_or_default();
    if inc.path.is_some() {
        out.path = inc.path;
    }
    Some(out)
}

fn merge_prometheus(
    base: Option<RawPrometheus>,
    incoming: Option<RawPrometheus>,
) -> Option<RawPrometheus> {
    let Some(inc) = incoming else { return base };
    let mut out = base.unwrap_or_default();
    if inc.enabled.is_some() {
        out.enabled = inc.enabled;
    }
    if inc.path.is_some() {
        out.path = inc.path;
    }
    Some(out)
}

fn merge_monitoring(
    base: Option<RawMonitoring>,
    incoming: Option<RawMonitoring>,
) -> Option<RawMonitoring> {
    let Some(inc) = incoming else { return base };
    let mut out = base.unwrap_or_default();
    if inc.workers.is_some() {
        out.workers = inc.workers;
    }
    if inc.soft_fail_enabled.is_some() {
        out.soft_fail_enabled = inc.soft_fail_enabled;
    }
    if inc.cleanup_interval.is_some() {
        out.cleanup_interval = inc.cleanup_interval;
    }
    if inc.compact_interval.is_some() {
        out.compact_interval = inc.compact_interval;
    }
    if inc.retention_horizon.is_some() {
        out.retention_horizon = inc.retention_horizon;
    }
    if inc.purge_on_startup.is_some() {
        out.purge_on_startup = inc.purge_on_startup;
    }
    if inc.purge_on_reload.is_some() {
        out.purge_on_reload = inc.purge_on_reload;
    }
    Some(out)
}

fn merge_notification_settings(
    base: RawNotificationSettings,
    inc: RawNotificationSettings,
) -> RawNotificationSettings {
    RawNotificationSettings {
        enabled: inc.enabled.or(base.enabled),
        realert_interval: inc.realert_interval.or(base.realert_interval),
        max_realerts: inc.max_realerts.or(base.max_realerts),
        send_recovery: inc.send_recovery.or(base.send_recovery),
        quiet_hours_start: inc.quiet_hours_start.or(base.quiet_hours_start),
        quiet_hours_end: inc.quiet_hours_end.or(base.quiet_hours_end),
        quiet_hours_tz: inc.quiet_hours_tz.or(base.quiet_hours_tz),
    }
}

fn merge_notification(
    base: Option<RawNotification>,
    incoming: Option<RawNotification>,
) -> Option<RawNotification> {
    let Some(inc) = incoming else { return base };
    let mut out = base.unwrap_or_default();
    if let Some(defaults) = inc.defaults {
        out.defaults = Some(merge_notification_settings(
            out.defaults.unwrap_or_default(),
            defaults,
        ));
    }
    if let Some(mut rules) = inc.rules {
        out.rules.get_or_insert_with(Vec::new).append(&mut rules);
    }
    if let Some(hosts) = inc.hosts {
        out.hosts.get_or_insert_with(HashMap::new).extend(hosts);
    }
    if let Some(checks) = inc.checks {
        out.checks.get_or_insert_with(HashMap::new).extend(checks);
    }
    if inc.throttle.is_some() {
        out.throttle = inc.throttle;
    }
    if inc.title_template.is_some() {
        out.title_template = inc.title_template;
    }
    if inc.body_template.is_some() {
        out.body_template = inc.body_template;
    }
    if inc.transport.is_some() {
        out.transport = inc.transport;
    }
    Some(out)
}

fn merge_logging(base: Option<RawLogging>, incoming: Option<RawLogging>) -> Option<RawLogging> {
    let Some(inc) = incoming else { return base };
    let mut out = base.unwrap_or_default();
    if inc.level.is_some() {
        out.level = inc.level;
    }
    if inc.format.is_some() {
        out.format = inc.format;
    }
    Some(out)
}

// ── Finalize: defaulting, raw->domain conversion, validation ────────────────

fn finalize(acc: Accumulator) -> Result<Configuration, ConfigError> {
    let server = acc.server.map(convert_server).unwrap_or_default();
    let web = acc.web.map(convert_web).unwrap_or_default();
    let database = acc
        .database
        .map(convert_database)
        .transpose()?
        .unwrap_or_default();
    let prometheus = acc.prometheus.map(convert_prometheus).unwrap_or_default();
    let monitoring = acc
        .monitoring
        .map(convert_monitoring)
        .transpose()?
        .unwrap_or_default();
    let notification = acc
        .notification
        .map(convert_notification)
        .transpose()?
        .unwrap_or_default();
    let logging = acc.logging.map(convert_logging).unwrap_or_default();

    let hosts: Vec<Host> = acc
        .hosts
        .into_iter()
        .map(convert_host)
        .collect::<Result<_, _>>()?;

    let checks: Vec<Check> = acc
        .check_order
        .iter()
        .map(|id| {
            let raw = acc.checks.get(id).expect("check_order tracks checks map keys");
            convert_check(raw.clone())
        })
        .collect::<Result<_, _>>()?;

    validate(&hosts, &checks)?;

    Ok(Configuration {
        server,
        web,
        database,
        prometheus,
        monitoring,
        notification,
        logging,
        include: IncludeConfig::default(),
        hosts,
        checks,
    })
}

fn validate(hosts: &[Host], checks: &[Check]) -> Result<(), ConfigError> {
    let mut seen_hosts = HashSet::new();
    for host in hosts {
        if !seen_hosts.insert(host.id.as_str().to_string()) {
            return Err(ConfigError::Domain(vigil_domain::DomainError::DuplicateHostId(
                host.id.as_str().to_string(),
            )));
        }
    }

    let mut seen_checks = HashSet::new();
    for check in checks {
        if !seen_checks.insert(check.id.as_str().to_string()) {
            return Err(ConfigError::Domain(vigil_domain::DomainError::DuplicateCheckId(
                check.id.as_str().to_string(),
            )));
        }
        if check.threshold < 1 {
            return Err(ConfigError::Domain(vigil_domain::DomainError::InvalidThreshold {
                check: check.id.as_str().to_string(),
                threshold: check.threshold as i64,
            }));
        }
        check.intervals.validate(check.id.as_str())?;
        for host_id in &check.hosts {
            if !seen_hosts.contains(host_id.as_str()) {
                return Err(ConfigError::Domain(vigil_domain::DomainError::UnknownHostReference {
                    check: check.id.as_str().to_string(),
                    host: host_id.as_str().to_string(),
                }));
            }
        }
    }

    Ok(())
}

fn convert_server(raw: RawServer) -> ServerConfig {
    let default = ServerConfig::default();
    ServerConfig {
        bind: raw.bind.unwrap_or(default.bind),
        port: raw.port.unwrap_or(default.port),
    }
}

fn convert_web(raw: RawWeb) -> WebConfig {
    WebConfig {
        enabled: raw.enabled.unwrap_or(false),
        files: raw.files.unwrap_or_default(),
    }
}

fn convert_database(raw: RawDatabase) -> Result<DatabaseConfig, ConfigError> {
    let default = DatabaseConfig::default();
    Ok(DatabaseConfig {
        path: raw.path.map(PathBuf::from).unwrap_or(default.path),
    })
}

fn convert_prometheus(raw: RawPrometheus) -> PrometheusConfig {
    PrometheusConfig {
        enabled: raw.enabled.unwrap_or(false),
        path: raw.path,
    }
}

fn convert_monitoring(raw: RawMonitoring) -> Result<MonitoringConfig, ConfigError> {
    let default = MonitoringConfig::default();
    Ok(MonitoringConfig {
        workers: raw.workers.unwrap_or(default.workers),
        soft_fail_enabled: raw.soft_fail_enabled.unwrap_or(default.soft_fail_enabled),
        cleanup_interval: raw
            .cleanup_interval
            .as_deref()
            .map(|s| parse_duration(s).map_err(conv_err("monitoring.cleanup_interval")))
            .transpose()?
            .unwrap_or(default.cleanup_interval),
        compact_interval: raw
            .compact_interval
            .as_deref()
            .map(|s| parse_duration(s).map_err(conv_err("monitoring.compact_interval")))
            .transpose()?
            .unwrap_or(default.compact_interval),
        retention_horizon: raw
            .retention_horizon
            .as_deref()
            .map(|s| parse_duration(s).map_err(conv_err("monitoring.retention_horizon")))
            .transpose()?
            .unwrap_or(default.retention_horizon),
        purge_on_startup: raw.purge_on_startup.unwrap_or(default.purge_on_startup),
        purge_on_reload: raw.purge_on_reload.unwrap_or(default.purge_on_reload),
    })
}

fn convert_logging(raw: RawLogging) -> LoggingConfig {
    LoggingConfig {
        level: raw.level,
        format: raw.format,
    }
}

fn convert_notification_settings(raw: RawNotificationSettings) -> Result<NotificationSettings, ConfigError> {
    Ok(NotificationSettings {
        enabled: raw.enabled,
        realert_interval: raw
            .realert_interval
            .as_deref()
            .map(|s| parse_duration(s).map_err(conv_err("notification.realert_interval")))
            .transpose()?,
        max_realerts: raw.max_realerts,
        send_recovery: raw.send_recovery,
        quiet_hours_start: raw.quiet_hours_start,
        quiet_hours_end: raw.quiet_hours_end,
        quiet_hours_tz: raw.quiet_hours_tz,
    })
}

fn convert_notification(raw: RawNotification) -> Result<NotificationConfig, ConfigError> {
    let throttle = raw
        .throttle
        .map(|t| -> Result<ThrottleConfig, ConfigError> {
            Ok(ThrottleConfig {
                window: parse_duration(&t.window).map_err(conv_err("notification.throttle.window"))?,
                per_host_cap: t.per_host_cap,
                global_cap: t.global_cap,
            })
        })
        .transpose()?;

    let mut host_overrides = HashMap::new();
    for (k, v) in raw.hosts.unwrap_or_default() {
        host_overrides.insert(k, convert_notification_settings(v)?);
    }
    let mut check_overrides = HashMap::new();
    for (k, v) in raw.checks.unwrap_or_default() {
        check_overrides.insert(k, convert_notification_settings(v)?);
    }

    let mut rules = Vec::new();
    for rule in raw.rules.unwrap_or_default() {
        rules.push(convert_notification_rule(rule)?);
    }

    Ok(NotificationConfig {
        defaults: convert_notification_settings(raw.defaults.unwrap_or_default())?,
        rules,
        host_overrides,
        check_overrides,
        throttle,
        title_template: raw.title_template,
        body_template: raw.body_template,
        transport: raw
            .transport
            .map(|t| PushTransportConfig { url: t.url, token: t.token })
            .unwrap_or_default(),
    })
}

fn convert_notification_rule(raw: RawNotificationRule) -> Result<NotificationRule, ConfigError> {
    Ok(NotificationRule {
        name: raw.name,
        host_pattern: raw.host_pattern,
        check_pattern: raw.check_pattern,
        settings: convert_notification_settings(raw.settings)?,
    })
}

fn convert_host(raw: RawHost) -> Result<Host, ConfigError> {
    let ipv4 = raw
        .ipv4
        .as_deref()
        .map(|s| s.parse())
        .transpose()
        .map_err(|_| ConfigError::Domain(vigil_domain::DomainError::InvalidHostId(raw.id.clone())))?;

    Ok(Host {
        id: HostId::new(raw.id),
        name: raw.name,
        display_name: raw.display_name,
        ipv4,
        hostname: raw.hostname,
        group: raw.group,
        enabled: raw.enabled,
        tags: raw.tags,
        created_at: None,
        updated_at: None,
    })
}

fn convert_check(raw: RawCheck) -> Result<Check, ConfigError> {
    let check_type = parse_check_type(&raw.check_type, &raw.id)?;
    let intervals = convert_intervals(raw.interval, &raw.id)?;
    let timeout = parse_duration(&raw.timeout).map_err(conv_err(&format!("checks.{}.timeout", raw.id)))?;

    Ok(Check {
        id: CheckId::new(raw.id),
        name: raw.name,
        check_type,
        hosts: raw.hosts.into_iter().map(HostId::new).collect(),
        intervals,
        threshold: raw.threshold.unwrap_or(1),
        timeout,
        enabled: raw.enabled,
        options: raw.options,
        soft_fail_enabled: raw.soft_fail_enabled,
    })
}

fn parse_check_type(s: &str, check_id: &str) -> Result<CheckType, ConfigError> {
    match s {
        "ping" => Ok(CheckType::Ping),
        "tcp" => Ok(CheckType::Tcp),
        "http" => Ok(CheckType::Http),
        "external" => Ok(CheckType::External),
        other => Err(ConfigError::Conversion {
            path: check_id.to_string(),
            message: format!("unknown check type '{}'", other),
        }),
    }
}

fn convert_intervals(raw: RawIntervals, check_id: &str) -> Result<StateIntervals, ConfigError> {
    Ok(StateIntervals {
        ok: parse_duration(&raw.ok).map_err(conv_err(&format!("checks.{}.interval.ok", check_id)))?,
        warning: parse_duration(&raw.warning)
            .map_err(conv_err(&format!("checks.{}.interval.warning", check_id)))?,
        critical: parse_duration(&raw.critical)
            .map_err(conv_err(&format!("checks.{}.interval.critical", check_id)))?,
        unknown: parse_duration(&raw.unknown)
            .map_err(conv_err(&format!("checks.{}.interval.unknown", check_id)))?,
    })
}

fn conv_err(path: &str) -> impl Fn(String) -> ConfigError + '_ {
    move |message| ConfigError::Conversion {
        path: path.to_string(),
        message,
    }
}
