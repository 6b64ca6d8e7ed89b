use std::time::Duration;

use regex::Regex;
use vigil_domain::{Check, Host, NotificationConfig, NotificationSettings};

use crate::error::NotifyError;

/// Fully-resolved notification settings for one (host, check) pair, after
/// applying the defaults ← rule ← host-override ← check-override overlay.
///
/// Every field here is concrete — no further `Option` layering happens past
/// this point.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSettings {
    pub enabled: bool,
    pub realert_interval: Duration,
    /// 0 means "no cap" — realerts continue until the pair recovers.
    pub max_realerts: u32,
    pub send_recovery: bool,
    pub quiet_hours: Option<QuietHours>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuietHours {
    pub start_hour: u8,
    pub end_hour: u8,
    pub tz: String,
}

impl Default for ResolvedSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            realert_interval: Duration::from_secs(3600),
            max_realerts: 0,
            send_recovery: true,
            quiet_hours: None,
        }
    }
}

/// Applies one [`NotificationSettings`] layer over `base`, overriding only
/// the fields the layer actually sets.
fn overlay(base: &mut ResolvedSettings, layer: &NotificationSettings) {
    if let Some(v) = layer.enabled {
        base.enabled = v;
    }
    if let Some(v) = layer.realert_interval {
        base.realert_interval = v;
    }
    if let Some(v) = layer.max_realerts {
        base.max_realerts = v;
    }
    if let Some(v) = layer.send_recovery {
        base.send_recovery = v;
    }
    if layer.quiet_hours_start.is_some() || layer.quiet_hours_end.is_some() {
        let start = layer
            .quiet_hours_start
            .or_else(|| base.quiet_hours.as_ref().map(|q| q.start_hour))
            .unwrap_or(0);
        let end = layer
            .quiet_hours_end
            .or_else(|| base.quiet_hours.as_ref().map(|q| q.end_hour))
            .unwrap_or(0);
        let tz = layer
            .quiet_hours_tz
            .clone()
            .or_else(|| base.quiet_hours.as_ref().map(|q| q.tz.clone()))
            .unwrap_or_else(|| "UTC".to_string());
        base.quiet_hours = Some(QuietHours { start_hour: start, end_hour: end, tz });
    } else if let Some(tz) = &layer.quiet_hours_tz {
        if let Some(q) = base.quiet_hours.as_mut() {
            q.tz = tz.clone();
        }
    }
}

fn pattern_matches(pattern: &str, candidates: &[&str]) -> Result<bool, NotifyError> {
    let re = Regex::new(pattern).map_err(|e| NotifyError::InvalidPattern(pattern.to_string(), e))?;
    Ok(candidates.iter().any(|c| re.is_match(c)))
}

/// Resolves the effective notification settings for `host`/`check`: global
/// defaults, then every matching named rule in declaration order, then the
/// host override block, then the check override block — last-defined field
/// wins at each layer.
pub fn resolve(
    config: &NotificationConfig,
    host: &Host,
    check: &Check,
) -> Result<ResolvedSettings, NotifyError> {
    let mut resolved = ResolvedSettings::default();
    overlay(&mut resolved, &config.defaults);

    let host_candidates = [host.id.as_str(), host.name.as_str()];
    let check_candidates = [check.id.as_str(), check.name.as_str()];

    for rule in &config.rules {
        let host_ok = match &rule.host_pattern {
            Some(p) => pattern_matches(p, &host_candidates)?,
            None => true,
        };
        let check_ok = match &rule.check_pattern {
            Some(p) => pattern_matches(p, &check_candidates)?,
            None => true,
        };
        if host_ok && check_ok {
            overlay(&mut resolved, &rule.settings);
        }
    }

    if let Some(settings) = config.host_overrides.get(host.id.as_str()) {
        overlay(&mut resolved, settings);
    }
    if let Some(settings) = config.check_overrides.get(check.id.as_str()) {
        overlay(&mut resolved, settings);
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use vigil_domain::{CheckId, CheckType, HostId, NotificationRule, StateIntervals};

    fn host() -> Host {
        Host {
            id: HostId::new("h1"),
            name: "web-01".into(),
            display_name: None,
            ipv4: None,
            hostname: Some("web-01.example.com".into()),
            group: "default".into(),
            enabled: true,
            tags: HashMap::new(),
            created_at: None,
            updated_at: None,
        }
    }

    fn check() -> Check {
        Check {
            id: CheckId::new("c1"),
            name: "http-root".into(),
            check_type: CheckType::Http,
            hosts: vec![],
            intervals: StateIntervals {
                ok: Duration::from_secs(300),
                warning: Duration::from_secs(300),
                critical: Duration::from_secs(300),
                unknown: Duration::from_secs(300),
            },
            threshold: 1,
            timeout: Duration::from_secs(10),
            enabled: true,
            options: HashMap::new(),
            soft_fail_enabled: None,
        }
    }

    fn base_config() -> NotificationConfig {
        NotificationConfig {
            defaults: NotificationSettings {
                enabled: Some(true),
                realert_interval: Some(Duration::from_secs(3600)),
                max_realerts: Some(3),
                send_recovery: Some(true),
                quiet_hours_start: None,
                quiet_hours_end: None,
                quiet_hours_tz: None,
            },
            rules: vec![],
            host_overrides: HashMap::new(),
            check_overrides: HashMap::new(),
            throttle: None,
            title_template: None,
            body_template: None,
            transport: Default::default(),
        }
    }

    #[test]
    fn rule_overrides_defaults_when_host_pattern_matches() {
        let mut config = base_config();
        config.rules.push(NotificationRule {
            name: "web-quiet".into(),
            host_pattern: Some("^web-".into()),
            check_pattern: None,
            settings: NotificationSettings {
                max_realerts: Some(1),
                ..Default::default()
            },
        });

        let resolved = resolve(&config, &host(), &check()).unwrap();
        assert_eq!(resolved.max_realerts, 1);
        assert!(resolved.send_recovery);
    }

    #[test]
    fn check_override_wins_over_host_override() {
        let mut config = base_config();
        config.host_overrides.insert(
            "h1".into(),
            NotificationSettings { send_recovery: Some(false), ..Default::default() },
        );
        config.check_overrides.insert(
            "c1".into(),
            NotificationSettings { send_recovery: Some(true), ..Default::default() },
        );

        let resolved = resolve(&config, &host(), &check()).unwrap();
        assert!(resolved.send_recovery);
    }

    #[test]
    fn non_matching_rule_is_ignored() {
        let mut config = base_config();
        config.rules.push(NotificationRule {
            name: "db-only".into(),
            host_pattern: Some("^db-".into()),
            check_pattern: None,
            settings: NotificationSettings { max_realerts: Some(99), ..Default::default() },
        });

        let resolved = resolve(&config, &host(), &check()).unwrap();
        assert_eq!(resolved.max_realerts, 3);
    }
}
