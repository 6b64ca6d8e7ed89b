use std::collections::HashSet;

use vigil_domain::{Check, CheckId, Host, HostId, Pair};

use crate::error::GraphError;

/// Result of resolving a host/check configuration into the sets the
/// reconciler and scheduler actually consume.
///
/// Hosts and checks form a bipartite many-to-many graph — no cross-entity
/// cycles to detect, so unlike a dependency DAG this is a pure set
/// computation over two tables plus a `check.hosts` list, not an embedded
/// pointer graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGraph {
    pub known_hosts: HashSet<HostId>,
    pub known_checks: HashSet<CheckId>,
    /// `{ (host_id, check_id) | check enabled ∧ host enabled ∧ host_id ∈ check.hosts }`
    pub valid_pairs: HashSet<Pair>,
}

/// Validate a fully-loaded host/check configuration and resolve the pair set.
///
/// Checks every `check.hosts` reference against the host table (a dangling
/// reference is a hard failure — `vigil-config` already enforces this at
/// load time, but the reconciler re-derives pairs independently on every
/// reload, so this stays a standalone, re-checkable step).
pub fn validate(hosts: &[Host], checks: &[Check]) -> Result<ResolvedGraph, GraphError> {
    let known_hosts: HashSet<HostId> = hosts.iter().map(|h| h.id.clone()).collect();
    let known_checks: HashSet<CheckId> = checks.iter().map(|c| c.id.clone()).collect();

    let mut errors = Vec::new();
    for check in checks {
        for host_id in &check.hosts {
            if !known_hosts.contains(host_id) {
                errors.push(GraphError::DanglingHostReference {
                    check: check.id.clone(),
                    host: host_id.clone(),
                });
            }
        }
    }

    if !errors.is_empty() {
        if errors.len() == 1 {
            return Err(errors.remove(0));
        }
        return Err(GraphError::Multiple(errors));
    }

    let enabled_hosts: HashSet<&HostId> = hosts.iter().filter(|h| h.enabled).map(|h| &h.id).collect();

    let mut valid_pairs = HashSet::new();
    for check in checks {
        if !check.enabled {
            continue;
        }
        for host_id in &check.hosts {
            if enabled_hosts.contains(host_id) {
                valid_pairs.insert(Pair::new(host_id.clone(), check.id.clone()));
            }
        }
    }

    Ok(ResolvedGraph {
        known_hosts,
        known_checks,
        valid_pairs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;
    use vigil_domain::{CheckType, StateIntervals};

    fn host(id: &str, enabled: bool) -> Host {
        Host {
            id: HostId::new(id),
            name: id.to_string(),
            display_name: None,
            ipv4: None,
            hostname: Some(format!("{id}.example.com")),
            group: "default".into(),
            enabled,
            tags: HashMap::new(),
            created_at: None,
            updated_at: None,
        }
    }

    fn check(id: &str, hosts: &[&str], enabled: bool) -> Check {
        Check {
            id: CheckId::new(id),
            name: id.to_string(),
            check_type: CheckType::Tcp,
            hosts: hosts.iter().map(|h| HostId::new(*h)).collect(),
            intervals: StateIntervals {
                ok: Duration::from_secs(60),
                warning: Duration::from_secs(30),
                critical: Duration::from_secs(15),
                unknown: Duration::from_secs(60),
            },
            threshold: 1,
            timeout: Duration::from_secs(5),
            enabled,
            options: HashMap::new(),
            soft_fail_enabled: None,
        }
    }

    #[test]
    fn valid_pairs_require_both_sides_enabled() {
        let hosts = vec![host("a", true), host("b", false)];
        let checks = vec![check("c1", &["a", "b"], true)];
        let resolved = validate(&hosts, &checks).unwrap();
        assert_eq!(resolved.valid_pairs.len(), 1);
        assert!(resolved
            .valid_pairs
            .contains(&Pair::new(HostId::new("a"), CheckId::new("c1"))));
    }

    #[test]
    fn disabled_check_yields_no_pairs() {
        let hosts = vec![host("a", true)];
        let checks = vec![check("c1", &["a"], false)];
        let resolved = validate(&hosts, &checks).unwrap();
        assert!(resolved.valid_pairs.is_empty());
    }

    #[test]
    fn dangling_host_reference_is_an_error() {
        let hosts = vec![host("a", true)];
        let checks = vec![check("c1", &["ghost"], true)];
        assert!(validate(&hosts, &checks).is_err());
    }
}
