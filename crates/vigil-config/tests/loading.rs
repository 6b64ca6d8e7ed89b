use std::fs;

use vigil_config::load;

fn write(dir: &std::path::Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("write fixture file");
}

#[test]
fn loads_minimal_primary_document() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "primary.yaml",
        r#"
hosts:
  - id: web1
    name: web1
    hostname: web1.example.com
checks:
  - id: ping-web1
    name: ping web1
    type: ping
    hosts: [web1]
    interval: { ok: 60s, warning: 30s, critical: 15s, unknown: 60s }
    threshold: 3
    timeout: 5s
"#,
    );

    let cfg = load(&dir.path().join("primary.yaml")).expect("should load");
    assert_eq!(cfg.hosts.len(), 1);
    assert_eq!(cfg.checks.len(), 1);
    assert_eq!(cfg.checks[0].threshold, 3);
    assert_eq!(cfg.server.port, 8080);
}

/// spec.md §8 scenario 4: a full check defined in one file, with partial
/// entries appending hosts in two further files, merges to a single check
/// with a deduplicated, insertion-order host list.
#[test]
fn smart_merge_appends_hosts_in_order() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "primary.yaml",
        r#"
include:
  enabled: true
  directory: includes
  pattern: "*.yaml"
hosts:
  - id: x
    name: x
    hostname: x.example.com
  - id: y
    name: y
    hostname: y.example.com
  - id: z
    name: z
    hostname: z.example.com
"#,
    );
    let includes = dir.path().join("includes");
    fs::create_dir(&includes).unwrap();
    write(
        &includes,
        "01.yaml",
        r#"
checks:
  - id: port-25
    name: smtp
    type: tcp
    hosts: []
    interval: { ok: 60s, warning: 30s, critical: 15s, unknown: 60s }
    threshold: 2
    timeout: 5s
"#,
    );
    write(
        &includes,
        "02.yaml",
        r#"
checks:
  - id: port-25
    hosts: [x, y]
"#,
    );
    write(
        &includes,
        "03.yaml",
        r#"
checks:
  - id: port-25
    hosts: [y, z]
"#,
    );

    let cfg = load(&dir.path().join("primary.yaml")).expect("should load");
    let check = cfg.checks.iter().find(|c| c.id.as_str() == "port-25").unwrap();
    let host_ids: Vec<&str> = check.hosts.iter().map(|h| h.as_str()).collect();
    assert_eq!(host_ids, vec!["x", "y", "z"]);
}

#[test]
fn partial_check_for_unknown_id_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "primary.yaml",
        r#"
hosts:
  - id: x
    name: x
    hostname: x.example.com
checks:
  - id: ghost
    hosts: [x]
"#,
    );

    let err = load(&dir.path().join("primary.yaml")).unwrap_err();
    assert!(matches!(err, vigil_config::ConfigError::UnknownPartialCheck(_)));
}

#[test]
fn duplicate_host_id_across_files_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "primary.yaml",
        r#"
include:
  enabled: true
  directory: includes
  pattern: "*.yaml"
hosts:
  - id: x
    name: x
    hostname: x.example.com
"#,
    );
    let includes = dir.path().join("includes");
    fs::create_dir(&includes).unwrap();
    write(
        &includes,
        "01.yaml",
        r#"
hosts:
  - id: x
    name: x-again
    hostname: x2.example.com
"#,
    );

    let err = load(&dir.path().join("primary.yaml")).unwrap_err();
    assert!(matches!(err, vigil_config::ConfigError::DuplicateHost(_)));
}

#[test]
fn check_referencing_unknown_host_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "primary.yaml",
        r#"
hosts:
  - id: x
    name: x
    hostname: x.example.com
checks:
  - id: c1
    name: c1
    type: tcp
    hosts: [does-not-exist]
    interval: { ok: 60s, warning: 30s, critical: 15s, unknown: 60s }
    threshold: 1
    timeout: 5s
"#,
    );

    assert!(load(&dir.path().join("primary.yaml")).is_err());
}

/// spec.md §8: merging the same include set in a different on-disk order
/// yields the same result, since includes are sorted lexically before merge.
#[test]
fn merge_is_deterministic_regardless_of_creation_order() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();

    for dir in [&dir_a, &dir_b] {
        write(
            dir.path(),
            "primary.yaml",
            r#"
include:
  enabled: true
  directory: includes
  pattern: "*.yaml"
hosts:
  - id: x
    name: x
    hostname: x.example.com
"#,
        );
        fs::create_dir(dir.path().join("includes")).unwrap();
    }

    // Write in reverse order into dir_b to prove creation order doesn't matter.
    write(
        &dir_a.path().join("includes"),
        "01-server.yaml",
        "server: { bind: 10.0.0.1, port: 9000 }\n",
    );
    write(
        &dir_a.path().join("includes"),
        "02-server.yaml",
        "server: { port: 9100 }\n",
    );
    write(
        &dir_b.path().join("includes"),
        "02-server.yaml",
        "server: { port: 9100 }\n",
    );
    write(
        &dir_b.path().join("includes"),
        "01-server.yaml",
        "server: { bind: 10.0.0.1, port: 9000 }\n",
    );

    let cfg_a = load(&dir_a.path().join("primary.yaml")).unwrap();
    let cfg_b = load(&dir_b.path().join("primary.yaml")).unwrap();
    assert_eq!(cfg_a.server, cfg_b.server);
    assert_eq!(cfg_a.server.port, 9100);
    assert_eq!(cfg_a.server.bind, "10.0.0.1");
}
