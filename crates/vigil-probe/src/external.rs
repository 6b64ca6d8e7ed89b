use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use vigil_domain::{Check, CheckType, ExitCode, Host};

use crate::probe::{Probe, ProbeOutcome};

/// Runs an external plugin program and maps its exit status directly: 0/1/2
/// become ok/warn/crit, anything else (including a signal or spawn failure)
/// becomes `UNKNOWN`. Stdout is split on the first newline into a one-line
/// `output` and an optional `long_output`; a trailing `| perf` segment on the
/// first line is captured separately as `perf_data`.
///
/// `command` is read from the check's `command` option; the host's resolved
/// address and the check's id are passed to it as `VIGIL_HOST` and
/// `VIGIL_CHECK` environment variables so plugins written for other
/// monitoring systems' conventions still have something to key off.
#[derive(Debug, Default, Clone)]
pub struct ExternalProbe;

impl ExternalProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Probe for ExternalProbe {
    fn check_type(&self) -> CheckType {
        CheckType::External
    }

    async fn execute(&self, host: &Host, check: &Check) -> ProbeOutcome {
        let start = Instant::now();

        let Some(command) = check.option("command") else {
            return ProbeOutcome::unknown(
                format!("check '{}' is missing a 'command' option", check.id),
                start.elapsed(),
            );
        };

        let args: Vec<&str> = check
            .option("args")
            .map(|a| a.split_whitespace().collect())
            .unwrap_or_default();

        let address = host.address().unwrap_or_default();

        let run = Command::new(command)
            .args(&args)
            .env("VIGIL_HOST", &address)
            .env("VIGIL_CHECK", check.id.as_str())
            .stdin(Stdio::null())
            .output();

        let output = match tokio::time::timeout(check.timeout, run).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return ProbeOutcome::unknown(
                    format!("failed to spawn '{command}': {e}"),
                    start.elapsed(),
                );
            }
            Err(_) => {
                return ProbeOutcome {
                    exit_code: ExitCode::UNKNOWN,
                    output: format!("'{command}' timed out after {:?}", check.timeout),
                    long_output: None,
                    perf_data: None,
                    duration: start.elapsed(),
                };
            }
        };

        let duration = start.elapsed();
        let exit_code = match output.status.code() {
            Some(0) => ExitCode::OK,
            Some(1) => ExitCode::WARNING,
            Some(2) => ExitCode::CRITICAL,
            _ => ExitCode::UNKNOWN,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let (first_line, rest) = match stdout.split_once('\n') {
            Some((first, rest)) => (first.to_string(), Some(rest.to_string())),
            None => (stdout.clone(), None),
        };

        let (summary, perf_data) = match first_line.split_once('|') {
            Some((text, perf)) => (text.trim().to_string(), Some(perf.trim().to_string())),
            None => (first_line, None),
        };

        let summary = if summary.is_empty() {
            format!("'{command}' exited with status {:?}", output.status.code())
        } else {
            summary
        };

        ProbeOutcome {
            exit_code,
            output: summary,
            long_output: rest.filter(|r| !r.is_empty()),
            perf_data,
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use vigil_domain::{CheckId, HostId, StateIntervals};

    fn host() -> Host {
        Host {
            id: HostId::new("h1"),
            name: "h1".to_string(),
            display_name: None,
            ipv4: None,
            hostname: Some("h1.example.com".to_string()),
            group: "default".into(),
            enabled: true,
            tags: HashMap::new(),
            created_at: None,
            updated_at: None,
        }
    }

    fn check(options: HashMap<String, String>) -> Check {
        Check {
            id: CheckId::new("c1"),
            name: "c1".to_string(),
            check_type: CheckType::External,
            hosts: vec![HostId::new("h1")],
            intervals: StateIntervals {
                ok: std::time::Duration::from_secs(60),
                warning: std::time::Duration::from_secs(30),
                critical: std::time::Duration::from_secs(15),
                unknown: std::time::Duration::from_secs(60),
            },
            threshold: 1,
            timeout: std::time::Duration::from_secs(5),
            enabled: true,
            options,
            soft_fail_enabled: None,
        }
    }

    fn opts(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    /// Writes an executable shell script and returns its path; the
    /// `tempfile::TempDir` guard must be kept alive for as long as the path.
    fn script(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("plugin.sh");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "#!/bin/sh\n{body}").unwrap();
        f.set_permissions(std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn exit_zero_is_ok_with_perf_data() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = script(&dir, "echo 'all good | response_time=12ms'\nexit 0");

        let c = check(opts(&[("command", path.to_str().unwrap())]));
        let outcome = ExternalProbe::new().execute(&host(), &c).await;

        assert_eq!(outcome.exit_code, ExitCode::OK);
        assert_eq!(outcome.output, "all good");
        assert_eq!(outcome.perf_data.as_deref(), Some("response_time=12ms"));
    }

    #[tokio::test]
    async fn exit_one_is_warning() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = script(&dir, "echo 'disk nearly full'\nexit 1");

        let c = check(opts(&[("command", path.to_str().unwrap())]));
        let outcome = ExternalProbe::new().execute(&host(), &c).await;

        assert_eq!(outcome.exit_code, ExitCode::WARNING);
    }

    #[tokio::test]
    async fn exit_two_is_critical_with_long_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = script(&dir, "echo 'service down'\necho 'stack trace line 1'\necho 'stack trace line 2'\nexit 2");

        let c = check(opts(&[("command", path.to_str().unwrap())]));
        let outcome = ExternalProbe::new().execute(&host(), &c).await;

        assert_eq!(outcome.exit_code, ExitCode::CRITICAL);
        assert_eq!(outcome.output, "service down");
        assert!(outcome.long_output.unwrap().contains("stack trace line 1"));
    }

    #[tokio::test]
    async fn unmapped_exit_code_is_unknown() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = script(&dir, "exit 7");

        let c = check(opts(&[("command", path.to_str().unwrap())]));
        let outcome = ExternalProbe::new().execute(&host(), &c).await;

        assert_eq!(outcome.exit_code, ExitCode::UNKNOWN);
    }

    #[tokio::test]
    async fn passes_host_and_check_as_env_vars() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = script(&dir, "echo \"$VIGIL_HOST $VIGIL_CHECK\"\nexit 0");

        let c = check(opts(&[("command", path.to_str().unwrap())]));
        let outcome = ExternalProbe::new().execute(&host(), &c).await;

        assert_eq!(outcome.output, "h1.example.com c1");
    }

    #[tokio::test]
    async fn missing_command_option_is_unknown() {
        let c = check(opts(&[]));
        let outcome = ExternalProbe::new().execute(&host(), &c).await;
        assert_eq!(outcome.exit_code, ExitCode::UNKNOWN);
        assert!(outcome.output.contains("command"));
    }
}
