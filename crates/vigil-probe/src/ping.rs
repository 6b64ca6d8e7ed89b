use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use vigil_domain::{Check, CheckType, ExitCode, Host};

use crate::probe::{Probe, ProbeOutcome};

/// ICMP echo probe.
///
/// No ICMP crate is used: sending raw ICMP from userspace normally needs
/// `CAP_NET_RAW` or a setuid binary, which an embedded monitoring daemon
/// cannot assume it has. Shelling out to the system `ping` binary — the same
/// mechanism [`crate::external::ExternalProbe`] uses — sidesteps that
/// entirely and is how most userspace monitoring agents do this in practice.
#[derive(Debug, Default, Clone)]
pub struct PingProbe;

impl PingProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Probe for PingProbe {
    fn check_type(&self) -> CheckType {
        CheckType::Ping
    }

    async fn execute(&self, host: &Host, check: &Check) -> ProbeOutcome {
        let start = Instant::now();

        let Some(address) = host.address() else {
            return ProbeOutcome::unknown(
                format!("host '{}' has no ipv4 or hostname", host.id),
                start.elapsed(),
            );
        };

        let count: u32 = check.option("count").and_then(|v| v.parse().ok()).unwrap_or(3);
        let loss_threshold_pct: f64 = check
            .option("loss_threshold_pct")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0);
        let deadline_secs = check.timeout.as_secs().max(1);

        let run = Command::new("ping")
            .arg("-c")
            .arg(count.to_string())
            .arg("-w")
            .arg(deadline_secs.to_string())
            .arg(&address)
            .output();

        let output = match tokio::time::timeout(check.timeout, run).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return ProbeOutcome::unknown(format!("ping spawn failed: {e}"), start.elapsed());
            }
            Err(_) => {
                return ProbeOutcome {
                    exit_code: ExitCode::UNKNOWN,
                    output: format!("ping timed out after {:?}", check.timeout),
                    long_output: None,
                    perf_data: None,
                    duration: start.elapsed(),
                };
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let duration = start.elapsed();

        let Some(loss_pct) = parse_packet_loss(&stdout) else {
            return ProbeOutcome {
                exit_code: ExitCode::UNKNOWN,
                output: format!("could not resolve or reach '{address}'"),
                long_output: Some(stdout),
                perf_data: None,
                duration,
            };
        };

        let avg_rtt_ms = parse_avg_rtt_ms(&stdout);
        let perf_data = avg_rtt_ms.map(|rtt| format!("rta={rtt}ms pl={loss_pct}%"));

        let exit_code = if loss_pct >= 100.0 {
            ExitCode::CRITICAL
        } else if loss_pct > loss_threshold_pct {
            ExitCode::WARNING
        } else {
            ExitCode::OK
        };

        let summary = match avg_rtt_ms {
            Some(rtt) => format!("{loss_pct}% packet loss, avg rtt {rtt}ms"),
            None => format!("{loss_pct}% packet loss"),
        };

        ProbeOutcome {
            exit_code,
            output: summary,
            long_output: Some(stdout),
            perf_data,
            duration,
        }
    }
}

fn parse_packet_loss(stdout: &str) -> Option<f64> {
    let line = stdout.lines().find(|l| l.contains("packet loss"))?;
    let before = line.split("% packet loss").next()?;
    let pct_str = before.rsplit(',').next()?.trim();
    pct_str.parse().ok()
}

fn parse_avg_rtt_ms(stdout: &str) -> Option<f64> {
    let line = stdout.lines().find(|l| l.contains("min/avg/max"))?;
    let values = line.split('=').nth(1)?;
    let avg_str = values.trim().split('/').nth(1)?;
    avg_str.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const IPROUTE2_OUTPUT: &str = "PING example.com (93.184.216.34) 56(84) bytes of data.\n\
64 bytes from 93.184.216.34: icmp_seq=1 ttl=56 time=11.2 ms\n\
64 bytes from 93.184.216.34: icmp_seq=2 ttl=56 time=10.8 ms\n\
64 bytes from 93.184.216.34: icmp_seq=3 ttl=56 time=11.5 ms\n\
\n\
--- example.com ping statistics ---\n\
3 packets transmitted, 3 received, 0% packet loss, time 2003ms\n\
rtt min/avg/max/mdev = 10.800/11.166/11.500/0.290 ms\n";

    const ALL_LOST_OUTPUT: &str = "PING 10.0.0.99 (10.0.0.99) 56(84) bytes of data.\n\
\n\
--- 10.0.0.99 ping statistics ---\n\
3 packets transmitted, 0 received, 100% packet loss, time 2044ms\n\
\n";

    const PARTIAL_LOSS_OUTPUT: &str = "PING 10.0.0.5 (10.0.0.5) 56(84) bytes of data.\n\
64 bytes from 10.0.0.5: icmp_seq=1 ttl=64 time=0.5 ms\n\
\n\
--- 10.0.0.5 ping statistics ---\n\
3 packets transmitted, 2 received, 33.3333% packet loss, time 2010ms\n\
rtt min/avg/max/mdev = 0.412/0.489/0.512/0.042 ms\n";

    #[test]
    fn parses_zero_loss_and_avg_rtt() {
        assert_eq!(parse_packet_loss(IPROUTE2_OUTPUT), Some(0.0));
        assert_eq!(parse_avg_rtt_ms(IPROUTE2_OUTPUT), Some(11.166));
    }

    #[test]
    fn parses_total_loss_with_no_rtt_line() {
        assert_eq!(parse_packet_loss(ALL_LOST_OUTPUT), Some(100.0));
        assert_eq!(parse_avg_rtt_ms(ALL_LOST_OUTPUT), None);
    }

    #[test]
    fn parses_fractional_packet_loss() {
        assert_eq!(parse_packet_loss(PARTIAL_LOSS_OUTPUT), Some(33.3333));
        assert_eq!(parse_avg_rtt_ms(PARTIAL_LOSS_OUTPUT), Some(0.489));
    }

    #[test]
    fn unparseable_output_yields_none() {
        assert_eq!(parse_packet_loss("ping: unknown host nowhere.invalid\n"), None);
    }

    #[tokio::test]
    async fn host_without_address_is_unknown() {
        let host = Host {
            id: vigil_domain::HostId::new("h1"),
            name: "h1".to_string(),
            display_name: None,
            ipv4: None,
            hostname: None,
            group: "default".into(),
            enabled: true,
            tags: std::collections::HashMap::new(),
            created_at: None,
            updated_at: None,
        };
        let check = Check {
            id: vigil_domain::CheckId::new("c1"),
            name: "c1".to_string(),
            check_type: CheckType::Ping,
            hosts: vec![host.id.clone()],
            intervals: vigil_domain::StateIntervals {
                ok: std::time::Duration::from_secs(60),
                warning: std::time::Duration::from_secs(30),
                critical: std::time::Duration::from_secs(15),
                unknown: std::time::Duration::from_secs(60),
            },
            threshold: 1,
            timeout: std::time::Duration::from_secs(2),
            enabled: true,
            options: std::collections::HashMap::new(),
            soft_fail_enabled: None,
        };

        let outcome = PingProbe::new().execute(&host, &check).await;
        assert_eq!(outcome.exit_code, ExitCode::UNKNOWN);
    }
}
