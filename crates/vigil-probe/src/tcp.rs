use std::net::ToSocketAddrs;
use std::time::Instant;

use async_trait::async_trait;
use tokio::net::TcpStream;
use vigil_domain::{Check, CheckType, ExitCode, Host};

use crate::probe::{Probe, ProbeOutcome};

/// TCP connect probe: 0 on a successful connection within `check.timeout`,
/// 2 on refusal or timeout, 3 on a DNS error or missing `port` option.
#[derive(Debug, Default, Clone)]
pub struct TcpProbe;

impl TcpProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Probe for TcpProbe {
    fn check_type(&self) -> CheckType {
        CheckType::Tcp
    }

    async fn execute(&self, host: &Host, check: &Check) -> ProbeOutcome {
        let start = Instant::now();

        let Some(address) = host.address() else {
            return ProbeOutcome::unknown(
                format!("host '{}' has no ipv4 or hostname", host.id),
                start.elapsed(),
            );
        };

        let Some(port) = check.option("port").and_then(|v| v.parse::<u16>().ok()) else {
            return ProbeOutcome::unknown(
                format!("check '{}' is missing a numeric 'port' option", check.id),
                start.elapsed(),
            );
        };

        let target = format!("{address}:{port}");
        let resolved = {
            let target = target.clone();
            tokio::task::spawn_blocking(move || target.to_socket_addrs().map(|mut it| it.next()))
                .await
        };

        let socket_addr = match resolved {
            Ok(Ok(Some(addr))) => addr,
            Ok(Ok(None)) | Ok(Err(_)) | Err(_) => {
                return ProbeOutcome {
                    exit_code: ExitCode::UNKNOWN,
                    output: format!("dns resolution failed for '{address}'"),
                    long_output: None,
                    perf_data: None,
                    duration: start.elapsed(),
                };
            }
        };

        match tokio::time::timeout(check.timeout, TcpStream::connect(socket_addr)).await {
            Ok(Ok(_stream)) => ProbeOutcome {
                exit_code: ExitCode::OK,
                output: format!("connected to {target}"),
                long_output: None,
                perf_data: Some(format!("connect_time={}ms", start.elapsed().as_millis())),
                duration: start.elapsed(),
            },
            Ok(Err(e)) => ProbeOutcome {
                exit_code: ExitCode::CRITICAL,
                output: format!("connection to {target} refused: {e}"),
                long_output: None,
                perf_data: None,
                duration: start.elapsed(),
            },
            Err(_) => ProbeOutcome {
                exit_code: ExitCode::CRITICAL,
                output: format!("connection to {target} timed out after {:?}", check.timeout),
                long_output: None,
                perf_data: None,
                duration: start.elapsed(),
            },
        }
    }
}
