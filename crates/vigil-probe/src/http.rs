use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use vigil_domain::{Check, CheckType, ExitCode, Host};

use crate::probe::{Probe, ProbeOutcome};

/// Single HTTP(S) request probe.
///
/// Options: `scheme` (default `http`), `port`, `path` (default `/`), `method`
/// (default `GET`), `expected_status` (default `200`), `body_contains`.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for HttpProbe {
    fn check_type(&self) -> CheckType {
        CheckType::Http
    }

    async fn execute(&self, host: &Host, check: &Check) -> ProbeOutcome {
        let start = Instant::now();

        let Some(address) = host.address() else {
            return ProbeOutcome::unknown(
                format!("host '{}' has no ipv4 or hostname", host.id),
                start.elapsed(),
            );
        };

        let scheme = check.option("scheme").unwrap_or("http");
        let path = check.option("path").unwrap_or("/");
        let method_name = check.option("method").unwrap_or("GET").to_uppercase();
        let expected_status: u16 = check
            .option("expected_status")
            .and_then(|v| v.parse().ok())
            .unwrap_or(200);
        let body_contains = check.option("body_contains");

        let authority = match check.option("port") {
            Some(port) => format!("{address}:{port}"),
            None => address.clone(),
        };
        let url = format!("{scheme}://{authority}{path}");

        let method = match method_name.as_str() {
            "POST" => reqwest::Method::POST,
            "HEAD" => reqwest::Method::HEAD,
            "PUT" => reqwest::Method::PUT,
            "DELETE" => reqwest::Method::DELETE,
            _ => reqwest::Method::GET,
        };

        let request = self.client.request(method, &url).timeout(check.timeout);

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                let duration = start.elapsed();
                let message = e.to_string();
                if message.to_lowercase().contains("dns") {
                    return ProbeOutcome {
                        exit_code: ExitCode::UNKNOWN,
                        output: format!("dns error requesting {url}: {message}"),
                        long_output: None,
                        perf_data: None,
                        duration,
                    };
                }
                return ProbeOutcome {
                    exit_code: ExitCode::CRITICAL,
                    output: format!("request to {url} failed: {message}"),
                    long_output: None,
                    perf_data: None,
                    duration,
                };
            }
        };

        let status = response.status();
        let perf_data = Some(format!("response_time={}ms", start.elapsed().as_millis()));

        if status.as_u16() != expected_status {
            return ProbeOutcome {
                exit_code: ExitCode::WARNING,
                output: format!("expected status {expected_status}, got {status}"),
                long_output: None,
                perf_data,
                duration: start.elapsed(),
            };
        }

        if let Some(needle) = body_contains {
            let needle = needle.to_string();
            let body = response.text().await.unwrap_or_default();
            let duration = start.elapsed();
            if !body.contains(&needle) {
                return ProbeOutcome {
                    exit_code: ExitCode::WARNING,
                    output: format!("response body does not contain '{needle}'"),
                    long_output: Some(body),
                    perf_data,
                    duration,
                };
            }
            return ProbeOutcome {
                exit_code: ExitCode::OK,
                output: format!("{status} and body matched '{needle}'"),
                long_output: None,
                perf_data,
                duration,
            };
        }

        ProbeOutcome {
            exit_code: ExitCode::OK,
            output: format!("{status}"),
            long_output: None,
            perf_data,
            duration: start.elapsed(),
        }
    }
}
