use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use vigil_domain::PushTransportConfig;

use crate::error::NotifyError;

/// Ceiling on every outbound notification call, regardless of what the
/// remote end does.
const TRANSPORT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
pub struct PushMessage<'a> {
    pub title: &'a str,
    pub body: &'a str,
}

#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(&self, message: &PushMessage<'_>) -> Result<(), NotifyError>;
}

/// Posts `{title, body}` as JSON to a configured webhook URL, bearer-authed
/// with `token` when one is set.
#[derive(Debug, Clone)]
pub struct HttpPushTransport {
    client: Client,
    config: PushTransportConfig,
}

impl HttpPushTransport {
    pub fn new(config: PushTransportConfig) -> Self {
        let client = Client::builder()
            .timeout(TRANSPORT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, config }
    }
}

#[async_trait]
impl PushTransport for HttpPushTransport {
    async fn send(&self, message: &PushMessage<'_>) -> Result<(), NotifyError> {
        let Some(url) = &self.config.url else {
            return Err(NotifyError::NotConfigured);
        };

        let mut request = self.client.post(url).json(message);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::TransportStatus(response.status()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_transport_errors_without_a_network_call() {
        let transport = HttpPushTransport::new(PushTransportConfig { url: None, token: None });
        let message = PushMessage { title: "t", body: "b" };
        let result = transport.send(&message).await;
        assert!(matches!(result, Err(NotifyError::NotConfigured)));
    }
}
