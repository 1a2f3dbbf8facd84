//! Blocking HTTP client bridged onto the tokio blocking pool.

use std::time::Duration;
use tracing::trace;

use super::{Transport, TransportError, TransportResponse};
use crate::{AgentError, Result};

/// HTTP transport backed by a `ureq` agent.
#[derive(Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
    url: String,
}

impl HttpTransport {
    /// Create a transport posting to `url`.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AgentError::config(format!(
                "collector URL must start with http:// or https://, got '{}'",
                url
            )));
        }

        let agent = ureq::AgentBuilder::new()
            .redirects(0)
            .user_agent(&format!("vitalink/{}", env!("CARGO_PKG_VERSION")))
            .build();

        Ok(Self { agent, url })
    }

    /// The collector URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn send_blocking(
        agent: &ureq::Agent,
        url: &str,
        body: &[u8],
        timeout: Duration,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let response = agent
            .post(url)
            .set("Content-Type", "application/json")
            .timeout(timeout)
            .send_bytes(body);

        match response {
            Ok(resp) => {
                let status = resp.status();
                let body = resp.into_string().unwrap_or_default();
                Ok(TransportResponse { status, body })
            }
            Err(ureq::Error::Status(status, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Ok(TransportResponse { status, body })
            }
            Err(ureq::Error::Transport(transport)) => Err(classify(&transport)),
        }
    }
}

fn classify(transport: &ureq::Transport) -> TransportError {
    let message = transport.to_string();
    match transport.kind() {
        ureq::ErrorKind::Dns => TransportError::Dns(message),
        ureq::ErrorKind::ConnectionFailed => TransportError::Connect(message),
        ureq::ErrorKind::Io if message.contains("timed out") => TransportError::Timeout,
        ureq::ErrorKind::Io => TransportError::Io(message),
        _ => TransportError::Other(message),
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn post_json(
        &mut self,
        body: &[u8],
        timeout: Duration,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let agent = self.agent.clone();
        let url = self.url.clone();
        let body = body.to_vec();

        trace!(url = %url, bytes = body.len(), "POST telemetry");

        tokio::task::spawn_blocking(move || Self::send_blocking(&agent, &url, &body, timeout))
            .await
            .map_err(|e| TransportError::Other(format!("request task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_urls() {
        assert!(HttpTransport::new("ftp://collector").is_err());
        assert!(HttpTransport::new("collector/api").is_err());
    }

    #[test]
    fn keeps_the_configured_url() {
        let transport = HttpTransport::new("https://collector.example/api/telemetry/receive")
            .expect("valid url");
        assert_eq!(transport.url(), "https://collector.example/api/telemetry/receive");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        // Port 9 on localhost is the discard service, almost never listening.
        let mut transport = HttpTransport::new("http://127.0.0.1:9/receive").expect("valid url");
        let result = transport.post_json(b"{}", Duration::from_millis(500)).await;
        assert!(result.is_err());
    }
}
