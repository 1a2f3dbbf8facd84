//! Network transport seam for delivering encoded telemetry records.

pub mod http;

use std::time::Duration;
use thiserror::Error;

pub use http::HttpTransport;

/// Transport-level failure: the request never produced an HTTP status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("DNS lookup failed: {0}")]
    Dns(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out")]
    Timeout,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Transport error: {0}")]
    Other(String),
}

/// Status and body returned by the collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16) -> Self {
        Self { status, body: String::new() }
    }
}

/// Request/response primitive used by the delivery protocol.
///
/// Implementations must not follow redirects: a 3xx status is part of the
/// classification the caller performs.
#[async_trait::async_trait]
pub trait Transport: Send + 'static {
    /// POST a JSON body to the collector.
    ///
    /// Returns:
    /// - `Ok(response)` - the collector answered with any HTTP status
    /// - `Err(e)` - DNS, connect, timeout or other transport failure
    async fn post_json(
        &mut self,
        body: &[u8],
        timeout: Duration,
    ) -> std::result::Result<TransportResponse, TransportError>;
}
