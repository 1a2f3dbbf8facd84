//! Error types for the telemetry agent.
//!
//! Every failure the agent can observe is absorbed locally: acquisition
//! timeouts keep the previous estimate, delivery failures drop the record,
//! and sensor initialization failures hold startup in a retry loop. The
//! error values exist so those decisions can be logged with structured
//! context and so callers of the library API get typed results.
//!
//! ## Error Categories
//!
//! - **Sensor Errors**: hardware not detected or not answering at startup
//! - **Acquisition Errors**: the waveform sensor did not fill the buffer in time
//! - **Delivery Errors**: no network association, transient send failures,
//!   permanent rejection by the collector
//! - **Configuration Errors**: invalid or unreadable agent configuration
//! - **Buffer Errors**: writes past the fixed sample capacity
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use vitalink::AgentError;
//!
//! let error = AgentError::link_down();
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for agent operations.
pub type Result<T, E = AgentError> = std::result::Result<T, E>;

/// Main error type for agent operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AgentError {
    #[error("Sensor '{sensor}' failed to initialize: {reason}")]
    SensorInit { sensor: String, reason: String },

    #[error("Acquisition timed out after {collected}/{capacity} samples")]
    AcquisitionTimeout { collected: usize, capacity: usize },

    #[error("No network association")]
    LinkDown,

    #[error("Delivery failed after {attempts} attempt(s): {cause}")]
    TransientDelivery { attempts: u32, cause: String },

    #[error("Collector rejected the record with HTTP {status}")]
    PermanentRejection { status: u16 },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Configuration file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Failed to encode telemetry record: {details}")]
    Encode { details: String },

    #[error("Buffer operation failed: {context}")]
    Buffer { context: String, capacity: usize },
}

impl AgentError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            AgentError::SensorInit { .. } => true,
            AgentError::AcquisitionTimeout { .. } => true,
            AgentError::LinkDown => true,
            AgentError::TransientDelivery { .. } => true,
            AgentError::PermanentRejection { .. } => false,
            AgentError::Config { .. } => false,
            AgentError::File { .. } => false,
            AgentError::Parse { .. } => false,
            AgentError::Encode { .. } => false,
            AgentError::Buffer { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            AgentError::SensorInit { .. } => vec![
                "Check the sensor wiring and bus pull-ups",
                "Verify the sensor bus address",
                "Power-cycle the device",
            ],
            AgentError::AcquisitionTimeout { .. } => vec![
                "Check that the finger is placed on the sensor",
                "Verify the sensor sample rate matches the poll budget",
                "Increase the poll attempt budget",
            ],
            AgentError::LinkDown => vec![
                "Check that a configured network is in range",
                "Verify the network candidate list",
                "Wait for the next transmission tick to reconnect",
            ],
            AgentError::TransientDelivery { .. } => vec![
                "Check the collector is reachable",
                "Verify DNS resolution for the collector host",
                "Increase the request timeout",
            ],
            AgentError::PermanentRejection { .. } => vec![
                "Check the collector URL scheme and path",
                "Update the collector URL to the redirect target",
            ],
            AgentError::Config { .. } => vec![
                "Check configuration values against the documented ranges",
                "Remove overrides to fall back to defaults",
            ],
            AgentError::File { .. } => vec![
                "Check the configuration file exists and is readable",
                "Check file permissions",
            ],
            AgentError::Parse { .. } => vec![
                "Check the configuration file is valid YAML",
                "Verify field names and value types",
            ],
            AgentError::Encode { .. } => vec![
                "Check temperature readings are finite",
                "Verify record fields are serializable",
            ],
            AgentError::Buffer { .. } => vec![
                "Reset the buffer before refilling",
                "Verify the configured capacity",
            ],
        }
    }

    /// Helper constructor for sensor initialization errors.
    pub fn sensor_init(sensor: impl Into<String>, reason: impl Into<String>) -> Self {
        AgentError::SensorInit { sensor: sensor.into(), reason: reason.into() }
    }

    /// Helper constructor for acquisition timeouts.
    pub fn acquisition_timeout(collected: usize, capacity: usize) -> Self {
        AgentError::AcquisitionTimeout { collected, capacity }
    }

    /// Helper constructor for a missing network association.
    pub fn link_down() -> Self {
        AgentError::LinkDown
    }

    /// Helper constructor for an HTTP status that exhausted its retries.
    pub fn delivery_status(attempts: u32, status: u16) -> Self {
        AgentError::TransientDelivery { attempts, cause: format!("HTTP {}", status) }
    }

    /// Helper constructor for a transport error that exhausted its retries.
    pub fn delivery_transport(attempts: u32, error: &TransportError) -> Self {
        AgentError::TransientDelivery { attempts, cause: error.to_string() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        AgentError::Config { reason: reason.into() }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        AgentError::File { path, source }
    }

    /// Helper constructor for parse errors.
    pub fn parse(context: impl Into<String>, details: impl Into<String>) -> Self {
        AgentError::Parse { context: context.into(), details: details.into() }
    }

    /// Helper constructor for buffer operation errors.
    pub fn buffer_operation_error(context: impl Into<String>, capacity: usize) -> Self {
        AgentError::Buffer { context: context.into(), capacity }
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::Encode { details: err.to_string() }
    }
}

impl From<serde_yaml_ng::Error> for AgentError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        AgentError::Parse { context: "configuration".to_string(), details: err.to_string() }
    }
}
