//! Agent configuration loaded from YAML.
//!
//! Every field has a default equal to the device's documented constants, so
//! an empty document is a valid configuration.
//!
//! ```yaml
//! device_id: 4
//! collector_url: http://collector.local:8080/api/telemetry
//! scheduler:
//!   mode: concurrent
//! network:
//!   candidates:
//!     - ssid: ward-3
//!       passphrase: secret
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::delivery::DeliveryPolicy;
use crate::link::NetworkCandidate;
use crate::retry::RetryPolicy;
use crate::types::{DEFAULT_CAPACITY, FillPolicy};
use crate::{AgentError, Result};

/// Collector endpoint used when none is configured.
pub const DEFAULT_COLLECTOR_URL: &str = "http://127.0.0.1:8080/api/telemetry";

/// Top-level agent configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    pub device_id: u32,
    pub collector_url: String,
    pub acquisition: AcquisitionConfig,
    pub transmission: TransmissionConfig,
    pub delivery: DeliveryConfig,
    pub scheduler: SchedulerConfig,
    pub startup: StartupConfig,
    pub network: NetworkConfig,
    pub estimator: EstimatorConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            device_id: 1,
            collector_url: DEFAULT_COLLECTOR_URL.to_string(),
            acquisition: AcquisitionConfig::default(),
            transmission: TransmissionConfig::default(),
            delivery: DeliveryConfig::default(),
            scheduler: SchedulerConfig::default(),
            startup: StartupConfig::default(),
            network: NetworkConfig::default(),
            estimator: EstimatorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AcquisitionConfig {
    pub interval_ms: u64,
    pub capacity: usize,
    pub poll_attempts: u32,
    pub poll_delay_ms: u64,
    pub inter_sample_delay_ms: u64,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            capacity: DEFAULT_CAPACITY,
            poll_attempts: 100,
            poll_delay_ms: 10,
            inter_sample_delay_ms: 5,
        }
    }
}

impl AcquisitionConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn fill_policy(&self) -> FillPolicy {
        FillPolicy {
            poll: RetryPolicy::new(self.poll_attempts, Duration::from_millis(self.poll_delay_ms)),
            inter_sample_delay: Duration::from_millis(self.inter_sample_delay_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransmissionConfig {
    pub interval_ms: u64,
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

impl TransmissionConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeliveryConfig {
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self { max_attempts: 3, backoff_ms: 2000, request_timeout_ms: 10_000 }
    }
}

impl DeliveryConfig {
    pub fn policy(&self) -> DeliveryPolicy {
        DeliveryPolicy {
            retry: RetryPolicy::new(self.max_attempts, Duration::from_millis(self.backoff_ms)),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }
}

/// How the two cycles share the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulingMode {
    /// One loop alternating acquisition and transmission.
    #[default]
    Cooperative,
    /// Acquisition and transmission as separate tasks.
    Concurrent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    pub pass_delay_ms: u64,
    pub mode: SchedulingMode,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { pass_delay_ms: 100, mode: SchedulingMode::Cooperative }
    }
}

impl SchedulerConfig {
    pub fn pass_delay(&self) -> Duration {
        Duration::from_millis(self.pass_delay_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StartupConfig {
    pub sensor_retry_ms: u64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self { sensor_retry_ms: 1000 }
    }
}

impl StartupConfig {
    pub fn sensor_retry(&self) -> Duration {
        Duration::from_millis(self.sensor_retry_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    pub association_timeout_ms: u64,
    pub status_poll_ms: u64,
    pub candidates: Vec<NetworkCandidate>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { association_timeout_ms: 10_000, status_poll_ms: 500, candidates: Vec::new() }
    }
}

impl NetworkConfig {
    pub fn association_timeout(&self) -> Duration {
        Duration::from_millis(self.association_timeout_ms)
    }

    pub fn status_poll(&self) -> Duration {
        Duration::from_millis(self.status_poll_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EstimatorConfig {
    pub sample_rate_hz: f32,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self { sample_rate_hz: 25.0 }
    }
}

impl AgentConfig {
    /// Read and validate a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| AgentError::file_error(path.to_path_buf(), e))?;
        debug!(path = %path.display(), bytes = text.len(), "Loaded configuration file");
        Self::from_yaml_str(&text)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml_ng::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values that would stall or break the agent.
    pub fn validate(&self) -> Result<()> {
        if self.acquisition.capacity == 0 {
            return Err(AgentError::config("acquisition.capacity must be greater than zero"));
        }
        if self.acquisition.interval_ms == 0 {
            return Err(AgentError::config("acquisition.interval_ms must be greater than zero"));
        }
        if self.acquisition.poll_attempts == 0 {
            return Err(AgentError::config("acquisition.poll_attempts must be greater than zero"));
        }
        if self.transmission.interval_ms == 0 {
            return Err(AgentError::config("transmission.interval_ms must be greater than zero"));
        }
        if self.scheduler.pass_delay_ms == 0 {
            return Err(AgentError::config("scheduler.pass_delay_ms must be greater than zero"));
        }
        if self.delivery.max_attempts == 0 {
            return Err(AgentError::config("delivery.max_attempts must be greater than zero"));
        }
        if self.delivery.request_timeout_ms == 0 {
            return Err(AgentError::config("delivery.request_timeout_ms must be greater than zero"));
        }
        if !(self.collector_url.starts_with("http://") || self.collector_url.starts_with("https://"))
        {
            return Err(AgentError::config(format!(
                "collector_url must be an http(s) URL, got '{}'",
                self.collector_url
            )));
        }
        if self.network.status_poll_ms == 0
            || self.network.status_poll_ms > self.network.association_timeout_ms
        {
            return Err(AgentError::config(
                "network.status_poll_ms must be non-zero and not above association_timeout_ms",
            ));
        }
        if self.estimator.sample_rate_hz.is_nan() || self.estimator.sample_rate_hz <= 0.0 {
            return Err(AgentError::config("estimator.sample_rate_hz must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_uses_device_defaults() {
        let config = AgentConfig::from_yaml_str("").unwrap();
        assert_eq!(config, AgentConfig::default());
        assert_eq!(config.device_id, 1);
        assert_eq!(config.acquisition.interval(), Duration::from_millis(2000));
        assert_eq!(config.acquisition.fill_policy(), FillPolicy::default());
        assert_eq!(config.transmission.interval(), Duration::from_secs(1));
        assert_eq!(config.delivery.policy(), DeliveryPolicy::default());
        assert_eq!(config.scheduler.pass_delay(), Duration::from_millis(100));
        assert_eq!(config.scheduler.mode, SchedulingMode::Cooperative);
        assert_eq!(config.startup.sensor_retry(), Duration::from_secs(1));
    }

    #[test]
    fn partial_document_overrides_only_named_fields() {
        let yaml = r#"
device_id: 9
collector_url: https://collector.example/api/telemetry
delivery:
  max_attempts: 5
scheduler:
  mode: concurrent
network:
  candidates:
    - ssid: ward-3
      passphrase: secret
    - ssid: open-guest
"#;
        let config = AgentConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.device_id, 9);
        assert_eq!(config.delivery.max_attempts, 5);
        assert_eq!(config.delivery.backoff_ms, 2000);
        assert_eq!(config.scheduler.mode, SchedulingMode::Concurrent);
        assert_eq!(
            config.network.candidates,
            vec![NetworkCandidate::new("ward-3", "secret"), NetworkCandidate::new("open-guest", "")]
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = AgentConfig::from_yaml_str("device_idd: 3").unwrap_err();
        assert!(matches!(err, AgentError::Parse { .. }), "{err:?}");
    }

    #[test]
    fn zero_capacity_is_invalid() {
        let err = AgentConfig::from_yaml_str("acquisition:\n  capacity: 0").unwrap_err();
        assert!(matches!(err, AgentError::Config { .. }));
    }

    #[test]
    fn zero_pass_delay_is_invalid() {
        let err = AgentConfig::from_yaml_str("scheduler:\n  pass_delay_ms: 0").unwrap_err();
        assert!(err.to_string().contains("scheduler.pass_delay_ms"));
        assert!(AgentConfig::from_yaml_str("scheduler:\n  pass_delay_ms: 1").is_ok());
    }

    #[test]
    fn non_http_collector_is_invalid() {
        let err = AgentConfig::from_yaml_str("collector_url: ftp://collector").unwrap_err();
        assert!(err.to_string().contains("ftp://collector"));
    }

    #[test]
    fn status_poll_above_timeout_is_invalid() {
        let yaml = "network:\n  association_timeout_ms: 400\n  status_poll_ms: 500";
        assert!(AgentConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn load_reads_file_and_reports_missing_path() {
        let dir = std::env::temp_dir().join(format!("vitalink-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("agent.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "device_id: 12").unwrap();

        assert_eq!(AgentConfig::load(&path).unwrap().device_id, 12);

        let missing = AgentConfig::load(dir.join("missing.yaml")).unwrap_err();
        assert!(matches!(missing, AgentError::File { .. }));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn serialized_defaults_parse_back() {
        let yaml = serde_yaml_ng::to_string(&AgentConfig::default()).unwrap();
        assert_eq!(AgentConfig::from_yaml_str(&yaml).unwrap(), AgentConfig::default());
    }
}
