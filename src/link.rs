//! Network association: link status checks and the candidate-list join routine.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::NetworkConfig;
use crate::retry::RetryPolicy;

/// Network association seen by the delivery protocol.
#[async_trait::async_trait]
pub trait Link: Send + 'static {
    /// Whether an association is currently established.
    fn is_associated(&self) -> bool;

    /// Re-run the association routine. Returns whether it succeeded.
    async fn reconnect(&mut self) -> bool;
}

/// Link for hosts whose network is managed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

#[async_trait::async_trait]
impl Link for AlwaysOnline {
    fn is_associated(&self) -> bool {
        true
    }

    async fn reconnect(&mut self) -> bool {
        true
    }
}

/// One network the device may join, in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCandidate {
    pub ssid: String,
    #[serde(default)]
    pub passphrase: String,
}

impl NetworkCandidate {
    pub fn new(ssid: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self { ssid: ssid.into(), passphrase: passphrase.into() }
    }
}

/// Radio driver used by [`CandidateAssociation`].
pub trait NetworkInterface: Send + Sync + 'static {
    /// Start joining `ssid`. Returns immediately.
    fn begin(&mut self, ssid: &str, passphrase: &str);

    /// Whether the last join has completed.
    fn is_connected(&self) -> bool;
}

/// Joins the first reachable network from an ordered candidate list.
pub struct CandidateAssociation<N: NetworkInterface> {
    interface: N,
    candidates: Vec<NetworkCandidate>,
    poll: RetryPolicy,
    connected_to: Option<String>,
}

impl<N: NetworkInterface> CandidateAssociation<N> {
    /// Each candidate gets `timeout`, checked every `status_poll`.
    pub fn new(
        interface: N,
        candidates: Vec<NetworkCandidate>,
        timeout: Duration,
        status_poll: Duration,
    ) -> Self {
        let step = status_poll.max(Duration::from_millis(1));
        let attempts = (timeout.as_millis() / step.as_millis()).max(1) as u32;
        Self { interface, candidates, poll: RetryPolicy::new(attempts, step), connected_to: None }
    }

    /// Build from the `network` section of the agent configuration.
    pub fn from_config(interface: N, config: &NetworkConfig) -> Self {
        Self::new(
            interface,
            config.candidates.clone(),
            config.association_timeout(),
            config.status_poll(),
        )
    }

    /// SSID of the network joined by the last successful association.
    pub fn connected_to(&self) -> Option<&str> {
        self.connected_to.as_deref()
    }

    /// Try every candidate in order until one connects.
    pub async fn associate(&mut self) -> bool {
        self.connected_to = None;

        for candidate in &self.candidates {
            info!(ssid = %candidate.ssid, "Joining network");
            self.interface.begin(&candidate.ssid, &candidate.passphrase);

            let interface = &self.interface;
            if self.poll.poll_until(|| interface.is_connected()).await {
                info!(ssid = %candidate.ssid, "Network joined");
                self.connected_to = Some(candidate.ssid.clone());
                return true;
            }
            debug!(ssid = %candidate.ssid, "Join timed out, trying next candidate");
        }

        warn!(candidates = self.candidates.len(), "Could not join any network");
        false
    }
}

#[async_trait::async_trait]
impl<N: NetworkInterface> Link for CandidateAssociation<N> {
    fn is_associated(&self) -> bool {
        self.interface.is_connected()
    }

    async fn reconnect(&mut self) -> bool {
        self.associate().await
    }
}
