//! Delivery protocol: link check, bounded retry with constant backoff.
//!
//! Every record ends in exactly one terminal outcome:
//!
//! - `LinkDown`: no association; the link is reconnected and nothing is sent
//! - `Delivered`: HTTP 200/201
//! - `Rejected`: HTTP 301/302, never retried
//! - `TransientFailure`: any other status or a transport error, retried up to
//!   the attempt budget with a fixed backoff between sends
//!
//! Records that are not delivered are dropped; there is no local queue.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::link::Link;
use crate::retry::RetryPolicy;
use crate::transport::{Transport, TransportError};
use crate::types::{DeliveryOutcome, DeliveryReport, FailureCause, TelemetryRecord};

/// Attempt budget and timing of the delivery protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryPolicy {
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::new(3, Duration::from_secs(2)),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Sends records over a [`Transport`] when the [`Link`] is up.
pub struct DeliveryProtocol {
    transport: Box<dyn Transport>,
    link: Box<dyn Link>,
    policy: DeliveryPolicy,
}

impl DeliveryProtocol {
    pub fn new<T: Transport, L: Link>(transport: T, link: L, policy: DeliveryPolicy) -> Self {
        Self { transport: Box::new(transport), link: Box::new(link), policy }
    }

    /// Deliver one record to its terminal outcome.
    pub async fn deliver(&mut self, record: &TelemetryRecord) -> DeliveryReport {
        if !self.link.is_associated() {
            warn!("Network association lost, reconnecting; record dropped");
            let reconnected = self.link.reconnect().await;
            debug!(reconnected, "Reconnect finished");
            return DeliveryReport { outcome: DeliveryOutcome::LinkDown, attempts: 0 };
        }

        let body = match record.to_json() {
            Ok(body) => body,
            Err(e) => {
                warn!("{}; record dropped", e);
                let cause = FailureCause::Transport(TransportError::Other(e.to_string()));
                return DeliveryReport {
                    outcome: DeliveryOutcome::TransientFailure(cause),
                    attempts: 0,
                };
            }
        };

        debug!(payload = %String::from_utf8_lossy(&body), "Sending telemetry");

        let retry = self.policy.retry;
        let budget = retry.budget();
        let mut attempts = 1;

        let outcome = loop {
            let result = self.transport.post_json(&body, self.policy.request_timeout).await;
            if let Ok(response) = &result {
                debug!(status = response.status, body = %response.body, "Collector response");
            }

            let outcome = DeliveryOutcome::classify(&result);
            if !outcome.is_retryable() || attempts >= budget {
                break outcome;
            }

            warn!(attempt = attempts, budget, "Delivery attempt failed: {:?}", outcome);
            retry.backoff().await;
            attempts += 1;
        };

        match outcome.error(attempts) {
            None => info!(attempts, "Telemetry delivered"),
            Some(e) => warn!("{}; record dropped", e),
        }

        DeliveryReport { outcome, attempts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeLink, ScriptedTransport};
    use crate::transport::TransportResponse;
    use crate::types::VitalEstimate;
    use tokio::time::Instant;

    fn record() -> TelemetryRecord {
        TelemetryRecord::new(1, &VitalEstimate::default(), 36.5, "2025-01-01T00:00:00")
    }

    #[tokio::test(start_paused = true)]
    async fn delivered_on_first_attempt() {
        let transport = ScriptedTransport::new([Ok(TransportResponse::new(201))]);
        let sent = transport.handle();
        let mut protocol = DeliveryProtocol::new(transport, FakeLink::up(), DeliveryPolicy::default());

        let report = protocol.deliver(&record()).await;

        assert_eq!(report, DeliveryReport { outcome: DeliveryOutcome::Delivered(201), attempts: 1 });
        assert_eq!(sent.calls(), 1);
        assert_eq!(sent.timeouts(), vec![Duration::from_secs(10)]);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_errors_exhaust_the_budget_with_fixed_backoff() {
        let transport = ScriptedTransport::new([
            Err(TransportError::Timeout),
            Err(TransportError::Dns("collector".to_string())),
            Err(TransportError::Connect("refused".to_string())),
        ]);
        let sent = transport.handle();
        let mut protocol = DeliveryProtocol::new(transport, FakeLink::up(), DeliveryPolicy::default());
        let start = Instant::now();

        let report = protocol.deliver(&record()).await;

        assert_eq!(report.attempts, 3);
        assert_eq!(
            report.outcome,
            DeliveryOutcome::TransientFailure(FailureCause::Transport(TransportError::Connect(
                "refused".to_string()
            )))
        );
        assert_eq!(sent.calls(), 3);
        let offsets: Vec<Duration> = sent.sent_at().iter().map(|t| *t - start).collect();
        assert_eq!(offsets, vec![Duration::ZERO, Duration::from_secs(2), Duration::from_secs(4)]);
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn redirect_is_rejected_without_retry() {
        let transport = ScriptedTransport::new([Ok(TransportResponse::new(302))]);
        let sent = transport.handle();
        let mut protocol = DeliveryProtocol::new(transport, FakeLink::up(), DeliveryPolicy::default());
        let start = Instant::now();

        let report = protocol.deliver(&record()).await;

        assert_eq!(report, DeliveryReport { outcome: DeliveryOutcome::Rejected(302), attempts: 1 });
        assert_eq!(sent.calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn server_error_then_success() {
        let transport = ScriptedTransport::new([
            Ok(TransportResponse::new(503)),
            Ok(TransportResponse::new(200)),
        ]);
        let mut protocol = DeliveryProtocol::new(transport, FakeLink::up(), DeliveryPolicy::default());
        let start = Instant::now();

        let report = protocol.deliver(&record()).await;

        assert_eq!(report, DeliveryReport { outcome: DeliveryOutcome::Delivered(200), attempts: 2 });
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn link_down_reconnects_and_sends_nothing() {
        let transport = ScriptedTransport::repeating(TransportResponse::new(200));
        let sent = transport.handle();
        let link = FakeLink::down();
        let link_state = link.handle();
        let mut protocol = DeliveryProtocol::new(transport, link, DeliveryPolicy::default());

        let report = protocol.deliver(&record()).await;

        assert_eq!(report, DeliveryReport { outcome: DeliveryOutcome::LinkDown, attempts: 0 });
        assert_eq!(sent.calls(), 0);
        assert_eq!(link_state.reconnects(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reconnected_link_drops_the_current_record_and_sends_the_next() {
        let transport = ScriptedTransport::repeating(TransportResponse::new(200));
        let sent = transport.handle();
        let link = FakeLink::down_until_reconnect();
        let link_state = link.handle();
        let mut protocol = DeliveryProtocol::new(transport, link, DeliveryPolicy::default());

        let first = protocol.deliver(&record()).await;

        assert_eq!(first, DeliveryReport { outcome: DeliveryOutcome::LinkDown, attempts: 0 });
        assert_eq!(sent.calls(), 0);
        assert_eq!(link_state.reconnects(), 1);

        let second = protocol.deliver(&record()).await;

        assert_eq!(second, DeliveryReport { outcome: DeliveryOutcome::Delivered(200), attempts: 1 });
        assert_eq!(sent.calls(), 1);
        assert_eq!(link_state.reconnects(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn every_send_carries_the_same_json_body() {
        let transport = ScriptedTransport::new([
            Ok(TransportResponse::new(500)),
            Ok(TransportResponse::new(201)),
        ]);
        let sent = transport.handle();
        let mut protocol = DeliveryProtocol::new(transport, FakeLink::up(), DeliveryPolicy::default());

        protocol.deliver(&record()).await;

        let bodies = sent.bodies();
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0], bodies[1]);
        let value: serde_json::Value = serde_json::from_slice(&bodies[0]).unwrap();
        assert_eq!(value["device_id"], 1);
    }
}
