//! Acquisition cycle: fill the sample buffer and publish a fresh estimate.

use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::AgentError;
use crate::estimator::EstimatorAdapter;
use crate::scheduler::IntervalGate;
use crate::sensor::WaveformSensor;
use crate::types::{FillPolicy, FillResult, SampleBuffer, VitalEstimate};

/// Periodic waveform acquisition.
///
/// Owns the sample buffer and is the only writer of the estimate slot.
pub struct AcquisitionCycle {
    sensor: Box<dyn WaveformSensor>,
    adapter: EstimatorAdapter,
    buffer: SampleBuffer,
    policy: FillPolicy,
    gate: IntervalGate,
    estimates: watch::Sender<VitalEstimate>,
}

impl AcquisitionCycle {
    /// Create a cycle and the receiving end of its estimate slot.
    pub fn new<S: WaveformSensor>(
        sensor: S,
        adapter: EstimatorAdapter,
        capacity: usize,
        policy: FillPolicy,
        interval: Duration,
    ) -> (Self, watch::Receiver<VitalEstimate>) {
        let (estimates, receiver) = watch::channel(VitalEstimate::default());
        let cycle = Self {
            sensor: Box::new(sensor),
            adapter,
            buffer: SampleBuffer::with_capacity(capacity),
            policy,
            gate: IntervalGate::new(interval),
            estimates,
        };
        (cycle, receiver)
    }

    /// Run one acquisition if the interval has elapsed.
    ///
    /// Returns whether a new estimate was published. A timed-out fill keeps
    /// the previous estimate.
    pub async fn tick(&mut self, now_ms: u64) -> bool {
        if !self.gate.try_fire(now_ms) {
            return false;
        }

        match self.buffer.try_fill(self.sensor.as_mut(), &self.policy).await {
            FillResult::TimedOut { collected } => {
                let err = AgentError::acquisition_timeout(collected, self.buffer.capacity());
                warn!("{}; keeping previous estimate", err);
                false
            }
            FillResult::Complete => {
                let Some(window) = self.buffer.window() else {
                    return false;
                };
                let estimate = self.adapter.evaluate(window);
                info!(
                    heart_rate = estimate.heart_rate,
                    spo2 = estimate.spo2,
                    heart_rate_valid = estimate.heart_rate_valid,
                    spo2_valid = estimate.spo2_valid,
                    "New vital estimate"
                );
                self.estimates.send_replace(estimate);
                true
            }
        }
    }

    /// Most recently published estimate.
    pub fn latest(&self) -> VitalEstimate {
        *self.estimates.borrow()
    }

    /// Another receiver for the estimate slot.
    pub fn subscribe(&self) -> watch::Receiver<VitalEstimate> {
        debug!("New estimate subscriber");
        self.estimates.subscribe()
    }

    pub fn interval(&self) -> Duration {
        self.gate.interval()
    }
}
