//! Transmission cycle: build a record from the latest estimate and deliver it.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

use crate::clock::Clock;
use crate::delivery::DeliveryProtocol;
use crate::scheduler::IntervalGate;
use crate::sensor::TemperatureSensor;
use crate::types::{DeliveryReport, TelemetryRecord, VitalEstimate};

/// Periodic record builder and sender.
///
/// Reads the estimate slot without waiting for a fresh value; the same
/// estimate may be sent several times.
pub struct TransmissionCycle {
    temperature: Box<dyn TemperatureSensor>,
    delivery: DeliveryProtocol,
    estimates: watch::Receiver<VitalEstimate>,
    clock: Arc<dyn Clock>,
    device_id: u32,
    gate: IntervalGate,
}

impl TransmissionCycle {
    pub fn new<T: TemperatureSensor>(
        temperature: T,
        delivery: DeliveryProtocol,
        estimates: watch::Receiver<VitalEstimate>,
        clock: Arc<dyn Clock>,
        device_id: u32,
        interval: Duration,
    ) -> Self {
        Self {
            temperature: Box::new(temperature),
            delivery,
            estimates,
            clock,
            device_id,
            gate: IntervalGate::new(interval),
        }
    }

    /// Assemble the record for right now.
    pub fn build_record(&mut self) -> TelemetryRecord {
        let estimate = *self.estimates.borrow_and_update();
        let temp_skin = self.temperature.read_temperature_c();
        TelemetryRecord::new(self.device_id, &estimate, temp_skin, self.clock.timestamp())
    }

    /// Send one record if the interval has elapsed.
    pub async fn tick(&mut self, now_ms: u64) -> Option<DeliveryReport> {
        if !self.gate.try_fire(now_ms) {
            return None;
        }

        let record = self.build_record();
        debug!(
            heart_rate = record.heart_rate,
            spo2 = record.spo2,
            temp_skin = record.temp_skin,
            timestamp = %record.timestamp,
            "Built telemetry record"
        );
        Some(self.delivery.deliver(&record).await)
    }

    pub fn interval(&self) -> Duration {
        self.gate.interval()
    }
}
