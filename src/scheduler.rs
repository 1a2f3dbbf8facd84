//! Cooperative scheduler driving both cycles from a single loop.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::acquisition::AcquisitionCycle;
use crate::clock::Clock;
use crate::transmission::TransmissionCycle;
use crate::types::DeliveryReport;

/// Interval timer fed by a monotonic millisecond clock.
///
/// Unset at boot, so the first check fires. Each firing records the current
/// time before the work it gates runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalGate {
    interval: Duration,
    last: Option<u64>,
}

impl IntervalGate {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// Fire if the interval has elapsed since the last firing.
    pub fn try_fire(&mut self, now_ms: u64) -> bool {
        let due = match self.last {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval.as_millis() as u64,
        };
        if due {
            self.last = Some(now_ms);
        }
        due
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// What a single scheduler pass did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PassSummary {
    /// A new estimate was published.
    pub estimated: bool,
    /// Report of the record sent this pass, if one was due.
    pub delivery: Option<DeliveryReport>,
}

/// Runs acquisition, then transmission, then pauses, forever.
///
/// Both cycles share one thread of control; the estimate slot is only ever
/// touched between their steps.
pub struct Scheduler {
    acquisition: AcquisitionCycle,
    transmission: TransmissionCycle,
    clock: Arc<dyn Clock>,
    pass_delay: Duration,
}

impl Scheduler {
    pub fn new(
        acquisition: AcquisitionCycle,
        transmission: TransmissionCycle,
        clock: Arc<dyn Clock>,
        pass_delay: Duration,
    ) -> Self {
        Self { acquisition, transmission, clock, pass_delay }
    }

    /// One pass: acquisition tick, transmission tick, pause.
    pub async fn run_pass(&mut self) -> PassSummary {
        let summary = self.step().await;
        tokio::time::sleep(self.pass_delay).await;
        summary
    }

    async fn step(&mut self) -> PassSummary {
        let estimated = self.acquisition.tick(self.clock.now_ms()).await;
        // Acquisition may have taken seconds; re-read the clock.
        let delivery = self.transmission.tick(self.clock.now_ms()).await;
        PassSummary { estimated, delivery }
    }

    /// Run passes until `cancel` fires.
    ///
    /// Cancellation is observed during the pause; a pass in progress always
    /// runs to completion.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            acquisition_ms = self.acquisition.interval().as_millis() as u64,
            transmission_ms = self.transmission.interval().as_millis() as u64,
            "Scheduler started"
        );
        let mut passes = 0u64;

        while !cancel.is_cancelled() {
            let summary = self.step().await;
            passes += 1;
            trace!(
                passes,
                estimated = summary.estimated,
                sent = summary.delivery.is_some(),
                "Pass finished"
            );

            tokio::select! {
                _ = cancel.cancelled() => debug!("Scheduler cancelled"),
                _ = tokio::time::sleep(self.pass_delay) => {}
            }
        }

        info!("Scheduler stopped after {} passes", passes);
    }
}
