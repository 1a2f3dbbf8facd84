//! Driver spawns the acquisition and transmission cycles as separate tasks

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::acquisition::AcquisitionCycle;
use crate::clock::Clock;
use crate::transmission::TransmissionCycle;
use crate::types::VitalEstimate;

/// Handle to running driver tasks.
///
/// Dropping the handle cancels both tasks.
pub struct DriverHandle {
    /// Receiver for published estimates
    pub estimates: watch::Receiver<VitalEstimate>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl DriverHandle {
    /// Stream of estimates, starting with the current one.
    pub fn estimate_updates(&self) -> WatchStream<VitalEstimate> {
        WatchStream::new(self.estimates.clone())
    }

    /// Most recently published estimate.
    pub fn latest(&self) -> VitalEstimate {
        *self.estimates.borrow()
    }

    /// Cancel both tasks and wait for them to finish their current step.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                debug!("Driver task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for DriverHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Runs the two cycles concurrently.
///
/// The cycles share nothing but the estimate slot: acquisition is its only
/// writer, transmission its only reader. A slow delivery no longer delays
/// sampling, and a long acquisition no longer delays sends.
pub struct Driver;

impl Driver {
    /// Spawn one task per cycle. Each task ticks its cycle, then pauses for
    /// `pass_delay`.
    pub fn spawn(
        acquisition: AcquisitionCycle,
        transmission: TransmissionCycle,
        clock: Arc<dyn Clock>,
        pass_delay: Duration,
    ) -> DriverHandle {
        let estimates = acquisition.subscribe();
        let cancel = CancellationToken::new();

        let acquisition_task = tokio::spawn(Self::acquisition_task(
            acquisition,
            Arc::clone(&clock),
            pass_delay,
            cancel.clone(),
        ));
        let transmission_task =
            tokio::spawn(Self::transmission_task(transmission, clock, pass_delay, cancel.clone()));

        DriverHandle { estimates, cancel, tasks: vec![acquisition_task, transmission_task] }
    }

    async fn acquisition_task(
        mut cycle: AcquisitionCycle,
        clock: Arc<dyn Clock>,
        pass_delay: Duration,
        cancel: CancellationToken,
    ) {
        info!("Acquisition task started");
        let mut published = 0u64;

        while !cancel.is_cancelled() {
            if cycle.tick(clock.now_ms()).await {
                published += 1;
                trace!(published, "Estimate published");
            }
            if !Self::pause(&cancel, pass_delay).await {
                break;
            }
        }

        info!("Acquisition task ended ({} estimates published)", published);
    }

    async fn transmission_task(
        mut cycle: TransmissionCycle,
        clock: Arc<dyn Clock>,
        pass_delay: Duration,
        cancel: CancellationToken,
    ) {
        info!("Transmission task started");
        let mut delivered = 0u64;
        let mut dropped = 0u64;

        while !cancel.is_cancelled() {
            if let Some(report) = cycle.tick(clock.now_ms()).await {
                if report.outcome.is_delivered() {
                    delivered += 1;
                } else {
                    dropped += 1;
                }
            }
            if !Self::pause(&cancel, pass_delay).await {
                break;
            }
        }

        info!("Transmission task ended ({} delivered, {} dropped)", delivered, dropped);
    }

    /// Sleep unless cancelled first. Returns false on cancellation.
    async fn pause(cancel: &CancellationToken, delay: Duration) -> bool {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Driver task cancelled");
                false
            }
            _ = tokio::time::sleep(delay) => true,
        }
    }
}
