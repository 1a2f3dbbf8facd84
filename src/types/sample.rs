//! Fixed-capacity dual-channel sample storage and the fill routine.

use std::time::Duration;
use tracing::trace;

use crate::retry::RetryPolicy;
use crate::sensor::WaveformSensor;
use crate::{AgentError, Result};

/// Default number of samples per estimation window.
pub const DEFAULT_CAPACITY: usize = 100;

/// One paired reading from the waveform sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sample {
    /// Infrared channel.
    pub channel_a: u32,
    /// Red channel.
    pub channel_b: u32,
}

impl Sample {
    pub const fn new(channel_a: u32, channel_b: u32) -> Self {
        Self { channel_a, channel_b }
    }
}

/// Timing of a buffer fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillPolicy {
    /// Availability polling per slot.
    pub poll: RetryPolicy,
    /// Pause after each consumed sample.
    pub inter_sample_delay: Duration,
}

impl Default for FillPolicy {
    fn default() -> Self {
        Self {
            poll: RetryPolicy::new(100, Duration::from_millis(10)),
            inter_sample_delay: Duration::from_millis(5),
        }
    }
}

impl FillPolicy {
    /// Fill policy without any sleeps.
    pub const fn immediate(poll_attempts: u32) -> Self {
        Self { poll: RetryPolicy::immediate(poll_attempts), inter_sample_delay: Duration::ZERO }
    }
}

/// Outcome of [`SampleBuffer::try_fill`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillResult {
    /// Every slot was filled.
    Complete,
    /// The sensor stopped producing data; the buffer holds `collected` samples.
    TimedOut { collected: usize },
}

/// Dual-channel sample store with a capacity fixed at construction.
///
/// Samples keep acquisition order. Only a full buffer hands out a
/// [`SampleWindow`], so a partial fill can never reach the estimator.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    channel_a: Box<[u32]>,
    channel_b: Box<[u32]>,
    len: usize,
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl SampleBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channel_a: vec![0; capacity].into_boxed_slice(),
            channel_b: vec![0; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.channel_a.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_complete(&self) -> bool {
        self.len == self.capacity()
    }

    /// Forget all stored samples.
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Append a sample.
    pub fn push(&mut self, sample: Sample) -> Result<()> {
        if self.is_complete() {
            return Err(AgentError::buffer_operation_error(
                format!("push into full buffer ({} samples)", self.len),
                self.capacity(),
            ));
        }
        self.channel_a[self.len] = sample.channel_a;
        self.channel_b[self.len] = sample.channel_b;
        self.len += 1;
        Ok(())
    }

    /// Read-only view of a complete buffer.
    pub fn window(&self) -> Option<SampleWindow<'_>> {
        (self.is_complete() && self.capacity() > 0)
            .then(|| SampleWindow { channel_a: &self.channel_a, channel_b: &self.channel_b })
    }

    /// Refill the buffer from `sensor`.
    ///
    /// Each slot polls the sensor under `policy.poll`; a slot that never
    /// becomes available aborts the fill. Each consumed sample advances the
    /// sensor's read cursor and is followed by `policy.inter_sample_delay`.
    pub async fn try_fill<S>(&mut self, sensor: &mut S, policy: &FillPolicy) -> FillResult
    where
        S: WaveformSensor + ?Sized,
    {
        self.reset();

        while !self.is_complete() {
            if !policy.poll.poll_until(|| sensor.data_available()).await {
                trace!(collected = self.len, "Sensor stopped producing samples");
                return FillResult::TimedOut { collected: self.len };
            }

            let sample = sensor.read_sample();
            self.channel_a[self.len] = sample.channel_a;
            self.channel_b[self.len] = sample.channel_b;
            self.len += 1;
            sensor.advance();

            if !policy.inter_sample_delay.is_zero() {
                tokio::time::sleep(policy.inter_sample_delay).await;
            }
        }

        FillResult::Complete
    }
}

/// Borrowed view over a complete [`SampleBuffer`].
#[derive(Debug, Clone, Copy)]
pub struct SampleWindow<'a> {
    pub channel_a: &'a [u32],
    pub channel_b: &'a [u32],
}

impl SampleWindow<'_> {
    pub fn len(&self) -> usize {
        self.channel_a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel_a.is_empty()
    }
}
