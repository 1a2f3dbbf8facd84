//! Vital-sign estimation over a complete sample window.

mod peak;

pub use peak::PeakRatioEstimator;

use crate::types::{RawEstimate, SampleWindow, VitalEstimate};

/// Heart-rate and SpO2 algorithm.
///
/// Receives exactly one complete window: infrared samples in `channel_a`,
/// red samples in `channel_b`, both in acquisition order and of equal length.
pub trait Estimator: Send + 'static {
    fn estimate(&self, channel_a: &[u32], channel_b: &[u32]) -> RawEstimate;
}

impl<F> Estimator for F
where
    F: Fn(&[u32], &[u32]) -> RawEstimate + Send + 'static,
{
    fn estimate(&self, channel_a: &[u32], channel_b: &[u32]) -> RawEstimate {
        self(channel_a, channel_b)
    }
}

/// Runs an [`Estimator`] and zeroes every value it marks invalid.
pub struct EstimatorAdapter {
    estimator: Box<dyn Estimator>,
}

impl EstimatorAdapter {
    pub fn new<E: Estimator>(estimator: E) -> Self {
        Self { estimator: Box::new(estimator) }
    }

    pub fn evaluate(&self, window: SampleWindow<'_>) -> VitalEstimate {
        VitalEstimate::from(self.estimator.estimate(window.channel_a, window.channel_b))
    }
}
