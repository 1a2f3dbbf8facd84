//! Peak-interval heart rate and ratio-of-ratios SpO2.

use tracing::trace;

use super::Estimator;
use crate::types::RawEstimate;

const SMOOTHING_WIDTH: usize = 4;
const MIN_HEART_RATE: i32 = 30;
const MAX_HEART_RATE: i32 = 240;
const MIN_RATIO: f32 = 0.2;
const MAX_RATIO: f32 = 1.84;

/// Reference estimator for reflective PPG windows.
///
/// Heart rate comes from the mean spacing of pulse peaks in the infrared
/// channel; SpO2 from the empirical calibration curve
/// `-45.060·R² + 30.354·R + 94.845` where `R` is the ratio of the red and
/// infrared perfusion indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakRatioEstimator {
    /// Sensor sample rate the window was acquired at.
    pub sample_rate_hz: f32,
    /// Mean infrared level below which no finger is assumed.
    pub min_dc: f32,
    /// Smallest pulsatile swing accepted as a heartbeat.
    pub min_pulse_amplitude: f32,
    /// Minimum spacing between two peaks, in samples.
    pub min_peak_distance: usize,
}

impl Default for PeakRatioEstimator {
    fn default() -> Self {
        Self {
            sample_rate_hz: 25.0,
            min_dc: 50_000.0,
            min_pulse_amplitude: 30.0,
            min_peak_distance: 4,
        }
    }
}

impl PeakRatioEstimator {
    pub fn with_sample_rate(sample_rate_hz: f32) -> Self {
        Self { sample_rate_hz, ..Self::default() }
    }

    fn heart_rate(&self, pulsatile: &[f32]) -> Option<i32> {
        let peaks = self.find_peaks(pulsatile);
        if peaks.len() < 2 {
            return None;
        }

        let span = (peaks[peaks.len() - 1] - peaks[0]) as f32;
        let interval = span / (peaks.len() - 1) as f32;
        let bpm = (60.0 * self.sample_rate_hz / interval).round() as i32;

        (MIN_HEART_RATE..=MAX_HEART_RATE).contains(&bpm).then_some(bpm)
    }

    fn find_peaks(&self, signal: &[f32]) -> Vec<usize> {
        let max = signal.iter().copied().fold(f32::MIN, f32::max);
        if max < self.min_pulse_amplitude {
            return Vec::new();
        }
        let threshold = max * 0.5;

        let mut peaks: Vec<usize> = Vec::new();
        for i in 1..signal.len().saturating_sub(1) {
            let value = signal[i];
            if value <= threshold || value <= signal[i - 1] || value < signal[i + 1] {
                continue;
            }
            match peaks.last_mut() {
                Some(last) if i - *last < self.min_peak_distance => {
                    if value > signal[*last] {
                        *last = i;
                    }
                }
                _ => peaks.push(i),
            }
        }
        peaks
    }

    fn spo2(&self, ir: &[u32], red: &[u32], dc_ir: f32) -> Option<i32> {
        let dc_red = mean(red);
        let ac_ir = peak_to_peak(ir);
        let ac_red = peak_to_peak(red);
        if dc_red <= 0.0 || ac_ir <= 0.0 {
            return None;
        }

        let ratio = (ac_red / dc_red) / (ac_ir / dc_ir);
        trace!(ratio, "Perfusion ratio");
        if !(MIN_RATIO..=MAX_RATIO).contains(&ratio) {
            return None;
        }

        let spo2 = -45.060 * ratio * ratio + 30.354 * ratio + 94.845;
        Some((spo2.round() as i32).min(100))
    }
}

impl Estimator for PeakRatioEstimator {
    fn estimate(&self, channel_a: &[u32], channel_b: &[u32]) -> RawEstimate {
        let len = channel_a.len().min(channel_b.len());
        if len <= SMOOTHING_WIDTH * 2 {
            return RawEstimate::invalid();
        }
        let (ir, red) = (&channel_a[..len], &channel_b[..len]);

        let dc_ir = mean(ir);
        if dc_ir < self.min_dc {
            trace!(dc_ir, "No finger on sensor");
            return RawEstimate::invalid();
        }

        // Absorption rises with each heartbeat, so the pulse shows up as a dip.
        let inverted: Vec<f32> = ir.iter().map(|&v| dc_ir - v as f32).collect();
        let pulsatile = moving_average(&inverted, SMOOTHING_WIDTH);

        let heart_rate = self.heart_rate(&pulsatile);
        let spo2 = self.spo2(ir, red, dc_ir);

        RawEstimate::new(
            heart_rate.unwrap_or(0),
            heart_rate.is_some(),
            spo2.unwrap_or(0),
            spo2.is_some(),
        )
    }
}

fn mean(values: &[u32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64) as f32
}

fn peak_to_peak(values: &[u32]) -> f32 {
    let max = values.iter().copied().max().unwrap_or(0);
    let min = values.iter().copied().min().unwrap_or(0);
    (max - min) as f32
}

fn moving_average(signal: &[f32], width: usize) -> Vec<f32> {
    signal.windows(width).map(|w| w.iter().sum::<f32>() / width as f32).collect()
}
