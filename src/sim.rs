//! Simulated sensors for running the agent without hardware.
//!
//! Default levels follow a resting adult: 72 bpm, a perfusion ratio giving
//! roughly 97 % SpO2, and a skin temperature of 36.5 °C.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;

use crate::sensor::{TemperatureSensor, WaveformSensor};
use crate::types::Sample;

const DC_INFRARED: f64 = 120_000.0;
const DC_RED: f64 = 90_000.0;
const PERFUSION_INDEX: f64 = 0.02;

/// Synthetic reflective PPG source.
///
/// Each heartbeat is a raised-cosine dip on both channels. The red dip is
/// scaled so the red/infrared perfusion ratio equals `ratio`.
pub struct SimulatedPpg {
    heart_rate_bpm: f64,
    ratio: f64,
    sample_rate_hz: f64,
    noise: u32,
    cursor: u64,
    rng: StdRng,
}

impl SimulatedPpg {
    pub fn new(heart_rate_bpm: f32, ratio: f32) -> Self {
        Self {
            heart_rate_bpm: heart_rate_bpm as f64,
            ratio: ratio as f64,
            sample_rate_hz: 25.0,
            noise: 20,
            cursor: 0,
            rng: StdRng::seed_from_u64(0x5eed),
        }
    }

    /// Peak noise in sensor counts added to both channels.
    pub fn with_noise(mut self, noise: u32) -> Self {
        self.noise = noise;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate_hz: f32) -> Self {
        self.sample_rate_hz = sample_rate_hz as f64;
        self
    }

    pub fn with_heart_rate(mut self, heart_rate_bpm: f32) -> Self {
        self.set_heart_rate(heart_rate_bpm);
        self
    }

    /// Change the simulated heart rate from the next sample on.
    pub fn set_heart_rate(&mut self, heart_rate_bpm: f32) {
        self.heart_rate_bpm = heart_rate_bpm as f64;
    }

    fn jitter(&mut self) -> f64 {
        if self.noise == 0 {
            return 0.0;
        }
        let noise = self.noise as i64;
        self.rng.gen_range(-noise..=noise) as f64
    }
}

impl Default for SimulatedPpg {
    fn default() -> Self {
        Self::new(72.0, 0.6)
    }
}

impl WaveformSensor for SimulatedPpg {
    fn data_available(&mut self) -> bool {
        true
    }

    fn read_sample(&mut self) -> Sample {
        let seconds = self.cursor as f64 / self.sample_rate_hz;
        let phase = seconds * self.heart_rate_bpm / 60.0;
        let pulse = 0.5 * (1.0 - (TAU * phase).cos());

        let ac_infrared = DC_INFRARED * PERFUSION_INDEX;
        let ac_red = DC_RED * PERFUSION_INDEX * self.ratio;

        let infrared = DC_INFRARED - ac_infrared * pulse + self.jitter();
        let red = DC_RED - ac_red * pulse + self.jitter();

        Sample::new(infrared.max(0.0) as u32, red.max(0.0) as u32)
    }

    fn advance(&mut self) {
        self.cursor += 1;
    }
}

/// Skin temperature around a fixed baseline.
pub struct SimulatedThermometer {
    base_c: f32,
    noise_c: f32,
    rng: StdRng,
}

impl SimulatedThermometer {
    pub fn new(base_c: f32) -> Self {
        Self { base_c, noise_c: 0.2, rng: StdRng::seed_from_u64(0x7e3) }
    }

    pub fn with_noise(mut self, noise_c: f32) -> Self {
        self.noise_c = noise_c.abs();
        self
    }
}

impl Default for SimulatedThermometer {
    fn default() -> Self {
        Self::new(36.5)
    }
}

impl TemperatureSensor for SimulatedThermometer {
    fn read_temperature_c(&mut self) -> f32 {
        if self.noise_c == 0.0 {
            return self.base_c;
        }
        let reading = self.base_c + self.rng.gen_range(-self.noise_c..=self.noise_c);
        (reading * 10.0).round() / 10.0
    }
}
