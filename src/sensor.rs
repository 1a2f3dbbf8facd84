//! Sensor traits and the startup initialization loop.

use std::time::Duration;
use tracing::{info, warn};

use crate::Result;
use crate::types::Sample;

/// Dual-channel photoplethysmography sensor with a sample FIFO.
///
/// Drivers are blocking; the agent paces calls with async sleeps so the
/// methods must return promptly.
pub trait WaveformSensor: Send + 'static {
    /// Probe the device and apply its configuration.
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Whether an unread sample is waiting. May refresh the FIFO.
    fn data_available(&mut self) -> bool;

    /// Read the sample at the read cursor without consuming it.
    fn read_sample(&mut self) -> Sample;

    /// Move the read cursor past the current sample.
    fn advance(&mut self);
}

/// Contactless skin temperature sensor.
pub trait TemperatureSensor: Send + 'static {
    /// Probe the device.
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    /// Single-shot object temperature in degrees Celsius.
    fn read_temperature_c(&mut self) -> f32;
}

/// Run `init` until it succeeds, sleeping `retry_delay` between attempts.
///
/// The device has no function without its sensors, so this never gives up.
/// Returns the number of attempts it took.
pub async fn initialize_until_ready<F>(name: &str, retry_delay: Duration, mut init: F) -> u32
where
    F: FnMut() -> Result<()>,
{
    let mut attempts = 1;
    loop {
        match init() {
            Ok(()) => {
                info!(sensor = name, attempts, "Sensor initialized");
                return attempts;
            }
            Err(e) => {
                warn!(sensor = name, attempt = attempts, "{}; retrying", e);
                tokio::time::sleep(retry_delay).await;
                attempts += 1;
            }
        }
    }
}
