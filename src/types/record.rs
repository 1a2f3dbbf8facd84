//! Outbound telemetry record.

use serde::{Deserialize, Serialize};

use super::VitalEstimate;
use crate::Result;

/// One reading sent to the collector.
///
/// Field order matches the collector's documented JSON layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub device_id: u32,
    pub heart_rate: i32,
    pub spo2: i32,
    pub temp_skin: f32,
    pub timestamp: String,
}

impl TelemetryRecord {
    /// Build a record from the current estimate and a fresh temperature.
    pub fn new(
        device_id: u32,
        estimate: &VitalEstimate,
        temp_skin: f32,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            device_id,
            heart_rate: estimate.heart_rate,
            spo2: estimate.spo2,
            temp_skin,
            timestamp: timestamp.into(),
        }
    }

    /// JSON body for the collector.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
