//! Vital-sign estimate types.

use serde::{Deserialize, Serialize};

/// Estimator output before normalization.
///
/// Numeric fields are meaningless when the matching `*_valid` flag is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawEstimate {
    pub heart_rate: i32,
    pub heart_rate_valid: bool,
    pub spo2: i32,
    pub spo2_valid: bool,
}

impl RawEstimate {
    pub const fn new(heart_rate: i32, heart_rate_valid: bool, spo2: i32, spo2_valid: bool) -> Self {
        Self { heart_rate, heart_rate_valid, spo2, spo2_valid }
    }

    /// Both values invalid.
    pub const fn invalid() -> Self {
        Self::new(0, false, 0, false)
    }
}

/// Most recent normalized estimate.
///
/// An invalid field always carries `0`. The default value, used before the
/// first acquisition completes, is all-zero and invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VitalEstimate {
    pub heart_rate: i32,
    pub heart_rate_valid: bool,
    pub spo2: i32,
    pub spo2_valid: bool,
}

impl From<RawEstimate> for VitalEstimate {
    fn from(raw: RawEstimate) -> Self {
        Self {
            heart_rate: if raw.heart_rate_valid { raw.heart_rate } else { 0 },
            heart_rate_valid: raw.heart_rate_valid,
            spo2: if raw.spo2_valid { raw.spo2 } else { 0 },
            spo2_valid: raw.spo2_valid,
        }
    }
}
