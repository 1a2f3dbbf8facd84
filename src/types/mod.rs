//! Core data types flowing through the agent.
//!
//! ## Data Flow
//!
//! - [`Sample`] pairs from the waveform sensor fill a [`SampleBuffer`]
//! - a complete buffer yields a [`SampleWindow`] for the estimator, which
//!   returns a [`RawEstimate`]
//! - normalization turns it into the published [`VitalEstimate`]
//! - each transmission tick builds a [`TelemetryRecord`] and delivers it,
//!   producing a [`DeliveryReport`]
//!
//! ## Usage Example
//!
//! ```rust
//! use vitalink::types::{RawEstimate, TelemetryRecord, VitalEstimate};
//!
//! let estimate = VitalEstimate::from(RawEstimate::new(72, true, 140, false));
//! assert_eq!(estimate.spo2, 0);
//!
//! let record = TelemetryRecord::new(1, &estimate, 36.5, "2025-01-01T00:00:00");
//! let json = String::from_utf8(record.to_json().unwrap()).unwrap();
//! assert!(json.contains("\"heart_rate\":72"));
//! ```

mod estimate;
mod outcome;
mod record;
mod sample;

pub use estimate::{RawEstimate, VitalEstimate};
pub use outcome::{DeliveryOutcome, DeliveryReport, FailureCause};
pub use record::TelemetryRecord;
pub use sample::{DEFAULT_CAPACITY, FillPolicy, FillResult, Sample, SampleBuffer, SampleWindow};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{TransportError, TransportResponse};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn invalid_fields_are_reported_as_zero(
            heart_rate in any::<i32>(),
            heart_rate_valid in any::<bool>(),
            spo2 in any::<i32>(),
            spo2_valid in any::<bool>(),
        ) {
            let estimate = VitalEstimate::from(RawEstimate::new(heart_rate, heart_rate_valid, spo2, spo2_valid));

            prop_assert_eq!(estimate.heart_rate_valid, heart_rate_valid);
            prop_assert_eq!(estimate.spo2_valid, spo2_valid);
            prop_assert_eq!(estimate.heart_rate, if heart_rate_valid { heart_rate } else { 0 });
            prop_assert_eq!(estimate.spo2, if spo2_valid { spo2 } else { 0 });
        }

        #[test]
        fn statuses_classify_into_exactly_one_outcome(status in 100u16..600u16) {
            let outcome = DeliveryOutcome::classify(&Ok(TransportResponse::new(status)));
            match status {
                200 | 201 => prop_assert_eq!(outcome, DeliveryOutcome::Delivered(status)),
                301 | 302 => prop_assert_eq!(outcome, DeliveryOutcome::Rejected(status)),
                _ => prop_assert_eq!(outcome, DeliveryOutcome::TransientFailure(FailureCause::Status(status))),
            }
        }
    }

    #[test]
    fn record_serializes_in_collector_layout() {
        let estimate = VitalEstimate::from(RawEstimate::new(72, true, 98, true));
        let record = TelemetryRecord::new(1, &estimate, 36.5, "2025-06-01T12:00:00");

        let json = String::from_utf8(record.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"device_id":1,"heart_rate":72,"spo2":98,"temp_skin":36.5,"timestamp":"2025-06-01T12:00:00"}"#
        );
    }

    #[test]
    fn invalid_estimate_serializes_zeros() {
        let estimate = VitalEstimate::from(RawEstimate::new(187, false, 41, false));
        let record = TelemetryRecord::new(1, &estimate, 36.1, "1234");
        let value: serde_json::Value = serde_json::from_slice(&record.to_json().unwrap()).unwrap();

        assert_eq!(value["heart_rate"], 0);
        assert_eq!(value["spo2"], 0);
        assert_eq!(value["timestamp"], "1234");
    }

    #[test]
    fn default_estimate_is_invalid_zero() {
        let estimate = VitalEstimate::default();
        assert_eq!(estimate, VitalEstimate::from(RawEstimate::invalid()));
        assert!(!estimate.heart_rate_valid && !estimate.spo2_valid);
    }

    #[test]
    fn transport_errors_are_transient() {
        let outcome = DeliveryOutcome::classify(&Err(TransportError::Timeout));
        assert!(outcome.is_retryable());
        assert!(!outcome.is_delivered());
        assert!(outcome.error(3).is_some_and(|e| e.is_retryable()));
    }

    #[test]
    fn rejection_error_is_permanent() {
        let outcome = DeliveryOutcome::classify(&Ok(TransportResponse::new(302)));
        assert!(!outcome.is_retryable());
        assert!(outcome.error(1).is_some_and(|e| !e.is_retryable()));
        assert!(DeliveryOutcome::Delivered(200).error(1).is_none());
    }
}
