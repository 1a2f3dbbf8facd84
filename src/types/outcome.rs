//! Classification of delivery attempts.

use crate::AgentError;
use crate::transport::{TransportError, TransportResponse};

/// Why an attempt counts as transient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    Status(u16),
    Transport(TransportError),
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureCause::Status(status) => write!(f, "HTTP {}", status),
            FailureCause::Transport(err) => write!(f, "{}", err),
        }
    }
}

/// Result of delivering one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Collector accepted the record (200 or 201).
    Delivered(u16),
    /// Collector redirected (301 or 302); never retried.
    Rejected(u16),
    /// Any other status or a transport error.
    TransientFailure(FailureCause),
    /// No network association; nothing was sent.
    LinkDown,
}

impl DeliveryOutcome {
    /// Classify the result of one send.
    pub fn classify(result: &Result<TransportResponse, TransportError>) -> Self {
        match result {
            Ok(response) => match response.status {
                200 | 201 => DeliveryOutcome::Delivered(response.status),
                301 | 302 => DeliveryOutcome::Rejected(response.status),
                status => DeliveryOutcome::TransientFailure(FailureCause::Status(status)),
            },
            Err(err) => DeliveryOutcome::TransientFailure(FailureCause::Transport(err.clone())),
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered(_))
    }

    /// Whether another attempt may follow this one.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DeliveryOutcome::TransientFailure(_))
    }

    /// Error describing a dropped record, `None` when delivered.
    pub fn error(&self, attempts: u32) -> Option<AgentError> {
        match self {
            DeliveryOutcome::Delivered(_) => None,
            DeliveryOutcome::Rejected(status) => {
                Some(AgentError::PermanentRejection { status: *status })
            }
            DeliveryOutcome::TransientFailure(FailureCause::Status(status)) => {
                Some(AgentError::delivery_status(attempts, *status))
            }
            DeliveryOutcome::TransientFailure(FailureCause::Transport(err)) => {
                Some(AgentError::delivery_transport(attempts, err))
            }
            DeliveryOutcome::LinkDown => Some(AgentError::link_down()),
        }
    }
}

/// Terminal outcome of a record and the sends it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub outcome: DeliveryOutcome,
    pub attempts: u32,
}
