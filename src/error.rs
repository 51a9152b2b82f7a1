//! Error types for the `TripSmith` planning pipeline
//!
//! Two boundaries, two types: `ProviderFault` classifies everything that can
//! go wrong talking to a single external provider, `PlanError` is the only
//! error the orchestrator surfaces to callers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::PartialFailureSet;

/// Classification of a provider-level failure.
///
/// The retry policy keys off this: `Timeout` and `TransientNetwork` get one
/// retry, everything else is surfaced as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultKind {
    /// The call did not complete within its per-attempt deadline
    Timeout,
    /// Connection-level or server-side failure likely to clear on retry
    TransientNetwork,
    /// Credentials rejected by the provider
    Authentication,
    /// The provider rejected the query itself
    InvalidQuery,
    /// The payload arrived but failed the normalization contract
    MalformedResponse,
    /// The planning session was abandoned while this call was in flight
    Cancelled,
}

impl FaultKind {
    /// Whether the single-retry policy applies to this kind.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, FaultKind::Timeout | FaultKind::TransientNetwork)
    }
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FaultKind::Timeout => "timeout",
            FaultKind::TransientNetwork => "transient network fault",
            FaultKind::Authentication => "authentication fault",
            FaultKind::InvalidQuery => "invalid query",
            FaultKind::MalformedResponse => "malformed response",
            FaultKind::Cancelled => "cancelled",
        };
        write!(f, "{label}")
    }
}

/// A single provider call's failure: what kind, and what the provider said.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ProviderFault {
    pub kind: FaultKind,
    pub message: String,
}

impl ProviderFault {
    pub fn new<S: Into<String>>(kind: FaultKind, message: S) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::new(FaultKind::Timeout, message)
    }

    pub fn transient<S: Into<String>>(message: S) -> Self {
        Self::new(FaultKind::TransientNetwork, message)
    }

    pub fn authentication<S: Into<String>>(message: S) -> Self {
        Self::new(FaultKind::Authentication, message)
    }

    pub fn invalid_query<S: Into<String>>(message: S) -> Self {
        Self::new(FaultKind::InvalidQuery, message)
    }

    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::new(FaultKind::MalformedResponse, message)
    }

    pub fn cancelled() -> Self {
        Self::new(FaultKind::Cancelled, "planning session abandoned")
    }
}

/// Every provider call resolves to exactly one of these.
pub type ProviderResult<T> = std::result::Result<T, ProviderFault>;

/// Errors the orchestrator surfaces past its own boundary.
///
/// Everything else is contained inside the returned `TravelPlan`.
#[derive(Error, Debug)]
pub enum PlanError {
    /// Caller error, rejected before any provider is contacted
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Flights, hotels, and attractions all failed; no usable plan exists
    #[error("All providers failed")]
    AllProvidersFailed(PartialFailureSet),
}

impl PlanError {
    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            PlanError::InvalidRequest(reason) => {
                format!("Please correct your request: {reason}")
            }
            PlanError::AllProvidersFailed(failures) => {
                let detail: Vec<String> = failures
                    .entries()
                    .iter()
                    .map(|f| format!("{}: {}", f.domain, f.kind))
                    .collect();
                format!(
                    "No travel data could be fetched right now ({}). Please try again later.",
                    detail.join(", ")
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_kinds() {
        assert!(FaultKind::Timeout.is_retryable());
        assert!(FaultKind::TransientNetwork.is_retryable());
        assert!(!FaultKind::Authentication.is_retryable());
        assert!(!FaultKind::InvalidQuery.is_retryable());
        assert!(!FaultKind::MalformedResponse.is_retryable());
        assert!(!FaultKind::Cancelled.is_retryable());
    }

    #[test]
    fn test_fault_display() {
        let fault = ProviderFault::authentication("key rejected");
        assert_eq!(fault.to_string(), "authentication fault: key rejected");
    }

    #[test]
    fn test_invalid_request_user_message() {
        let err = PlanError::InvalidRequest("end date before start date".to_string());
        assert!(err.user_message().contains("end date before start date"));
    }
}
