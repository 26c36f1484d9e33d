//! Capability error types.

use thiserror::Error;

use crate::types::CapabilityKind;

/// Errors a transport can report for a single capability call.
///
/// These never escape [`CapabilityClient::invoke`](crate::CapabilityClient::invoke):
/// the client logs them and substitutes the deterministic fallback.
#[derive(Error, Debug)]
pub enum CapabilityError {
    /// Network/connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Remote service answered with a non-success status
    #[error("Capability service returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// Remote call did not settle in time
    #[error("Request timed out")]
    Timeout,

    /// Transport answered with a payload for another capability
    #[error("Expected {expected} payload, got {actual}")]
    UnexpectedPayload {
        expected: CapabilityKind,
        actual: CapabilityKind,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CapabilityError {
    /// Short machine-friendly label, used as a tracing field.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Api { .. } => "api",
            Self::InvalidResponse(_) => "invalid_response",
            Self::Timeout => "timeout",
            Self::UnexpectedPayload { .. } => "unexpected_payload",
            Self::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CapabilityError::Api {
            status: 503,
            message: "unavailable".into(),
        };
        assert_eq!(
            err.to_string(),
            "Capability service returned status 503: unavailable"
        );

        let err = CapabilityError::UnexpectedPayload {
            expected: CapabilityKind::Inventory,
            actual: CapabilityKind::Navigation,
        };
        assert_eq!(err.to_string(), "Expected inventory payload, got navigation");
        assert_eq!(err.kind_label(), "unexpected_payload");
    }
}
