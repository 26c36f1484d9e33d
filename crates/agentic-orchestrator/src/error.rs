//! Orchestrator error types.

use thiserror::Error;

use crate::types::Strategy;

/// Errors that can end an orchestration run.
///
/// Capability failures are not in here: clients absorb them into degraded
/// results, so a run only fails on bad input, cancellation, or a fault
/// inside a strategy.
#[derive(Error, Debug)]
pub enum OrchestrationError {
    /// Request rejected before any capability was called
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Caller cancelled the run; no partial result is returned
    #[error("Orchestration cancelled")]
    Cancelled,

    /// Unexpected fault inside a strategy
    #[error("{strategy} strategy failed: {message}")]
    StrategyFailed { strategy: Strategy, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl OrchestrationError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, OrchestrationError::Cancelled)
    }
}

impl From<storefront_agentic_capabilities::CapabilityError> for OrchestrationError {
    fn from(e: storefront_agentic_capabilities::CapabilityError) -> Self {
        OrchestrationError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OrchestrationError::StrategyFailed {
            strategy: Strategy::GroupChat,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "GroupChat strategy failed: boom");
        assert!(OrchestrationError::Cancelled.is_cancelled());
    }
}
