//! Orchestration Patterns - the five ways a run can coordinate capabilities.
//!
//! # Available Patterns
//!
//! | Pattern | Flow | Context passed to capabilities |
//! |---------|------|--------------------------------|
//! | [`SequentialStrategy`] | Inventory → Matchmaking → Location → (Navigation) | Growing summary of earlier results |
//! | [`ConcurrentStrategy`] | All applicable capabilities at once, joined | Raw query only |
//! | [`HandoffStrategy`] | Router, then table-driven transitions until Complete | Handoff trail |
//! | [`GroupChatStrategy`] | Manager, scripted rounds, manager | Rendered turn prompt |
//! | [`MagenticStrategy`] | Plan, parallel specialists, integrate, refine, synthesize | Coordinator plan |
//!
//! Every pattern records its progress in a [`StepLedger`](crate::ledger::StepLedger)
//! and never sees a capability error: clients degrade to fallbacks. The only
//! error a pattern returns is [`OrchestrationError::Cancelled`].

mod concurrent;
mod group_chat;
mod handoff;
mod magentic;
mod sequential;

pub use concurrent::ConcurrentStrategy;
pub use group_chat::{GroupChatScript, GroupChatStrategy, Participant, Round, Turn, TurnCondition};
pub use handoff::{HandoffStrategy, ROUTER_AGENT};
pub use magentic::{MagenticStrategy, COORDINATOR_AGENT, REFINEMENT_AGENT};
pub use sequential::SequentialStrategy;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use storefront_agentic_capabilities::{
    CapabilityKind, CapabilityRequest, CapabilityResult, Framework,
};

use crate::{
    capabilities::CapabilitySet, config::OrchestratorConfig, error::OrchestrationError,
    ledger::StepLedger, types::OrchestrationRequest, types::Strategy,
};

// ============================================================================
// STRATEGY TRAIT
// ============================================================================

/// One orchestration algorithm.
#[async_trait]
pub trait OrchestrationStrategy: Send + Sync {
    /// Which of the five strategies this is.
    fn strategy(&self) -> Strategy;

    /// Drive the capabilities for one run, appending every step to `ledger`.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Cancelled`] if the run is cancelled.
    async fn run(
        &self,
        ctx: &RunContext<'_>,
        ledger: &mut StepLedger,
    ) -> Result<(), OrchestrationError>;
}

// ============================================================================
// RUN CONTEXT
// ============================================================================

/// Request-scoped state handed to a strategy.
#[derive(Debug, Clone)]
pub struct RunContext<'a> {
    pub run_id: Uuid,
    pub request: &'a OrchestrationRequest,
    pub capabilities: &'a CapabilitySet,
    pub config: &'a OrchestratorConfig,
    /// Backend every capability call of this run targets.
    pub framework: Framework,
    pub cancel: CancellationToken,
}

impl<'a> RunContext<'a> {
    pub fn query(&self) -> &str {
        self.request.query()
    }

    pub fn has_geo(&self) -> bool {
        crate::routing::requires_navigation(self.request.location())
    }

    /// Capability request carrying the query, position, framework and `context`.
    pub fn request_for(&self, context: Option<String>) -> CapabilityRequest {
        let request = CapabilityRequest::new(self.query())
            .with_location(self.request.location())
            .with_framework(self.framework);
        match context {
            Some(context) => request.with_context(context),
            None => request,
        }
    }

    /// Call one capability for this run.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Cancelled`] if the run is cancelled
    /// while the call is in flight.
    pub async fn invoke(
        &self,
        kind: CapabilityKind,
        context: Option<String>,
    ) -> Result<CapabilityResult, OrchestrationError> {
        let request = self.request_for(context);
        self.capabilities.invoke(kind, &request, &self.cancel).await
    }

    /// Capabilities that apply to every run: Navigation only with a position.
    pub fn applicable_capabilities(&self) -> Vec<CapabilityKind> {
        CapabilityKind::ALL
            .into_iter()
            .filter(|kind| *kind != CapabilityKind::Navigation || self.has_geo())
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use storefront_agentic_capabilities::{GeoPoint, StaticTransport};

    use super::*;

    /// Owns everything a [`RunContext`] borrows.
    pub struct Fixture {
        pub request: OrchestrationRequest,
        pub capabilities: CapabilitySet,
        pub config: OrchestratorConfig,
        pub cancel: CancellationToken,
    }

    impl Fixture {
        pub fn new(transport: Arc<StaticTransport>, query: &str, location: Option<GeoPoint>) -> Self {
            Self {
                request: OrchestrationRequest::new(query, "u1", location).unwrap(),
                capabilities: CapabilitySet::from_transport(transport, Duration::from_secs(5)),
                config: OrchestratorConfig::default(),
                cancel: CancellationToken::new(),
            }
        }

        pub fn ctx(&self) -> RunContext<'_> {
            RunContext {
                run_id: Uuid::new_v4(),
                request: &self.request,
                capabilities: &self.capabilities,
                config: &self.config,
                framework: Framework::default(),
                cancel: self.cancel.clone(),
            }
        }
    }
}
