//! Concurrent Pattern - fan-out/fan-in over every applicable capability.
//!
//! ```text
//!                 query
//!       ┌─────────┬─┴───────┬────────────┐
//!       ▼         ▼         ▼            ▼
//!   Inventory Matchmaking Location  Navigation (with position)
//!       └─────────┴────┬────┴────────────┘
//!                      ▼
//!                    join
//! ```
//!
//! Branches get the raw query only. A degraded branch does not affect its
//! siblings; cancellation stops all of them.

use async_trait::async_trait;
use chrono::Utc;
use futures::future::try_join_all;
use tracing::debug;

use storefront_agentic_capabilities::CapabilityKind;

use super::{OrchestrationStrategy, RunContext};
use crate::{
    error::OrchestrationError,
    ledger::{Step, StepLedger},
    types::Strategy,
};

/// Parallel fan-out with a join barrier.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcurrentStrategy;

impl ConcurrentStrategy {
    pub fn new() -> Self {
        Self
    }
}

fn action_for(kind: CapabilityKind, query: &str) -> String {
    match kind {
        CapabilityKind::Inventory => format!("Check stock for '{query}'"),
        CapabilityKind::Matchmaking => format!("Suggest alternatives for '{query}'"),
        CapabilityKind::Location => format!("Find store location of '{query}'"),
        CapabilityKind::Navigation => format!("Generate route to '{query}'"),
    }
}

#[async_trait]
impl OrchestrationStrategy for ConcurrentStrategy {
    fn strategy(&self) -> Strategy {
        Strategy::Concurrent
    }

    async fn run(
        &self,
        ctx: &RunContext<'_>,
        ledger: &mut StepLedger,
    ) -> Result<(), OrchestrationError> {
        let kinds = ctx.applicable_capabilities();
        let started = Utc::now();

        // Dropping the joined future on the first error drops every sibling.
        let results = try_join_all(kinds.iter().map(|kind| ctx.invoke(*kind, None))).await?;
        debug!(branches = results.len(), "Concurrent fan-out joined");

        for result in results {
            let action = action_for(result.capability, ctx.query());
            ledger.append(Step::from_capability(action, result).at(started));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use storefront_agentic_capabilities::{GeoPoint, StaticTransport};

    use super::super::test_support::Fixture;
    use super::*;

    #[tokio::test]
    async fn test_no_context_is_shared() {
        let transport = Arc::new(StaticTransport::recording());
        let fixture = Fixture::new(Arc::clone(&transport), "paint brush", Some(GeoPoint::new(1.0, 2.0)));
        let mut ledger = StepLedger::new();

        ConcurrentStrategy.run(&fixture.ctx(), &mut ledger).await.unwrap();

        assert_eq!(ledger.len(), 4);
        for call in transport.calls().await {
            assert_eq!(call.request.context, None);
            assert_eq!(call.request.query, "paint brush");
        }
    }

    #[tokio::test]
    async fn test_one_failing_branch_leaves_siblings_live() {
        let transport = Arc::new(StaticTransport::new().fail(CapabilityKind::Matchmaking, "503"));
        let fixture = Fixture::new(transport, "paint brush", None);
        let mut ledger = StepLedger::new();

        ConcurrentStrategy.run(&fixture.ctx(), &mut ledger).await.unwrap();

        let degraded: Vec<_> = ledger
            .iter()
            .filter(|s| s.is_degraded())
            .filter_map(|s| s.capability)
            .collect();
        assert_eq!(degraded, vec![CapabilityKind::Matchmaking]);
        assert_eq!(ledger.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_branches_run_in_parallel() {
        let delay = Duration::from_millis(400);
        let transport = Arc::new(
            StaticTransport::new()
                .delay(CapabilityKind::Inventory, delay)
                .delay(CapabilityKind::Matchmaking, delay)
                .delay(CapabilityKind::Location, delay),
        );
        let fixture = Fixture::new(transport, "paint brush", None);
        let mut ledger = StepLedger::new();

        let started = tokio::time::Instant::now();
        ConcurrentStrategy.run(&fixture.ctx(), &mut ledger).await.unwrap();

        assert!(started.elapsed() < delay * 2);
        let first = ledger.steps()[0].produced_at;
        assert!(ledger.iter().all(|s| s.produced_at == first));
    }
}
