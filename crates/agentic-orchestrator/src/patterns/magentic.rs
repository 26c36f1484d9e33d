//! Magentic Pattern - coordinator-directed plan, execute, refine, synthesize.
//!
//! ```text
//!   Coordinator: plan
//!        │
//!   ┌────┴─────────┐
//!   ▼              ▼
//! Inventory   Matchmaking     specialists, in parallel, plan as context
//!   └────┬─────────┘
//!        ▼
//!     Location                integrates specialist findings
//!        ▼
//!     Navigation              with position only
//!        ▼
//!   Adaptive Refinement       first N contributions
//!        ▼
//!   Coordinator: synthesis
//! ```
//!
//! Refinement only starts once every specialist step is in the ledger.

use async_trait::async_trait;
use chrono::Utc;
use futures::future::try_join;
use tracing::debug;

use storefront_agentic_capabilities::CapabilityKind;

use super::{OrchestrationStrategy, RunContext};
use crate::{
    error::OrchestrationError,
    ledger::{Step, StepLedger},
    routing::summarize_contributions,
    types::Strategy,
};

/// Agent name of the planning and synthesis steps.
pub const COORDINATOR_AGENT: &str = "Magentic Coordinator";

/// Agent name of the refinement step.
pub const REFINEMENT_AGENT: &str = "Adaptive Refinement";

/// Coordinator-led multi-phase orchestration.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagenticStrategy;

impl MagenticStrategy {
    pub fn new() -> Self {
        Self
    }
}

fn plan_for(query: &str, has_geo: bool) -> String {
    let route = if has_geo {
        " Navigation then builds a route from the shopper's position."
    } else {
        ""
    };
    format!(
        "Plan for '{query}': Inventory and Matchmaking specialists analyse availability and \
         alternatives in parallel; Location integrates their findings.{route} Results are \
         refined and synthesized by the coordinator."
    )
}

#[async_trait]
impl OrchestrationStrategy for MagenticStrategy {
    fn strategy(&self) -> Strategy {
        Strategy::Magentic
    }

    async fn run(
        &self,
        ctx: &RunContext<'_>,
        ledger: &mut StepLedger,
    ) -> Result<(), OrchestrationError> {
        let query = ctx.query();

        // 1. Plan
        let plan = plan_for(query, ctx.has_geo());
        ledger.append(Step::new(COORDINATOR_AGENT, "Create plan", plan.clone()));
        let first_contribution = ledger.len();

        // 2. Specialists
        let specialist_context = format!("Coordinator plan: {plan} Perform a deep analysis.");
        let started = Utc::now();
        let (inventory, matchmaking) = try_join(
            ctx.invoke(CapabilityKind::Inventory, Some(specialist_context.clone())),
            ctx.invoke(CapabilityKind::Matchmaking, Some(specialist_context)),
        )
        .await?;
        debug!("Magentic specialists joined");

        let findings = format!("{}; {}", inventory.summary, matchmaking.summary);
        for result in [inventory, matchmaking] {
            let text = format!("Deep analysis: {}", result.summary);
            let action = format!("Specialist analysis of '{query}'");
            ledger.append(Step::from_capability_with_text(action, result, text).at(started));
        }

        // 3. Location integrates
        let location = ctx
            .invoke(
                CapabilityKind::Location,
                Some(format!("Integrate specialist findings: {findings}")),
            )
            .await?;
        let location_summary = location.summary.clone();
        ledger.append(Step::from_capability(
            "Integrate specialist findings into store location",
            location,
        ));

        // 4. Navigation
        if ctx.has_geo() {
            let navigation = ctx
                .invoke(
                    CapabilityKind::Navigation,
                    Some(format!("Route to: {location_summary}")),
                )
                .await?;
            ledger.append(Step::from_capability("Plan in-store route", navigation));
        }

        // 5. Refinement
        let contributions = &ledger.steps()[first_contribution..];
        let specialist_count = contributions.len();
        let degraded_count = contributions.iter().filter(|s| s.is_degraded()).count();
        let refined = summarize_contributions(contributions, ctx.config.refinement_window);
        ledger.append(Step::new(
            REFINEMENT_AGENT,
            "Refine specialist contributions",
            format!("Refined insights: {refined}"),
        ));

        // 6. Synthesis
        let degraded_note = if degraded_count > 0 {
            format!(" ({degraded_count} answered from fallback data)")
        } else {
            String::new()
        };
        ledger.append(Step::new(
            COORDINATOR_AGENT,
            "Final synthesis",
            format!(
                "Synthesized {specialist_count} specialist contributions for '{query}'{degraded_note}."
            ),
        ));

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
    async fn test_phases_in_order() {
        let fixture = Fixture::new(
            Arc::new(StaticTransport::new()),
            "paint brush",
            Some(GeoPoint::new(1.0, 2.0)),
        );
        let mut ledger = StepLedger::new();

        MagenticStrategy.run(&fixture.ctx(), &mut ledger).await.unwrap();

        let agents: Vec<&str> = ledger.iter().map(|s| s.agent.as_str()).collect();
        assert_eq!(
            agents,
            [
                COORDINATOR_AGENT,
                "Inventory Agent",
                "Matchmaking Agent",
                "Location Agent",
                "Navigation Agent",
                REFINEMENT_AGENT,
                COORDINATOR_AGENT
            ]
        );
        assert!(ledger.steps()[1].result.starts_with("Deep analysis: "));
        assert_eq!(
            ledger.steps()[6].result,
            "Synthesized 4 specialist contributions for 'paint brush'."
        );
    }

    #[tokio::test]
    async fn test_refinement_window_and_context() {
        let transport = Arc::new(StaticTransport::recording());
        let fixture = Fixture::new(Arc::clone(&transport), "paint brush", Some(GeoPoint::new(1.0, 2.0)));
        let mut ledger = StepLedger::new();

        MagenticStrategy.run(&fixture.ctx(), &mut ledger).await.unwrap();

        let refinement = ledger.steps()[5].result.clone();
        assert!(refinement.contains("Inventory Agent: "));
        assert!(refinement.contains("Matchmaking Agent: "));
        assert!(refinement.contains("Location Agent: "));
        assert!(!refinement.contains("Navigation Agent: "));

        let inventory = transport.calls_for(CapabilityKind::Inventory).await;
        assert!(inventory[0]
            .context
            .as_deref()
            .unwrap()
            .starts_with("Coordinator plan: Plan for 'paint brush'"));

        let location = transport.calls_for(CapabilityKind::Location).await;
        assert!(location[0]
            .context
            .as_deref()
            .unwrap()
            .contains("Eco paint brush"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refinement_waits_for_slow_specialist() {
        let transport = Arc::new(
            StaticTransport::new()
                .delay(CapabilityKind::Matchmaking, Duration::from_secs(2))
                .fail(CapabilityKind::Inventory, "down"),
        );
        let fixture = Fixture::new(transport, "paint brush", None);
        let mut ledger = StepLedger::new();

        MagenticStrategy.run(&fixture.ctx(), &mut ledger).await.unwrap();

        let refinement = ledger
            .iter()
            .position(|s| s.agent == REFINEMENT_AGENT)
            .unwrap();
        let matchmaking = ledger
            .iter()
            .position(|s| s.capability == Some(CapabilityKind::Matchmaking))
            .unwrap();
        assert!(matchmaking < refinement);
        assert!(ledger.last().unwrap().result.contains("1 answered from fallback data"));
    }
}
