//! Handoff Pattern - router plus table-driven transitions.
//!
//! A router step picks the entry capability from the query. After each
//! capability the [`HandoffTable`] decides the next one from the step's
//! result text and what has run so far, until it says `Complete` or the step
//! cap (router step included, never below router plus one capability) is
//! reached. Each step records the decision it
//! led to in [`Step::next`].

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{OrchestrationStrategy, RunContext};
use crate::{
    config::MIN_HANDOFF_STEPS,
    error::OrchestrationError,
    ledger::{Step, StepLedger},
    routing::{classify_entry, HandoffState, HandoffTable, RoutingSnapshot},
    types::Strategy,
};

/// Agent name of the router step.
pub const ROUTER_AGENT: &str = "Handoff Router";

/// Dynamic routing across capabilities.
#[derive(Debug, Clone, Default)]
pub struct HandoffStrategy {
    table: HandoffTable,
}

impl HandoffStrategy {
    pub fn new(table: HandoffTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &HandoffTable {
        &self.table
    }
}

fn action_for(state: HandoffState, query: &str) -> String {
    match state {
        HandoffState::Inventory => format!("Search inventory for '{query}'"),
        HandoffState::Matchmaking => format!("Find alternatives for '{query}'"),
        HandoffState::Location => format!("Locate '{query}' in store"),
        HandoffState::Navigation => format!("Plan route to '{query}'"),
        HandoffState::Complete => "Complete".to_string(),
    }
}

#[async_trait]
impl OrchestrationStrategy for HandoffStrategy {
    fn strategy(&self) -> Strategy {
        Strategy::Handoff
    }

    async fn run(
        &self,
        ctx: &RunContext<'_>,
        ledger: &mut StepLedger,
    ) -> Result<(), OrchestrationError> {
        let max_steps = ctx.config.handoff_max_steps.max(MIN_HANDOFF_STEPS);
        let policy = &ctx.config.keywords;

        let entry = classify_entry(ctx.query(), policy);
        ledger.append(
            Step::new(
                ROUTER_AGENT,
                format!("Classify '{}'", ctx.query()),
                format!("Routing to {entry}"),
            )
            .with_next(entry.to_string()),
        );

        let mut trail: Vec<String> = Vec::new();
        let mut state = entry;

        while let Some(kind) = state.capability() {
            let context = if trail.is_empty() {
                None
            } else {
                Some(format!("Handed off after {}", trail.join("; ")))
            };

            let result = ctx.invoke(kind, context).await?;
            let step = Step::from_capability(action_for(state, ctx.query()), result);

            let snapshot = RoutingSnapshot::pending(&step, ledger, ctx.has_geo());
            let mut next = self.table.next(state, &snapshot, policy);
            if ledger.len() + 1 >= max_steps && !next.is_complete() {
                warn!(max_steps, blocked = %next, "Handoff step cap reached, completing");
                next = HandoffState::Complete;
            }
            debug!(from = %state, to = %next, "Handoff decision");

            trail.push(format!("{}: {}", step.agent, step.result));
            ledger.append(step.with_next(next.to_string()));
            state = next;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use storefront_agentic_capabilities::{
        CapabilityKind, CapabilityPayload, GeoPoint, InventoryResult, LocationResult,
        StaticTransport,
    };

    use super::super::test_support::Fixture;
    use super::*;
    use crate::routing::{Guard, Transition};

    fn path(ledger: &StepLedger) -> Vec<String> {
        ledger.iter().map(|s| s.agent.clone()).collect()
    }

    fn empty_inventory() -> CapabilityPayload {
        CapabilityPayload::Inventory(InventoryResult { products: vec![] })
    }

    #[tokio::test]
    async fn test_inventory_first_happy_path() {
        let fixture = Fixture::new(Arc::new(StaticTransport::new()), "is paint in stock", None);
        let mut ledger = StepLedger::new();

        HandoffStrategy::default().run(&fixture.ctx(), &mut ledger).await.unwrap();

        assert_eq!(path(&ledger), ["Handoff Router", "Inventory Agent", "Location Agent"]);
        let nexts: Vec<_> = ledger.iter().map(|s| s.next.clone().unwrap()).collect();
        assert_eq!(nexts, ["Inventory", "Location", "Complete"]);
    }

    #[tokio::test]
    async fn test_empty_inventory_hands_off_to_matchmaking() {
        let transport = Arc::new(
            StaticTransport::recording().respond_with(CapabilityKind::Inventory, empty_inventory()),
        );
        let fixture = Fixture::new(
            Arc::clone(&transport),
            "search paint brush",
            Some(GeoPoint::new(1.0, 2.0)),
        );
        let mut ledger = StepLedger::new();

        HandoffStrategy::default().run(&fixture.ctx(), &mut ledger).await.unwrap();

        assert_eq!(
            path(&ledger),
            [
                "Handoff Router",
                "Inventory Agent",
                "Matchmaking Agent",
                "Location Agent",
                "Navigation Agent"
            ]
        );

        let matchmaking = transport.calls_for(CapabilityKind::Matchmaking).await;
        assert!(matchmaking[0]
            .context
            .as_deref()
            .unwrap()
            .contains("0 products found"));
    }

    #[tokio::test]
    async fn test_location_first_not_found() {
        let transport = Arc::new(StaticTransport::new().respond_with(
            CapabilityKind::Location,
            CapabilityPayload::Location(LocationResult {
                found: false,
                aisle: String::new(),
                section: String::new(),
                description: String::new(),
            }),
        ));
        let fixture = Fixture::new(transport, "where are the hammers", None);
        let mut ledger = StepLedger::new();

        HandoffStrategy::default().run(&fixture.ctx(), &mut ledger).await.unwrap();

        assert_eq!(path(&ledger), ["Handoff Router", "Location Agent", "Matchmaking Agent"]);
        assert_eq!(ledger.last().unwrap().next.as_deref(), Some("Complete"));
    }

    #[tokio::test]
    async fn test_step_cap_forces_complete() {
        use HandoffState::*;

        // Ping-pong forever without the cap.
        let table = HandoffTable::new(vec![
            Transition::new(Inventory, Guard::Always, Matchmaking),
            Transition::new(Matchmaking, Guard::Always, Inventory),
        ]);
        let mut fixture = Fixture::new(Arc::new(StaticTransport::new()), "stock check", None);
        fixture.config.handoff_max_steps = 5;
        let mut ledger = StepLedger::new();

        HandoffStrategy::new(table).run(&fixture.ctx(), &mut ledger).await.unwrap();

        assert_eq!(ledger.len(), 5);
        assert_eq!(ledger.last().unwrap().next.as_deref(), Some("Complete"));
    }

    #[tokio::test]
    async fn test_smallest_cap_still_calls_one_capability() {
        let mut fixture = Fixture::new(Arc::new(StaticTransport::new()), "stock check", None);
        fixture.config.handoff_max_steps = 1;
        assert!(matches!(
            fixture.config.validate(),
            Err(OrchestrationError::Config(_))
        ));

        let mut ledger = StepLedger::new();
        HandoffStrategy::default().run(&fixture.ctx(), &mut ledger).await.unwrap();

        assert_eq!(path(&ledger), ["Handoff Router", "Inventory Agent"]);
        assert_eq!(ledger.steps()[0].next.as_deref(), Some("Inventory"));
        assert_eq!(ledger.last().unwrap().next.as_deref(), Some("Complete"));
    }

    #[tokio::test]
    async fn test_query_text_does_not_fake_an_empty_inventory() {
        let fixture = Fixture::new(Arc::new(StaticTransport::new()), "stock of 0 products", None);
        let mut ledger = StepLedger::new();

        HandoffStrategy::default().run(&fixture.ctx(), &mut ledger).await.unwrap();

        assert_eq!(path(&ledger), ["Handoff Router", "Inventory Agent", "Location Agent"]);
        assert_eq!(ledger.steps()[1].next.as_deref(), Some("Location"));
    }

    #[tokio::test]
    async fn test_query_text_does_not_fake_a_location_miss() {
        let fixture = Fixture::new(Arc::new(StaticTransport::new()), "not found", None);
        let mut ledger = StepLedger::new();

        HandoffStrategy::default().run(&fixture.ctx(), &mut ledger).await.unwrap();

        assert_eq!(path(&ledger), ["Handoff Router", "Location Agent"]);
    }
}
