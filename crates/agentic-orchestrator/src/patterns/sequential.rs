//! Sequential Pattern - linear pipeline with a growing context.
//!
//! ```text
//! Inventory ──▶ Matchmaking ──▶ Location ──▶ Navigation (with position)
//! ```
//!
//! Each stage receives a summary of every earlier result, e.g. the
//! Matchmaking call gets "Based on inventory: 2 products found ..., find
//! alternatives". A degraded stage is still threaded forward.

use async_trait::async_trait;
use tracing::debug;

use storefront_agentic_capabilities::CapabilityKind;

use super::{OrchestrationStrategy, RunContext};
use crate::{
    error::OrchestrationError,
    ledger::{Step, StepLedger},
    types::Strategy,
};

struct Stage {
    kind: CapabilityKind,
    /// Label the stage's result carries in later contexts.
    label: &'static str,
    /// What the stage is asked to do with the accumulated context.
    instruction: &'static str,
}

const PIPELINE: [Stage; 4] = [
    Stage {
        kind: CapabilityKind::Inventory,
        label: "inventory",
        instruction: "search inventory",
    },
    Stage {
        kind: CapabilityKind::Matchmaking,
        label: "alternatives",
        instruction: "find alternatives",
    },
    Stage {
        kind: CapabilityKind::Location,
        label: "location",
        instruction: "locate these products in the store",
    },
    Stage {
        kind: CapabilityKind::Navigation,
        label: "route",
        instruction: "plan a route to the product",
    },
];

/// Linear chain Inventory → Matchmaking → Location → (Navigation).
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialStrategy;

impl SequentialStrategy {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OrchestrationStrategy for SequentialStrategy {
    fn strategy(&self) -> Strategy {
        Strategy::Sequential
    }

    async fn run(
        &self,
        ctx: &RunContext<'_>,
        ledger: &mut StepLedger,
    ) -> Result<(), OrchestrationError> {
        let mut accumulated: Vec<String> = Vec::new();

        for stage in &PIPELINE {
            if stage.kind == CapabilityKind::Navigation && !ctx.has_geo() {
                continue;
            }

            let context = if accumulated.is_empty() {
                None
            } else {
                Some(format!(
                    "Based on {}, {}",
                    accumulated.join("; "),
                    stage.instruction
                ))
            };

            let result = ctx.invoke(stage.kind, context).await?;
            debug!(capability = %stage.kind, degraded = result.degraded, "Sequential stage completed");

            accumulated.push(format!("{}: {}", stage.label, result.summary));
            let action = format!("{} for '{}'", capitalize(stage.instruction), ctx.query());
            ledger.append(Step::from_capability(action, result));
        }

        Ok(())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
