//! Group Chat Pattern - a scripted roundtable.
//!
//! A manager opens the discussion, capabilities take turns over fixed
//! rounds, and the manager closes. The whole conversation is data: a
//! [`GroupChatScript`] of [`Round`]s, each an ordered list of [`Turn`]s whose
//! prompt templates are rendered against the conversation so far.
//!
//! # Template placeholders
//!
//! | Placeholder | Value |
//! |-------------|-------|
//! | `{query}` | The shopper's query |
//! | `{round}` | Current round number (total rounds in the closing) |
//! | `{previous_agent}` | Agent of the latest contribution |
//! | `{previous}` | Summary of the latest contribution |
//! | `{contributions}` | Every contribution so far, `agent: summary; ...` |
//!
//! The rendered prompt is sent as the capability's context and kept in the
//! step result, so any turn using `{previous}` visibly builds on an earlier one.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use storefront_agentic_capabilities::CapabilityKind;

use super::{OrchestrationStrategy, RunContext};
use crate::{
    error::OrchestrationError,
    ledger::{Step, StepLedger},
    types::Strategy,
};

// ============================================================================
// SCRIPT
// ============================================================================

/// Who speaks in a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Participant {
    Manager,
    Capability(CapabilityKind),
}

/// When a turn takes place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnCondition {
    #[default]
    Always,
    /// Only when the shopper supplied a position.
    HasGeo,
}

/// One scripted turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub participant: Participant,
    pub template: String,
    #[serde(default)]
    pub condition: TurnCondition,
}

impl Turn {
    pub fn new(participant: Participant, template: impl Into<String>) -> Self {
        Self {
            participant,
            template: template.into(),
            condition: TurnCondition::Always,
        }
    }

    /// Shorthand for a capability turn.
    pub fn capability(kind: CapabilityKind, template: impl Into<String>) -> Self {
        Self::new(Participant::Capability(kind), template)
    }

    #[must_use]
    pub fn when(mut self, condition: TurnCondition) -> Self {
        self.condition = condition;
        self
    }
}

/// An ordered list of turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub turns: Vec<Turn>,
}

impl Round {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self { turns }
    }
}

/// The full roundtable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupChatScript {
    /// Display name of the manager.
    pub manager: String,
    pub opening: String,
    pub rounds: Vec<Round>,
    pub closing: String,
}

impl GroupChatScript {
    /// The storefront roundtable.
    ///
    /// Round 1: Inventory, Matchmaking, Location. Round 2: Inventory and
    /// Matchmaking revisit earlier contributions, then Navigation joins when
    /// the shopper supplied a position.
    pub fn standard() -> Self {
        use CapabilityKind::*;

        Self {
            manager: "Group Manager".to_string(),
            opening: "Opening the roundtable on '{query}'. Inventory, Matchmaking and Location \
                      agents, please share what you know."
                .to_string(),
            rounds: vec![
                Round::new(vec![
                    Turn::capability(Inventory, "Round {round}: checking stock for '{query}'."),
                    Turn::capability(
                        Matchmaking,
                        "Round {round}: {previous_agent} reported \"{previous}\"; suggesting alternatives.",
                    ),
                    Turn::capability(
                        Location,
                        "Round {round}: {previous_agent} reported \"{previous}\"; locating the products.",
                    ),
                ]),
                Round::new(vec![
                    Turn::capability(
                        Inventory,
                        "Round {round}: rechecking stock in light of {previous_agent}: \"{previous}\".",
                    ),
                    Turn::capability(
                        Matchmaking,
                        "Round {round}: refining alternatives after {previous_agent}: \"{previous}\".",
                    ),
                    Turn::capability(
                        Navigation,
                        "Round {round}: planning a route using {previous_agent}: \"{previous}\".",
                    )
                    .when(TurnCondition::HasGeo),
                ]),
            ],
            closing: "Closing the roundtable on '{query}' after {round} rounds. Contributions: \
                      {contributions}"
                .to_string(),
        }
    }
}

impl Default for GroupChatScript {
    fn default() -> Self {
        Self::standard()
    }
}

// ============================================================================
// CONVERSATION STATE
// ============================================================================

#[derive(Default)]
struct Conversation {
    /// `(agent, summary)` per capability contribution.
    contributions: Vec<(String, String)>,
}

impl Conversation {
    /// Substitute placeholders in one left-to-right pass. Inserted values are
    /// never scanned again, and unknown `{...}` spans are kept as written.
    fn render(&self, template: &str, query: &str, round: usize) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            let substituted = tail.find('}').and_then(|close| {
                self.placeholder(&tail[1..close], query, round)
                    .map(|value| (close, value))
            });
            match substituted {
                Some((close, value)) => {
                    out.push_str(&value);
                    rest = &tail[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }

        out.push_str(rest);
        out
    }

    fn placeholder(&self, name: &str, query: &str, round: usize) -> Option<String> {
        let last = self.contributions.last();
        let value = match name {
            "query" => query.to_string(),
            "round" => round.to_string(),
            "previous_agent" => last.map_or("nobody", |(agent, _)| agent.as_str()).to_string(),
            "previous" => last
                .map_or("nothing yet", |(_, summary)| summary.as_str())
                .to_string(),
            "contributions" => self
                .contributions
                .iter()
                .map(|(agent, summary)| format!("{agent}: {summary}"))
                .collect::<Vec<_>>()
                .join("; "),
            _ => return None,
        };
        Some(value)
    }
}

// ============================================================================
// STRATEGY
// ============================================================================

/// Scripted multi-round discussion.
#[derive(Debug, Clone, Default)]
pub struct GroupChatStrategy {
    script: GroupChatScript,
}

impl GroupChatStrategy {
    pub fn new(script: GroupChatScript) -> Self {
        Self { script }
    }

    pub fn script(&self) -> &GroupChatScript {
        &self.script
    }
}

#[async_trait]
impl OrchestrationStrategy for GroupChatStrategy {
    fn strategy(&self) -> Strategy {
        Strategy::GroupChat
    }

    async fn run(
        &self,
        ctx: &RunContext<'_>,
        ledger: &mut StepLedger,
    ) -> Result<(), OrchestrationError> {
        let script = &self.script;
        let mut conversation = Conversation::default();

        ledger.append(Step::new(
            &script.manager,
            "Open discussion",
            conversation.render(&script.opening, ctx.query(), 0),
        ));

        for (index, round) in script.rounds.iter().enumerate() {
            let number = index + 1;

            for turn in &round.turns {
                if turn.condition == TurnCondition::HasGeo && !ctx.has_geo() {
                    continue;
                }

                let prompt = conversation.render(&turn.template, ctx.query(), number);
                let kind = match turn.participant {
                    Participant::Manager => {
                        ledger.append(Step::new(
                            &script.manager,
                            format!("Round {number}: moderate"),
                            prompt,
                        ));
                        continue;
                    }
                    Participant::Capability(kind) => kind,
                };

                let result = ctx.invoke(kind, Some(prompt.clone())).await?;
                debug!(round = number, capability = %kind, "Group chat contribution");

                conversation
                    .contributions
                    .push((kind.agent_name().to_string(), result.summary.clone()));
                let text = format!("{prompt} => {}", result.summary);
                ledger.append(Step::from_capability_with_text(
                    format!("Round {number}: contribute"),
                    result,
                    text,
                ));
            }
        }

        ledger.append(Step::new(
            &script.manager,
            "Close discussion",
            conversation.render(&script.closing, ctx.query(), script.rounds.len()),
        ));

        Ok(())
    }
}
