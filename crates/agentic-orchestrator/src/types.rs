//! Request and run types.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use storefront_agentic_capabilities::{GeoPoint, NavigationInstructions, ProductAlternative};

use crate::{error::OrchestrationError, ledger::Step};

// ============================================================================
// REQUEST
// ============================================================================

/// A shopper request, validated on construction and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationRequest {
    query: String,
    user_id: String,
    location: Option<GeoPoint>,
}

impl OrchestrationRequest {
    /// Create a request.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::InvalidRequest`] if the query is empty or
    /// only whitespace.
    pub fn new(
        query: impl Into<String>,
        user_id: impl Into<String>,
        location: Option<GeoPoint>,
    ) -> Result<Self, OrchestrationError> {
        let query = query.into();
        if query.trim().is_empty() {
            return Err(OrchestrationError::InvalidRequest(
                "query must not be empty".to_string(),
            ));
        }

        Ok(Self {
            query,
            user_id: user_id.into(),
            location,
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn location(&self) -> Option<GeoPoint> {
        self.location
    }

    /// Whether the shopper supplied a position.
    pub fn has_geo(&self) -> bool {
        self.location.is_some()
    }
}

// ============================================================================
// STRATEGY
// ============================================================================

/// The five orchestration algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Linear chain with growing context.
    Sequential,
    /// Parallel fan-out, no shared context.
    Concurrent,
    /// Dynamic routing through a transition table.
    Handoff,
    /// Scripted multi-round roundtable.
    GroupChat,
    /// Coordinator plan, specialists, refinement, synthesis.
    Magentic,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::Sequential,
        Strategy::Concurrent,
        Strategy::Handoff,
        Strategy::GroupChat,
        Strategy::Magentic,
    ];

    /// One-line description shown in the response envelope.
    pub fn description(&self) -> &'static str {
        match self {
            Strategy::Sequential => {
                "Sequential orchestration: each agent builds on the previous agent's result"
            }
            Strategy::Concurrent => {
                "Concurrent orchestration: all agents run in parallel on the raw query"
            }
            Strategy::Handoff => {
                "Handoff orchestration: a router hands the request from agent to agent"
            }
            Strategy::GroupChat => {
                "Group chat orchestration: agents discuss the request over scripted rounds"
            }
            Strategy::Magentic => {
                "Magentic orchestration: a coordinator plans, delegates, refines and synthesizes"
            }
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Sequential => "Sequential",
            Strategy::Concurrent => "Concurrent",
            Strategy::Handoff => "Handoff",
            Strategy::GroupChat => "GroupChat",
            Strategy::Magentic => "Magentic",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Strategy {
    type Err = OrchestrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_') && !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "sequential" => Ok(Strategy::Sequential),
            "concurrent" => Ok(Strategy::Concurrent),
            "handoff" => Ok(Strategy::Handoff),
            "groupchat" => Ok(Strategy::GroupChat),
            "magentic" => Ok(Strategy::Magentic),
            _ => Err(OrchestrationError::InvalidRequest(format!(
                "unknown strategy: {s}"
            ))),
        }
    }
}

// ============================================================================
// RUN
// ============================================================================

/// The complete outcome of one `execute` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationRun {
    pub id: Uuid,
    pub strategy: Strategy,
    pub steps: Vec<Step>,
    pub final_alternatives: Vec<ProductAlternative>,
    pub final_navigation: Option<NavigationInstructions>,
}

impl OrchestrationRun {
    /// Steps recorded for one agent, in order.
    pub fn steps_for<'a>(&'a self, agent: &'a str) -> impl Iterator<Item = &'a Step> + 'a {
        self.steps.iter().filter(move |s| s.agent == agent)
    }

    /// Agent names in step order.
    pub fn agents(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.agent.as_str()).collect()
    }
}
