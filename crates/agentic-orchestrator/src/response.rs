//! Response Assembler - from a finished ledger to a run and its envelope.
//!
//! Final alternatives come from the last Matchmaking step and final
//! navigation from the last Navigation step. Typed payloads are used when
//! present; otherwise the step text is searched for an embedded JSON payload,
//! and when that fails too a default payload is used. Assembly never fails.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use storefront_agentic_capabilities::{
    fallback, CapabilityKind, MatchmakingResult, NavigationInstructions, ProductAlternative,
};

use crate::{
    ledger::{Step, StepLedger},
    types::{OrchestrationRequest, OrchestrationRun, Strategy},
};

/// Builds [`OrchestrationRun`]s from ledgers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseAssembler;

impl ResponseAssembler {
    /// Freeze `ledger` into a run.
    pub fn assemble(
        id: Uuid,
        strategy: Strategy,
        request: &OrchestrationRequest,
        ledger: StepLedger,
    ) -> OrchestrationRun {
        let final_alternatives = Self::alternatives(&ledger, request.query());
        let final_navigation = Self::navigation(&ledger, request.query());

        OrchestrationRun {
            id,
            strategy,
            steps: ledger.into_steps(),
            final_alternatives,
            final_navigation,
        }
    }

    /// Alternatives from the last Matchmaking step; empty when none ran.
    pub fn alternatives(ledger: &StepLedger, query: &str) -> Vec<ProductAlternative> {
        let Some(step) = ledger.last_for(CapabilityKind::Matchmaking) else {
            return Vec::new();
        };

        if let Some(m) = step.payload.as_ref().and_then(|p| p.as_matchmaking()) {
            return m.alternatives.clone();
        }

        parse_embedded::<MatchmakingResult>(&step.result)
            .map(|m| m.alternatives)
            .or_else(|| parse_embedded::<Vec<ProductAlternative>>(&step.result))
            .unwrap_or_else(|| {
                debug!("No structured alternatives in step, using defaults");
                fallback::matchmaking(query).alternatives
            })
    }

    /// Route from the last Navigation step; `None` when none ran.
    pub fn navigation(ledger: &StepLedger, query: &str) -> Option<NavigationInstructions> {
        let step = ledger.last_for(CapabilityKind::Navigation)?;

        if let Some(nav) = step.payload.as_ref().and_then(|p| p.as_navigation()) {
            return Some(nav.clone());
        }

        Some(parse_embedded(&step.result).unwrap_or_else(|| {
            debug!("No structured navigation in step, using defaults");
            fallback::navigation(query)
        }))
    }
}

/// Lenient structured parse of a step result.
///
/// Tries the whole text, then the outermost `{...}` and `[...]` spans inside it.
pub fn parse_embedded<T: DeserializeOwned>(text: &str) -> Option<T> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    [('{', '}'), ('[', ']')].into_iter().find_map(|(open, close)| {
        let start = trimmed.find(open)?;
        let end = trimmed.rfind(close)?;
        if end <= start {
            return None;
        }
        serde_json::from_str(&trimmed[start..=end]).ok()
    })
}

// ============================================================================
// ENVELOPE
// ============================================================================

/// Serializable response envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationResponse {
    pub orchestration_id: Uuid,
    pub strategy: Strategy,
    pub description: String,
    pub steps: Vec<Step>,
    pub alternatives: Vec<ProductAlternative>,
    pub navigation: Option<NavigationInstructions>,
}

impl From<OrchestrationRun> for OrchestrationResponse {
    fn from(run: OrchestrationRun) -> Self {
        Self {
            orchestration_id: run.id,
            strategy: run.strategy,
            description: run.strategy.description().to_string(),
            steps: run.steps,
            alternatives: run.final_alternatives,
            navigation: run.final_navigation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_agentic_capabilities::fallback::fallback_result;

    fn text_step(kind: CapabilityKind, text: &str) -> Step {
        let mut step = Step::new(kind.agent_name(), "contribute", text);
        step.capability = Some(kind);
        step
    }

    #[test]
    fn test_typed_payload_wins() {
        let mut ledger = StepLedger::new();
        ledger.append(Step::from_capability(
            "Find",
            fallback_result(CapabilityKind::Matchmaking, "tape"),
        ));

        let alternatives = ResponseAssembler::alternatives(&ledger, "ignored");
        assert_eq!(alternatives[0].name, "Premium tape");
    }

    #[test]
    fn test_embedded_json_is_parsed() {
        let mut ledger = StepLedger::new();
        ledger.append(text_step(
            CapabilityKind::Matchmaking,
            r#"Found these: {"alternatives": [{"name": "Foam roller", "sku": "FR-1", "price": 6.0}]} hope it helps"#,
        ));
        ledger.append(text_step(
            CapabilityKind::Navigation,
            r#"{"steps": [{"direction": "arrive", "description": "Aisle 3"}], "startLocation": "Door"}"#,
        ));

        let alternatives = ResponseAssembler::alternatives(&ledger, "roller");
        assert_eq!(alternatives.len(), 1);
        assert_eq!(alternatives[0].sku, "FR-1");
        assert!(!alternatives[0].in_stock);

        let navigation = ResponseAssembler::navigation(&ledger, "roller").unwrap();
        assert_eq!(navigation.start_location, "Door");
        assert_eq!(navigation.steps[0].description, "Aisle 3");
    }

    #[test]
    fn test_unparsable_text_falls_back_to_defaults() {
        let mut ledger = StepLedger::new();
        ledger.append(text_step(CapabilityKind::Matchmaking, "Try the {blue} one"));
        ledger.append(text_step(CapabilityKind::Navigation, "Walk left, then right"));

        let alternatives = ResponseAssembler::alternatives(&ledger, "roller");
        assert_eq!(alternatives, fallback::matchmaking("roller").alternatives);

        let navigation = ResponseAssembler::navigation(&ledger, "roller").unwrap();
        assert_eq!(navigation, fallback::navigation("roller"));
    }

    #[test]
    fn test_missing_steps_yield_empty_results() {
        let ledger = StepLedger::new();
        assert!(ResponseAssembler::alternatives(&ledger, "roller").is_empty());
        assert!(ResponseAssembler::navigation(&ledger, "roller").is_none());
    }

    #[test]
    fn test_envelope_shape() {
        let mut ledger = StepLedger::new();
        ledger.append(Step::new("Group Manager", "Open", "hi"));
        let request = OrchestrationRequest::new("tape", "u1", None).unwrap();
        let run = ResponseAssembler::assemble(Uuid::new_v4(), Strategy::GroupChat, &request, ledger);
        let id = run.id;

        let json = serde_json::to_value(OrchestrationResponse::from(run)).unwrap();
        assert_eq!(json["orchestrationId"], id.to_string());
        assert_eq!(json["strategy"], "group_chat");
        assert_eq!(json["steps"][0]["agent"], "Group Manager");
        assert!(json["alternatives"].as_array().unwrap().is_empty());
        assert!(json["navigation"].is_null());
        assert!(json["description"].as_str().unwrap().starts_with("Group chat"));
    }
}
