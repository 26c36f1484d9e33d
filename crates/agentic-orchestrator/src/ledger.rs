//! Step Ledger - ordered, append-only record of a run.
//!
//! Every strategy writes its progress here. Insertion order is execution
//! order; it is shown to the shopper and it is what later steps mean by
//! "the previous result".
//!
//! # Example
//!
//! ```rust,ignore
//! let mut ledger = StepLedger::new();
//! ledger.append(Step::from_capability("Search inventory", result));
//!
//! let inventory = ledger.last_for(CapabilityKind::Inventory);
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use storefront_agentic_capabilities::{CapabilityKind, CapabilityResult};

// ============================================================================
// STEP
// ============================================================================

/// One recorded action: a capability call or a coordinator/manager turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Display name of the acting agent ("Inventory Agent", "Group Manager", ...).
    pub agent: String,
    /// Capability called, `None` for coordinator steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability: Option<CapabilityKind>,
    /// Human-readable description of what was done.
    pub action: String,
    /// Result text.
    pub result: String,
    /// Typed capability result behind `result`, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<CapabilityResult>,
    /// Routing decision taken after this step (Handoff only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    pub produced_at: DateTime<Utc>,
}

impl Step {
    /// A coordinator step with free-form result text.
    pub fn new(agent: impl Into<String>, action: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            capability: None,
            action: action.into(),
            result: result.into(),
            payload: None,
            next: None,
            produced_at: Utc::now(),
        }
    }

    /// A capability step; the result text is the capability summary.
    pub fn from_capability(action: impl Into<String>, result: CapabilityResult) -> Self {
        let text = result.summary.clone();
        Self::from_capability_with_text(action, result, text)
    }

    /// A capability step with custom result text.
    pub fn from_capability_with_text(
        action: impl Into<String>,
        result: CapabilityResult,
        text: impl Into<String>,
    ) -> Self {
        Self {
            agent: result.capability.agent_name().to_string(),
            capability: Some(result.capability),
            action: action.into(),
            result: text.into(),
            payload: Some(result),
            next: None,
            produced_at: Utc::now(),
        }
    }

    /// Record the routing decision taken after this step.
    #[must_use]
    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }

    /// Override the timestamp.
    #[must_use]
    pub fn at(mut self, produced_at: DateTime<Utc>) -> Self {
        self.produced_at = produced_at;
        self
    }

    /// Whether the capability behind this step answered with a fallback.
    pub fn is_degraded(&self) -> bool {
        self.payload.as_ref().is_some_and(CapabilityResult::is_degraded)
    }
}

// ============================================================================
// LEDGER
// ============================================================================

/// Append-only sequence of [`Step`]s.
///
/// There is no way to remove or edit a step once appended. Timestamps are
/// clamped on append so they never go backwards.
#[derive(Debug, Clone, Default)]
pub struct StepLedger {
    steps: Vec<Step>,
}

impl StepLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step and return it as stored.
    pub fn append(&mut self, mut step: Step) -> &Step {
        if let Some(last) = self.steps.last() {
            if step.produced_at < last.produced_at {
                step.produced_at = last.produced_at;
            }
        }
        self.steps.push(step);
        &self.steps[self.steps.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    pub fn last(&self) -> Option<&Step> {
        self.steps.last()
    }

    /// First step that called `kind`.
    pub fn first_for(&self, kind: CapabilityKind) -> Option<&Step> {
        self.steps.iter().find(|s| s.capability == Some(kind))
    }

    /// Most recent step that called `kind`.
    pub fn last_for(&self, kind: CapabilityKind) -> Option<&Step> {
        self.steps.iter().rev().find(|s| s.capability == Some(kind))
    }

    /// Whether `kind` has been called in this run.
    pub fn contains(&self, kind: CapabilityKind) -> bool {
        self.first_for(kind).is_some()
    }

    /// Number of steps that called `kind`.
    pub fn count_for(&self, kind: CapabilityKind) -> usize {
        self.steps.iter().filter(|s| s.capability == Some(kind)).count()
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }
}

impl<'a> IntoIterator for &'a StepLedger {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use storefront_agentic_capabilities::fallback::fallback_result;

    #[test]
    fn test_append_preserves_order() {
        let mut ledger = StepLedger::new();
        assert!(ledger.is_empty());

        ledger.append(Step::new("Group Manager", "Open", "Welcome"));
        ledger.append(Step::from_capability(
            "Search",
            fallback_result(CapabilityKind::Inventory, "tape"),
        ));
        ledger.append(Step::new("Group Manager", "Close", "Done"));

        let agents: Vec<&str> = ledger.iter().map(|s| s.agent.as_str()).collect();
        assert_eq!(agents, ["Group Manager", "Inventory Agent", "Group Manager"]);
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_timestamps_never_decrease() {
        let mut ledger = StepLedger::new();
        let now = Utc::now();

        ledger.append(Step::new("A", "first", "").at(now));
        let stored = ledger.append(Step::new("B", "second", "").at(now - Duration::seconds(5)));
        assert_eq!(stored.produced_at, now);

        let stored = ledger.append(Step::new("C", "third", "").at(now + Duration::seconds(1)));
        assert_eq!(stored.produced_at, now + Duration::seconds(1));
    }

    #[test]
    fn test_first_and_last_for() {
        let mut ledger = StepLedger::new();
        ledger.append(Step::from_capability(
            "Round 1",
            fallback_result(CapabilityKind::Matchmaking, "tape"),
        ));
        ledger.append(Step::from_capability(
            "Round 2",
            fallback_result(CapabilityKind::Matchmaking, "tape"),
        ));

        assert_eq!(ledger.first_for(CapabilityKind::Matchmaking).unwrap().action, "Round 1");
        assert_eq!(ledger.last_for(CapabilityKind::Matchmaking).unwrap().action, "Round 2");
        assert_eq!(ledger.count_for(CapabilityKind::Matchmaking), 2);
        assert!(!ledger.contains(CapabilityKind::Navigation));
        assert!(ledger.last_for(CapabilityKind::Location).is_none());
    }

    #[test]
    fn test_step_serializes_camel_case() {
        let step = Step::from_capability(
            "Search",
            fallback_result(CapabilityKind::Inventory, "tape"),
        )
        .with_next("Location");
        assert!(step.is_degraded());

        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["agent"], "Inventory Agent");
        assert_eq!(json["capability"], "inventory");
        assert_eq!(json["next"], "Location");
        assert!(json.get("producedAt").is_some());
    }
}
