//! Routing and decision helpers.
//!
//! The Handoff strategy walks a finite state machine over
//! {Inventory, Matchmaking, Location, Navigation, Complete}. Its transitions
//! live in a [`HandoffTable`] (plain data, first matching row wins) and the
//! text signals it reacts to live in a [`KeywordPolicy`], so both can be
//! swapped without touching the strategy.
//!
//! ```text
//!   Inventory   ── no products ─────────────────────▶ Matchmaking
//!               ── otherwise ───────────────────────▶ Location
//!   Matchmaking ── no location yet ─────────────────▶ Location
//!               ── shopper position ────────────────▶ Navigation
//!               ── otherwise ───────────────────────▶ Complete
//!   Location    ── not found and no matchmaking yet ▶ Matchmaking
//!               ── shopper position ────────────────▶ Navigation
//!               ── otherwise ───────────────────────▶ Complete
//!   Navigation  ────────────────────────────────────▶ Complete
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use storefront_agentic_capabilities::{CapabilityKind, CapabilityResult, GeoPoint};

use crate::ledger::{Step, StepLedger};

// ============================================================================
// STATES
// ============================================================================

/// A node of the handoff state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandoffState {
    Inventory,
    Matchmaking,
    Location,
    Navigation,
    Complete,
}

impl HandoffState {
    /// Capability executed in this state, `None` for `Complete`.
    pub fn capability(&self) -> Option<CapabilityKind> {
        match self {
            HandoffState::Inventory => Some(CapabilityKind::Inventory),
            HandoffState::Matchmaking => Some(CapabilityKind::Matchmaking),
            HandoffState::Location => Some(CapabilityKind::Location),
            HandoffState::Navigation => Some(CapabilityKind::Navigation),
            HandoffState::Complete => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, HandoffState::Complete)
    }
}

impl From<CapabilityKind> for HandoffState {
    fn from(kind: CapabilityKind) -> Self {
        match kind {
            CapabilityKind::Inventory => HandoffState::Inventory,
            CapabilityKind::Matchmaking => HandoffState::Matchmaking,
            CapabilityKind::Location => HandoffState::Location,
            CapabilityKind::Navigation => HandoffState::Navigation,
        }
    }
}

impl fmt::Display for HandoffState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HandoffState::Inventory => "Inventory",
            HandoffState::Matchmaking => "Matchmaking",
            HandoffState::Location => "Location",
            HandoffState::Navigation => "Navigation",
            HandoffState::Complete => "Complete",
        };
        f.write_str(name)
    }
}

// ============================================================================
// KEYWORD POLICY
// ============================================================================

/// Keyword heuristics used by routing.
///
/// All matching is case-insensitive and anchored at a word start, so
/// "10 products found" does not read as "0 products".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordPolicy {
    /// Terms sending the router to Inventory first.
    #[serde(default = "default_inventory_terms")]
    pub inventory_terms: Vec<String>,
    /// Phrases meaning an inventory search came back empty.
    #[serde(default = "default_no_products_signals")]
    pub no_products_signals: Vec<String>,
    /// Phrases meaning a lookup failed to find the product.
    #[serde(default = "default_not_found_signals")]
    pub not_found_signals: Vec<String>,
}

fn default_inventory_terms() -> Vec<String> {
    to_strings(&["inventory", "search", "stock", "available", "availability"])
}

fn default_no_products_signals() -> Vec<String> {
    to_strings(&["0 products", "no products", "not found"])
}

fn default_not_found_signals() -> Vec<String> {
    to_strings(&["not found", "not located", "unknown location"])
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for KeywordPolicy {
    fn default() -> Self {
        Self {
            inventory_terms: default_inventory_terms(),
            no_products_signals: default_no_products_signals(),
            not_found_signals: default_not_found_signals(),
        }
    }
}

impl KeywordPolicy {
    pub fn is_inventory_query(&self, query: &str) -> bool {
        contains_any(query, &self.inventory_terms)
    }

    pub fn signals_no_products(&self, text: &str) -> bool {
        contains_any(text, &self.no_products_signals)
    }

    pub fn signals_not_found(&self, text: &str) -> bool {
        contains_any(text, &self.not_found_signals)
    }
}

fn contains_any(text: &str, phrases: &[String]) -> bool {
    let text = text.to_lowercase();
    phrases
        .iter()
        .any(|phrase| contains_phrase(&text, &phrase.to_lowercase()))
}

/// `phrase` occurs in `text` starting at a word boundary.
fn contains_phrase(text: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    text.match_indices(phrase).any(|(idx, _)| {
        text[..idx]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}

// ============================================================================
// TRANSITION TABLE
// ============================================================================

/// Everything a routing decision may look at.
#[derive(Debug, Clone, Copy)]
pub struct RoutingSnapshot<'a> {
    /// Result text of the step just executed.
    pub result: &'a str,
    /// Typed result behind `result`, when the step carries one.
    pub payload: Option<&'a CapabilityResult>,
    /// A Location step has run.
    pub has_location_info: bool,
    /// A Matchmaking step has run.
    pub has_matchmaking: bool,
    /// The shopper supplied a position.
    pub has_geo: bool,
}

impl<'a> RoutingSnapshot<'a> {
    /// Snapshot for `step`, which is about to be appended to `ledger`.
    pub fn pending(step: &'a Step, ledger: &StepLedger, has_geo: bool) -> Self {
        let seen = |kind| ledger.contains(kind) || step.capability == Some(kind);
        Self {
            result: &step.result,
            payload: step.payload.as_ref(),
            has_location_info: seen(CapabilityKind::Location),
            has_matchmaking: seen(CapabilityKind::Matchmaking),
            has_geo,
        }
    }
}

/// Condition on a transition row.
///
/// `NoProducts` and `NotFound` read the typed payload when there is one and
/// fall back to the status part of the result text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Guard {
    Always,
    /// The inventory came back empty.
    NoProducts,
    /// The lookup did not find the product.
    NotFound,
    /// No Location step yet.
    NoLocationInfo,
    /// No Matchmaking step yet.
    NoMatchmaking,
    /// Shopper position present.
    HasGeo,
    /// All inner guards hold.
    All(Vec<Guard>),
}

impl Guard {
    pub fn holds(&self, snapshot: &RoutingSnapshot<'_>, policy: &KeywordPolicy) -> bool {
        match self {
            Guard::Always => true,
            Guard::NoProducts => match snapshot.payload.and_then(CapabilityResult::as_inventory) {
                Some(inventory) => inventory.products.is_empty(),
                None => policy.signals_no_products(status_text(snapshot.result)),
            },
            Guard::NotFound => match snapshot.payload.and_then(CapabilityResult::as_location) {
                Some(location) => !location.found,
                None => policy.signals_not_found(status_text(snapshot.result)),
            },
            Guard::NoLocationInfo => !snapshot.has_location_info,
            Guard::NoMatchmaking => !snapshot.has_matchmaking,
            Guard::HasGeo => snapshot.has_geo,
            Guard::All(guards) => guards.iter().all(|g| g.holds(snapshot, policy)),
        }
    }
}

/// Leading status of a result text.
///
/// Summaries quote the query and list product names after a `'` or `:`, and
/// neither may trigger a signal.
fn status_text(text: &str) -> &str {
    text.split(|c: char| c == '\'' || c == ':').next().unwrap_or("")
}

/// One row of the transition table.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: HandoffState,
    pub guard: Guard,
    pub to: HandoffState,
}

impl Transition {
    pub fn new(from: HandoffState, guard: Guard, to: HandoffState) -> Self {
        Self { from, guard, to }
    }
}

/// Ordered transition rows. For a given state the first row whose guard
/// holds wins; if none does the decision is `Complete`.
#[derive(Debug, Clone, PartialEq)]
pub struct HandoffTable {
    transitions: Vec<Transition>,
}

impl HandoffTable {
    pub fn new(transitions: Vec<Transition>) -> Self {
        Self { transitions }
    }

    /// The storefront routing rules.
    pub fn standard() -> Self {
        use Guard::*;
        use HandoffState::*;

        Self::new(vec![
            Transition::new(Inventory, NoProducts, Matchmaking),
            Transition::new(Inventory, Always, Location),
            Transition::new(Matchmaking, NoLocationInfo, Location),
            Transition::new(Matchmaking, HasGeo, Navigation),
            Transition::new(Matchmaking, Always, Complete),
            Transition::new(Location, All(vec![NotFound, NoMatchmaking]), Matchmaking),
            Transition::new(Location, HasGeo, Navigation),
            Transition::new(Location, Always, Complete),
            Transition::new(Navigation, Always, Complete),
        ])
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Decide where to go after `from`.
    pub fn next(
        &self,
        from: HandoffState,
        snapshot: &RoutingSnapshot<'_>,
        policy: &KeywordPolicy,
    ) -> HandoffState {
        self.transitions
            .iter()
            .filter(|t| t.from == from)
            .find(|t| t.guard.holds(snapshot, policy))
            .map_or(HandoffState::Complete, |t| t.to)
    }
}

impl Default for HandoffTable {
    fn default() -> Self {
        Self::standard()
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// First capability the handoff router sends a query to.
pub fn classify_entry(query: &str, policy: &KeywordPolicy) -> HandoffState {
    if policy.is_inventory_query(query) {
        HandoffState::Inventory
    } else {
        HandoffState::Location
    }
}

/// Navigation only runs when the shopper supplied a position.
pub fn requires_navigation(location: Option<GeoPoint>) -> bool {
    location.is_some()
}

/// Join up to `window` capability contributions, in ledger order.
pub fn summarize_contributions<'a, I>(steps: I, window: usize) -> String
where
    I: IntoIterator<Item = &'a Step>,
{
    steps
        .into_iter()
        .filter(|s| s.capability.is_some())
        .take(window)
        .map(|s| format!("{}: {}", s.agent, s.result))
        .collect::<Vec<_>>()
        .join("; ")
}
