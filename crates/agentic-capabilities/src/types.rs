//! Core types shared by capability clients and transports.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// One independently deployed remote capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    /// Product search against store stock.
    Inventory,
    /// Similar/alternative product suggestions.
    Matchmaking,
    /// In-store aisle and section lookup.
    Location,
    /// Route generation inside the store.
    Navigation,
}

impl CapabilityKind {
    /// All capabilities, in their canonical pipeline order.
    pub const ALL: [CapabilityKind; 4] = [
        CapabilityKind::Inventory,
        CapabilityKind::Matchmaking,
        CapabilityKind::Location,
        CapabilityKind::Navigation,
    ];

    /// Lowercase identifier (`inventory`, `matchmaking`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityKind::Inventory => "inventory",
            CapabilityKind::Matchmaking => "matchmaking",
            CapabilityKind::Location => "location",
            CapabilityKind::Navigation => "navigation",
        }
    }

    /// Display name of the agent fronting this capability.
    pub fn agent_name(&self) -> &'static str {
        match self {
            CapabilityKind::Inventory => "Inventory Agent",
            CapabilityKind::Matchmaking => "Matchmaking Agent",
            CapabilityKind::Location => "Location Agent",
            CapabilityKind::Navigation => "Navigation Agent",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend the remote capability should run on.
///
/// Sent with every call instead of being fixed on the client, so one client
/// can serve concurrent runs that target different backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framework {
    /// Semantic Kernel agents.
    #[default]
    SemanticKernel,
    /// Microsoft Agent Framework.
    AgentFramework,
    /// Azure AI Foundry hosted agents.
    FoundryAgents,
    /// Plain LLM client, no agent runtime.
    DirectLlm,
}

impl Framework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::SemanticKernel => "semantic_kernel",
            Framework::AgentFramework => "agent_framework",
            Framework::FoundryAgents => "foundry_agents",
            Framework::DirectLlm => "direct_llm",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Framework {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "semantic_kernel" | "sk" => Ok(Framework::SemanticKernel),
            "agent_framework" | "maf" => Ok(Framework::AgentFramework),
            "foundry_agents" | "foundry" => Ok(Framework::FoundryAgents),
            "direct_llm" | "llm" => Ok(Framework::DirectLlm),
            other => Err(format!("unknown framework: {other}")),
        }
    }
}

/// A geographic position supplied by the shopper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

// ============================================================================
// REQUEST
// ============================================================================

/// Input for one capability call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityRequest {
    /// The shopper's raw query.
    pub query: String,
    /// Context accumulated by the calling strategy, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Shopper position, forwarded to location-aware capabilities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    /// Target backend for this call.
    #[serde(default)]
    pub framework: Framework,
}

impl CapabilityRequest {
    /// Create a request carrying only the raw query.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            context: None,
            location: None,
            framework: Framework::default(),
        }
    }

    /// Attach strategy context.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Attach an optional shopper position.
    #[must_use]
    pub fn with_location(mut self, location: Option<GeoPoint>) -> Self {
        self.location = location;
        self
    }

    /// Select the target backend.
    #[must_use]
    pub fn with_framework(mut self, framework: Framework) -> Self {
        self.framework = framework;
        self
    }
}

// ============================================================================
// PAYLOADS
// ============================================================================

/// A single inventory hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductHit {
    pub sku: String,
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub in_stock: bool,
}

/// Inventory search result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryResult {
    #[serde(default)]
    pub products: Vec<ProductHit>,
}

/// A product suggested in place of (or next to) the requested one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAlternative {
    pub name: String,
    pub sku: String,
    pub price: f64,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub aisle: String,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub reason: String,
}

/// Matchmaking result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchmakingResult {
    #[serde(default)]
    pub alternatives: Vec<ProductAlternative>,
}

/// Where a product sits in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationResult {
    pub found: bool,
    #[serde(default)]
    pub aisle: String,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub description: String,
}

/// One step of an in-store route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationStep {
    pub direction: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
}

/// A full in-store route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationInstructions {
    pub steps: Vec<NavigationStep>,
    #[serde(default)]
    pub start_location: String,
    #[serde(default)]
    pub estimated_time: String,
}

/// Typed payload of a capability call, one variant per capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "capability", rename_all = "snake_case")]
pub enum CapabilityPayload {
    Inventory(InventoryResult),
    Matchmaking(MatchmakingResult),
    Location(LocationResult),
    Navigation(NavigationInstructions),
}

impl CapabilityPayload {
    /// The capability this payload belongs to.
    pub fn kind(&self) -> CapabilityKind {
        match self {
            CapabilityPayload::Inventory(_) => CapabilityKind::Inventory,
            CapabilityPayload::Matchmaking(_) => CapabilityKind::Matchmaking,
            CapabilityPayload::Location(_) => CapabilityKind::Location,
            CapabilityPayload::Navigation(_) => CapabilityKind::Navigation,
        }
    }

    /// Human-readable one-line summary, threaded between strategy steps.
    ///
    /// An empty inventory always reads "0 products found" and a location miss
    /// always reads "not found"; routing keys off those phrases.
    pub fn summarize(&self, query: &str) -> String {
        match self {
            CapabilityPayload::Inventory(inv) if inv.products.is_empty() => {
                format!("0 products found for '{query}'")
            }
            CapabilityPayload::Inventory(inv) => {
                let names: Vec<String> = inv
                    .products
                    .iter()
                    .map(|p| {
                        let stock = if p.in_stock { "in stock" } else { "out of stock" };
                        format!("{} ({}, ${:.2}, {stock})", p.name, p.sku, p.price)
                    })
                    .collect();
                format!(
                    "{} found for '{query}': {}",
                    counted(inv.products.len(), "product", "products"),
                    names.join(", ")
                )
            }
            CapabilityPayload::Matchmaking(m) if m.alternatives.is_empty() => {
                format!("No alternatives found for '{query}'")
            }
            CapabilityPayload::Matchmaking(m) => {
                let names: Vec<&str> = m.alternatives.iter().map(|a| a.name.as_str()).collect();
                format!(
                    "{} for '{query}': {}",
                    counted(m.alternatives.len(), "alternative", "alternatives"),
                    names.join(", ")
                )
            }
            CapabilityPayload::Location(loc) if !loc.found => {
                format!("Location not found for '{query}'")
            }
            CapabilityPayload::Location(loc) => {
                format!("'{query}' is in {}, {}", loc.aisle, loc.section)
            }
            CapabilityPayload::Navigation(nav) => {
                let destination = nav
                    .steps
                    .last()
                    .map(|s| s.description.as_str())
                    .unwrap_or("destination");
                format!(
                    "Route with {} from {} ({}): {destination}",
                    counted(nav.steps.len(), "step", "steps"),
                    nav.start_location,
                    nav.estimated_time
                )
            }
        }
    }
}

fn counted(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("1 {one}")
    } else {
        format!("{n} {many}")
    }
}

// ============================================================================
// RESULT
// ============================================================================

/// Outcome of one capability invocation.
///
/// Always complete: either the real payload or a full fallback, with
/// `degraded` telling the two apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityResult {
    pub capability: CapabilityKind,
    pub payload: CapabilityPayload,
    pub summary: String,
    pub degraded: bool,
}

impl CapabilityResult {
    /// Wrap a payload returned by the remote capability.
    pub fn live(payload: CapabilityPayload, query: &str) -> Self {
        Self {
            capability: payload.kind(),
            summary: payload.summarize(query),
            payload,
            degraded: false,
        }
    }

    /// Wrap a substituted fallback payload.
    pub fn degraded(payload: CapabilityPayload, query: &str) -> Self {
        Self {
            degraded: true,
            ..Self::live(payload, query)
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn as_inventory(&self) -> Option<&InventoryResult> {
        match &self.payload {
            CapabilityPayload::Inventory(inv) => Some(inv),
            _ => None,
        }
    }

    pub fn as_matchmaking(&self) -> Option<&MatchmakingResult> {
        match &self.payload {
            CapabilityPayload::Matchmaking(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_location(&self) -> Option<&LocationResult> {
        match &self.payload {
            CapabilityPayload::Location(loc) => Some(loc),
            _ => None,
        }
    }

    pub fn as_navigation(&self) -> Option<&NavigationInstructions> {
        match &self.payload {
            CapabilityPayload::Navigation(nav) => Some(nav),
            _ => None,
        }
    }
}
