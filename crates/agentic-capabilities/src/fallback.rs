//! Deterministic fallback payloads.
//!
//! When a remote call fails the client substitutes one of these. Every
//! function here is a pure function of the query: the same query always
//! yields the same payload, with every field a real payload would carry.

use crate::types::{
    CapabilityKind, CapabilityPayload, CapabilityResult, InventoryResult, LocationResult,
    MatchmakingResult, NavigationInstructions, NavigationStep, ProductAlternative, ProductHit,
};

/// Number of aisles the synthetic store layout spreads products over.
const FALLBACK_AISLES: u32 = 24;

const FALLBACK_SECTIONS: [&str; 6] = [
    "Hardware",
    "Paint & Decor",
    "Garden",
    "Electrical",
    "Plumbing",
    "Tools",
];

/// Build the degraded result for `kind` and `query`.
pub fn fallback_result(kind: CapabilityKind, query: &str) -> CapabilityResult {
    CapabilityResult::degraded(fallback_payload(kind, query), query)
}

/// Build the fallback payload for `kind` and `query`.
pub fn fallback_payload(kind: CapabilityKind, query: &str) -> CapabilityPayload {
    match kind {
        CapabilityKind::Inventory => CapabilityPayload::Inventory(inventory(query)),
        CapabilityKind::Matchmaking => CapabilityPayload::Matchmaking(matchmaking(query)),
        CapabilityKind::Location => CapabilityPayload::Location(location(query)),
        CapabilityKind::Navigation => CapabilityPayload::Navigation(navigation(query)),
    }
}

/// One synthetic "Demo Product for {query}" hit.
pub fn inventory(query: &str) -> InventoryResult {
    InventoryResult {
        products: vec![ProductHit {
            sku: sku_for(query, "DEMO"),
            name: format!("Demo Product for {query}"),
            price: 9.99,
            in_stock: true,
        }],
    }
}

/// A premium and a budget alternative.
pub fn matchmaking(query: &str) -> MatchmakingResult {
    let (aisle, section) = slot_for(query);
    MatchmakingResult {
        alternatives: vec![
            ProductAlternative {
                name: format!("Premium {query}"),
                sku: sku_for(query, "PREM"),
                price: 29.99,
                in_stock: true,
                aisle: aisle.clone(),
                section: section.to_string(),
                reason: "Higher quality option".to_string(),
            },
            ProductAlternative {
                name: format!("Budget {query}"),
                sku: sku_for(query, "BUDG"),
                price: 12.99,
                in_stock: true,
                aisle,
                section: section.to_string(),
                reason: "More affordable option".to_string(),
            },
        ],
    }
}

/// A location derived from the query.
pub fn location(query: &str) -> LocationResult {
    let (aisle, section) = slot_for(query);
    LocationResult {
        found: true,
        description: format!("{query} is usually stocked in {aisle}, {section}"),
        aisle,
        section: section.to_string(),
    }
}

/// A generic route from the entrance to the fallback location.
pub fn navigation(query: &str) -> NavigationInstructions {
    let (aisle, section) = slot_for(query);
    NavigationInstructions {
        steps: vec![
            NavigationStep {
                direction: "start".to_string(),
                description: "Enter through the main entrance".to_string(),
                landmark: Some("Main entrance".to_string()),
            },
            NavigationStep {
                direction: "forward".to_string(),
                description: format!("Walk to the {section} department"),
                landmark: Some(section.to_string()),
            },
            NavigationStep {
                direction: "arrive".to_string(),
                description: format!("Find {query} in {aisle}"),
                landmark: None,
            },
        ],
        start_location: "Main entrance".to_string(),
        estimated_time: "3 minutes".to_string(),
    }
}

/// Stable 32-bit FNV-1a over the lowercased query.
fn fingerprint(query: &str) -> u32 {
    query
        .trim()
        .to_lowercase()
        .bytes()
        .fold(0x811c_9dc5_u32, |hash, b| (hash ^ u32::from(b)).wrapping_mul(0x0100_0193))
}

fn sku_for(query: &str, prefix: &str) -> String {
    format!("{prefix}-{:08X}", fingerprint(query))
}

fn slot_for(query: &str) -> (String, &'static str) {
    let hash = fingerprint(query);
    let aisle = format!("Aisle {}", hash % FALLBACK_AISLES + 1);
    let section = FALLBACK_SECTIONS[(hash as usize / FALLBACK_AISLES as usize) % FALLBACK_SECTIONS.len()];
    (aisle, section)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_fallback_is_demo_product() {
        let inv = inventory("paint brush");
        assert_eq!(inv.products.len(), 1);
        assert_eq!(inv.products[0].name, "Demo Product for paint brush");
        assert!(inv.products[0].sku.starts_with("DEMO-"));
    }

    #[test]
    fn test_fallback_is_pure_function_of_query() {
        for kind in CapabilityKind::ALL {
            let a = fallback_result(kind, "cordless drill");
            let b = fallback_result(kind, "cordless drill");
            assert_eq!(a, b, "fallback for {kind} must be deterministic");
            assert!(a.degraded);
            assert_eq!(a.capability, kind);
        }
    }

    #[test]
    fn test_fallback_varies_with_query() {
        let hammer = inventory("hammer");
        let hose = inventory("garden hose");
        assert_ne!(hammer.products[0].sku, hose.products[0].sku);
        assert_ne!(hammer.products[0].name, hose.products[0].name);
    }

    #[test]
    fn test_fallback_location_is_found() {
        let loc = location("wood glue");
        assert!(loc.found);
        assert!(loc.aisle.starts_with("Aisle "));
        assert!(!loc.section.is_empty());
    }

    #[test]
    fn test_fallback_navigation_ends_at_query() {
        let nav = navigation("wood glue");
        assert_eq!(nav.steps.len(), 3);
        assert!(nav.steps[2].description.contains("wood glue"));
        assert_eq!(nav.start_location, "Main entrance");
    }

    #[test]
    fn test_fingerprint_ignores_case_and_padding() {
        assert_eq!(fingerprint("  Hammer "), fingerprint("hammer"));
    }
}
