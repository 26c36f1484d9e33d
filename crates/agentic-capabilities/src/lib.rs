//! # storefront-agentic-capabilities
//!
//! Capability clients for the storefront agents.
//!
//! Four remote capabilities sit behind one uniform client:
//! - Inventory (product search)
//! - Matchmaking (alternative products)
//! - Location (aisle and section lookup)
//! - Navigation (in-store route)
//!
//! A [`CapabilityClient`] never fails. When its transport errors, times out,
//! or answers garbage, it returns a deterministic fallback derived from the
//! query and marks the result degraded.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use storefront_agentic_capabilities::{
//!     CapabilityClient, CapabilityRequest, Framework, HttpTransport, HttpTransportConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = Arc::new(HttpTransport::new(HttpTransportConfig::from_env()?)?);
//!     let inventory = CapabilityClient::inventory(transport);
//!
//!     let request = CapabilityRequest::new("paint brush").with_framework(Framework::AgentFramework);
//!     let result = inventory.invoke(&request).await;
//!     println!("{} (degraded: {})", result.summary, result.degraded);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
pub mod fallback;
mod static_transport;
mod traits;
mod types;

#[cfg(feature = "http")]
mod http;

pub use client::{CapabilityClient, DEFAULT_TIMEOUT};
pub use config::{CapabilityEndpoints, HttpTransportConfig};
pub use error::CapabilityError;
pub use static_transport::{demo_payload, RecordedCall, ResponderFn, StaticTransport};
pub use traits::CapabilityTransport;
pub use types::{
    CapabilityKind, CapabilityPayload, CapabilityRequest, CapabilityResult, Framework, GeoPoint,
    InventoryResult, LocationResult, MatchmakingResult, NavigationInstructions, NavigationStep,
    ProductAlternative, ProductHit,
};

#[cfg(feature = "http")]
pub use http::HttpTransport;
