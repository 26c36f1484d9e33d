//! # storefront-agentic-orchestrator
//!
//! Multi-strategy orchestration over the storefront capabilities.
//!
//! Provides:
//! - Five interchangeable strategies: Sequential, Concurrent, Handoff,
//!   GroupChat and Magentic
//! - An append-only step ledger recording every run
//! - Table-driven handoff routing with replaceable keyword policy
//! - A response assembler producing the serializable response envelope
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use storefront_agentic_capabilities::StaticTransport;
//! use storefront_agentic_orchestrator::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), OrchestrationError> {
//!     let orchestrator =
//!         Orchestrator::from_transport(Arc::new(StaticTransport::new()), OrchestratorConfig::default())?;
//!
//!     let request = OrchestrationRequest::new("paint brush", "u1", None)?;
//!     let run = orchestrator.execute(Strategy::Handoff, &request).await?;
//!
//!     let response = OrchestrationResponse::from(run);
//!     println!("{}", serde_json::to_string_pretty(&response).unwrap_or_default());
//!     Ok(())
//! }
//! ```

mod capabilities;
mod config;
mod error;
pub mod ledger;
mod orchestrator;
pub mod patterns;
pub mod prelude;
mod response;
pub mod routing;
mod types;


pub use capabilities::CapabilitySet;
pub use config::OrchestratorConfig;
pub use error::OrchestrationError;
pub use ledger::{Step, StepLedger};
pub use orchestrator::{Orchestrator, RunOptions};
pub use patterns::{GroupChatScript, OrchestrationStrategy, RunContext};
pub use response::{parse_embedded, OrchestrationResponse, ResponseAssembler};
pub use routing::{HandoffState, HandoffTable, KeywordPolicy};
pub use types::{OrchestrationRequest, OrchestrationRun, Strategy};
