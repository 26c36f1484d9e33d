//! Prelude - Import everything you need with one line.
//!
//! ```rust
//! use storefront_agentic_orchestrator::prelude::*;
//! ```

pub use crate::{
    CapabilitySet, OrchestrationError, OrchestrationRequest, OrchestrationResponse,
    OrchestrationRun, Orchestrator, OrchestratorConfig, RunOptions, Step, StepLedger, Strategy,
};

pub use storefront_agentic_capabilities::{
    CapabilityClient, CapabilityKind, CapabilityTransport, Framework, GeoPoint,
};

pub use tokio_util::sync::CancellationToken;
