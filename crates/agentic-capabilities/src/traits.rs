//! Transport seam between capability clients and the remote services.

use async_trait::async_trait;

use crate::{
    error::CapabilityError,
    types::{CapabilityKind, CapabilityPayload, CapabilityRequest},
};

/// Trait for capability transports.
///
/// Implement this trait to reach the capabilities over a new backend
/// (HTTP, in-process call, recorded fixtures). The same orchestration
/// strategies then run unchanged against it.
#[async_trait]
pub trait CapabilityTransport: Send + Sync {
    /// Transport name for logging (e.g., "http", "static").
    fn name(&self) -> &str;

    /// Perform one call to `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or its body cannot be decoded.
    /// Callers go through [`CapabilityClient`](crate::CapabilityClient),
    /// which turns every error into a fallback.
    async fn send(
        &self,
        kind: CapabilityKind,
        request: &CapabilityRequest,
    ) -> Result<CapabilityPayload, CapabilityError>;
}
