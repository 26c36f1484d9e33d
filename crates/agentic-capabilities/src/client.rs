//! Capability client: one remote capability behind a never-failing `invoke`.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::{
    error::CapabilityError,
    fallback::fallback_result,
    traits::CapabilityTransport,
    types::{CapabilityKind, CapabilityPayload, CapabilityRequest, CapabilityResult},
};

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for a single capability.
///
/// Cheap to clone and safe to share between concurrent runs: it holds no
/// per-call state. The target framework travels in each [`CapabilityRequest`].
#[derive(Clone)]
pub struct CapabilityClient {
    kind: CapabilityKind,
    transport: Arc<dyn CapabilityTransport>,
    timeout: Duration,
}

impl CapabilityClient {
    /// Create a client for `kind` over `transport`.
    #[must_use]
    pub fn new(kind: CapabilityKind, transport: Arc<dyn CapabilityTransport>) -> Self {
        Self {
            kind,
            transport,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn inventory(transport: Arc<dyn CapabilityTransport>) -> Self {
        Self::new(CapabilityKind::Inventory, transport)
    }

    #[must_use]
    pub fn matchmaking(transport: Arc<dyn CapabilityTransport>) -> Self {
        Self::new(CapabilityKind::Matchmaking, transport)
    }

    #[must_use]
    pub fn location(transport: Arc<dyn CapabilityTransport>) -> Self {
        Self::new(CapabilityKind::Location, transport)
    }

    #[must_use]
    pub fn navigation(transport: Arc<dyn CapabilityTransport>) -> Self {
        Self::new(CapabilityKind::Navigation, transport)
    }

    /// Set the per-call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn kind(&self) -> CapabilityKind {
        self.kind
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Invoke the capability once.
    ///
    /// Never fails: a transport error, a timeout, or a payload for the wrong
    /// capability yields the deterministic fallback for the query, marked
    /// degraded. No retries.
    #[instrument(
        skip(self, request),
        fields(capability = %self.kind, transport = %self.transport.name(), framework = %request.framework)
    )]
    pub async fn invoke(&self, request: &CapabilityRequest) -> CapabilityResult {
        match self.try_invoke(request).await {
            Ok(payload) => {
                debug!("Capability call succeeded");
                CapabilityResult::live(payload, &request.query)
            }
            Err(e) => {
                warn!(error = %e, error_kind = e.kind_label(), "Capability call failed, using fallback");
                fallback_result(self.kind, &request.query)
            }
        }
    }

    async fn try_invoke(
        &self,
        request: &CapabilityRequest,
    ) -> Result<CapabilityPayload, CapabilityError> {
        let payload = tokio::time::timeout(self.timeout, self.transport.send(self.kind, request))
            .await
            .map_err(|_| CapabilityError::Timeout)??;

        if payload.kind() != self.kind {
            return Err(CapabilityError::UnexpectedPayload {
                expected: self.kind,
                actual: payload.kind(),
            });
        }

        Ok(payload)
    }
}

impl std::fmt::Debug for CapabilityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityClient")
            .field("kind", &self.kind)
            .field("transport", &self.transport.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}
