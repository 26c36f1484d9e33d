//! The four capability clients a run can call.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use storefront_agentic_capabilities::{
    CapabilityClient, CapabilityKind, CapabilityRequest, CapabilityResult, CapabilityTransport,
};

use crate::error::OrchestrationError;

/// Inventory, Matchmaking, Location and Navigation clients.
///
/// Shared by every concurrent run; holds no per-run state.
#[derive(Debug, Clone)]
pub struct CapabilitySet {
    inventory: CapabilityClient,
    matchmaking: CapabilityClient,
    location: CapabilityClient,
    navigation: CapabilityClient,
}

impl CapabilitySet {
    /// Assemble a set from four clients.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Config`] if a client is wired to the
    /// wrong capability.
    pub fn new(
        inventory: CapabilityClient,
        matchmaking: CapabilityClient,
        location: CapabilityClient,
        navigation: CapabilityClient,
    ) -> Result<Self, OrchestrationError> {
        let wiring = [
            (CapabilityKind::Inventory, &inventory),
            (CapabilityKind::Matchmaking, &matchmaking),
            (CapabilityKind::Location, &location),
            (CapabilityKind::Navigation, &navigation),
        ];
        for (expected, client) in wiring {
            if client.kind() != expected {
                return Err(OrchestrationError::Config(format!(
                    "{expected} slot holds a {} client",
                    client.kind()
                )));
            }
        }

        Ok(Self {
            inventory,
            matchmaking,
            location,
            navigation,
        })
    }

    /// All four capabilities over one transport.
    pub fn from_transport(transport: Arc<dyn CapabilityTransport>, timeout: Duration) -> Self {
        let client = |kind| CapabilityClient::new(kind, Arc::clone(&transport)).with_timeout(timeout);
        Self {
            inventory: client(CapabilityKind::Inventory),
            matchmaking: client(CapabilityKind::Matchmaking),
            location: client(CapabilityKind::Location),
            navigation: client(CapabilityKind::Navigation),
        }
    }

    /// All four capabilities over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    #[cfg(feature = "http")]
    pub fn http(
        config: storefront_agentic_capabilities::HttpTransportConfig,
        timeout: Duration,
    ) -> Result<Self, OrchestrationError> {
        let transport = storefront_agentic_capabilities::HttpTransport::new(config)?;
        Ok(Self::from_transport(Arc::new(transport), timeout))
    }

    pub fn client(&self, kind: CapabilityKind) -> &CapabilityClient {
        match kind {
            CapabilityKind::Inventory => &self.inventory,
            CapabilityKind::Matchmaking => &self.matchmaking,
            CapabilityKind::Location => &self.location,
            CapabilityKind::Navigation => &self.navigation,
        }
    }

    /// Invoke one capability, racing it against `cancel`.
    ///
    /// The client itself never fails; the only error is cancellation, in
    /// which case the in-flight call is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Cancelled`] if `cancel` fires first.
    pub async fn invoke(
        &self,
        kind: CapabilityKind,
        request: &CapabilityRequest,
        cancel: &CancellationToken,
    ) -> Result<CapabilityResult, OrchestrationError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(capability = %kind, "Capability call cancelled");
                Err(OrchestrationError::Cancelled)
            }
            result = self.client(kind).invoke(request) => Ok(result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_agentic_capabilities::StaticTransport;

    #[test]
    fn test_new_rejects_miswired_clients() {
        let transport: Arc<dyn CapabilityTransport> = Arc::new(StaticTransport::new());
        let err = CapabilitySet::new(
            CapabilityClient::inventory(Arc::clone(&transport)),
            CapabilityClient::location(Arc::clone(&transport)),
            CapabilityClient::location(Arc::clone(&transport)),
            CapabilityClient::navigation(transport),
        )
        .unwrap_err();
        assert!(matches!(err, OrchestrationError::Config(msg) if msg.contains("matchmaking")));
    }

    #[tokio::test]
    async fn test_invoke_cancelled() {
        let transport = Arc::new(StaticTransport::new().hang(CapabilityKind::Location));
        let set = CapabilitySet::from_transport(transport, Duration::from_secs(60));
        let cancel = CancellationToken::new();

        let request = CapabilityRequest::new("tape");
        let call = set.invoke(CapabilityKind::Location, &request, &cancel);
        cancel.cancel();

        assert!(matches!(call.await, Err(OrchestrationError::Cancelled)));
    }

    #[tokio::test]
    async fn test_invoke_routes_to_client() {
        let set = CapabilitySet::from_transport(Arc::new(StaticTransport::new()), Duration::from_secs(1));
        let result = set
            .invoke(
                CapabilityKind::Navigation,
                &CapabilityRequest::new("tape"),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(result.capability, CapabilityKind::Navigation);
        assert!(!result.degraded);
        assert_eq!(set.client(CapabilityKind::Navigation).timeout(), Duration::from_secs(1));
    }
}
