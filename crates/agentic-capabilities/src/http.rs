//! HTTP transport for remotely deployed capability services.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::{
    config::{CapabilityEndpoints, HttpTransportConfig},
    error::CapabilityError,
    traits::CapabilityTransport,
    types::{
        CapabilityKind, CapabilityPayload, CapabilityRequest, InventoryResult, LocationResult,
        MatchmakingResult, NavigationInstructions,
    },
};

/// Transport posting JSON to one endpoint per capability.
///
/// The request body is the serialized [`CapabilityRequest`]; the response
/// body is the bare payload of the capability (e.g. `{"products": [...]}`).
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoints: CapabilityEndpoints,
}

impl HttpTransport {
    /// Create a transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: HttpTransportConfig) -> Result<Self, CapabilityError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| CapabilityError::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoints: config.endpoints,
        })
    }

    /// Create a transport with a caller-supplied client.
    #[must_use]
    pub fn with_client(client: Client, endpoints: CapabilityEndpoints) -> Self {
        Self { client, endpoints }
    }

    pub fn endpoints(&self) -> &CapabilityEndpoints {
        &self.endpoints
    }

    async fn post<T: DeserializeOwned>(
        &self,
        url: &str,
        request: &CapabilityRequest,
    ) -> Result<T, CapabilityError> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            return Err(CapabilityError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| CapabilityError::InvalidResponse(e.to_string()))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> CapabilityError {
    if e.is_timeout() {
        CapabilityError::Timeout
    } else {
        CapabilityError::Connection(e.to_string())
    }
}

#[async_trait]
impl CapabilityTransport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self, request), fields(capability = %kind))]
    async fn send(
        &self,
        kind: CapabilityKind,
        request: &CapabilityRequest,
    ) -> Result<CapabilityPayload, CapabilityError> {
        let url = self.endpoints.url_for(kind);
        debug!(url = %url, "Calling capability service");

        let payload = match kind {
            CapabilityKind::Inventory => {
                CapabilityPayload::Inventory(self.post::<InventoryResult>(url, request).await?)
            }
            CapabilityKind::Matchmaking => {
                CapabilityPayload::Matchmaking(self.post::<MatchmakingResult>(url, request).await?)
            }
            CapabilityKind::Location => {
                CapabilityPayload::Location(self.post::<LocationResult>(url, request).await?)
            }
            CapabilityKind::Navigation => CapabilityPayload::Navigation(
                self.post::<NavigationInstructions>(url, request).await?,
            ),
        };

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::client::CapabilityClient;
    use crate::types::Framework;

    fn transport_for(server: &MockServer) -> HttpTransport {
        HttpTransport::new(HttpTransportConfig {
            endpoints: CapabilityEndpoints::with_base_url(&server.uri()),
            timeout_ms: 200,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_inventory_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/inventory"))
            .and(body_partial_json(serde_json::json!({
                "query": "paint brush",
                "framework": "agent_framework"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "products": [
                    {"sku": "PB-1", "name": "Angled sash brush", "price": 7.5, "inStock": true}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let request =
            CapabilityRequest::new("paint brush").with_framework(Framework::AgentFramework);
        let payload = transport
            .send(CapabilityKind::Inventory, &request)
            .await
            .unwrap();

        match payload {
            CapabilityPayload::Inventory(inv) => {
                assert_eq!(inv.products.len(), 1);
                assert_eq!(inv.products[0].sku, "PB-1");
                assert!(inv.products[0].in_stock);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_success_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/location"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down for maintenance"))
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let err = transport
            .send(CapabilityKind::Location, &CapabilityRequest::new("tape"))
            .await
            .unwrap_err();

        match err {
            CapabilityError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "down for maintenance");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/navigation"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        let err = transport
            .send(CapabilityKind::Navigation, &CapabilityRequest::new("tape"))
            .await
            .unwrap_err();

        assert!(matches!(err, CapabilityError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_slow_service_times_out_into_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/matchmaking"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"alternatives": []}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let transport = Arc::new(transport_for(&server));
        let client = CapabilityClient::matchmaking(transport);
        let result = client.invoke(&CapabilityRequest::new("sandpaper")).await;

        assert!(result.degraded);
        let alternatives = &result.as_matchmaking().unwrap().alternatives;
        assert_eq!(alternatives.len(), 2);
        assert_eq!(alternatives[0].name, "Premium sandpaper");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_connection_error() {
        let transport = HttpTransport::new(HttpTransportConfig {
            endpoints: CapabilityEndpoints::with_base_url("http://127.0.0.1:9"),
            timeout_ms: 200,
        })
        .unwrap();

        let err = transport
            .send(CapabilityKind::Inventory, &CapabilityRequest::new("tape"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CapabilityError::Connection(_) | CapabilityError::Timeout
        ));
    }
}
