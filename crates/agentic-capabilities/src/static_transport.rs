//! In-process transport with scripted behaviour.
//!
//! Used for direct-call wiring, demos and tests. Each capability can be
//! scripted to answer a fixed payload, compute one from the request, fail,
//! stall for a while, or never answer. Unscripted capabilities answer with a
//! plausible demo payload derived from the query.
//!
//! Calls are only kept when the transport is built with
//! [`StaticTransport::recording`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    error::CapabilityError,
    traits::CapabilityTransport,
    types::{
        CapabilityKind, CapabilityPayload, CapabilityRequest, InventoryResult, LocationResult,
        MatchmakingResult, NavigationInstructions, NavigationStep, ProductAlternative, ProductHit,
    },
};

/// Function computing a response from the incoming request.
pub type ResponderFn =
    Arc<dyn Fn(&CapabilityRequest) -> Result<CapabilityPayload, CapabilityError> + Send + Sync>;

#[derive(Clone)]
enum Script {
    Respond(ResponderFn),
    Hang,
}

/// A call observed by a [`StaticTransport`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub kind: CapabilityKind,
    pub request: CapabilityRequest,
}

/// In-memory [`CapabilityTransport`].
#[derive(Default)]
pub struct StaticTransport {
    scripts: HashMap<CapabilityKind, Script>,
    delays: HashMap<CapabilityKind, Duration>,
    record: bool,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StaticTransport {
    /// Create a transport answering demo payloads for every capability.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Same as [`new`](Self::new), but every call is kept for [`calls`](Self::calls).
    #[must_use]
    pub fn recording() -> Self {
        Self {
            record: true,
            ..Self::default()
        }
    }

    /// Always answer `payload` for `kind`.
    #[must_use]
    pub fn respond_with(self, kind: CapabilityKind, payload: CapabilityPayload) -> Self {
        self.respond_fn(kind, move |_| Ok(payload.clone()))
    }

    /// Compute the answer for `kind` from the request.
    #[must_use]
    pub fn respond_fn<F>(mut self, kind: CapabilityKind, f: F) -> Self
    where
        F: Fn(&CapabilityRequest) -> Result<CapabilityPayload, CapabilityError>
            + Send
            + Sync
            + 'static,
    {
        self.scripts.insert(kind, Script::Respond(Arc::new(f)));
        self
    }

    /// Make every call to `kind` fail with a connection error.
    #[must_use]
    pub fn fail(self, kind: CapabilityKind, message: impl Into<String>) -> Self {
        let message = message.into();
        self.respond_fn(kind, move |_| Err(CapabilityError::Connection(message.clone())))
    }

    /// Make calls to `kind` never complete.
    #[must_use]
    pub fn hang(mut self, kind: CapabilityKind) -> Self {
        self.scripts.insert(kind, Script::Hang);
        self
    }

    /// Delay every answer for `kind`.
    #[must_use]
    pub fn delay(mut self, kind: CapabilityKind, delay: Duration) -> Self {
        self.delays.insert(kind, delay);
        self
    }

    /// All calls recorded so far, in arrival order. Always empty unless
    /// built with [`recording`](Self::recording).
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    /// Calls received for one capability.
    pub async fn calls_for(&self, kind: CapabilityKind) -> Vec<CapabilityRequest> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.request.clone())
            .collect()
    }
}

#[async_trait]
impl CapabilityTransport for StaticTransport {
    fn name(&self) -> &str {
        "static"
    }

    async fn send(
        &self,
        kind: CapabilityKind,
        request: &CapabilityRequest,
    ) -> Result<CapabilityPayload, CapabilityError> {
        if self.record {
            self.calls.lock().await.push(RecordedCall {
                kind,
                request: request.clone(),
            });
        }

        if let Some(delay) = self.delays.get(&kind) {
            tokio::time::sleep(*delay).await;
        }

        match self.scripts.get(&kind) {
            Some(Script::Respond(f)) => f(request),
            Some(Script::Hang) => std::future::pending().await,
            None => Ok(demo_payload(kind, &request.query)),
        }
    }
}

/// A plausible live payload for `kind`, derived from the query.
pub fn demo_payload(kind: CapabilityKind, query: &str) -> CapabilityPayload {
    match kind {
        CapabilityKind::Inventory => CapabilityPayload::Inventory(InventoryResult {
            products: vec![
                ProductHit {
                    sku: "INV-1001".to_string(),
                    name: format!("{query} (standard)"),
                    price: 14.99,
                    in_stock: true,
                },
                ProductHit {
                    sku: "INV-1002".to_string(),
                    name: format!("{query} (professional)"),
                    price: 24.99,
                    in_stock: false,
                },
            ],
        }),
        CapabilityKind::Matchmaking => CapabilityPayload::Matchmaking(MatchmakingResult {
            alternatives: vec![ProductAlternative {
                name: format!("Eco {query}"),
                sku: "ALT-2001".to_string(),
                price: 11.49,
                in_stock: true,
                aisle: "Aisle 5".to_string(),
                section: "Paint & Decor".to_string(),
                reason: "Similar product with recycled materials".to_string(),
            }],
        }),
        CapabilityKind::Location => CapabilityPayload::Location(LocationResult {
            found: true,
            aisle: "Aisle 5".to_string(),
            section: "Paint & Decor".to_string(),
            description: format!("{query} is on the left-hand shelves"),
        }),
        CapabilityKind::Navigation => CapabilityPayload::Navigation(NavigationInstructions {
            steps: vec![
                NavigationStep {
                    direction: "start".to_string(),
                    description: "Enter through the garden center doors".to_string(),
                    landmark: Some("Garden center".to_string()),
                },
                NavigationStep {
                    direction: "left".to_string(),
                    description: "Turn left at the paint counter".to_string(),
                    landmark: Some("Paint counter".to_string()),
                },
                NavigationStep {
                    direction: "arrive".to_string(),
                    description: "Aisle 5, Paint & Decor".to_string(),
                    landmark: None,
                },
            ],
            start_location: "Garden center entrance".to_string(),
            estimated_time: "2 minutes".to_string(),
        }),
    }
}
