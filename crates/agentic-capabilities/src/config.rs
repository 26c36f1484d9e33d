//! Endpoint configuration for the HTTP transport.

use serde::{Deserialize, Serialize};

use crate::{error::CapabilityError, types::CapabilityKind};

/// Where each capability service lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityEndpoints {
    #[serde(default = "default_inventory_url")]
    pub inventory: String,
    #[serde(default = "default_matchmaking_url")]
    pub matchmaking: String,
    #[serde(default = "default_location_url")]
    pub location: String,
    #[serde(default = "default_navigation_url")]
    pub navigation: String,
}

fn default_inventory_url() -> String {
    "http://localhost:7071/api/inventory/search".to_string()
}

fn default_matchmaking_url() -> String {
    "http://localhost:7072/api/matchmaking/alternatives".to_string()
}

fn default_location_url() -> String {
    "http://localhost:7073/api/location/find".to_string()
}

fn default_navigation_url() -> String {
    "http://localhost:7074/api/navigation/route".to_string()
}

impl Default for CapabilityEndpoints {
    fn default() -> Self {
        Self {
            inventory: default_inventory_url(),
            matchmaking: default_matchmaking_url(),
            location: default_location_url(),
            navigation: default_navigation_url(),
        }
    }
}

impl CapabilityEndpoints {
    /// Point every capability at `{base_url}/api/{capability}`.
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            inventory: format!("{base}/api/inventory"),
            matchmaking: format!("{base}/api/matchmaking"),
            location: format!("{base}/api/location"),
            navigation: format!("{base}/api/navigation"),
        }
    }

    /// URL for one capability.
    pub fn url_for(&self, kind: CapabilityKind) -> &str {
        match kind {
            CapabilityKind::Inventory => &self.inventory,
            CapabilityKind::Matchmaking => &self.matchmaking,
            CapabilityKind::Location => &self.location,
            CapabilityKind::Navigation => &self.navigation,
        }
    }
}

/// HTTP transport configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpTransportConfig {
    #[serde(default)]
    pub endpoints: CapabilityEndpoints,
    /// Per-request timeout enforced by the HTTP client.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            endpoints: CapabilityEndpoints::default(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl HttpTransportConfig {
    /// Load from `STOREFRONT_*` environment variables.
    ///
    /// `STOREFRONT_CAPABILITIES_URL` sets a shared base URL; the per-capability
    /// variables (`STOREFRONT_INVENTORY_URL`, ...) override it.
    ///
    /// # Errors
    ///
    /// Returns an error if `STOREFRONT_HTTP_TIMEOUT_MS` is not a number.
    pub fn from_env() -> Result<Self, CapabilityError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CapabilityError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut endpoints = match lookup("STOREFRONT_CAPABILITIES_URL") {
            Some(base) => CapabilityEndpoints::with_base_url(&base),
            None => CapabilityEndpoints::default(),
        };
        if let Some(url) = lookup("STOREFRONT_INVENTORY_URL") {
            endpoints.inventory = url;
        }
        if let Some(url) = lookup("STOREFRONT_MATCHMAKING_URL") {
            endpoints.matchmaking = url;
        }
        if let Some(url) = lookup("STOREFRONT_LOCATION_URL") {
            endpoints.location = url;
        }
        if let Some(url) = lookup("STOREFRONT_NAVIGATION_URL") {
            endpoints.navigation = url;
        }

        let timeout_ms = match lookup("STOREFRONT_HTTP_TIMEOUT_MS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                CapabilityError::Config(format!("STOREFRONT_HTTP_TIMEOUT_MS is not a number: {raw}"))
            })?,
            None => default_timeout_ms(),
        };

        Ok(Self {
            endpoints,
            timeout_ms,
        })
    }
}
