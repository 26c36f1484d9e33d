//! Orchestrator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use storefront_agentic_capabilities::{Framework, HttpTransportConfig};

use crate::{error::OrchestrationError, routing::KeywordPolicy};

/// Orchestrator settings.
///
/// Deserializable with every field optional, or loadable from `STOREFRONT_*`
/// environment variables via [`OrchestratorConfig::from_env`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Per-call timeout applied by every capability client.
    #[serde(default = "default_capability_timeout_ms")]
    pub capability_timeout_ms: u64,

    /// Hard cap on Handoff steps, router step included. At least
    /// [`MIN_HANDOFF_STEPS`].
    #[serde(default = "default_handoff_max_steps")]
    pub handoff_max_steps: usize,

    /// Number of contributions the Magentic refinement step summarizes.
    #[serde(default = "default_refinement_window")]
    pub refinement_window: usize,

    /// Backend used when a run does not pick one.
    #[serde(default)]
    pub framework: Framework,

    #[serde(default)]
    pub keywords: KeywordPolicy,

    #[serde(default)]
    pub transport: HttpTransportConfig,
}

/// Smallest Handoff cap: the router step plus one capability step.
pub const MIN_HANDOFF_STEPS: usize = 2;

fn default_capability_timeout_ms() -> u64 {
    30_000
}

fn default_handoff_max_steps() -> usize {
    10
}

fn default_refinement_window() -> usize {
    3
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            capability_timeout_ms: default_capability_timeout_ms(),
            handoff_max_steps: default_handoff_max_steps(),
            refinement_window: default_refinement_window(),
            framework: Framework::default(),
            keywords: KeywordPolicy::default(),
            transport: HttpTransportConfig::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Load from the environment.
    ///
    /// Reads `STOREFRONT_CAPABILITY_TIMEOUT_MS`, `STOREFRONT_HANDOFF_MAX_STEPS`,
    /// `STOREFRONT_REFINEMENT_WINDOW`, `STOREFRONT_FRAMEWORK`, plus the
    /// transport variables read by [`HttpTransportConfig::from_env`].
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Config`] on an unparsable value.
    pub fn from_env() -> Result<Self, OrchestrationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, OrchestrationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let transport = HttpTransportConfig::from_lookup(&lookup)?;

        let framework = match lookup("STOREFRONT_FRAMEWORK") {
            Some(raw) => raw.parse().map_err(OrchestrationError::Config)?,
            None => defaults.framework,
        };

        let config = Self {
            capability_timeout_ms: parse_or(
                &lookup,
                "STOREFRONT_CAPABILITY_TIMEOUT_MS",
                defaults.capability_timeout_ms,
            )?,
            handoff_max_steps: parse_or(
                &lookup,
                "STOREFRONT_HANDOFF_MAX_STEPS",
                defaults.handoff_max_steps,
            )?,
            refinement_window: parse_or(
                &lookup,
                "STOREFRONT_REFINEMENT_WINDOW",
                defaults.refinement_window,
            )?,
            framework,
            keywords: defaults.keywords,
            transport,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Config`] if the handoff cap leaves no
    /// room for a capability step or the timeout is zero.
    pub fn validate(&self) -> Result<(), OrchestrationError> {
        if self.handoff_max_steps < MIN_HANDOFF_STEPS {
            return Err(OrchestrationError::Config(format!(
                "handoff_max_steps must be at least {MIN_HANDOFF_STEPS}"
            )));
        }
        if self.capability_timeout_ms == 0 {
            return Err(OrchestrationError::Config(
                "capability_timeout_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn capability_timeout(&self) -> Duration {
        Duration::from_millis(self.capability_timeout_ms)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, OrchestrationError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| OrchestrationError::Config(format!("{key} is not a valid number: {raw}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, OrchestratorConfig::default());
        assert_eq!(config.handoff_max_steps, 10);
        assert_eq!(config.refinement_window, 3);
        assert_eq!(config.capability_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_env_overrides() {
        let config = OrchestratorConfig::from_lookup(lookup_from(&[
            ("STOREFRONT_FRAMEWORK", "agent-framework"),
            ("STOREFRONT_HANDOFF_MAX_STEPS", "4"),
            ("STOREFRONT_CAPABILITIES_URL", "http://agents.local"),
        ]))
        .unwrap();

        assert_eq!(config.framework, Framework::AgentFramework);
        assert_eq!(config.handoff_max_steps, 4);
        assert_eq!(config.transport.endpoints.location, "http://agents.local/api/location");
    }

    #[test]
    fn test_invalid_values() {
        let err = OrchestratorConfig::from_lookup(lookup_from(&[("STOREFRONT_FRAMEWORK", "langchain")]))
            .unwrap_err();
        assert!(matches!(err, OrchestrationError::Config(_)));

        for cap in ["0", "1"] {
            let err = OrchestratorConfig::from_lookup(lookup_from(&[(
                "STOREFRONT_HANDOFF_MAX_STEPS",
                cap,
            )]))
            .unwrap_err();
            assert!(matches!(err, OrchestrationError::Config(msg) if msg.contains("at least 2")));
        }

        let config = OrchestratorConfig::from_lookup(lookup_from(&[(
            "STOREFRONT_HANDOFF_MAX_STEPS",
            "2",
        )]))
        .unwrap();
        assert_eq!(config.handoff_max_steps, MIN_HANDOFF_STEPS);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: OrchestratorConfig = serde_json::from_str(
            r#"{"handoff_max_steps": 6, "framework": "foundry_agents", "keywords": {"inventory_terms": ["sku"]}}"#,
        )
        .unwrap();

        assert_eq!(config.handoff_max_steps, 6);
        assert_eq!(config.framework, Framework::FoundryAgents);
        assert_eq!(config.keywords.inventory_terms, vec!["sku".to_string()]);
        assert!(!config.keywords.not_found_signals.is_empty());
        assert_eq!(config.refinement_window, 3);
    }
}
