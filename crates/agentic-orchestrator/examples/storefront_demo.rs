//! Storefront demo - run every strategy against one request.
//!
//! Uses the in-memory transport unless `STOREFRONT_CAPABILITIES_URL` (or a
//! per-capability URL) is set, in which case the capabilities are called
//! over HTTP.
//!
//! ```bash
//! cargo run --example storefront_demo -- "paint brush" handoff
//! RUST_LOG=debug cargo run --example storefront_demo
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storefront_agentic_capabilities::StaticTransport;
use storefront_agentic_orchestrator::prelude::*;

fn uses_http() -> bool {
    [
        "STOREFRONT_CAPABILITIES_URL",
        "STOREFRONT_INVENTORY_URL",
        "STOREFRONT_MATCHMAKING_URL",
        "STOREFRONT_LOCATION_URL",
        "STOREFRONT_NAVIGATION_URL",
    ]
    .iter()
    .any(|key| std::env::var(key).is_ok())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let mut args = std::env::args().skip(1);
    let query = args.next().unwrap_or_else(|| "paint brush".to_string());
    let strategies = match args.next() {
        Some(name) => vec![name.parse::<Strategy>()?],
        None => Strategy::ALL.to_vec(),
    };

    let config = OrchestratorConfig::from_env().context("invalid STOREFRONT_* configuration")?;
    let orchestrator = if uses_http() {
        info!(endpoints = ?config.transport.endpoints, "Using HTTP capabilities");
        Orchestrator::from_config(config)?
    } else {
        info!("Using in-memory capabilities");
        Orchestrator::from_transport(Arc::new(StaticTransport::new()), config)?
    };

    let request = OrchestrationRequest::new(query, "demo-user", Some(GeoPoint::new(47.61, -122.33)))?;

    for strategy in strategies {
        let run = orchestrator.execute(strategy, &request).await?;
        let response = OrchestrationResponse::from(run);
        println!("{}", serde_json::to_string_pretty(&response)?);
    }

    Ok(())
}
