//! # Bus Gateway
//!
//! Entry point: loads configuration, wires the gateway and serves the
//! consent entity over the in-process message bus until Ctrl+C.

use anyhow::{Context, Result};
use gateway_core::InMemoryDataStore;
use gateway_runtime::entities::{consent_read_validator, consent_write_validator, ConsentSchema};
use gateway_runtime::{config, GatewayRuntime};
use gateway_telemetry::{init_logging, TelemetryConfig};
use shared_bus::InMemoryMessageBus;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env();
    init_logging(&telemetry).context("Failed to initialize logging")?;

    let config = config::load().context("Failed to load gateway configuration")?;

    info!("===========================================");
    info!("  Bus Gateway v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let bus = Arc::new(InMemoryMessageBus::new());
    let mut runtime = GatewayRuntime::from_config(config, bus, Arc::new(InMemoryDataStore::new()))?;
    runtime.register_entity(
        ConsentSchema::ENTITY,
        Arc::new(ConsentSchema),
        consent_read_validator(),
        consent_write_validator(),
    );

    let handles = runtime.start();
    info!("Gateway is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Initiating graceful shutdown...");
    runtime.shutdown();
    for handle in handles {
        let _ = handle.await;
    }
    info!("Shutdown complete");
    Ok(())
}
