//! Observability demo service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request           ┌──────────────────────────────────────────────┐
//!     ─────────────────────────┼─▶ :5000  /health, /api/data                 │
//!                              │      │                                       │
//!                              │      ├─▶ request span (W3C parent) ──────────┼──▶ OTLP collector
//!                              │      ├─▶ JSON log lines (trace/span ids) ────┼──▶ stdout
//!                              │      └─▶ counter + histogram                 │
//!                              │                 │                            │
//!     Prometheus scrape        │                 ▼                            │
//!     ─────────────────────────┼─▶ :8000  /metrics                           │
//!                              └──────────────────────────────────────────────┘
//! ```
//!
//! Configuration comes from the environment only:
//! - `OTEL_RESOURCE_ATTRIBUTES` (`service.name=<name>`)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT` (default `http://localhost:4317`)
//! - `OTEL_SDK_DISABLED` (`true` skips span export)
//! - `RUST_LOG` (log filter)

use std::sync::Arc;

use observability_demo::config;
use observability_demo::lifecycle::{self, signals};
use observability_demo::observability;
use observability_demo::simulation::ThreadRandomness;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_from_env()?;
    let telemetry_guard = observability::init(&config.telemetry)?;

    tracing::info!(
        service = %config.telemetry.service_name,
        otlp_endpoint = %config.telemetry.otlp_endpoint,
        export_disabled = config.telemetry.export_disabled,
        "observability-demo v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let service = lifecycle::start(&config, Arc::new(ThreadRandomness)).await?;
    tokio::spawn(signals::shutdown_on_ctrl_c(service.shutdown()));

    service.wait().await?;

    tracing::info!("Shutdown complete");
    telemetry_guard.shutdown()?;
    Ok(())
}
