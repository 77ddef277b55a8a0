//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Handlers produce:
//!     → logging.rs (JSON log lines stamped with service/trace/span ids)
//!     → metrics.rs (request counter + latency histogram)
//!     → tracing.rs (spans bridged to OpenTelemetry, exported over OTLP)
//!
//! Consumers:
//!     → Log aggregation (stdout JSON lines)
//!     → Metrics endpoint (Prometheus scrape, separate port)
//!     → OTLP collector
//! ```
//!
//! # Design Decisions
//! - Metric state lives in a [`Telemetry`] value injected into handlers,
//!   not in a globally installed recorder
//! - The subscriber and tracer provider are process-wide and installed once
//!   by [`init`]; dropping the returned guard flushes pending spans

pub mod logging;
pub mod metrics;
pub mod tracing;

use opentelemetry_sdk::trace::SdkTracerProvider;
use thiserror::Error;

use crate::config::TelemetryConfig;
pub use self::metrics::Metrics;
pub use self::tracing::TraceContext;

/// Errors raised while wiring telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to build OTLP span exporter: {0}")]
    Exporter(#[from] opentelemetry_otlp::ExporterBuildError),

    #[error("failed to build Prometheus recorder: {0}")]
    Recorder(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),

    #[error("failed to shut down tracer provider: {0}")]
    Shutdown(#[from] opentelemetry_sdk::error::OTelSdkError),
}

/// Per-process telemetry handles shared by every request.
#[derive(Debug, Clone)]
pub struct Telemetry {
    service_name: String,
    metrics: Metrics,
}

impl Telemetry {
    /// Build the telemetry registry for a service.
    pub fn new(service_name: impl Into<String>) -> Result<Self, TelemetryError> {
        Ok(Self {
            service_name: service_name.into(),
            metrics: Metrics::new()?,
        })
    }

    /// The `service.name` stamped on log lines and spans.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Keeps the tracer provider alive; flushes spans on shutdown.
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    /// Flush and shut down span export.
    pub fn shutdown(mut self) -> Result<(), TelemetryError> {
        if let Some(provider) = self.provider.take() {
            provider.shutdown()?;
        }
        Ok(())
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("tracer provider shutdown failed: {e}");
            }
        }
    }
}

/// Install the tracer provider and the JSON logging subscriber.
pub fn init(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let provider = self::tracing::init_tracer_provider(config)?;
    logging::init_json(config, &provider)?;
    Ok(TelemetryGuard {
        provider: Some(provider),
    })
}
