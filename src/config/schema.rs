//! Configuration schema definitions.
//!
//! Defaults mirror the fixed ports and fallback values the service has always
//! shipped with.

use serde::{Deserialize, Serialize};

/// Default service name used when `OTEL_RESOURCE_ATTRIBUTES` carries none.
pub const DEFAULT_SERVICE_NAME: &str = "default-service";

/// Default OTLP collector endpoint (gRPC).
pub const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4317";

/// Root configuration for the demo service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP API bind address.
    pub bind_address: String,

    /// Prometheus scrape endpoint bind address.
    pub metrics_address: String,

    /// Tracing/logging settings.
    pub telemetry: TelemetryConfig,
}

/// Telemetry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// `service.name` resource attribute, also stamped on every log line.
    pub service_name: String,

    /// OTLP collector endpoint for span export.
    pub otlp_endpoint: String,

    /// Disable span export entirely (spans still carry ids for log correlation).
    pub export_disabled: bool,

    /// Default log filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            otlp_endpoint: DEFAULT_OTLP_ENDPOINT.to_string(),
            export_disabled: false,
            log_filter: "observability_demo=info,tower_http=info".to_string(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
            metrics_address: "0.0.0.0:8000".to_string(),
            telemetry: TelemetryConfig::default(),
        }
    }
}
