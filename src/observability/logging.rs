//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Emit one JSON object per event for log aggregation
//! - Bridge spans into OpenTelemetry so trace ids are assigned
//!
//! # Design Decisions
//! - `RUST_LOG` wins; otherwise the configured default filter applies
//! - Event fields are flattened so `message`, `service`, `trace_id` and
//!   `span_id` sit at the top level of each line
//! - The load generator uses the human-readable format instead

use std::fmt::Display;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing::Subscriber;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::TelemetryConfig;
use crate::observability::{TelemetryError, TraceContext};

/// Install the JSON subscriber with an OpenTelemetry layer.
pub fn init_json(config: &TelemetryConfig, provider: &SdkTracerProvider) -> Result<(), TelemetryError> {
    let tracer = provider.tracer(env!("CARGO_PKG_NAME"));

    tracing_subscriber::registry()
        .with(env_filter(&config.log_filter))
        .with(json_layer(std::io::stdout))
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .try_init()?;

    install_panic_hook(config.service_name.clone());
    Ok(())
}

/// One flattened JSON object per event, written to `writer`.
pub(crate) fn json_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_writer(writer)
}

/// Report panics through `tracing` instead of the default stderr hook.
///
/// Panics caught by a handler are still logged here first, stamped with the
/// trace context of the request that panicked.
pub fn install_panic_hook(service_name: String) {
    std::panic::set_hook(Box::new(move |info| {
        log_panic(&service_name, &TraceContext::current(), info);
    }));
}

fn log_panic(service: &str, trace: &TraceContext, detail: &dyn Display) {
    tracing::error!(
        service = %service,
        trace_id = %trace.trace_id,
        span_id = %trace.span_id,
        severity = "CRITICAL",
        "Panic: {}",
        detail
    );
}

/// Install a human-readable subscriber (load generator).
pub fn init_console(default_filter: &str) -> Result<(), TelemetryError> {
    tracing_subscriber::registry()
        .with(env_filter(default_filter))
        .with(fmt::layer().with_target(false))
        .try_init()?;

    Ok(())
}

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}
