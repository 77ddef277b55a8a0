//! Distributed tracing support.
//!
//! # Responsibilities
//! - Build the OpenTelemetry tracer provider with an OTLP exporter
//! - Extract W3C trace context from incoming requests
//! - Read the current trace/span ids for log correlation
//! - Annotate spans with error details

use axum::{body::Body, http::HeaderMap, http::Request};
use opentelemetry::{
    global,
    propagation::Extractor,
    trace::{Status, TraceContextExt},
    KeyValue,
};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace::SdkTracerProvider, Resource};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::config::TelemetryConfig;
use crate::observability::TelemetryError;

/// Placeholder logged when no span context is active.
pub const UNAVAILABLE: &str = "N/A";

/// Build and globally register the tracer provider.
///
/// With export disabled the provider still assigns ids, so log lines keep
/// their correlation fields.
pub fn init_tracer_provider(config: &TelemetryConfig) -> Result<SdkTracerProvider, TelemetryError> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attribute(KeyValue::new("service.version", env!("CARGO_PKG_VERSION")))
        .build();

    let mut builder = SdkTracerProvider::builder().with_resource(resource);
    if !config.export_disabled {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(config.otlp_endpoint.clone())
            .build()?;
        builder = builder.with_batch_exporter(exporter);
    }

    let provider = builder.build();
    global::set_tracer_provider(provider.clone());
    Ok(provider)
}

/// Trace and span identifiers of the active span, rendered as hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    pub trace_id: String,
    pub span_id: String,
}

impl TraceContext {
    /// Context of `tracing::Span::current()`.
    pub fn current() -> Self {
        Self::from_span(&tracing::Span::current())
    }

    pub fn from_span(span: &tracing::Span) -> Self {
        let context = span.context();
        let otel_span = context.span();
        let span_context = otel_span.span_context();
        if span_context.is_valid() {
            Self {
                trace_id: span_context.trace_id().to_string(),
                span_id: span_context.span_id().to_string(),
            }
        } else {
            Self::unavailable()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            trace_id: UNAVAILABLE.to_string(),
            span_id: UNAVAILABLE.to_string(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.trace_id != UNAVAILABLE
    }
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Server span for an incoming request, parented to any remote
/// `traceparent` the caller sent.
pub fn make_request_span(request: &Request<Body>) -> tracing::Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    let span = tracing::info_span!(
        "request",
        otel.kind = "server",
        http.method = %request.method(),
        http.target = %request.uri(),
        request_id = %request_id,
    );

    let parent = global::get_text_map_propagator(|propagator| {
        propagator.extract(&HeaderExtractor(request.headers()))
    });
    if parent.span().span_context().is_valid() {
        let _ = span.set_parent(parent);
    }
    span
}

/// Mark a span as failed: error attribute, exception event, error status.
///
/// `error_type` is the stable category put on `error.type`; `exception_type`
/// names the concrete error value.
pub fn record_exception(
    span: &tracing::Span,
    error_type: &'static str,
    exception_type: &'static str,
    message: &str,
) {
    span.set_attribute("error.type", error_type);
    span.add_event(
        "exception",
        vec![
            KeyValue::new("exception.type", exception_type),
            KeyValue::new("exception.message", message.to_string()),
        ],
    );
    span.set_status(Status::error(message.to_string()));
}
