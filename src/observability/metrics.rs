//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, endpoint, status
//! - `http_request_duration_seconds` (histogram): latency by method, endpoint
//!
//! # Design Decisions
//! - A private `PrometheusRecorder` per [`Metrics`] value; updates go through
//!   `metrics::with_local_recorder` so no global recorder is installed
//! - Histogram buckets match the Prometheus client library defaults
//! - Exposition is served by its own listener, away from the API port

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";

/// Default Prometheus client histogram buckets, in seconds.
pub const LATENCY_BUCKETS: [f64; 14] = [
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Request metrics backed by a dedicated Prometheus recorder.
#[derive(Clone)]
pub struct Metrics {
    recorder: Arc<PrometheusRecorder>,
    handle: PrometheusHandle,
}

impl Metrics {
    pub fn new() -> Result<Self, BuildError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
                &LATENCY_BUCKETS,
            )?
            .build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            describe_counter!(REQUESTS_TOTAL, "Total HTTP Requests");
            describe_histogram!(REQUEST_DURATION_SECONDS, "HTTP Request Latency");
        });

        Ok(Self {
            recorder: Arc::new(recorder),
            handle,
        })
    }

    /// Record one completed request: a latency observation and a count.
    pub fn record_request(
        &self,
        method: &'static str,
        endpoint: &'static str,
        status: u16,
        latency: Duration,
    ) {
        metrics::with_local_recorder(self.recorder.as_ref(), || {
            histogram!(REQUEST_DURATION_SECONDS, "method" => method, "endpoint" => endpoint)
                .record(latency.as_secs_f64());
            counter!(
                REQUESTS_TOTAL,
                "method" => method,
                "endpoint" => endpoint,
                "status" => status.to_string()
            )
            .increment(1);
        });
    }

    /// Render the text exposition format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

/// Router exposing the scrape endpoint at `/metrics` and `/`.
pub fn exposition_router(metrics: Metrics) -> Router {
    Router::new()
        .route("/", get(scrape))
        .route("/metrics", get(scrape))
        .with_state(metrics)
}

async fn scrape(State(metrics): State<Metrics>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        metrics.render(),
    )
}

/// Serve the scrape endpoint until shutdown is signalled.
pub async fn serve(
    listener: TcpListener,
    metrics: Metrics,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::debug!(address = %addr, "Metrics listener accepting scrapes");

    axum::serve(listener, exposition_router(metrics))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    tracing::debug!("Metrics listener stopped");
    Ok(())
}
