//! Request finalizer.
//!
//! A [`RequestGuard`] is created when a request starts and records the
//! latency observation and request count when it is dropped, so every exit
//! path of a handler (return, error branch, caught panic, or the future being
//! dropped mid-flight) is measured exactly once.

use std::time::Instant;

use axum::http::StatusCode;

use crate::observability::{Metrics, TraceContext};

/// RAII guard that records request metrics on drop.
#[derive(Debug)]
pub struct RequestGuard {
    metrics: Metrics,
    service: String,
    method: &'static str,
    endpoint: &'static str,
    trace: TraceContext,
    start: Instant,
    status: StatusCode,
}

impl RequestGuard {
    /// Start timing a request.
    ///
    /// The status defaults to 500 so a request abandoned before an outcome
    /// is decided is not counted as a success.
    pub fn start(
        metrics: Metrics,
        service: impl Into<String>,
        method: &'static str,
        endpoint: &'static str,
        trace: TraceContext,
    ) -> Self {
        Self {
            metrics,
            service: service.into(),
            method,
            endpoint,
            trace,
            start: Instant::now(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Set the status the request will be recorded with.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        let latency = self.start.elapsed();
        let status = self.status.as_u16();

        self.metrics
            .record_request(self.method, self.endpoint, status, latency);

        tracing::debug!(
            service = %self.service,
            trace_id = %self.trace.trace_id,
            span_id = %self.trace.span_id,
            latency_secs = latency.as_secs_f64(),
            status,
            "[{}] Request completed in {:.4} seconds with status {}.",
            self.endpoint,
            latency.as_secs_f64(),
            status
        );
    }
}
