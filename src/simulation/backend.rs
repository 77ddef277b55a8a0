//! Simulated downstream call.

use std::time::Duration;

use tracing::Instrument;

use crate::observability::TraceContext;
use crate::simulation::Randomness;

/// Sleep for a random backend latency inside a child span.
///
/// Returns the latency that was slept.
pub async fn simulate_backend_call(
    randomness: &dyn Randomness,
    service: &str,
    endpoint: &str,
) -> Duration {
    let latency = randomness.backend_latency();
    let span = tracing::info_span!(
        "simulate_db_call",
        latency_ms = latency.as_millis() as u64
    );

    async move {
        let trace = TraceContext::current();
        tracing::debug!(
            service = %service,
            trace_id = %trace.trace_id,
            span_id = %trace.span_id,
            "[{}] Starting data retrieval process.",
            endpoint
        );
        tokio::time::sleep(latency).await;
        latency
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::ScriptedRandomness;
    use std::time::Instant;

    #[tokio::test]
    async fn test_sleeps_for_scripted_latency() {
        let source = ScriptedRandomness::success(1).with_latency(Duration::from_millis(60));
        let start = Instant::now();
        let slept = simulate_backend_call(&source, "test-service", "/api/data").await;
        assert_eq!(slept, Duration::from_millis(60));
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_zero_latency_returns_immediately() {
        let source = ScriptedRandomness::success(1);
        let start = Instant::now();
        simulate_backend_call(&source, "test-service", "/api/data").await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
