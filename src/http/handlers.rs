//! Request handlers for `/health` and `/api/data`.

use std::panic::AssertUnwindSafe;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::FutureExt;

use crate::http::guard::RequestGuard;
use crate::http::response::{DataError, DataPayload, ErrorBody, HealthStatus};
use crate::http::server::AppState;
use crate::observability::tracing::record_exception;
use crate::observability::TraceContext;
use crate::simulation::simulate_backend_call;

pub const HEALTH_PATH: &str = "/health";
pub const DATA_PATH: &str = "/api/data";

/// `GET /health`. Always 200; deliberately not counted in request metrics.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let trace = TraceContext::current();
    tracing::info!(
        service = %state.telemetry.service_name(),
        trace_id = %trace.trace_id,
        span_id = %trace.span_id,
        "Health check endpoint accessed."
    );
    (StatusCode::OK, Json(HealthStatus::healthy()))
}

/// `GET /api/data`.
pub async fn get_data(State(state): State<AppState>) -> Response {
    let trace = TraceContext::current();
    let service = state.telemetry.service_name().to_string();
    let mut guard = RequestGuard::start(
        state.telemetry.metrics().clone(),
        service.as_str(),
        "GET",
        DATA_PATH,
        trace.clone(),
    );

    let outcome = AssertUnwindSafe(retrieve_data(&state))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(DataError::from_panic(panic)));

    let response = match outcome {
        Ok(payload) => {
            tracing::info!(
                service = %service,
                trace_id = %trace.trace_id,
                span_id = %trace.span_id,
                value = payload.value,
                "[{}] Data retrieval successful. Value: {}",
                DATA_PATH,
                payload.value
            );
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err @ DataError::Simulated) => {
            tracing::error!(
                service = %service,
                trace_id = %trace.trace_id,
                span_id = %trace.span_id,
                error = ?err,
                "[{}] Error during data retrieval: {}",
                DATA_PATH,
                err
            );
            error_response(&err)
        }
        Err(err @ DataError::Unexpected(_)) => {
            tracing::error!(
                service = %service,
                trace_id = %trace.trace_id,
                span_id = %trace.span_id,
                severity = "CRITICAL",
                error = ?err,
                "[{}] An unexpected error occurred: {}",
                DATA_PATH,
                err
            );
            error_response(&err)
        }
    };

    guard.set_status(response.status());
    response
}

/// Simulated call plus the injected failure decision.
async fn retrieve_data(state: &AppState) -> Result<DataPayload, DataError> {
    simulate_backend_call(
        state.randomness.as_ref(),
        state.telemetry.service_name(),
        DATA_PATH,
    )
    .await;

    if state.randomness.should_fail() {
        let err = DataError::Simulated;
        record_exception(
            &tracing::Span::current(),
            "simulated_internal_error",
            err.kind(),
            &err.to_string(),
        );
        return Err(err);
    }

    Ok(DataPayload::new(state.randomness.payload_value()))
}

fn error_response(err: &DataError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::new(err.client_message())),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::server::build_router;
    use crate::observability::Telemetry;
    use crate::simulation::{Randomness, ScriptedRandomness, ThreadRandomness};
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    struct Panicking;

    impl Randomness for Panicking {
        fn backend_latency(&self) -> Duration {
            Duration::ZERO
        }
        fn should_fail(&self) -> bool {
            panic!("randomness source exploded with secret detail");
        }
        fn payload_value(&self) -> u32 {
            0
        }
    }

    /// Real decisions without the sleep, for high-volume tests.
    struct NoSleep;

    impl Randomness for NoSleep {
        fn backend_latency(&self) -> Duration {
            Duration::ZERO
        }
        fn should_fail(&self) -> bool {
            ThreadRandomness.should_fail()
        }
        fn payload_value(&self) -> u32 {
            ThreadRandomness.payload_value()
        }
    }

    fn state(randomness: impl Randomness + 'static) -> AppState {
        let telemetry = Arc::new(Telemetry::new("test-service").unwrap());
        AppState::new(telemetry, Arc::new(randomness))
    }

    async fn call(state: &AppState, path: &str) -> (StatusCode, serde_json::Value) {
        let response = build_router(state.clone())
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn counter(state: &AppState, status: &str) -> f64 {
        state
            .telemetry
            .metrics()
            .render()
            .lines()
            .filter(|l| l.starts_with("http_requests_total{") && l.contains(&format!("status=\"{}\"", status)))
            .find_map(|l| l.rsplit(' ').next()?.parse().ok())
            .unwrap_or(0.0)
    }

    fn histogram_count(state: &AppState) -> f64 {
        state
            .telemetry
            .metrics()
            .render()
            .lines()
            .find(|l| l.starts_with("http_request_duration_seconds_count{"))
            .and_then(|l| l.rsplit(' ').next()?.parse().ok())
            .unwrap_or(0.0)
    }

    #[tokio::test]
    async fn test_health_is_healthy_and_unmetered() {
        let state = state(ScriptedRandomness::failing());
        let (status, body) = call(&state, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"status": "healthy"}));
        assert!(!state.telemetry.metrics().render().contains("http_requests_total{"));
    }

    #[tokio::test]
    async fn test_data_success_path() {
        let state = state(ScriptedRandomness::success(73));
        let (status, body) = call(&state, "/api/data").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Data retrieved successfully!");
        assert_eq!(body["value"], 73);
        assert_eq!(counter(&state, "200"), 1.0);
        assert_eq!(histogram_count(&state), 1.0);
    }

    #[tokio::test]
    async fn test_data_simulated_failure() {
        let state = state(ScriptedRandomness::failing());
        let (status, body) = call(&state, "/api/data").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({"error": "Simulated internal service error"}));
        assert_eq!(counter(&state, "500"), 1.0);
        assert_eq!(counter(&state, "200"), 0.0);
        assert_eq!(histogram_count(&state), 1.0);
    }

    #[tokio::test]
    async fn test_data_unexpected_failure_is_generic() {
        let state = state(Panicking);
        let (status, body) = call(&state, "/api/data").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({"error": "An unexpected error occurred"}));
        assert!(!body.to_string().contains("secret detail"));
        assert_eq!(counter(&state, "500"), 1.0);
        assert_eq!(histogram_count(&state), 1.0);
    }

    #[tokio::test]
    async fn test_latency_observation_includes_backend_sleep() {
        let state = state(ScriptedRandomness::success(5).with_latency(Duration::from_millis(60)));
        call(&state, "/api/data").await;
        let sum: f64 = state
            .telemetry
            .metrics()
            .render()
            .lines()
            .find(|l| l.starts_with("http_request_duration_seconds_sum{"))
            .and_then(|l| l.rsplit(' ').next()?.parse().ok())
            .unwrap();
        assert!(sum >= 0.05, "recorded latency {} below simulated sleep", sum);
    }

    #[tokio::test]
    async fn test_every_request_counted_once_and_error_rate_converges() {
        let state = state(NoSleep);
        let total = 1000;
        let mut errors = 0;
        for _ in 0..total {
            let (status, body) = call(&state, "/api/data").await;
            match status {
                StatusCode::OK => {
                    let value = body["value"].as_u64().unwrap();
                    assert!((1..=100).contains(&value));
                }
                StatusCode::INTERNAL_SERVER_ERROR => {
                    assert!(body["error"].is_string());
                    errors += 1;
                }
                other => panic!("unexpected status {}", other),
            }
        }

        assert_eq!(counter(&state, "200") + counter(&state, "500"), total as f64);
        assert_eq!(counter(&state, "500"), errors as f64);
        assert_eq!(histogram_count(&state), total as f64);
        assert!((50..=150).contains(&errors), "observed {} errors in {} requests", errors, total);
    }

    #[tokio::test]
    async fn test_failure_annotates_request_span() {
        use opentelemetry::trace::{Status, TracerProvider as _};
        use opentelemetry::KeyValue;
        use opentelemetry_sdk::trace::{InMemorySpanExporter, SdkTracerProvider};
        use tracing_subscriber::layer::SubscriberExt;

        let exporter = InMemorySpanExporter::default();
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let subscriber = tracing_subscriber::registry()
            .with(tracing_opentelemetry::layer().with_tracer(provider.tracer("test")));
        let _default = tracing::subscriber::set_default(subscriber);

        let state = state(ScriptedRandomness::failing());
        let (status, _) = call(&state, "/api/data").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let spans = exporter.get_finished_spans().unwrap();
        let request = spans.iter().find(|s| s.name == "request").unwrap();
        let backend = spans.iter().find(|s| s.name == "simulate_db_call").unwrap();

        assert!(request
            .attributes
            .contains(&KeyValue::new("error.type", "simulated_internal_error")));
        let exception = request
            .events
            .events
            .iter()
            .find(|e| e.name == "exception")
            .unwrap();
        assert!(exception
            .attributes
            .contains(&KeyValue::new("exception.type", "DataError::Simulated")));
        assert_eq!(
            request.status,
            Status::error("Simulated internal service error")
        );

        assert_eq!(backend.parent_span_id, request.span_context.span_id());
        assert_eq!(
            backend.span_context.trace_id(),
            request.span_context.trace_id()
        );
    }
}
