//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use observability_demo::config::ServiceConfig;
use observability_demo::lifecycle::{self, RunningService};
use observability_demo::simulation::{Randomness, ScriptedRandomness};

/// Start the service on ephemeral ports with scripted randomness.
pub async fn start_service(randomness: impl Randomness + 'static) -> RunningService {
    let mut config = ServiceConfig::default();
    config.bind_address = "127.0.0.1:0".into();
    config.metrics_address = "127.0.0.1:0".into();
    config.telemetry.service_name = "integration-test".into();
    config.telemetry.export_disabled = true;

    lifecycle::start(&config, Arc::new(randomness)).await.unwrap()
}

/// Service whose backend always succeeds instantly with `value`.
pub async fn start_healthy_service(value: u32) -> RunningService {
    start_service(ScriptedRandomness::success(value).with_latency(Duration::ZERO)).await
}

pub fn api_url(service: &RunningService, path: &str) -> String {
    format!("http://{}{}", service.api_addr, path)
}

/// Fetch the Prometheus exposition over HTTP.
pub async fn scrape(service: &RunningService) -> String {
    reqwest::get(format!("http://{}/metrics", service.metrics_addr))
        .await
        .unwrap()
        .text()
        .await
        .unwrap()
}

/// Sum of `metric` samples whose labels contain every needle.
pub fn sample(exposition: &str, metric: &str, needles: &[&str]) -> f64 {
    exposition
        .lines()
        .filter(|l| l.starts_with(&format!("{}{{", metric)))
        .filter(|l| needles.iter().all(|n| l.contains(n)))
        .filter_map(|l| l.rsplit(' ').next()?.parse::<f64>().ok())
        .sum()
}
