//! Observability demo service.
//!
//! A small HTTP API instrumented with Prometheus metrics, JSON logs that
//! carry trace context, and OTLP trace export, plus a load generator that
//! drives it with a weighted request mix.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod loadgen;
pub mod observability;
pub mod simulation;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
