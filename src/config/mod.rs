//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! process environment
//!     → loader.rs (read OTEL_* / bind variables, parse)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → handed to telemetry + servers at startup
//! ```
//!
//! # Design Decisions
//! - Environment variables are the only configuration surface
//! - All fields have defaults so an empty environment boots the service
//! - The loader takes a lookup function so tests never touch the real env

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_from_env, load_with, parse_service_name, ConfigError};
pub use schema::{ServiceConfig, TelemetryConfig};
