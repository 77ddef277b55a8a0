//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, request span)
//!     → handlers.rs (/health, /api/data)
//!         → guard.rs (latency + count recorded on every exit path)
//!     → response.rs (JSON bodies)
//!     → Send to client
//! ```

pub mod guard;
pub mod handlers;
pub mod response;
pub mod server;

pub use guard::RequestGuard;
pub use response::{DataError, DataPayload, ErrorBody, HealthStatus};
pub use server::{build_router, AppState, HttpServer};
