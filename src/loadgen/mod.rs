//! Load generator subsystem.
//!
//! # Data Flow
//! ```text
//! LoadProfile (host, users, spawn rate, think time, run time)
//!     → runner.rs (ramp users up, stop on run time / Ctrl+C)
//!         → user.rs (wait → pick task → GET → record), one task per user
//!             → task.rs (weighted pick: /api/data ×3, /health ×1)
//!             → stats.rs (per-route counts, failures, latency percentiles)
//!     → report table
//! ```
//!
//! # Design Decisions
//! - Users share nothing but the HTTP client pool and the stats map
//! - Every user owns its own RNG stream
//! - Failed requests are recorded, never escalated

pub mod runner;
pub mod stats;
pub mod task;
pub mod user;

use thiserror::Error;

pub use runner::{LoadProfile, LoadRunner};
pub use stats::{render_report, RequestOutcome, RequestStats, StatsSnapshot};
pub use task::{Task, TaskSet};
pub use user::{SimulatedUser, WaitTime};

/// Errors raised while setting up a load run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid host: {0}")]
    InvalidHost(#[from] url::ParseError),

    #[error("task set has no selectable task")]
    EmptyTaskSet,

    #[error("invalid wait time: min {min_secs}s, max {max_secs}s")]
    InvalidWait { min_secs: f64, max_secs: f64 },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
