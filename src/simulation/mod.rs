//! Simulated backend behaviour.
//!
//! # Data Flow
//! ```text
//! /api/data handler
//!     → randomness.rs (latency, failure decision, payload value)
//!     → backend.rs (child span + sleep standing in for a database call)
//! ```
//!
//! # Design Decisions
//! - Every random decision goes through the [`Randomness`] trait so tests can
//!   force each branch
//! - The sleep is async; other requests keep running while one "waits on
//!   the database"

pub mod backend;
pub mod randomness;

pub use backend::simulate_backend_call;
pub use randomness::{Randomness, ScriptedRandomness, ThreadRandomness};
