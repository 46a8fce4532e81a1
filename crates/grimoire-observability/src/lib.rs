//! # grimoire-observability
//!
//! Structured tracing with per-stage span macros and event helpers,
//! degradation tracking, and a bounded query performance log.

pub mod degradation;
pub mod query_log;
pub mod tracing_setup;

pub use degradation::{DegradationTracker, RecoveryStatus, TrackedDegradation};
pub use query_log::{QueryLog, QueryLogEntry};
