//! # grimoire-engine
//!
//! Wires the subsystems into one query pipeline:
//! classify/plan → retrieve (+ graph boost, rerank) → evaluate → provenance.
//!
//! [`AppContext`] owns one handle per subsystem for a single environment and
//! is passed to [`QueryPipeline`] explicitly.

pub mod context;
pub mod pipeline;
pub mod response;

pub use context::{AppContext, QueryStats};
pub use pipeline::{QueryPipeline, QuerySession};
pub use response::{EvalSummary, QueryRequest, QueryResponse};
