//! # grimoire-evaluation
//!
//! The evaluation gate scores a candidate answer against the retrieved
//! sources and renders a `GateDecision`:
//! - fast path: four cheap heuristics
//! - comprehensive path: grounded accuracy, completeness, relevance,
//!   coherence, plus domain and confidence sub-scores
//! - optional citation validation
//! - TTL result cache

pub mod cache;
pub mod citation;
pub mod gate;
pub mod metrics;
pub mod scoring;

pub use cache::EvaluationCache;
pub use citation::CitationReport;
pub use gate::{decide, EvaluationGate, EvaluationRequest, GateThresholds};
pub use metrics::{EvaluationResult, QualityLevel, QualityMetrics};
