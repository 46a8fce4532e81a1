//! # grimoire-provenance
//!
//! Records the lineage of one query (query processing, retrieval,
//! reranking, answer generation) into a `ProvenanceBundle`, then derives
//! confidence, source reliability, and risk from it.
//!
//! Tracking never fails the pipeline: a stage that cannot be recorded is
//! noted in the bundle's `tracking_errors` and skipped.

pub mod authority;
pub mod model;
pub mod quality;
pub mod tracker;

pub use model::{
    AnswerProvenance, ConfidenceLevel, ProvenanceBundle, ProvenanceSummary, QueryProvenance,
    RankChange, ReasoningStep, RerankingProvenance, RetrievalProvenance, RiskLevel,
    SourceAttribution,
};
pub use quality::{harmonic_mean, QualityMetrics};
pub use tracker::{AnswerRecord, ProvenanceTracker};
