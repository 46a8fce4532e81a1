pub mod chunk;
pub mod classification;
pub mod degradation;
pub mod expansion;
pub mod gate;
pub mod graph;
pub mod plan;

pub use chunk::{normalize_scores, sanitize_score, sort_best_first, DocChunk};
pub use classification::{Classification, Complexity, Domain, Intent};
pub use degradation::DegradationEvent;
pub use expansion::{ExpandedQuery, ExpansionSource, ExpansionStrategy, ExpansionTerm};
pub use gate::GateDecision;
pub use graph::{
    CrossReference, EntityCategory, EntityLink, GraphEdge, GraphNode, GraphSnapshot,
    QueryGraphAnalysis, RelationshipKind, RelationshipPattern, TypedEntity,
};
pub use plan::{
    EvalSettings, EvaluationStrategy, GraphExpansion, ModelConfig, ModelTier, ProvenanceSettings,
    QueryPlan, RerankMode, RerankingConfig, RerankingStrategy, RetrievalStrategy, SignalWeights,
};
