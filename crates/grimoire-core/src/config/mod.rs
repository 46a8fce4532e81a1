//! Configuration: TOML-backed section structs with defaults in `defaults`.

pub mod defaults;
pub mod evaluation_config;
pub mod graph_config;
pub mod grimoire_config;
pub mod observability_config;
pub mod paths_config;
pub mod pipeline_config;
pub mod planner_config;
pub mod provenance_config;
pub mod reranker_config;
pub mod retrieval_config;

pub use evaluation_config::{EvaluationConfig, QualityWeights};
pub use graph_config::GraphConfig;
pub use grimoire_config::GrimoireConfig;
pub use observability_config::ObservabilityConfig;
pub use paths_config::PathsConfig;
pub use pipeline_config::PipelineConfig;
pub use planner_config::{ModelRoutingConfig, PlanCacheBackend, PlannerConfig, PolicyOverride};
pub use provenance_config::ProvenanceConfig;
pub use reranker_config::RerankerConfig;
pub use retrieval_config::RetrievalConfig;
