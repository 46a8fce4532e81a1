//! The cached per-query execution plan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::classification::{Classification, Domain, Intent};
use super::expansion::{ExpansionStrategy, ExpansionTerm};
use super::graph::QueryGraphAnalysis;

/// Reranking mode requested by the retrieval policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RerankMode {
    None,
    /// Maximal marginal relevance: diversity-maximizing.
    Mmr,
    Semantic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalStrategy {
    pub vector_top_k: usize,
    pub rerank_mode: RerankMode,
    pub graph_depth: usize,
    pub use_graph: bool,
    pub lexical_fallback: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    Small,
    Medium,
    Large,
    Code,
}

/// Model routing configuration for the external generation step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: String,
    pub tier: ModelTier,
    pub temperature: f64,
    pub max_tokens: u32,
    pub reasoning: bool,
}

/// Graph expansion attached to a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphExpansion {
    pub strategy: ExpansionStrategy,
    pub expanded_query: String,
    pub terms: Vec<ExpansionTerm>,
    pub entities: Vec<String>,
    #[serde(default)]
    pub analysis: Option<QueryGraphAnalysis>,
}

/// Hybrid reranking strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RerankingStrategy {
    VectorOnly,
    GraphEnhanced,
    DomainAware,
    HybridFull,
}

impl RerankingStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VectorOnly => "vector_only",
            Self::GraphEnhanced => "graph_enhanced",
            Self::DomainAware => "domain_aware",
            Self::HybridFull => "hybrid_full",
        }
    }

    /// Default strategy for a classification: fact lookups lean on the vector
    /// signal, multi-hop questions on the graph, rules content on domain signals.
    pub fn for_classification(classification: &Classification) -> Self {
        match (classification.intent, classification.domain) {
            (Intent::FactLookup, _) => Self::VectorOnly,
            (Intent::MultiHopReasoning, _) => Self::GraphEnhanced,
            (_, Domain::TtrpgRules) => Self::DomainAware,
            // High complexity and everything else.
            _ => Self::HybridFull,
        }
    }

    /// Default fusion weights for this strategy.
    pub fn default_weights(self) -> SignalWeights {
        match self {
            Self::VectorOnly => SignalWeights::new(0.7, 0.0, 0.2, 0.1, 0.0),
            Self::GraphEnhanced => SignalWeights::new(0.35, 0.35, 0.15, 0.1, 0.05),
            Self::DomainAware => SignalWeights::new(0.35, 0.15, 0.15, 0.3, 0.05),
            Self::HybridFull => SignalWeights::new(0.3, 0.25, 0.2, 0.2, 0.05),
        }
    }
}

/// Fusion weights over the signal families. Tunable defaults, not invariants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalWeights {
    pub vector: f64,
    pub graph: f64,
    pub content: f64,
    pub domain: f64,
    pub metadata: f64,
}

impl SignalWeights {
    pub fn new(vector: f64, graph: f64, content: f64, domain: f64, metadata: f64) -> Self {
        Self {
            vector,
            graph,
            content,
            domain,
            metadata,
        }
    }

    pub fn sum(&self) -> f64 {
        self.vector + self.graph + self.content + self.domain + self.metadata
    }

    /// Whether all weights are finite and non-negative with a positive sum.
    pub fn is_valid(&self) -> bool {
        let all = [self.vector, self.graph, self.content, self.domain, self.metadata];
        all.iter().all(|w| w.is_finite() && *w >= 0.0) && self.sum() > 0.0
    }
}

impl Default for SignalWeights {
    fn default() -> Self {
        RerankingStrategy::HybridFull.default_weights()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankingConfig {
    pub strategy: RerankingStrategy,
    pub weights: SignalWeights,
    pub max_results_to_rerank: usize,
    pub enable_caching: bool,
    pub timeout_ms: u64,
    pub parallel: bool,
}

impl RerankingConfig {
    pub fn for_strategy(strategy: RerankingStrategy) -> Self {
        Self {
            strategy,
            weights: strategy.default_weights(),
            ..Self::default()
        }
    }
}

impl Default for RerankingConfig {
    fn default() -> Self {
        Self {
            strategy: RerankingStrategy::HybridFull,
            weights: SignalWeights::default(),
            max_results_to_rerank: crate::config::defaults::DEFAULT_MAX_RESULTS_TO_RERANK,
            enable_caching: true,
            timeout_ms: crate::config::defaults::DEFAULT_RERANK_TIMEOUT_MS,
            parallel: true,
        }
    }
}

/// Which provenance stages to record for this query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceSettings {
    pub track_query: bool,
    pub track_retrieval: bool,
    pub track_reranking: bool,
    pub track_answer: bool,
}

impl Default for ProvenanceSettings {
    fn default() -> Self {
        Self {
            track_query: true,
            track_retrieval: true,
            track_reranking: true,
            track_answer: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStrategy {
    Fast,
    Comprehensive,
    Adaptive,
}

impl EvaluationStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Comprehensive => "comprehensive",
            Self::Adaptive => "adaptive",
        }
    }
}

/// Plan-level thresholds for the evaluation gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalSettings {
    pub strategy: EvaluationStrategy,
    pub min_accuracy: f64,
    pub min_overall: f64,
    pub min_rules_accuracy: f64,
    pub enable_domain_validation: bool,
    pub enable_source_validation: bool,
    pub require_good_quality: bool,
}

impl Default for EvalSettings {
    fn default() -> Self {
        use crate::config::defaults;
        Self {
            strategy: EvaluationStrategy::Adaptive,
            min_accuracy: defaults::DEFAULT_MIN_ACCURACY,
            min_overall: defaults::DEFAULT_MIN_OVERALL,
            min_rules_accuracy: defaults::DEFAULT_MIN_RULES_ACCURACY,
            enable_domain_validation: false,
            enable_source_validation: true,
            require_good_quality: false,
        }
    }
}

/// Complete cached execution plan for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    pub query: String,
    pub query_hash: String,
    pub classification: Classification,
    pub retrieval_strategy: RetrievalStrategy,
    pub model_config: ModelConfig,
    #[serde(default)]
    pub graph_expansion: Option<GraphExpansion>,
    #[serde(default)]
    pub reranking_config: Option<RerankingConfig>,
    #[serde(default)]
    pub provenance_config: Option<ProvenanceSettings>,
    #[serde(default)]
    pub eval_config: Option<EvalSettings>,
    pub created_at: DateTime<Utc>,
    /// Time-to-live in seconds.
    pub cache_ttl: u64,
    pub hit_count: u64,
}

impl QueryPlan {
    /// Record a cache hit. Never decreases.
    pub fn increment_hit_count(&mut self) {
        self.hit_count = self.hit_count.saturating_add(1);
    }

    /// Whether the plan is expired at `now` (strictly older than its TTL).
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let age_ms = (now - self.created_at).num_milliseconds();
        let ttl_ms = i64::try_from(self.cache_ttl)
            .unwrap_or(i64::MAX / 1000)
            .saturating_mul(1000);
        age_ms > ttl_ms
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// The query text retrieval should run against.
    pub fn search_query(&self) -> &str {
        self.graph_expansion
            .as_ref()
            .filter(|g| !g.terms.is_empty())
            .map(|g| g.expanded_query.as_str())
            .unwrap_or(self.query.as_str())
    }
}
