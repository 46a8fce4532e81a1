//! QueryPlanner: classification, policy, routing, and graph expansion behind a plan cache.

use std::sync::Arc;

use chrono::Utc;
use grimoire_core::config::{
    EvaluationConfig, GraphConfig, GrimoireConfig, PlannerConfig, ProvenanceConfig, RerankerConfig,
};
use grimoire_core::errors::{GrimoireError, GrimoireResult};
use grimoire_core::hashing::query_hash;
use grimoire_core::models::{
    Classification, Complexity, Domain, EvalSettings, ExpansionStrategy, GraphExpansion, Intent,
    ProvenanceSettings, QueryPlan, RerankMode, RerankingConfig, RerankingStrategy,
    RetrievalStrategy,
};
use grimoire_core::traits::{IPlanCache, PlanCacheStats};
use grimoire_graph::{GraphArtifactStore, GraphAwareRanker, GraphQueryExpander};
use grimoire_observability::planning_span;
use grimoire_observability::tracing_setup::events;
use tracing::{info, warn};

use crate::classifier::classify;
use crate::policy::resolve_policy;
use crate::routing::route_model;

/// A plan plus whether it came from the cache.
#[derive(Debug, Clone)]
pub struct PlanLookup {
    pub plan: QueryPlan,
    pub cache_hit: bool,
}

/// Builds and caches one `QueryPlan` per distinct (trimmed) query.
pub struct QueryPlanner {
    planner: PlannerConfig,
    graph: GraphConfig,
    reranking: RerankerConfig,
    evaluation: EvaluationConfig,
    provenance: ProvenanceConfig,
    cache: Arc<dyn IPlanCache>,
    expander: Option<GraphQueryExpander>,
    ranker: Option<GraphAwareRanker>,
}

impl QueryPlanner {
    /// `graph_store` is ignored when graph expansion is disabled in config.
    pub fn new(
        config: &GrimoireConfig,
        cache: Arc<dyn IPlanCache>,
        graph_store: Option<Arc<GraphArtifactStore>>,
    ) -> Self {
        let graph_store = graph_store.filter(|_| config.graph.enabled);
        Self {
            planner: config.planner.clone(),
            graph: config.graph.clone(),
            reranking: config.reranking.clone(),
            evaluation: config.evaluation.clone(),
            provenance: config.provenance.clone(),
            cache,
            expander: graph_store.clone().map(GraphQueryExpander::new),
            ranker: graph_store.map(GraphAwareRanker::new),
        }
    }

    /// Cached plan for `query`, building and storing one on a miss.
    pub fn get_plan(&self, query: &str) -> GrimoireResult<QueryPlan> {
        self.resolve(query).map(|lookup| lookup.plan)
    }

    /// Like [`Self::get_plan`] but also reports whether the cache was hit.
    pub fn resolve(&self, query: &str) -> GrimoireResult<PlanLookup> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GrimoireError::invalid_request("query must not be empty"));
        }
        let hash = query_hash(query);
        let _span = planning_span!(hash).entered();

        match self.cache.get(&hash) {
            Ok(Some(mut plan)) => {
                plan.increment_hit_count();
                if let Err(err) = self.cache.put(&plan) {
                    warn!(query_hash = %hash, error = %err, "failed to persist plan hit count");
                }
                events::plan_cache_hit(&hash, plan.hit_count);
                return Ok(PlanLookup {
                    plan,
                    cache_hit: true,
                });
            }
            Ok(None) => {}
            Err(err) => warn!(query_hash = %hash, error = %err, "plan cache read failed; rebuilding"),
        }

        events::plan_cache_miss(&hash);
        let plan = self.build_plan(query, hash);
        if let Err(err) = self.cache.put(&plan) {
            warn!(query_hash = %plan.query_hash, error = %err, "failed to store plan");
        }
        Ok(PlanLookup {
            plan,
            cache_hit: false,
        })
    }

    /// Drop the cached plan for `query`. Returns whether one existed.
    pub fn invalidate(&self, query: &str) -> GrimoireResult<bool> {
        self.cache.remove(&query_hash(query))
    }

    pub fn cleanup_expired(&self) -> GrimoireResult<usize> {
        self.cache.cleanup_expired()
    }

    pub fn cache_stats(&self) -> PlanCacheStats {
        self.cache.stats()
    }

    fn build_plan(&self, query: &str, hash: String) -> QueryPlan {
        let classification = classify(query);
        let retrieval_strategy = resolve_policy(&classification, &self.planner.policy_overrides);
        let model_config = route_model(&classification, &self.planner.models);
        let graph_expansion = if retrieval_strategy.use_graph {
            self.expand(query, &classification)
        } else {
            None
        };
        let reranking_config = self.reranking_config(&classification, &retrieval_strategy);
        let cache_ttl = plan_ttl(&classification, &self.planner);

        info!(
            query_hash = %hash,
            intent = %classification.intent,
            domain = %classification.domain,
            complexity = %classification.complexity,
            top_k = retrieval_strategy.vector_top_k,
            graph_depth = retrieval_strategy.graph_depth,
            expansion_terms = graph_expansion.as_ref().map_or(0, |g| g.terms.len()),
            cache_ttl,
            "plan built"
        );

        QueryPlan {
            query: query.to_string(),
            query_hash: hash,
            classification,
            retrieval_strategy,
            model_config,
            graph_expansion,
            reranking_config,
            provenance_config: self.provenance_settings(),
            eval_config: self.eval_settings(),
            created_at: Utc::now(),
            cache_ttl,
            hit_count: 0,
        }
    }

    /// Ask the ranker which expansion fits, then expand. `none` keeps the analysis only.
    fn expand(&self, query: &str, classification: &Classification) -> Option<GraphExpansion> {
        let (expander, ranker) = (self.expander.as_ref()?, self.ranker.as_ref()?);
        let analysis = ranker.analyze_query(query, Some(classification));
        let strategy = analysis.recommended_strategy;
        if strategy == ExpansionStrategy::None {
            return Some(GraphExpansion {
                strategy,
                expanded_query: query.to_string(),
                terms: Vec::new(),
                entities: analysis.entity_texts(),
                analysis: Some(analysis),
            });
        }
        let expanded = expander.expand_query(
            query,
            strategy,
            self.graph.max_expansions,
            self.graph.min_confidence,
        );
        Some(GraphExpansion {
            strategy,
            expanded_query: expanded.expanded_query,
            terms: expanded.expansion_terms,
            entities: expanded.entities,
            analysis: Some(analysis),
        })
    }

    fn reranking_config(
        &self,
        classification: &Classification,
        retrieval: &RetrievalStrategy,
    ) -> Option<RerankingConfig> {
        if !self.reranking.enabled || retrieval.rerank_mode == RerankMode::None {
            return None;
        }
        let strategy = RerankingStrategy::for_classification(classification);
        Some(RerankingConfig {
            strategy,
            weights: self.reranking.weights.unwrap_or_else(|| strategy.default_weights()),
            max_results_to_rerank: self.reranking.max_results_to_rerank,
            enable_caching: self.reranking.enable_caching,
            timeout_ms: self.reranking.timeout_ms,
            parallel: self.reranking.parallel,
        })
    }

    fn provenance_settings(&self) -> Option<ProvenanceSettings> {
        self.provenance.enabled.then(|| ProvenanceSettings {
            track_query: self.provenance.track_query,
            track_retrieval: self.provenance.track_retrieval,
            track_reranking: self.provenance.track_reranking,
            track_answer: self.provenance.track_answer,
        })
    }

    fn eval_settings(&self) -> Option<EvalSettings> {
        self.evaluation.enabled.then(|| EvalSettings {
            strategy: self.evaluation.strategy,
            min_accuracy: self.evaluation.min_accuracy,
            min_overall: self.evaluation.min_overall,
            min_rules_accuracy: self.evaluation.min_rules_accuracy,
            enable_domain_validation: self.evaluation.enable_domain_validation,
            enable_source_validation: self.evaluation.enable_source_validation,
            require_good_quality: self.evaluation.require_good_quality,
        })
    }
}

/// Plan TTL in seconds. Creative or high-complexity plans get the shortened TTL even
/// in the rules domain; other rules plans live longer than the default.
pub fn plan_ttl(classification: &Classification, config: &PlannerConfig) -> u64 {
    let base = config.default_ttl_secs;
    if classification.intent == Intent::CreativeWrite || classification.complexity == Complexity::High {
        base / config.volatile_ttl_divisor.max(1)
    } else if classification.domain == Domain::TtrpgRules {
        base.saturating_mul(config.rules_ttl_multiplier)
    } else {
        base
    }
}
