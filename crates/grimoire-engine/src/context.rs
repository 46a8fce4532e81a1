//! AppContext: every subsystem handle for one environment, built once.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use grimoire_core::config::{GrimoireConfig, PlanCacheBackend};
use grimoire_core::errors::GrimoireResult;
use grimoire_core::models::DegradationEvent;
use grimoire_core::traits::{IPlanCache, IVectorStore};
use grimoire_evaluation::EvaluationGate;
use grimoire_graph::GraphArtifactStore;
use grimoire_observability::{DegradationTracker, QueryLog, QueryLogEntry};
use grimoire_planner::{FilePlanCache, InMemoryPlanCache, QueryPlanner};
use grimoire_provenance::ProvenanceTracker;
use grimoire_retrieval::{HybridReranker, Retriever};
use serde::Serialize;
use tracing::info;

/// Aggregates over the query log.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryStats {
    pub queries: usize,
    pub avg_latency_ms: u128,
    pub p95_latency_ms: u128,
    pub plan_cache_hit_rate: f64,
    pub degraded_rate: f64,
    /// Unrecovered degradations per component.
    pub active_degradations: BTreeMap<String, usize>,
}

pub struct AppContext {
    pub config: GrimoireConfig,
    pub graph_store: Option<Arc<GraphArtifactStore>>,
    pub planner: QueryPlanner,
    pub retriever: Retriever,
    pub gate: EvaluationGate,
    pub tracker: ProvenanceTracker,
    query_log: Mutex<QueryLog>,
    degradations: Mutex<DegradationTracker>,
}

impl AppContext {
    /// Validate `config` and build every handle. The vector store is optional;
    /// without one the retriever scans local ingestion artifacts.
    pub fn new(config: GrimoireConfig, vector_store: Option<Arc<dyn IVectorStore>>) -> GrimoireResult<Self> {
        config.validate()?;
        let paths = &config.paths;

        let graph_store = config.graph.enabled.then(|| {
            Arc::new(GraphArtifactStore::new(
                paths.ingest_root.clone(),
                paths.environment.clone(),
                &config.graph,
            ))
        });

        let plan_cache: Arc<dyn IPlanCache> = match config.planner.cache_backend {
            PlanCacheBackend::File => Arc::new(FilePlanCache::open(paths.plan_cache_dir())?),
            PlanCacheBackend::Memory => Arc::new(InMemoryPlanCache::new()),
        };
        let planner = QueryPlanner::new(&config, plan_cache, graph_store.clone());

        let mut retriever = Retriever::new(&config.retrieval, paths.environment_ingest_dir());
        if let Some(store) = vector_store {
            retriever = retriever.with_vector_store(store);
        }
        if let Some(store) = &graph_store {
            retriever = retriever.with_graph_store(Arc::clone(store));
        }
        if config.reranking.enabled {
            let reranker = HybridReranker::new(&config.reranking, graph_store.clone());
            retriever = retriever.with_reranker(Arc::new(reranker));
        }

        info!(
            environment = %paths.environment,
            graph = graph_store.is_some(),
            reranking = config.reranking.enabled,
            evaluation = config.evaluation.enabled,
            provenance = config.provenance.enabled,
            "app context ready"
        );

        Ok(Self {
            gate: EvaluationGate::new(&config.evaluation),
            tracker: ProvenanceTracker::new(&config.provenance),
            query_log: Mutex::new(QueryLog::with_capacity(config.pipeline.query_log_capacity)),
            degradations: Mutex::new(DegradationTracker::new()),
            graph_store,
            planner,
            retriever,
            config,
        })
    }

    pub fn environment(&self) -> &str {
        &self.config.paths.environment
    }

    pub fn record_query(&self, entry: QueryLogEntry) {
        self.query_log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(entry);
    }

    pub fn record_degradations(&self, events: &[DegradationEvent]) {
        if events.is_empty() {
            return;
        }
        self.degradations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record_all(events);
    }

    /// Mark a component healthy again. Returns how many events were recovered.
    pub fn mark_recovered(&self, component: &str) -> usize {
        self.degradations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .mark_recovered(component)
    }

    pub fn stats(&self) -> QueryStats {
        let log = self.query_log.lock().unwrap_or_else(PoisonError::into_inner);
        let degradations = self.degradations.lock().unwrap_or_else(PoisonError::into_inner);
        QueryStats {
            queries: log.count(),
            avg_latency_ms: log.avg_latency().as_millis(),
            p95_latency_ms: log.latency_percentile(0.95).as_millis(),
            plan_cache_hit_rate: log.plan_cache_hit_rate(),
            degraded_rate: log.degraded_rate(),
            active_degradations: degradations.active_by_component(),
        }
    }
}
