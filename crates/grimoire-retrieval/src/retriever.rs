//! Retriever: vector store when reachable, lexical scan of local ingestion
//! artifacts otherwise, then graph boost, graph-aware rescale, dedup, and the
//! hybrid reranker when the plan asks for it.
//!
//! Every failure after the first deadline check is non-fatal: it is recorded
//! as a `DegradationEvent` and the outcome carries whatever the last
//! completed stage produced.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use grimoire_core::config::RetrievalConfig;
use grimoire_core::constants::{MAX_RETRIEVAL_LIMIT, MAX_VECTOR_K};
use grimoire_core::deadline::Deadline;
use grimoire_core::errors::{RerankError, RetrievalError};
use grimoire_core::models::{sanitize_score, sort_best_first, DegradationEvent, DocChunk, QueryPlan};
use grimoire_core::traits::{IVectorStore, VectorFilters, VectorHit};
use grimoire_graph::ranker::rescale_with;
use grimoire_graph::GraphArtifactStore;
use grimoire_observability::retrieval_span;
use grimoire_observability::tracing_setup::events;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::boost::apply_graph_boost;
use crate::dedup::dedup_chunks;
use crate::lexical::{load_chunks, score_chunks};
use crate::rerank::{HybridReranker, RerankStats, RerankedResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalSource {
    VectorStore,
    LexicalScan,
    None,
}

impl RetrievalSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VectorStore => "vector_store",
            Self::LexicalScan => "lexical_scan",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalOutcome {
    /// Best-first, deduplicated, at most `limit` long.
    pub chunks: Vec<DocChunk>,
    /// Present when the reranker ran to completion.
    pub reranked: Option<Vec<RerankedResult>>,
    pub rerank_stats: Option<RerankStats>,
    pub source: RetrievalSource,
    pub degradations: Vec<DegradationEvent>,
    pub elapsed_ms: u64,
}

impl RetrievalOutcome {
    pub fn is_degraded(&self) -> bool {
        !self.degradations.is_empty()
    }
}

pub struct Retriever {
    config: RetrievalConfig,
    ingest_dir: PathBuf,
    vector_store: Option<Arc<dyn IVectorStore>>,
    graph_store: Option<Arc<GraphArtifactStore>>,
    reranker: Option<Arc<HybridReranker>>,
}

impl Retriever {
    /// `ingest_dir` is the environment directory holding `*.json` chunk files.
    pub fn new(config: &RetrievalConfig, ingest_dir: impl Into<PathBuf>) -> Self {
        Self {
            config: config.clone(),
            ingest_dir: ingest_dir.into(),
            vector_store: None,
            graph_store: None,
            reranker: None,
        }
    }

    pub fn with_vector_store(mut self, store: Arc<dyn IVectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    pub fn with_graph_store(mut self, store: Arc<GraphArtifactStore>) -> Self {
        self.graph_store = Some(store);
        self
    }

    pub fn with_reranker(mut self, reranker: Arc<HybridReranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    pub fn ingest_dir(&self) -> &PathBuf {
        &self.ingest_dir
    }

    /// Just the ranked chunks.
    pub fn retrieve_chunks(
        &self,
        plan: &QueryPlan,
        query: &str,
        limit: usize,
        deadline: &Deadline,
    ) -> Result<Vec<DocChunk>, RetrievalError> {
        self.retrieve(plan, query, limit, deadline).map(|outcome| outcome.chunks)
    }

    /// Fails only when the deadline has already passed on entry.
    pub fn retrieve(
        &self,
        plan: &QueryPlan,
        query: &str,
        limit: usize,
        deadline: &Deadline,
    ) -> Result<RetrievalOutcome, RetrievalError> {
        let start = Instant::now();
        let limit = limit.clamp(1, MAX_RETRIEVAL_LIMIT);
        let _span = retrieval_span!(plan.query_hash, limit).entered();
        deadline.check("retrieval")?;

        let mut degradations = Vec::new();
        let search_text = plan.search_query();

        let (mut chunks, source) = match self.vector_candidates(search_text, limit, &mut degradations) {
            Some(chunks) => (chunks, RetrievalSource::VectorStore),
            None => match load_chunks(&self.ingest_dir, self.config.lexical_scan_limit) {
                Ok(all) => (score_chunks(all, search_text, query), RetrievalSource::LexicalScan),
                Err(err) => {
                    degrade(&mut degradations, "lexical_scan", &err.to_string(), "empty_results");
                    (Vec::new(), RetrievalSource::None)
                }
            },
        };

        let mut stages_complete = true;
        if deadline.check("graph_boost").is_ok() {
            self.apply_graph(plan, &mut chunks, &mut degradations);
        } else {
            stages_complete = false;
            degrade(&mut degradations, "retrieval", "deadline exceeded before graph boost", "unboosted_results");
        }

        sort_best_first(&mut chunks);
        let mut chunks = dedup_chunks(chunks, self.config.dedup_signature_tokens);
        chunks.truncate(limit);

        let mut reranked = None;
        let mut rerank_stats = None;
        if let Some(rerank_config) = &plan.reranking_config {
            if !stages_complete || deadline.is_expired() {
                degrade(&mut degradations, "reranker", "deadline exceeded before rerank", "retrieval_order");
            } else if let Some(reranker) = &self.reranker {
                match reranker.rerank(
                    query,
                    &chunks,
                    rerank_config,
                    Some(plan),
                    Some(&plan.classification),
                    deadline,
                ) {
                    Ok(output) => {
                        chunks = output.results.iter().map(|r| r.chunk.clone()).collect();
                        rerank_stats = Some(output.stats);
                        reranked = Some(output.results);
                    }
                    Err(err) => degrade(&mut degradations, "reranker", &err.to_string(), "retrieval_order"),
                }
            } else {
                let err = RerankError::ExtractorUnavailable {
                    extractor: "hybrid_reranker".to_string(),
                };
                degrade(&mut degradations, "reranker", &err.to_string(), "retrieval_order");
            }
        }

        let outcome = RetrievalOutcome {
            chunks,
            reranked,
            rerank_stats,
            source,
            degradations,
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            results = outcome.chunks.len(),
            source = ?outcome.source,
            degraded = outcome.is_degraded(),
            elapsed_ms = outcome.elapsed_ms,
            "retrieval complete"
        );
        Ok(outcome)
    }

    /// Vector-store candidates, or `None` when the lexical scan should run instead.
    fn vector_candidates(
        &self,
        search_text: &str,
        limit: usize,
        degradations: &mut Vec<DegradationEvent>,
    ) -> Option<Vec<DocChunk>> {
        let Some(store) = &self.vector_store else {
            degrade(degradations, "vector_store", "not configured", "lexical_scan");
            return None;
        };
        if !store.is_available() {
            degrade(degradations, "vector_store", "unavailable", "lexical_scan");
            return None;
        }
        let top_k = vector_fetch_k(limit, self.config.vector_overfetch_min);
        let filters = VectorFilters {
            query_text: search_text.to_string(),
            scan_limit: self.config.lexical_scan_limit,
            extra: Default::default(),
        };
        match store.query(None, top_k, &filters) {
            Ok(hits) if hits.is_empty() => {
                degrade(degradations, "vector_store", "empty result", "lexical_scan");
                None
            }
            Ok(hits) => {
                debug!(hits = hits.len(), top_k, "vector store results");
                Some(hits.into_iter().map(chunk_from_hit).collect())
            }
            Err(err) => {
                degrade(degradations, "vector_store", &err.to_string(), "lexical_scan");
                None
            }
        }
    }

    /// Expansion-term boost, then proximity rescale against the plan's analysis.
    fn apply_graph(&self, plan: &QueryPlan, chunks: &mut [DocChunk], degradations: &mut Vec<DegradationEvent>) {
        let graph = self
            .graph_store
            .as_ref()
            .and_then(|store| store.load_graph_snapshot(None));
        if plan.retrieval_strategy.use_graph && graph.is_none() {
            degrade(degradations, "graph", "snapshot unavailable", "ungraphed_ranking");
        }
        let Some(expansion) = &plan.graph_expansion else {
            return;
        };
        let boosted = apply_graph_boost(chunks, &expansion.terms, self.config.max_graph_boost);
        let rescaled = expansion
            .analysis
            .as_ref()
            .map_or(0, |analysis| rescale_with(graph.as_deref(), chunks, analysis));
        debug!(boosted, rescaled, "graph scoring applied");
    }
}

/// Vector candidates to request: twice the limit, at least `overfetch_min`,
/// never more than `MAX_VECTOR_K`. Limits above `MAX_VECTOR_K / 2` therefore
/// get less than a 2x overfetch.
fn vector_fetch_k(limit: usize, overfetch_min: usize) -> usize {
    limit.saturating_mul(2).max(overfetch_min).min(MAX_VECTOR_K)
}

fn chunk_from_hit(hit: VectorHit) -> DocChunk {
    let source = hit
        .metadata
        .get("source")
        .and_then(|s| s.as_str())
        .unwrap_or("vector_store")
        .to_string();
    DocChunk::new(hit.chunk_id, hit.content, source)
        .with_score(sanitize_score(hit.score))
        .with_metadata(hit.metadata)
}

fn degrade(degradations: &mut Vec<DegradationEvent>, component: &str, failure: &str, fallback: &str) {
    events::degradation_triggered(component, failure, fallback);
    degradations.push(DegradationEvent::new(component, failure, fallback));
}
