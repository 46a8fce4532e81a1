//! Hybrid reranker: extracts every signal family per candidate and fuses them
//! with the plan's strategy weights.
//!
//! Position-independent families are cached per `(query, chunk id, strategy)`.
//! Extraction is all-or-nothing under the deadline, so a rerank either
//! returns a complete, deterministic ordering or an error.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use grimoire_core::config::RerankerConfig;
use grimoire_core::deadline::Deadline;
use grimoire_core::errors::RerankError;
use grimoire_core::hashing::composite_hash;
use grimoire_core::models::{Classification, DocChunk, QueryPlan, RerankingConfig, SignalWeights};
use grimoire_graph::GraphArtifactStore;
use grimoire_observability::rerank_span;
use moka::sync::Cache;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::signals::{metadata, unit, CachedSignals, RerankingSignals, SignalContext};

/// One candidate after reranking. Ranks are zero-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankedResult {
    pub chunk: DocChunk,
    pub original_rank: usize,
    pub original_score: f64,
    pub final_score: f64,
    pub final_rank: usize,
    pub signals: RerankingSignals,
    pub extraction_time_ms: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RerankStats {
    pub candidates: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RerankOutput {
    pub results: Vec<RerankedResult>,
    pub stats: RerankStats,
}

pub struct HybridReranker {
    graph_store: Option<Arc<GraphArtifactStore>>,
    cache: Option<Cache<String, Arc<CachedSignals>>>,
}

impl HybridReranker {
    pub fn new(config: &RerankerConfig, graph_store: Option<Arc<GraphArtifactStore>>) -> Self {
        let cache = config.enable_caching.then(|| {
            Cache::builder()
                .max_capacity(config.cache_capacity.max(1))
                .time_to_live(Duration::from_secs(config.cache_ttl_secs))
                .build()
        });
        Self { graph_store, cache }
    }

    /// Cached signal entries.
    pub fn cached_signals(&self) -> u64 {
        self.cache.as_ref().map_or(0, |cache| {
            cache.run_pending_tasks();
            cache.entry_count()
        })
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }

    /// Rerank the first `config.max_results_to_rerank` of `results`.
    pub fn rerank(
        &self,
        query: &str,
        results: &[DocChunk],
        config: &RerankingConfig,
        plan: Option<&QueryPlan>,
        classification: Option<&Classification>,
        deadline: &Deadline,
    ) -> Result<RerankOutput, RerankError> {
        let start = Instant::now();
        if !config.weights.is_valid() {
            return Err(RerankError::InvalidWeights {
                reason: format!("{:?}", config.weights),
            });
        }
        let candidates = &results[..results.len().min(config.max_results_to_rerank)];
        let total = candidates.len();
        let _span = rerank_span!(config.strategy.as_str(), total).entered();

        let deadline = if config.timeout_ms == 0 {
            deadline.clone()
        } else {
            deadline.child(Duration::from_millis(config.timeout_ms))
        };
        if deadline.is_expired() {
            return Err(RerankError::DeadlineExceeded { completed: 0, total });
        }

        let graph = self.graph_store.as_ref().and_then(|s| s.load_graph_snapshot(None));
        let ctx = SignalContext::new(query, plan, classification, graph.as_deref(), total);
        let cache = self.cache.as_ref().filter(|_| config.enable_caching);
        let strategy = config.strategy.as_str();

        let completed = AtomicUsize::new(0);
        let hits = AtomicUsize::new(0);
        let extract = |(rank, chunk): (usize, &DocChunk)| -> Option<RerankedResult> {
            if deadline.is_expired() {
                return None;
            }
            let started = Instant::now();
            let cached = match cache {
                Some(cache) => {
                    let key = composite_hash(&[query, &chunk.id, strategy]);
                    if let Some(hit) = cache.get(&key) {
                        hits.fetch_add(1, Ordering::Relaxed);
                        hit
                    } else {
                        let fresh = Arc::new(CachedSignals::extract(&ctx, &chunk.text, &chunk.source, chunk.score));
                        cache.insert(key, Arc::clone(&fresh));
                        fresh
                    }
                }
                None => Arc::new(CachedSignals::extract(&ctx, &chunk.text, &chunk.source, chunk.score)),
            };
            let signals = RerankingSignals::from_parts(
                (*cached).clone(),
                metadata::extract(chunk, rank, total),
            );
            completed.fetch_add(1, Ordering::Relaxed);
            Some(RerankedResult {
                chunk: chunk.clone(),
                original_rank: rank,
                original_score: chunk.score,
                final_score: fuse(&signals, &config.weights),
                final_rank: rank,
                signals,
                extraction_time_ms: started.elapsed().as_secs_f64() * 1_000.0,
            })
        };

        let extracted: Vec<Option<RerankedResult>> = if config.parallel {
            candidates.par_iter().enumerate().map(extract).collect()
        } else {
            candidates.iter().enumerate().map(extract).collect()
        };
        let Some(mut reranked) = extracted.into_iter().collect::<Option<Vec<_>>>() else {
            return Err(RerankError::DeadlineExceeded {
                completed: completed.load(Ordering::Relaxed),
                total,
            });
        };

        reranked.sort_by(|a, b| {
            b.final_score
                .total_cmp(&a.final_score)
                .then_with(|| a.original_rank.cmp(&b.original_rank))
        });
        for (rank, result) in reranked.iter_mut().enumerate() {
            result.final_rank = rank;
            result.chunk.score = result.final_score;
        }

        let cache_hits = if cache.is_some() { hits.load(Ordering::Relaxed) } else { 0 };
        let stats = RerankStats {
            candidates: total,
            cache_hits,
            cache_misses: if cache.is_some() { total - cache_hits } else { 0 },
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        debug!(
            strategy,
            candidates = stats.candidates,
            cache_hits = stats.cache_hits,
            elapsed_ms = stats.elapsed_ms,
            "rerank complete"
        );
        Ok(RerankOutput {
            results: reranked,
            stats,
        })
    }
}

/// Weighted mean of the family scores, weights normalised by their sum.
pub fn fuse(signals: &RerankingSignals, weights: &SignalWeights) -> f64 {
    let sum = weights.sum();
    if sum <= 0.0 {
        return 0.0;
    }
    let weighted = weights.vector * signals.vector.score
        + weights.graph * signals.graph.score
        + weights.content * signals.content.score
        + weights.domain * signals.domain.score
        + weights.metadata * signals.metadata.score;
    unit(weighted / sum)
}
