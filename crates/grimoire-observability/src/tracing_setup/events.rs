//! Structured log events for key pipeline operations.

/// A plan was served from cache.
pub fn plan_cache_hit(query_hash: &str, hit_count: u64) {
    tracing::debug!(
        event = "plan_cache_hit",
        query_hash = %query_hash,
        hit_count = hit_count,
        "plan cache hit"
    );
}

/// A plan had to be built.
pub fn plan_cache_miss(query_hash: &str) {
    tracing::debug!(event = "plan_cache_miss", query_hash = %query_hash, "plan cache miss");
}

/// A persisted cache entry could not be parsed and was evicted.
pub fn cache_entry_corrupt(path: &str, reason: &str) {
    tracing::warn!(
        event = "cache_entry_corrupt",
        path = %path,
        reason = %reason,
        "corrupt cache entry evicted"
    );
}

/// A stage fell back to degraded behaviour.
pub fn degradation_triggered(component: &str, failure: &str, fallback: &str) {
    tracing::warn!(
        event = "degradation_triggered",
        component = %component,
        failure = %failure,
        fallback = %fallback,
        "degradation triggered"
    );
}

/// The evaluation gate produced a decision.
pub fn gate_decided(decision: &str, overall_score: f64, confidence: f64) {
    tracing::info!(
        event = "gate_decided",
        decision = %decision,
        overall_score = overall_score,
        confidence = confidence,
        "gate decided"
    );
}

/// A graph snapshot was parsed from disk.
pub fn graph_snapshot_loaded(job_id: &str, nodes: usize, edges: usize, cross_refs: usize) {
    tracing::info!(
        event = "graph_snapshot_loaded",
        job_id = %job_id,
        nodes = nodes,
        edges = edges,
        cross_refs = cross_refs,
        "graph snapshot loaded"
    );
}
