use serde::{Deserialize, Serialize};

use crate::errors::GrimoireResult;
use crate::models::QueryPlan;

/// Counters exposed by every plan cache adapter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub corrupt_evictions: u64,
    pub expired_evictions: u64,
}

impl PlanCacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Persistence for query plans, keyed by exact query hash.
///
/// Implementations serialise all operations. Expired and corrupt entries are
/// evicted and reported as misses, never as errors.
pub trait IPlanCache: Send + Sync {
    /// Fetch a live plan by query hash.
    fn get(&self, query_hash: &str) -> GrimoireResult<Option<QueryPlan>>;

    /// Insert or replace the plan stored under `plan.query_hash`.
    fn put(&self, plan: &QueryPlan) -> GrimoireResult<()>;

    /// Remove a single entry. Returns whether it existed.
    fn remove(&self, query_hash: &str) -> GrimoireResult<bool>;

    /// Delete every expired entry, returning how many were removed.
    fn cleanup_expired(&self) -> GrimoireResult<usize>;

    /// Delete every entry, returning how many were removed.
    fn clear(&self) -> GrimoireResult<usize>;

    fn stats(&self) -> PlanCacheStats;
}
