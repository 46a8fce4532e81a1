//! In-process plan cache backed by `DashMap`.

use dashmap::DashMap;
use grimoire_core::errors::GrimoireResult;
use grimoire_core::models::QueryPlan;
use grimoire_core::traits::{IPlanCache, PlanCacheStats};

use super::CacheCounters;

/// Same expiry and hit semantics as the file adapter, without persistence.
#[derive(Debug, Default)]
pub struct InMemoryPlanCache {
    plans: DashMap<String, QueryPlan>,
    counters: CacheCounters,
}

impl InMemoryPlanCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IPlanCache for InMemoryPlanCache {
    fn get(&self, query_hash: &str) -> GrimoireResult<Option<QueryPlan>> {
        let expired = match self.plans.get(query_hash) {
            Some(entry) if !entry.is_expired() => {
                self.counters.hit();
                return Ok(Some(entry.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.plans.remove(query_hash);
            self.counters.expired(1);
        }
        self.counters.miss();
        Ok(None)
    }

    fn put(&self, plan: &QueryPlan) -> GrimoireResult<()> {
        self.plans.insert(plan.query_hash.clone(), plan.clone());
        Ok(())
    }

    fn remove(&self, query_hash: &str) -> GrimoireResult<bool> {
        Ok(self.plans.remove(query_hash).is_some())
    }

    fn cleanup_expired(&self) -> GrimoireResult<usize> {
        let before = self.plans.len();
        self.plans.retain(|_, plan| !plan.is_expired());
        let removed = before.saturating_sub(self.plans.len());
        self.counters.expired(removed as u64);
        Ok(removed)
    }

    fn clear(&self) -> GrimoireResult<usize> {
        let removed = self.plans.len();
        self.plans.clear();
        Ok(removed)
    }

    fn stats(&self) -> PlanCacheStats {
        self.counters.snapshot(self.plans.len())
    }
}
