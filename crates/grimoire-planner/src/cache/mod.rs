//! `IPlanCache` adapters.

mod file_cache;
mod memory_cache;

pub use file_cache::FilePlanCache;
pub use memory_cache::InMemoryPlanCache;

use std::sync::atomic::{AtomicU64, Ordering};

use grimoire_core::traits::PlanCacheStats;

/// Counters shared by both adapters.
#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    corrupt_evictions: AtomicU64,
    expired_evictions: AtomicU64,
}

impl CacheCounters {
    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn corrupt(&self) {
        self.corrupt_evictions.fetch_add(1, Ordering::Relaxed);
        self.miss();
    }

    fn expired(&self, count: u64) {
        self.expired_evictions.fetch_add(count, Ordering::Relaxed);
    }

    fn snapshot(&self, entries: usize) -> PlanCacheStats {
        PlanCacheStats {
            entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            corrupt_evictions: self.corrupt_evictions.load(Ordering::Relaxed),
            expired_evictions: self.expired_evictions.load(Ordering::Relaxed),
        }
    }
}
