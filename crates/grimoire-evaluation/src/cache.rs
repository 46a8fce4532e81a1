//! TTL cache of evaluation results keyed by
//! `(query hash, answer hash, strategy, min_overall)`.

use std::time::Duration;

use grimoire_core::hashing::{composite_hash, content_hash, query_hash};
use grimoire_core::models::EvaluationStrategy;
use moka::sync::Cache;

use crate::metrics::EvaluationResult;

pub struct EvaluationCache {
    inner: Cache<String, EvaluationResult>,
}

impl EvaluationCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(capacity.max(1))
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn key(query: &str, answer: &str, strategy: EvaluationStrategy, min_overall: f64) -> String {
        composite_hash(&[
            &query_hash(query),
            &content_hash(answer),
            strategy.as_str(),
            &format!("{min_overall:.4}"),
        ])
    }

    /// A cached result, flagged `cached = true`.
    pub fn get(&self, key: &str) -> Option<EvaluationResult> {
        self.inner.get(key).map(|mut result| {
            result.cached = true;
            result
        })
    }

    pub fn insert(&self, key: String, result: EvaluationResult) {
        self.inner.insert(key, result);
    }

    pub fn len(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}
