//! Per-query performance log: hash, intent, latency, result count, cache and degradation flags.

use std::collections::VecDeque;
use std::time::Duration;

use grimoire_core::models::Intent;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLogEntry {
    pub query_hash: String,
    pub intent: Option<Intent>,
    pub latency: Duration,
    pub result_count: usize,
    pub plan_cache_hit: bool,
    pub degraded: bool,
    pub timestamp_epoch_ms: i64,
}

impl QueryLogEntry {
    pub fn new(
        query_hash: impl Into<String>,
        intent: Option<Intent>,
        latency: Duration,
        result_count: usize,
        plan_cache_hit: bool,
        degraded: bool,
    ) -> Self {
        Self {
            query_hash: query_hash.into(),
            intent,
            latency,
            result_count,
            plan_cache_hit,
            degraded,
            timestamp_epoch_ms: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Ring buffer of recent queries.
#[derive(Debug, Clone)]
pub struct QueryLog {
    entries: VecDeque<QueryLogEntry>,
    max_entries: usize,
}

impl Default for QueryLog {
    fn default() -> Self {
        Self::with_capacity(grimoire_core::config::defaults::DEFAULT_QUERY_LOG_CAPACITY)
    }
}

impl QueryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            entries: VecDeque::with_capacity(max_entries.min(1_024)),
            max_entries,
        }
    }

    pub fn record(&mut self, entry: QueryLogEntry) {
        tracing::debug!(
            event = "query_logged",
            query_hash = %entry.query_hash,
            intent = ?entry.intent,
            latency_ms = entry.latency.as_millis() as u64,
            result_count = entry.result_count,
            plan_cache_hit = entry.plan_cache_hit,
            degraded = entry.degraded,
            "query logged"
        );
        if self.entries.len() == self.max_entries {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn entries(&self) -> impl Iterator<Item = &QueryLogEntry> {
        self.entries.iter()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn avg_latency(&self) -> Duration {
        if self.entries.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.entries.iter().map(|e| e.latency).sum();
        total / self.entries.len() as u32
    }

    /// Latency at percentile `p` in [0.0, 1.0] (nearest rank).
    pub fn latency_percentile(&self, p: f64) -> Duration {
        if self.entries.is_empty() {
            return Duration::ZERO;
        }
        let mut latencies: Vec<Duration> = self.entries.iter().map(|e| e.latency).collect();
        latencies.sort();
        let p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
        let idx = (p * (latencies.len() - 1) as f64).round() as usize;
        latencies[idx.min(latencies.len() - 1)]
    }

    /// Fraction of logged queries served from the plan cache.
    pub fn plan_cache_hit_rate(&self) -> f64 {
        ratio(self.entries.iter().filter(|e| e.plan_cache_hit).count(), self.entries.len())
    }

    /// Fraction of logged queries that ran in degraded mode.
    pub fn degraded_rate(&self) -> f64 {
        ratio(self.entries.iter().filter(|e| e.degraded).count(), self.entries.len())
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}
