use serde::{Deserialize, Serialize};

use super::defaults;

/// Graph artifact loading and expansion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub enabled: bool,
    /// Snapshot cache TTL in seconds.
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
    pub max_expansions: usize,
    pub min_confidence: f64,
    /// Pin a specific ingestion job instead of the most recent one.
    pub job_id: Option<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::DEFAULT_GRAPH_ENABLED,
            cache_ttl_secs: defaults::DEFAULT_GRAPH_CACHE_TTL_SECS,
            cache_capacity: defaults::DEFAULT_GRAPH_CACHE_CAPACITY,
            max_expansions: defaults::DEFAULT_MAX_EXPANSIONS,
            min_confidence: defaults::DEFAULT_MIN_EXPANSION_CONFIDENCE,
            job_id: None,
        }
    }
}
