use serde::{Deserialize, Serialize};

use super::defaults;
use crate::models::SignalWeights;

/// Hybrid reranker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankerConfig {
    pub enabled: bool,
    pub max_results_to_rerank: usize,
    pub timeout_ms: u64,
    pub parallel: bool,
    pub enable_caching: bool,
    pub cache_capacity: u64,
    pub cache_ttl_secs: u64,
    /// Replaces the per-strategy default weights when set.
    pub weights: Option<SignalWeights>,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::DEFAULT_RERANKING_ENABLED,
            max_results_to_rerank: defaults::DEFAULT_MAX_RESULTS_TO_RERANK,
            timeout_ms: defaults::DEFAULT_RERANK_TIMEOUT_MS,
            parallel: true,
            enable_caching: true,
            cache_capacity: defaults::DEFAULT_SIGNAL_CACHE_CAPACITY,
            cache_ttl_secs: defaults::DEFAULT_SIGNAL_CACHE_TTL_SECS,
            weights: None,
        }
    }
}
