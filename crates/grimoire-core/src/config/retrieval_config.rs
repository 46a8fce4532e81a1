use serde::{Deserialize, Serialize};

use super::defaults;

/// Retriever configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Result limit when the request does not carry one.
    pub default_top_k: usize,
    /// Passed to the vector store as a scan hint.
    pub lexical_scan_limit: usize,
    /// Minimum number of candidates requested from the vector store.
    pub vector_overfetch_min: usize,
    /// Upper bound on the graph-expansion boost factor.
    pub max_graph_boost: f64,
    /// Number of leading tokens used for duplicate detection.
    pub dedup_signature_tokens: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: defaults::DEFAULT_TOP_K,
            lexical_scan_limit: defaults::DEFAULT_LEXICAL_SCAN_LIMIT,
            vector_overfetch_min: defaults::DEFAULT_VECTOR_OVERFETCH_MIN,
            max_graph_boost: defaults::DEFAULT_MAX_GRAPH_BOOST,
            dedup_signature_tokens: defaults::DEFAULT_DEDUP_SIGNATURE_TOKENS,
        }
    }
}
