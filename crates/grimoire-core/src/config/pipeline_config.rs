use serde::{Deserialize, Serialize};

use super::defaults;

/// End-to-end pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Default per-request deadline; `0` disables it.
    pub request_deadline_ms: u64,
    pub query_log_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_deadline_ms: defaults::DEFAULT_REQUEST_DEADLINE_MS,
            query_log_capacity: defaults::DEFAULT_QUERY_LOG_CAPACITY,
        }
    }
}
