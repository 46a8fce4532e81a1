use serde::{Deserialize, Serialize};

use super::defaults;

/// Provenance tracking configuration. Each stage is toggled independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvenanceConfig {
    pub enabled: bool,
    pub track_query: bool,
    pub track_retrieval: bool,
    pub track_reranking: bool,
    pub track_answer: bool,
    /// Max minus min stage confidence above which a warning is raised.
    pub confidence_variation_warning: f64,
}

impl Default for ProvenanceConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::DEFAULT_PROVENANCE_ENABLED,
            track_query: true,
            track_retrieval: true,
            track_reranking: true,
            track_answer: true,
            confidence_variation_warning: defaults::DEFAULT_CONFIDENCE_VARIATION_WARNING,
        }
    }
}
