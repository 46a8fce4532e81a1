use serde::{Deserialize, Serialize};

use super::defaults;
use crate::models::{EvaluationStrategy, GateDecision};

/// Evaluation gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub enabled: bool,
    pub strategy: EvaluationStrategy,
    pub min_accuracy: f64,
    pub min_overall: f64,
    pub min_rules_accuracy: f64,
    pub enable_domain_validation: bool,
    pub enable_source_validation: bool,
    pub require_good_quality: bool,
    /// Soft budget; adaptive mode drops to the fast path when it is tight.
    pub max_evaluation_time_ms: u64,
    /// Return `fallback_decision` instead of propagating scoring failures.
    pub fallback_on_timeout: bool,
    pub fallback_decision: GateDecision,
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
    pub fast_path_max_answer_words: usize,
    /// Weights for accuracy, completeness, relevance, coherence, domain.
    pub quality_weights: QualityWeights,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::DEFAULT_EVALUATION_ENABLED,
            strategy: EvaluationStrategy::Adaptive,
            min_accuracy: defaults::DEFAULT_MIN_ACCURACY,
            min_overall: defaults::DEFAULT_MIN_OVERALL,
            min_rules_accuracy: defaults::DEFAULT_MIN_RULES_ACCURACY,
            enable_domain_validation: false,
            enable_source_validation: true,
            require_good_quality: false,
            max_evaluation_time_ms: defaults::DEFAULT_MAX_EVALUATION_TIME_MS,
            fallback_on_timeout: defaults::DEFAULT_FALLBACK_ON_TIMEOUT,
            fallback_decision: GateDecision::Review,
            cache_ttl_secs: defaults::DEFAULT_EVAL_CACHE_TTL_SECS,
            cache_capacity: defaults::DEFAULT_EVAL_CACHE_CAPACITY,
            fast_path_max_answer_words: defaults::DEFAULT_FAST_PATH_MAX_ANSWER_WORDS,
            quality_weights: QualityWeights::default(),
        }
    }
}

/// Component weights for the overall quality score. Tunable defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    pub accuracy: f64,
    pub completeness: f64,
    pub relevance: f64,
    pub coherence: f64,
    pub domain: f64,
}

impl QualityWeights {
    pub fn sum(&self) -> f64 {
        self.accuracy + self.completeness + self.relevance + self.coherence + self.domain
    }
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            accuracy: 0.3,
            completeness: 0.25,
            relevance: 0.2,
            coherence: 0.15,
            domain: 0.1,
        }
    }
}
