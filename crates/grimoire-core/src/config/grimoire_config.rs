//! Root configuration: TOML file, then `GRIMOIRE_*` environment overrides, then validation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{
    EvaluationConfig, GraphConfig, ObservabilityConfig, PathsConfig, PipelineConfig,
    PlannerConfig, ProvenanceConfig, RerankerConfig, RetrievalConfig,
};
use crate::errors::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GrimoireConfig {
    pub paths: PathsConfig,
    pub planner: PlannerConfig,
    pub graph: GraphConfig,
    pub retrieval: RetrievalConfig,
    pub reranking: RerankerConfig,
    pub evaluation: EvaluationConfig,
    pub provenance: ProvenanceConfig,
    pub pipeline: PipelineConfig,
    pub observability: ObservabilityConfig,
}

impl GrimoireConfig {
    /// Parse a TOML document. Missing sections and keys take their defaults.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })
    }

    /// Load from a TOML file, apply environment overrides, and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("GRIMOIRE_ENV") {
            self.paths.environment = val;
        }
        if let Ok(val) = std::env::var("GRIMOIRE_INGEST_ROOT") {
            self.paths.ingest_root = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("GRIMOIRE_STATE_ROOT") {
            self.paths.state_root = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("GRIMOIRE_PLAN_TTL_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                self.planner.default_ttl_secs = v;
            }
        }
        if let Ok(val) = std::env::var("GRIMOIRE_EVALUATION_ENABLED") {
            if let Ok(v) = val.parse::<bool>() {
                self.evaluation.enabled = v;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paths.environment.trim().is_empty() {
            return Err(invalid("paths.environment", "must not be empty"));
        }
        if self.planner.default_ttl_secs == 0 {
            return Err(invalid("planner.default_ttl_secs", "must be greater than 0"));
        }
        if self.planner.rules_ttl_multiplier == 0 {
            return Err(invalid("planner.rules_ttl_multiplier", "must be greater than 0"));
        }
        if self.planner.volatile_ttl_divisor == 0 {
            return Err(invalid("planner.volatile_ttl_divisor", "must be greater than 0"));
        }
        if self.graph.cache_ttl_secs == 0 {
            return Err(invalid("graph.cache_ttl_secs", "must be greater than 0"));
        }
        check_unit("graph.min_confidence", self.graph.min_confidence)?;
        if self.retrieval.default_top_k == 0 {
            return Err(invalid("retrieval.default_top_k", "must be greater than 0"));
        }
        let boost = self.retrieval.max_graph_boost;
        if !boost.is_finite() || boost < 1.0 {
            return Err(invalid("retrieval.max_graph_boost", "must be at least 1.0"));
        }
        if self.reranking.max_results_to_rerank == 0 {
            return Err(invalid(
                "reranking.max_results_to_rerank",
                "must be greater than 0",
            ));
        }
        if let Some(weights) = &self.reranking.weights {
            if !weights.is_valid() {
                return Err(invalid(
                    "reranking.weights",
                    "must be non-negative with a positive sum",
                ));
            }
        }
        check_unit("evaluation.min_accuracy", self.evaluation.min_accuracy)?;
        check_unit("evaluation.min_overall", self.evaluation.min_overall)?;
        check_unit("evaluation.min_rules_accuracy", self.evaluation.min_rules_accuracy)?;
        let qw = &self.evaluation.quality_weights;
        let parts = [qw.accuracy, qw.completeness, qw.relevance, qw.coherence, qw.domain];
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) || qw.sum() <= 0.0 {
            return Err(invalid(
                "evaluation.quality_weights",
                "must be non-negative with a positive sum",
            ));
        }
        if self.evaluation.cache_ttl_secs == 0 {
            return Err(invalid("evaluation.cache_ttl_secs", "must be greater than 0"));
        }
        check_unit(
            "provenance.confidence_variation_warning",
            self.provenance.confidence_variation_warning,
        )?;
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn check_unit(field: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, "must be between 0.0 and 1.0"))
    }
}
