//! Request/response contract with the delivery layer.

use grimoire_core::errors::{GrimoireError, GrimoireResult};
use grimoire_core::models::{
    Classification, DegradationEvent, DocChunk, EvaluationStrategy, GateDecision, ModelConfig,
    RetrievalStrategy,
};
use grimoire_evaluation::{EvaluationResult, QualityLevel};
use grimoire_provenance::ProvenanceSummary;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
    /// Overrides the configured request deadline; `0` disables it.
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: None,
            deadline_ms: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_deadline_ms(mut self, deadline_ms: u64) -> Self {
        self.deadline_ms = Some(deadline_ms);
        self
    }

    pub fn validate(&self) -> GrimoireResult<()> {
        if self.query.trim().is_empty() {
            return Err(GrimoireError::invalid_request("query must not be empty"));
        }
        if self.top_k == Some(0) {
            return Err(GrimoireError::invalid_request("top_k must be at least 1"));
        }
        Ok(())
    }
}

/// Gate outcome as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalSummary {
    pub decision: GateDecision,
    pub overall_score: f64,
    pub quality_level: QualityLevel,
    pub confidence: f64,
    pub strategy: EvaluationStrategy,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
    pub critical_failures: Vec<String>,
    pub cached: bool,
    pub fallback_used: bool,
}

impl From<&EvaluationResult> for EvalSummary {
    fn from(result: &EvaluationResult) -> Self {
        Self {
            decision: result.gate_decision,
            overall_score: result.overall_score,
            quality_level: result.quality_level,
            confidence: result.confidence,
            strategy: result.strategy_used,
            issues: result.issues.clone(),
            suggestions: result.suggestions.clone(),
            critical_failures: result.critical_failures.clone(),
            cached: result.cached,
            fallback_used: result.fallback_used,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query: String,
    pub classification: Classification,
    /// The plan's retrieval strategy.
    pub plan: RetrievalStrategy,
    pub model: ModelConfig,
    pub retrieved: Vec<DocChunk>,
    pub reranked: bool,
    pub plan_cache_hit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval: Option<EvalSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<ProvenanceSummary>,
    pub degraded: bool,
    pub degradations: Vec<DegradationEvent>,
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_validation() {
        assert!(QueryRequest::new("fireball range").validate().is_ok());
        assert!(QueryRequest::new("   ").validate().unwrap_err().is_request_error());
        assert!(QueryRequest::new("fireball").with_top_k(0).validate().is_err());
    }

    #[test]
    fn request_defaults_from_json() {
        let req: QueryRequest = serde_json::from_str(r#"{"query": "fireball"}"#).unwrap();
        assert_eq!(req, QueryRequest::new("fireball"));
        let req: QueryRequest = serde_json::from_str(r#"{"query": "x", "top_k": 3, "deadline_ms": 0}"#).unwrap();
        assert_eq!(req.top_k, Some(3));
        assert_eq!(req.deadline_ms, Some(0));
    }
}
