//! Lineage records. One `ProvenanceBundle` per query lifecycle.

use chrono::{DateTime, Utc};
use grimoire_core::models::{Complexity, Domain, GateDecision, Intent, ProvenanceSettings};
use serde::{Deserialize, Serialize};

use crate::quality::QualityMetrics;

/// Bucketed confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 0.9 => Self::VeryHigh,
            s if s >= 0.75 => Self::High,
            s if s >= 0.5 => Self::Medium,
            s if s >= 0.25 => Self::Low,
            _ => Self::VeryLow,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::VeryLow => "very_low",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very_high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// One retrieved candidate, as attributed in the lineage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceAttribution {
    pub chunk_id: String,
    pub source: String,
    /// First characters of the chunk text.
    pub excerpt: String,
    pub score: f64,
    /// Zero-based rank in the retrieval output.
    pub rank: usize,
    pub confidence_level: ConfidenceLevel,
    /// Fixed authority weight of `source`.
    pub authority: f64,
    pub retrieval_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
}

/// A recorded decision and how sure the pipeline was about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub stage: String,
    pub description: String,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

impl ReasoningStep {
    pub fn new(stage: impl Into<String>, description: impl Into<String>, confidence: f64) -> Self {
        Self {
            stage: stage.into(),
            description: description.into(),
            confidence,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryProvenance {
    pub original_query: String,
    pub query_hash: String,
    pub intent: Intent,
    pub domain: Domain,
    pub complexity: Complexity,
    pub classification_confidence: f64,
    pub plan_cache_hit: bool,
    pub expanded_query: Option<String>,
    pub expansion_terms: Vec<String>,
    pub model: String,
    pub processing_time_ms: u64,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalProvenance {
    pub method: String,
    pub candidate_count: usize,
    pub sources: Vec<SourceAttribution>,
    pub degradations: Vec<String>,
    pub elapsed_ms: u64,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

/// Rank movement of one candidate through the reranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankChange {
    pub chunk_id: String,
    pub original_rank: usize,
    pub final_rank: usize,
    pub original_score: f64,
    pub final_score: f64,
}

impl RankChange {
    /// Positive when the candidate moved up.
    pub fn movement(&self) -> i64 {
        self.original_rank as i64 - self.final_rank as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankingProvenance {
    pub strategy: String,
    pub candidates: usize,
    pub rank_changes: Vec<RankChange>,
    pub cache_hits: usize,
    pub elapsed_ms: u64,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerProvenance {
    /// blake3 of the answer text; the text itself is not retained.
    pub answer_hash: String,
    pub model: String,
    pub word_count: usize,
    pub citations: Vec<String>,
    pub unverified_citations: Vec<String>,
    pub gate_decision: Option<GateDecision>,
    pub overall_quality: Option<f64>,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

/// The lineage of one query. Finalized exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceBundle {
    pub session_id: String,
    pub correlation_id: String,
    pub query: String,
    pub settings: ProvenanceSettings,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub query_provenance: Option<QueryProvenance>,
    pub retrieval_provenance: Option<RetrievalProvenance>,
    pub reranking_provenance: Option<RerankingProvenance>,
    pub answer_provenance: Option<AnswerProvenance>,
    /// Deduplicated by chunk id, first attribution wins.
    pub all_sources: Vec<SourceAttribution>,
    pub reasoning_steps: Vec<ReasoningStep>,
    pub quality: Option<QualityMetrics>,
    pub tracking_errors: Vec<String>,
}

impl ProvenanceBundle {
    pub fn is_finalized(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.completed_at
            .map(|done| (done - self.started_at).num_milliseconds())
    }

    /// Names of the stages that were recorded, in pipeline order.
    pub fn stages_tracked(&self) -> Vec<&'static str> {
        let mut stages = Vec::new();
        if self.query_provenance.is_some() {
            stages.push("query");
        }
        if self.retrieval_provenance.is_some() {
            stages.push("retrieval");
        }
        if self.reranking_provenance.is_some() {
            stages.push("reranking");
        }
        if self.answer_provenance.is_some() {
            stages.push("answer");
        }
        stages
    }

    /// Add attributions not already present by chunk id.
    pub fn merge_sources(&mut self, sources: &[SourceAttribution]) {
        for source in sources {
            if !self.all_sources.iter().any(|s| s.chunk_id == source.chunk_id) {
                self.all_sources.push(source.clone());
            }
        }
    }

    pub fn summary(&self) -> ProvenanceSummary {
        ProvenanceSummary {
            session_id: self.session_id.clone(),
            correlation_id: self.correlation_id.clone(),
            query: self.query.clone(),
            stages_tracked: self.stages_tracked().into_iter().map(str::to_string).collect(),
            source_count: self.all_sources.len(),
            overall_confidence: self.quality.as_ref().map(|q| q.overall_confidence),
            confidence_level: self.quality.as_ref().map(|q| q.confidence_level),
            risk_level: self.quality.as_ref().map(|q| q.risk_level),
            gate_decision: self.answer_provenance.as_ref().and_then(|a| a.gate_decision),
            duration_ms: self.duration_ms(),
            tracking_errors: self.tracking_errors.len(),
        }
    }
}

/// Compact view of a bundle for the delivery layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceSummary {
    pub session_id: String,
    pub correlation_id: String,
    pub query: String,
    pub stages_tracked: Vec<String>,
    pub source_count: usize,
    pub overall_confidence: Option<f64>,
    pub confidence_level: Option<ConfidenceLevel>,
    pub risk_level: Option<RiskLevel>,
    pub gate_decision: Option<GateDecision>,
    pub duration_ms: Option<i64>,
    pub tracking_errors: usize,
}
