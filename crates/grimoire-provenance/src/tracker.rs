//! ProvenanceTracker: builds a bundle stage by stage.
//!
//! Each `track_*` call is independently toggled and never propagates a
//! failure. A stage that cannot be recorded lands in `tracking_errors`;
//! tracking on a finalized bundle is ignored with a warning.

use chrono::Utc;
use grimoire_core::authority::source_authority;
use grimoire_core::config::ProvenanceConfig;
use grimoire_core::errors::ProvenanceError;
use grimoire_core::hashing::content_hash;
use grimoire_core::models::{DocChunk, ProvenanceSettings, QueryPlan, RerankingStrategy};
use grimoire_core::text::word_count;
use grimoire_evaluation::citation::extract_citations;
use grimoire_evaluation::EvaluationResult;
use grimoire_observability::provenance_span;
use grimoire_retrieval::{RerankStats, RerankedResult, RetrievalOutcome};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::model::{
    AnswerProvenance, ConfidenceLevel, ProvenanceBundle, QueryProvenance, RankChange,
    ReasoningStep, RerankingProvenance, RetrievalProvenance, SourceAttribution,
};
use crate::quality::{assess, QualityMetrics};

const EXCERPT_CHARS: usize = 160;

/// Stage confidence is the mean score of this many top results.
const CONFIDENCE_TOP_N: usize = 5;

/// Answer-stage confidence when the answer was never evaluated.
const UNEVALUATED_ANSWER_CONFIDENCE: f64 = 0.5;

/// A generated answer to attach to the lineage.
pub struct AnswerRecord<'a> {
    pub answer: &'a str,
    pub model: &'a str,
    pub evaluation: Option<&'a EvaluationResult>,
}

pub struct ProvenanceTracker {
    config: ProvenanceConfig,
}

fn finite(stage: &str, what: &str, value: f64) -> Result<f64, ProvenanceError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ProvenanceError::StageFailed {
            stage: stage.to_string(),
            reason: format!("{what} is not a finite number"),
        })
    }
}

fn top_mean(scores: impl Iterator<Item = f64>) -> f64 {
    let top: Vec<f64> = scores.take(CONFIDENCE_TOP_N).collect();
    if top.is_empty() {
        0.0
    } else {
        top.iter().sum::<f64>() / top.len() as f64
    }
}

fn page_of(chunk: &DocChunk) -> Option<String> {
    match chunk.metadata.get("page")? {
        serde_json::Value::String(page) => Some(page.clone()),
        serde_json::Value::Number(page) => Some(page.to_string()),
        _ => None,
    }
}

fn attribute(stage: &str, chunk: &DocChunk, rank: usize, method: &str) -> Result<SourceAttribution, ProvenanceError> {
    let score = finite(stage, &format!("score of {}", chunk.id), chunk.score)?;
    Ok(SourceAttribution {
        chunk_id: chunk.id.clone(),
        source: chunk.source.clone(),
        excerpt: chunk.text.chars().take(EXCERPT_CHARS).collect(),
        score,
        rank,
        confidence_level: ConfidenceLevel::from_score(score),
        authority: source_authority(&chunk.source),
        retrieval_method: method.to_string(),
        page: page_of(chunk),
    })
}

impl ProvenanceTracker {
    pub fn new(config: &ProvenanceConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &ProvenanceConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Start a bundle with the configured stage toggles.
    pub fn start_tracking(&self, query: &str) -> ProvenanceBundle {
        self.start_tracking_with(query, None)
    }

    /// Start a bundle. A stage is tracked only when both the config and the
    /// plan's settings (if any) enable it.
    pub fn start_tracking_with(&self, query: &str, plan: Option<&ProvenanceSettings>) -> ProvenanceBundle {
        let on = self.config.enabled;
        let plan = plan.cloned().unwrap_or_default();
        let settings = ProvenanceSettings {
            track_query: on && self.config.track_query && plan.track_query,
            track_retrieval: on && self.config.track_retrieval && plan.track_retrieval,
            track_reranking: on && self.config.track_reranking && plan.track_reranking,
            track_answer: on && self.config.track_answer && plan.track_answer,
        };
        let session_id = Uuid::new_v4().to_string();
        debug!(session_id = %session_id, "provenance tracking started");
        ProvenanceBundle {
            correlation_id: session_id.clone(),
            session_id,
            query: query.to_string(),
            settings,
            started_at: Utc::now(),
            completed_at: None,
            query_provenance: None,
            retrieval_provenance: None,
            reranking_provenance: None,
            answer_provenance: None,
            all_sources: Vec::new(),
            reasoning_steps: Vec::new(),
            quality: None,
            tracking_errors: Vec::new(),
        }
    }

    fn guarded(
        &self,
        bundle: &mut ProvenanceBundle,
        stage: &str,
        enabled: bool,
        track: impl FnOnce(&mut ProvenanceBundle) -> Result<(), ProvenanceError>,
    ) {
        let _span = provenance_span!(bundle.session_id).entered();
        if bundle.is_finalized() {
            warn!(stage, "bundle already finalized, tracking ignored");
            return;
        }
        if !enabled {
            debug!(stage, "stage tracking disabled");
            return;
        }
        if let Err(err) = track(bundle) {
            warn!(stage, error = %err, "provenance tracking failed");
            bundle.tracking_errors.push(err.to_string());
        }
    }

    pub fn track_query_processing(
        &self,
        bundle: &mut ProvenanceBundle,
        plan: &QueryPlan,
        plan_cache_hit: bool,
        processing_time_ms: u64,
    ) {
        let enabled = bundle.settings.track_query;
        self.guarded(bundle, "query", enabled, |bundle| {
            let classification = &plan.classification;
            let confidence = finite("query", "classification confidence", classification.confidence)?;
            let expansion_terms: Vec<String> = plan
                .graph_expansion
                .as_ref()
                .map(|g| g.terms.iter().map(|t| t.term.clone()).collect())
                .unwrap_or_default();
            let expanded_query = (!expansion_terms.is_empty()).then(|| plan.search_query().to_string());

            bundle.reasoning_steps.push(ReasoningStep::new(
                "query",
                format!(
                    "classified as {} in {} ({} complexity)",
                    classification.intent.as_str(),
                    classification.domain.as_str(),
                    classification.complexity.as_str()
                ),
                confidence,
            ));
            if !expansion_terms.is_empty() {
                let mean = plan
                    .graph_expansion
                    .as_ref()
                    .map(|g| g.terms.iter().map(|t| t.confidence).sum::<f64>() / g.terms.len() as f64)
                    .unwrap_or(0.0);
                bundle.reasoning_steps.push(ReasoningStep::new(
                    "query",
                    format!("expanded with {} graph terms", expansion_terms.len()),
                    mean,
                ));
            }
            bundle.query_provenance = Some(QueryProvenance {
                original_query: plan.query.clone(),
                query_hash: plan.query_hash.clone(),
                intent: classification.intent,
                domain: classification.domain,
                complexity: classification.complexity,
                classification_confidence: confidence,
                plan_cache_hit,
                expanded_query,
                expansion_terms,
                model: plan.model_config.model.clone(),
                processing_time_ms,
                confidence,
                timestamp: Utc::now(),
            });
            Ok(())
        });
    }

    pub fn track_retrieval(&self, bundle: &mut ProvenanceBundle, outcome: &RetrievalOutcome) {
        let enabled = bundle.settings.track_retrieval;
        self.guarded(bundle, "retrieval", enabled, |bundle| {
            let method = outcome.source.as_str();
            let sources = outcome
                .chunks
                .iter()
                .enumerate()
                .map(|(rank, chunk)| attribute("retrieval", chunk, rank, method))
                .collect::<Result<Vec<_>, _>>()?;
            let confidence = top_mean(sources.iter().map(|s| s.score));
            let degradations = outcome
                .degradations
                .iter()
                .map(|d| format!("{}: {} ({})", d.component, d.failure, d.fallback_used))
                .collect();

            bundle.merge_sources(&sources);
            bundle.reasoning_steps.push(ReasoningStep::new(
                "retrieval",
                format!("{} candidates via {method}", sources.len()),
                confidence,
            ));
            bundle.retrieval_provenance = Some(RetrievalProvenance {
                method: method.to_string(),
                candidate_count: sources.len(),
                sources,
                degradations,
                elapsed_ms: outcome.elapsed_ms,
                confidence,
                timestamp: Utc::now(),
            });
            Ok(())
        });
    }

    pub fn track_reranking(
        &self,
        bundle: &mut ProvenanceBundle,
        strategy: RerankingStrategy,
        results: &[RerankedResult],
        stats: Option<&RerankStats>,
    ) {
        let enabled = bundle.settings.track_reranking;
        self.guarded(bundle, "reranking", enabled, |bundle| {
            let mut rank_changes = Vec::with_capacity(results.len());
            for result in results {
                rank_changes.push(RankChange {
                    chunk_id: result.chunk.id.clone(),
                    original_rank: result.original_rank,
                    final_rank: result.final_rank,
                    original_score: result.original_score,
                    final_score: finite("reranking", "final score", result.final_score)?,
                });
            }
            let confidence = top_mean(rank_changes.iter().map(|c| c.final_score));
            let attributions = results
                .iter()
                .map(|r| attribute("reranking", &r.chunk, r.final_rank, "hybrid_rerank"))
                .collect::<Result<Vec<_>, _>>()?;
            let moved = rank_changes.iter().filter(|c| c.movement() != 0).count();

            bundle.merge_sources(&attributions);
            bundle.reasoning_steps.push(ReasoningStep::new(
                "reranking",
                format!("{} strategy moved {moved} of {} candidates", strategy.as_str(), results.len()),
                confidence,
            ));
            bundle.reranking_provenance = Some(RerankingProvenance {
                strategy: strategy.as_str().to_string(),
                candidates: results.len(),
                rank_changes,
                cache_hits: stats.map_or(0, |s| s.cache_hits),
                elapsed_ms: stats.map_or(0, |s| s.elapsed_ms),
                confidence,
                timestamp: Utc::now(),
            });
            Ok(())
        });
    }

    pub fn track_answer_generation(&self, bundle: &mut ProvenanceBundle, record: &AnswerRecord<'_>) {
        let enabled = bundle.settings.track_answer;
        self.guarded(bundle, "answer", enabled, |bundle| {
            let evaluation = record.evaluation;
            let confidence = match evaluation {
                Some(eval) => finite("answer", "overall quality", eval.overall_score)?,
                None => UNEVALUATED_ANSWER_CONFIDENCE,
            };
            let report = evaluation.and_then(|e| e.citations.as_ref());
            let citations = report.map_or_else(|| extract_citations(record.answer), |r| r.cited.clone());
            let unverified_citations = report.map(|r| r.unverified.clone()).unwrap_or_default();

            if let Some(eval) = evaluation {
                bundle.reasoning_steps.push(ReasoningStep::new(
                    "answer",
                    format!(
                        "gate decided {} at overall quality {:.2}",
                        eval.gate_decision, eval.overall_score
                    ),
                    finite("answer", "gate confidence", eval.confidence)?,
                ));
            }
            bundle.answer_provenance = Some(AnswerProvenance {
                answer_hash: content_hash(record.answer),
                model: record.model.to_string(),
                word_count: word_count(record.answer),
                citations,
                unverified_citations,
                gate_decision: evaluation.map(|e| e.gate_decision),
                overall_quality: evaluation.map(|e| e.overall_score),
                confidence,
                timestamp: Utc::now(),
            });
            Ok(())
        });
    }

    pub fn calculate_quality_metrics(&self, bundle: &ProvenanceBundle) -> QualityMetrics {
        assess(bundle, self.config.confidence_variation_warning)
    }

    /// Compute quality and close the bundle. A bundle is finalized once.
    pub fn finalize_bundle(&self, bundle: &mut ProvenanceBundle) -> Result<(), ProvenanceError> {
        let _span = provenance_span!(bundle.session_id).entered();
        if bundle.is_finalized() {
            return Err(ProvenanceError::AlreadyFinalized {
                session_id: bundle.session_id.clone(),
            });
        }
        let quality = self.calculate_quality_metrics(bundle);
        info!(
            overall_confidence = quality.overall_confidence,
            risk = quality.risk_level.as_str(),
            sources = bundle.all_sources.len(),
            tracking_errors = bundle.tracking_errors.len(),
            "provenance bundle finalized"
        );
        bundle.quality = Some(quality);
        bundle.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn export_json(bundle: &ProvenanceBundle) -> Result<String, ProvenanceError> {
        serde_json::to_string_pretty(bundle).map_err(|e| ProvenanceError::ExportFailed {
            reason: e.to_string(),
        })
    }
}
