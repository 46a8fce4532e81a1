use std::sync::Arc;

use grimoire_core::config::{GrimoireConfig, ProvenanceConfig};
use grimoire_core::deadline::Deadline;
use grimoire_core::errors::ProvenanceError;
use grimoire_core::models::{
    DegradationEvent, DocChunk, EvaluationStrategy, GateDecision, ProvenanceSettings, QueryPlan,
    RerankingConfig, RerankingStrategy,
};
use grimoire_evaluation::{CitationReport, EvaluationResult, QualityLevel, QualityMetrics};
use grimoire_planner::{InMemoryPlanCache, QueryPlanner};
use grimoire_provenance::{AnswerRecord, ConfidenceLevel, ProvenanceTracker, RiskLevel};
use grimoire_retrieval::{HybridReranker, RetrievalOutcome, RetrievalSource};

const QUERY: &str = "What is the range of Fireball?";

fn plan() -> QueryPlan {
    let config = GrimoireConfig::default();
    QueryPlanner::new(&config, Arc::new(InMemoryPlanCache::new()), None)
        .get_plan(QUERY)
        .unwrap()
}

fn chunks() -> Vec<DocChunk> {
    vec![
        DocChunk::new("phb-001", "Fireball. Range: 150 feet. 8d6 fire damage.", "phb")
            .with_score(0.9)
            .with_metadata(serde_json::json!({"page": 241})),
        DocChunk::new("hb-002", "A homebrew fireball variant with a 60 foot range.", "homebrew")
            .with_score(0.6),
        DocChunk::new("phb-001", "duplicate id, attributed once", "phb").with_score(0.5),
    ]
}

fn outcome(chunks: Vec<DocChunk>) -> RetrievalOutcome {
    RetrievalOutcome {
        chunks,
        reranked: None,
        rerank_stats: None,
        source: RetrievalSource::LexicalScan,
        degradations: vec![DegradationEvent::new("vector_store", "not configured", "lexical_scan")],
        elapsed_ms: 12,
    }
}

fn evaluation(decision: GateDecision, overall: f64, unverified: Vec<String>) -> EvaluationResult {
    EvaluationResult {
        metrics: QualityMetrics::core(overall, overall, overall, overall),
        overall_score: overall,
        quality_level: QualityLevel::from_score(overall),
        gate_decision: decision,
        confidence: 0.85,
        strategy_used: EvaluationStrategy::Fast,
        issues: Vec::new(),
        suggestions: Vec::new(),
        critical_failures: Vec::new(),
        citations: Some(CitationReport {
            cited: vec!["phb".to_string()],
            verified: vec!["phb".to_string()],
            unverified,
            unreferenced_sources: Vec::new(),
            score: 1.0,
        }),
        evaluation_time_ms: 3,
        cached: false,
        fallback_used: false,
    }
}

#[test]
fn full_lifecycle_records_every_stage() {
    let tracker = ProvenanceTracker::new(&ProvenanceConfig::default());
    let plan = plan();
    let mut bundle = tracker.start_tracking(QUERY);
    assert_eq!(bundle.correlation_id, bundle.session_id);

    tracker.track_query_processing(&mut bundle, &plan, false, 4);
    let retrieved = outcome(chunks());
    tracker.track_retrieval(&mut bundle, &retrieved);
    let reranker = HybridReranker::new(&GrimoireConfig::default().reranking, None);
    let reranked = reranker
        .rerank(QUERY, &retrieved.chunks, &RerankingConfig::default(), Some(&plan), None, &Deadline::none())
        .unwrap();
    tracker.track_reranking(&mut bundle, RerankingStrategy::HybridFull, &reranked.results, Some(&reranked.stats));
    let eval = evaluation(GateDecision::Pass, 0.86, Vec::new());
    tracker.track_answer_generation(
        &mut bundle,
        &AnswerRecord {
            answer: "Fireball has a range of 150 feet [phb].",
            model: "small-instruct",
            evaluation: Some(&eval),
        },
    );
    tracker.finalize_bundle(&mut bundle).unwrap();

    assert_eq!(bundle.stages_tracked(), vec!["query", "retrieval", "reranking", "answer"]);
    assert!(bundle.tracking_errors.is_empty());
    // Duplicate chunk ids are attributed once.
    assert_eq!(bundle.all_sources.len(), 2);
    let phb = &bundle.all_sources[0];
    assert_eq!(phb.chunk_id, "phb-001");
    assert_eq!(phb.confidence_level, ConfidenceLevel::VeryHigh);
    assert_eq!(phb.authority, 1.0);
    assert_eq!(phb.page.as_deref(), Some("241"));
    let retrieval = bundle.retrieval_provenance.as_ref().unwrap();
    assert_eq!(retrieval.method, "lexical_scan");
    assert_eq!(retrieval.candidate_count, 3);
    assert_eq!(retrieval.degradations.len(), 1);
    let answer = bundle.answer_provenance.as_ref().unwrap();
    assert_eq!(answer.gate_decision, Some(GateDecision::Pass));
    assert_eq!(answer.citations, vec!["phb".to_string()]);

    let quality = bundle.quality.as_ref().unwrap();
    assert_eq!(quality.stage_confidences.len(), 4);
    assert!((0.0..=1.0).contains(&quality.overall_confidence));
    let max_stage = quality.stage_confidences.values().copied().fold(0.0, f64::max);
    assert!(quality.overall_confidence <= max_stage + 1e-12);
    let weakest = bundle
        .reasoning_steps
        .iter()
        .map(|s| s.confidence)
        .fold(f64::MAX, f64::min);
    assert_eq!(quality.reasoning_soundness, Some(weakest));
    assert!(bundle.summary().duration_ms.is_some());
}

#[test]
fn second_finalize_is_rejected() {
    let tracker = ProvenanceTracker::new(&ProvenanceConfig::default());
    let mut bundle = tracker.start_tracking(QUERY);
    tracker.finalize_bundle(&mut bundle).unwrap();
    let err = tracker.finalize_bundle(&mut bundle).unwrap_err();
    assert!(matches!(err, ProvenanceError::AlreadyFinalized { .. }));
}

#[test]
fn tracking_after_finalize_is_ignored() {
    let tracker = ProvenanceTracker::new(&ProvenanceConfig::default());
    let mut bundle = tracker.start_tracking(QUERY);
    tracker.finalize_bundle(&mut bundle).unwrap();
    tracker.track_retrieval(&mut bundle, &outcome(chunks()));
    assert!(bundle.retrieval_provenance.is_none());
    assert!(bundle.all_sources.is_empty());
    assert!(bundle.tracking_errors.is_empty());
}

#[test]
fn bad_scores_are_recorded_not_raised() {
    let tracker = ProvenanceTracker::new(&ProvenanceConfig::default());
    let mut bundle = tracker.start_tracking(QUERY);
    let broken = vec![DocChunk::new("x-1", "text", "phb").with_score(f64::NAN)];
    tracker.track_retrieval(&mut bundle, &outcome(broken));
    assert!(bundle.retrieval_provenance.is_none());
    assert_eq!(bundle.tracking_errors.len(), 1);
    assert!(bundle.tracking_errors[0].contains("retrieval"));

    // Later stages still record.
    tracker.track_query_processing(&mut bundle, &plan(), true, 1);
    assert!(bundle.query_provenance.as_ref().unwrap().plan_cache_hit);
}

#[test]
fn stage_toggles_combine_config_and_plan() {
    let config = ProvenanceConfig {
        track_reranking: false,
        ..ProvenanceConfig::default()
    };
    let tracker = ProvenanceTracker::new(&config);
    let plan_settings = ProvenanceSettings {
        track_answer: false,
        ..ProvenanceSettings::default()
    };
    let bundle = tracker.start_tracking_with(QUERY, Some(&plan_settings));
    assert!(bundle.settings.track_query);
    assert!(!bundle.settings.track_reranking);
    assert!(!bundle.settings.track_answer);

    let disabled = ProvenanceTracker::new(&ProvenanceConfig {
        enabled: false,
        ..ProvenanceConfig::default()
    });
    let mut bundle = disabled.start_tracking(QUERY);
    disabled.track_retrieval(&mut bundle, &outcome(chunks()));
    assert!(bundle.retrieval_provenance.is_none());
}

#[test]
fn confidence_variation_and_inconsistency_raise_risk() {
    let tracker = ProvenanceTracker::new(&ProvenanceConfig::default());
    let mut bundle = tracker.start_tracking(QUERY);
    tracker.track_query_processing(&mut bundle, &plan(), false, 2);
    let weak = vec![DocChunk::new("hb-1", "unrelated", "homebrew").with_score(0.1)];
    tracker.track_retrieval(&mut bundle, &outcome(weak));
    let eval = evaluation(GateDecision::Pass, 0.9, vec!["dmg_404".to_string()]);
    tracker.track_answer_generation(
        &mut bundle,
        &AnswerRecord {
            answer: "Fireball reaches 150 feet [dmg-404].",
            model: "small-instruct",
            evaluation: Some(&eval),
        },
    );

    let quality = tracker.calculate_quality_metrics(&bundle);
    assert_eq!(quality.risk_level, RiskLevel::High);
    assert!(quality
        .confidence_warnings
        .iter()
        .any(|w| w.starts_with("large confidence variation")));
    assert!(quality.confidence_warnings.iter().any(|w| w.contains("retrieval")));
    assert_eq!(quality.inconsistencies.len(), 2);
    assert_eq!(quality.missing_information, vec!["no reranking record".to_string()]);
    assert!((quality.source_reliability - 0.3).abs() < 1e-9);
    // Calculating does not finalize.
    assert!(!bundle.is_finalized());
}

#[test]
fn export_round_trips_through_json() {
    let tracker = ProvenanceTracker::new(&ProvenanceConfig::default());
    let mut bundle = tracker.start_tracking(QUERY);
    tracker.track_retrieval(&mut bundle, &outcome(chunks()));
    tracker.finalize_bundle(&mut bundle).unwrap();
    let json = ProvenanceTracker::export_json(&bundle).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["session_id"], bundle.session_id.as_str());
    assert_eq!(parsed["all_sources"].as_array().unwrap().len(), 2);
    assert_eq!(parsed["quality"]["risk_level"], "medium");
}
