use std::sync::Arc;

use grimoire_core::config::{GrimoireConfig, PlanCacheBackend};
use grimoire_core::errors::{EvaluationError, GrimoireError};
use grimoire_core::models::GateDecision;
use grimoire_engine::{AppContext, QueryPipeline, QueryRequest};
use test_fixtures::{ingest_root, FIXTURE_ENV};

const RULES_QUERY: &str = "What is the range of Fireball spell?";
const ANSWER: &str = "Fireball has a range of 150 feet and deals 8d6 fire damage [phb].";

fn config() -> GrimoireConfig {
    let mut config = GrimoireConfig::default();
    config.paths.environment = FIXTURE_ENV.to_string();
    config.paths.ingest_root = ingest_root();
    config.planner.cache_backend = PlanCacheBackend::Memory;
    config
}

fn pipeline_with(config: GrimoireConfig) -> QueryPipeline {
    QueryPipeline::new(Arc::new(AppContext::new(config, None).unwrap()))
}

fn components(response: &grimoire_engine::QueryResponse) -> Vec<&str> {
    response.degradations.iter().map(|d| d.component.as_str()).collect()
}

#[test]
fn run_retrieves_and_tracks_provenance() {
    let pipeline = pipeline_with(config());
    let response = pipeline.run(QueryRequest::new(RULES_QUERY)).unwrap();

    assert_eq!(response.query, RULES_QUERY);
    assert!(!response.retrieved.is_empty());
    assert_eq!(response.retrieved[0].id, "phb-001");
    assert!(response.reranked);
    assert!(!response.plan_cache_hit);
    assert!(response.eval.is_none());
    // No vector store is configured.
    assert!(response.degraded);
    assert_eq!(components(&response), vec!["vector_store"]);

    let provenance = response.provenance.expect("provenance summary");
    assert_eq!(provenance.stages_tracked, vec!["query", "retrieval", "reranking"]);
    assert!(provenance.source_count > 0);
    assert!(provenance.overall_confidence.is_some());
    assert_eq!(provenance.tracking_errors, 0);
}

#[test]
fn repeated_queries_hit_the_plan_cache() {
    let pipeline = pipeline_with(config());
    pipeline.run(QueryRequest::new(RULES_QUERY)).unwrap();
    let second = pipeline.run(QueryRequest::new(format!("  {RULES_QUERY}  "))).unwrap();
    assert!(second.plan_cache_hit);

    let stats = pipeline.context().stats();
    assert_eq!(stats.queries, 2);
    assert!((stats.plan_cache_hit_rate - 0.5).abs() < 1e-9);
    assert_eq!(stats.degraded_rate, 1.0);
    assert_eq!(stats.active_degradations.get("vector_store"), Some(&2));
}

#[test]
fn top_k_caps_the_result_set() {
    let pipeline = pipeline_with(config());
    let response = pipeline.run(QueryRequest::new(RULES_QUERY).with_top_k(2)).unwrap();
    assert_eq!(response.retrieved.len(), 2);
}

#[test]
fn invalid_requests_are_rejected() {
    let pipeline = pipeline_with(config());
    let err = pipeline.run(QueryRequest::new("  ")).unwrap_err();
    assert!(err.is_request_error());
    let err = pipeline.run(QueryRequest::new(RULES_QUERY).with_top_k(0)).unwrap_err();
    assert!(matches!(err, GrimoireError::InvalidRequest { .. }));
    assert_eq!(pipeline.context().stats().queries, 0);
}

#[test]
fn answers_go_through_the_gate() {
    let pipeline = pipeline_with(config());
    let session = pipeline.start(QueryRequest::new(RULES_QUERY)).unwrap();
    let response = pipeline.complete(session, Some(ANSWER)).unwrap();

    let eval = response.eval.expect("evaluation summary");
    assert!((0.0..=1.0).contains(&eval.overall_score));
    assert!(matches!(
        eval.decision,
        GateDecision::Pass | GateDecision::Review | GateDecision::Fail
    ));
    let provenance = response.provenance.unwrap();
    assert_eq!(provenance.stages_tracked.last().map(String::as_str), Some("answer"));
    assert_eq!(provenance.gate_decision, Some(eval.decision));
}

#[test]
fn evaluation_fallback_is_reported_as_degradation() {
    let pipeline = pipeline_with(config());
    let session = pipeline.start(QueryRequest::new(RULES_QUERY)).unwrap();
    session.deadline().cancel();
    let response = pipeline.complete(session, Some(ANSWER)).unwrap();

    let eval = response.eval.as_ref().expect("evaluation summary");
    assert_eq!(eval.decision, GateDecision::Review);
    assert!(eval.fallback_used);
    assert!(response.degraded);
    assert_eq!(components(&response), vec!["vector_store", "evaluation"]);
    let event = response.degradations.last().unwrap();
    assert_eq!(event.fallback_used, "fallback decision");
    assert!(event.failure.contains("timed out"));

    let stats = pipeline.context().stats();
    assert_eq!(stats.active_degradations.get("evaluation"), Some(&1));
}

#[test]
fn successful_evaluation_adds_no_degradation() {
    let pipeline = pipeline_with(config());
    let session = pipeline.start(QueryRequest::new(RULES_QUERY)).unwrap();
    let response = pipeline.complete(session, Some(ANSWER)).unwrap();
    assert!(!response.eval.as_ref().unwrap().fallback_used);
    assert_eq!(components(&response), vec!["vector_store"]);
}

#[test]
fn empty_answer_asks_for_retry() {
    let pipeline = pipeline_with(config());
    let session = pipeline.start(QueryRequest::new(RULES_QUERY)).unwrap();
    let response = pipeline.complete(session, Some("")).unwrap();
    assert_eq!(response.eval.unwrap().decision, GateDecision::Retry);
}

#[test]
fn answer_with_disabled_gate_is_a_request_error() {
    let mut config = config();
    config.evaluation.enabled = false;
    let pipeline = pipeline_with(config);

    let session = pipeline.start(QueryRequest::new(RULES_QUERY)).unwrap();
    let err = pipeline.complete(session, Some(ANSWER)).unwrap_err();
    assert!(matches!(err, GrimoireError::Evaluation(EvaluationError::Disabled)));
    assert!(err.is_request_error());

    // Without an answer the gate is never consulted.
    assert!(pipeline.run(QueryRequest::new(RULES_QUERY)).is_ok());
}

#[test]
fn provenance_can_be_disabled() {
    let mut config = config();
    config.provenance.enabled = false;
    let response = pipeline_with(config).run(QueryRequest::new(RULES_QUERY)).unwrap();
    assert!(response.provenance.is_none());
    assert!(!response.retrieved.is_empty());
}

#[test]
fn missing_environment_degrades_instead_of_failing() {
    let mut config = config();
    config.paths.environment = "staging".to_string();
    let response = pipeline_with(config).run(QueryRequest::new(RULES_QUERY)).unwrap();
    assert!(response.retrieved.is_empty());
    assert!(response.degraded);
    assert!(components(&response).contains(&"lexical_scan"));
}

#[test]
fn file_plan_cache_survives_a_new_context() {
    let state = tempfile::tempdir().unwrap();
    let mut config = config();
    config.planner.cache_backend = PlanCacheBackend::File;
    config.paths.state_root = state.path().to_path_buf();

    let first = pipeline_with(config.clone()).run(QueryRequest::new(RULES_QUERY)).unwrap();
    assert!(!first.plan_cache_hit);
    let second = pipeline_with(config).run(QueryRequest::new(RULES_QUERY)).unwrap();
    assert!(second.plan_cache_hit);
}

#[test]
fn response_serializes_for_delivery() {
    let response = pipeline_with(config()).run(QueryRequest::new(RULES_QUERY)).unwrap();
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["query"], RULES_QUERY);
    assert!(json["retrieved"].as_array().is_some_and(|r| !r.is_empty()));
    assert!(json.get("eval").is_none());
    assert!(json["plan"]["vector_top_k"].is_number());
}
