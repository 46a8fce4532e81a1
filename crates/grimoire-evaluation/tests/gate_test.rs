use std::time::Duration;

use grimoire_core::config::{EvaluationConfig, QualityWeights};
use grimoire_core::deadline::Deadline;
use grimoire_core::errors::EvaluationError;
use grimoire_core::models::{
    Classification, Complexity, DocChunk, Domain, EvalSettings, EvaluationStrategy, GateDecision,
    Intent,
};
use grimoire_evaluation::{decide, EvaluationGate, EvaluationRequest, GateThresholds, QualityMetrics};
use serde::Deserialize;

#[derive(Deserialize)]
struct GoldenFile {
    cases: Vec<GoldenCase>,
}

#[derive(Deserialize)]
struct GoldenCase {
    name: String,
    metrics: CoreMetrics,
    expected_overall: f64,
    expected_decision: GateDecision,
}

#[derive(Deserialize)]
struct CoreMetrics {
    accuracy: f64,
    completeness: f64,
    relevance: f64,
    coherence: f64,
}

const QUERY: &str = "What is the range of the Fireball spell?";
const ANSWER: &str = "Fireball has a range of 150 feet. Each creature in a 20-foot radius sphere \
    must make a Dexterity saving throw and takes 8d6 fire damage on a failed save. \
    The fire spreads around corners and ignites flammable objects that are not being worn or carried, \
    because the blast is a bright streak that blossoms into flame at the point you choose.";

fn sources() -> Vec<DocChunk> {
    vec![
        DocChunk::new(
            "phb-001",
            "Fireball. 3rd-level evocation. Range: 150 feet. A bright streak flashes from your pointing \
             finger to a point you choose within range and then blossoms with a low roar into an explosion \
             of flame. Each creature in a 20-foot-radius sphere centered on that point must make a Dexterity \
             saving throw. A target takes 8d6 fire damage on a failed save. The fire spreads around corners. \
             It ignites flammable objects in the area that aren't being worn or carried.",
            "phb",
        )
        .with_score(0.9),
    ]
}

fn rules_classification() -> Classification {
    Classification {
        intent: Intent::FactLookup,
        domain: Domain::TtrpgRules,
        complexity: Complexity::Low,
        needs_tools: false,
        confidence: 0.9,
    }
}

fn config_with(strategy: EvaluationStrategy) -> EvaluationConfig {
    EvaluationConfig {
        strategy,
        ..EvaluationConfig::default()
    }
}

fn cancelled() -> Deadline {
    let deadline = Deadline::none();
    deadline.cancel();
    deadline
}

#[test]
fn golden_cases_match_decisions() {
    let golden: GoldenFile = test_fixtures::load_fixture("golden/gate_cases.json");
    let thresholds = GateThresholds::from_config(&EvaluationConfig::default());
    let weights = QualityWeights::default();
    for case in golden.cases {
        let m = &case.metrics;
        let metrics = QualityMetrics::core(m.accuracy, m.completeness, m.relevance, m.coherence);
        let overall = metrics.overall_quality_score(&weights);
        assert!(
            (overall - case.expected_overall).abs() < 1e-6,
            "{}: overall {overall} != {}",
            case.name,
            case.expected_overall
        );
        let (decision, _, _) = decide(&metrics, &thresholds, &weights);
        assert_eq!(decision, case.expected_decision, "{}", case.name);
    }
}

#[test]
fn disabled_gate_refuses() {
    let config = EvaluationConfig {
        enabled: false,
        ..EvaluationConfig::default()
    };
    let gate = EvaluationGate::new(&config);
    let sources = sources();
    let err = gate
        .evaluate(&EvaluationRequest::new(QUERY, ANSWER, &sources), &Deadline::none())
        .unwrap_err();
    assert!(matches!(err, EvaluationError::Disabled));
}

#[test]
fn empty_answer_asks_for_retry() {
    let gate = EvaluationGate::new(&EvaluationConfig::default());
    let sources = sources();
    let result = gate
        .evaluate(&EvaluationRequest::new(QUERY, "   ", &sources), &Deadline::none())
        .unwrap();
    assert_eq!(result.gate_decision, GateDecision::Retry);
    assert_eq!(result.critical_failures.len(), 1);
    assert!(gate.cache().is_empty());
}

#[test]
fn repeated_evaluation_is_served_from_cache() {
    let gate = EvaluationGate::new(&config_with(EvaluationStrategy::Comprehensive));
    let sources = sources();
    let request = EvaluationRequest::new(QUERY, ANSWER, &sources);

    let first = gate.evaluate(&request, &Deadline::none()).unwrap();
    assert!(!first.cached);
    assert_eq!(first.strategy_used, EvaluationStrategy::Comprehensive);

    let second = gate.evaluate(&request, &Deadline::none()).unwrap();
    assert!(second.cached);
    assert_eq!(second.gate_decision, first.gate_decision);
    assert_eq!(second.overall_score, first.overall_score);
    assert_eq!(gate.cache().len(), 1);
}

#[test]
fn plan_thresholds_key_the_cache_separately() {
    let gate = EvaluationGate::new(&config_with(EvaluationStrategy::Fast));
    let sources = sources();
    let strict = EvalSettings {
        strategy: EvaluationStrategy::Fast,
        min_overall: 0.95,
        ..EvalSettings::default()
    };
    let mut request = EvaluationRequest::new(QUERY, ANSWER, &sources);
    gate.evaluate(&request, &Deadline::none()).unwrap();
    request.settings = Some(&strict);
    let result = gate.evaluate(&request, &Deadline::none()).unwrap();
    assert!(!result.cached);
    assert_eq!(gate.cache().len(), 2);
}

#[test]
fn expired_budget_falls_back_to_configured_decision() {
    let gate = EvaluationGate::new(&config_with(EvaluationStrategy::Comprehensive));
    let sources = sources();
    let result = gate
        .evaluate(&EvaluationRequest::new(QUERY, ANSWER, &sources), &cancelled())
        .unwrap();
    assert_eq!(result.gate_decision, GateDecision::Review);
    assert_eq!(result.critical_failures.len(), 1);
    assert!(result.critical_failures[0].contains("timed out"));
    assert!(gate.cache().is_empty());
}

#[test]
fn expired_budget_without_fallback_is_a_timeout() {
    let config = EvaluationConfig {
        fallback_on_timeout: false,
        ..config_with(EvaluationStrategy::Comprehensive)
    };
    let gate = EvaluationGate::new(&config);
    let sources = sources();
    let err = gate
        .evaluate(&EvaluationRequest::new(QUERY, ANSWER, &sources), &cancelled())
        .unwrap_err();
    assert!(matches!(err, EvaluationError::Timeout { budget_ms: 1_500, .. }));
}

#[test]
fn adaptive_evaluation_past_its_deadline_falls_back() {
    let gate = EvaluationGate::new(&config_with(EvaluationStrategy::Adaptive));
    let sources = sources();
    let expired = Deadline::after(Duration::ZERO);
    let result = gate
        .evaluate(&EvaluationRequest::new(QUERY, ANSWER, &sources), &expired)
        .unwrap();
    assert_eq!(result.strategy_used, EvaluationStrategy::Fast);
    assert_eq!(result.gate_decision, GateDecision::Review);
    assert!(result.fallback_used);
    assert!(result.critical_failures[0].contains("timed out"));
    assert!(gate.cache().is_empty());
}

#[test]
fn cancelled_fast_evaluation_falls_back() {
    let gate = EvaluationGate::new(&config_with(EvaluationStrategy::Fast));
    let sources = sources();
    let result = gate
        .evaluate(&EvaluationRequest::new(QUERY, ANSWER, &sources), &cancelled())
        .unwrap();
    assert_eq!(result.gate_decision, GateDecision::Review);
    assert!(result.fallback_used);
    assert!(gate.cache().is_empty());

    let fresh = gate
        .evaluate(&EvaluationRequest::new(QUERY, ANSWER, &sources), &Deadline::none())
        .unwrap();
    assert!(!fresh.fallback_used);
    assert!(!fresh.cached);
}

#[test]
fn unverified_citation_is_never_a_pass() {
    let gate = EvaluationGate::new(&config_with(EvaluationStrategy::Comprehensive));
    let sources = sources();
    let answer = format!("{ANSWER} [dmg-404]");
    let result = gate
        .evaluate(&EvaluationRequest::new(QUERY, &answer, &sources), &Deadline::none())
        .unwrap();
    let report = result.citations.as_ref().unwrap();
    assert_eq!(report.unverified, vec!["dmg_404".to_string()]);
    assert_ne!(result.gate_decision, GateDecision::Pass);
    assert!(result.issues.iter().any(|i| i.contains("dmg_404")));
}

#[test]
fn adaptive_short_answer_takes_fast_path() {
    let gate = EvaluationGate::new(&config_with(EvaluationStrategy::Adaptive));
    let sources = sources();
    let result = gate
        .evaluate(
            &EvaluationRequest::new(QUERY, "Fireball has a range of 150 feet.", &sources),
            &Deadline::none(),
        )
        .unwrap();
    assert_eq!(result.strategy_used, EvaluationStrategy::Fast);
    assert!(result.metrics.rules_accuracy.is_none());
}

#[test]
fn rules_domain_adds_domain_metrics() {
    let gate = EvaluationGate::new(&config_with(EvaluationStrategy::Comprehensive));
    let sources = sources();
    let classification = rules_classification();
    let mut request = EvaluationRequest::new(QUERY, ANSWER, &sources);
    request.classification = Some(&classification);
    let result = gate.evaluate(&request, &Deadline::none()).unwrap();
    assert_eq!(result.metrics.rules_accuracy, Some(1.0));
    assert!(result.metrics.source_authority.is_some());
    assert!((0.0..=1.0).contains(&result.overall_score));
}
