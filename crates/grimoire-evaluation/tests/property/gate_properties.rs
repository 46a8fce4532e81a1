use grimoire_core::config::{EvaluationConfig, QualityWeights};
use grimoire_core::models::GateDecision;
use grimoire_evaluation::{decide, GateThresholds, QualityMetrics};
use proptest::prelude::*;

fn component() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => 0.0..=1.0f64,
        1 => -5.0..5.0f64,
        1 => Just(f64::NAN),
    ]
}

proptest! {
    #[test]
    fn overall_is_a_unit_score(
        accuracy in component(),
        completeness in component(),
        relevance in component(),
        coherence in component(),
        rules in proptest::option::of(component()),
    ) {
        let mut metrics = QualityMetrics::core(accuracy, completeness, relevance, coherence);
        metrics.rules_accuracy = rules;
        let overall = metrics.overall_quality_score(&QualityWeights::default());
        prop_assert!((0.0..=1.0).contains(&overall));
    }

    #[test]
    fn low_accuracy_never_passes(
        accuracy in 0.0..0.7f64,
        completeness in 0.0..=1.0f64,
        relevance in 0.0..=1.0f64,
        coherence in 0.0..=1.0f64,
    ) {
        let thresholds = GateThresholds::from_config(&EvaluationConfig::default());
        let metrics = QualityMetrics::core(accuracy, completeness, relevance, coherence);
        let (decision, confidence, issues) = decide(&metrics, &thresholds, &QualityWeights::default());
        prop_assert_eq!(decision, GateDecision::Fail);
        prop_assert!(!issues.is_empty());
        prop_assert!((0.0..=1.0).contains(&confidence));
    }
}
