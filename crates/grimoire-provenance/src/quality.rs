//! Derived lineage quality: stage confidence, source reliability,
//! reasoning soundness, and risk.

use std::collections::BTreeMap;

use grimoire_core::models::GateDecision;
use serde::{Deserialize, Serialize};

use crate::authority::source_reliability;
use crate::model::{ConfidenceLevel, ProvenanceBundle, RiskLevel};

/// Stage confidence below this is called out individually.
const VERY_LOW_STAGE_CONFIDENCE: f64 = 0.25;

/// A reasoning step below this is named as the weak link.
const WEAK_STEP_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Harmonic mean of the recorded stage confidences.
    pub overall_confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub stage_confidences: BTreeMap<String, f64>,
    pub source_reliability: f64,
    /// Lowest confidence across reasoning steps; `None` with no steps.
    pub reasoning_soundness: Option<f64>,
    pub risk_level: RiskLevel,
    pub inconsistencies: Vec<String>,
    pub missing_information: Vec<String>,
    pub confidence_warnings: Vec<String>,
}

fn unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Harmonic mean of values clamped to `[0, 1]`. Any zero (or an empty
/// slice) yields 0.0, so one unconfident stage drags the whole lineage down.
pub fn harmonic_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut reciprocal_sum = 0.0;
    for value in values.iter().copied().map(unit) {
        if value <= 0.0 {
            return 0.0;
        }
        reciprocal_sum += 1.0 / value;
    }
    unit(values.len() as f64 / reciprocal_sum)
}

fn stage_confidences(bundle: &ProvenanceBundle) -> BTreeMap<String, f64> {
    let stages = [
        ("query", bundle.query_provenance.as_ref().map(|p| p.confidence)),
        ("retrieval", bundle.retrieval_provenance.as_ref().map(|p| p.confidence)),
        ("reranking", bundle.reranking_provenance.as_ref().map(|p| p.confidence)),
        ("answer", bundle.answer_provenance.as_ref().map(|p| p.confidence)),
    ];
    stages
        .into_iter()
        .filter_map(|(stage, confidence)| confidence.map(|c| (stage.to_string(), unit(c))))
        .collect()
}

fn inconsistencies(bundle: &ProvenanceBundle, stages: &BTreeMap<String, f64>) -> Vec<String> {
    let mut found = Vec::new();
    let retrieval = bundle.retrieval_provenance.as_ref();
    if let Some(answer) = &bundle.answer_provenance {
        let weak_retrieval = stages
            .get("retrieval")
            .is_some_and(|c| *c < VERY_LOW_STAGE_CONFIDENCE);
        if answer.gate_decision == Some(GateDecision::Pass) && weak_retrieval {
            found.push("answer passed the gate on weakly supported retrieval".to_string());
        }
        if !answer.unverified_citations.is_empty() {
            found.push(format!(
                "answer cites {} source(s) that were not retrieved",
                answer.unverified_citations.len()
            ));
        }
        if retrieval.is_some_and(|r| r.candidate_count == 0) {
            found.push("answer generated without retrieved sources".to_string());
        }
    }
    if bundle.reranking_provenance.as_ref().is_some_and(|r| r.candidates > 0)
        && retrieval.is_some_and(|r| r.candidate_count == 0)
    {
        found.push("reranking recorded candidates that retrieval did not return".to_string());
    }
    found
}

fn missing_information(bundle: &ProvenanceBundle) -> Vec<String> {
    let settings = &bundle.settings;
    let mut missing = Vec::new();
    let expected = [
        ("query", settings.track_query, bundle.query_provenance.is_some()),
        ("retrieval", settings.track_retrieval, bundle.retrieval_provenance.is_some()),
        ("reranking", settings.track_reranking, bundle.reranking_provenance.is_some()),
        ("answer", settings.track_answer, bundle.answer_provenance.is_some()),
    ];
    for (stage, enabled, recorded) in expected {
        if enabled && !recorded {
            missing.push(format!("no {stage} record"));
        }
    }
    if bundle.retrieval_provenance.as_ref().is_some_and(|r| r.sources.is_empty()) {
        missing.push("retrieval returned no sources".to_string());
    }
    if bundle.answer_provenance.as_ref().is_some_and(|a| a.gate_decision.is_none()) {
        missing.push("answer was not evaluated".to_string());
    }
    missing
}

fn confidence_warnings(
    bundle: &ProvenanceBundle,
    stages: &BTreeMap<String, f64>,
    variation_warning: f64,
) -> Vec<String> {
    let mut warnings = Vec::new();
    if stages.len() >= 2 {
        let max = stages.values().copied().fold(f64::MIN, f64::max);
        let min = stages.values().copied().fold(f64::MAX, f64::min);
        if max - min > variation_warning {
            warnings.push(format!(
                "large confidence variation across stages ({min:.2} to {max:.2})"
            ));
        }
    }
    for (stage, confidence) in stages {
        if *confidence < VERY_LOW_STAGE_CONFIDENCE {
            warnings.push(format!("very low confidence in {stage} ({confidence:.2})"));
        }
    }
    if let Some(step) = weakest_step(bundle).filter(|s| s.confidence < WEAK_STEP_CONFIDENCE) {
        warnings.push(format!(
            "weak reasoning step in {}: {} ({:.2})",
            step.stage, step.description, step.confidence
        ));
    }
    warnings
}

fn weakest_step(bundle: &ProvenanceBundle) -> Option<&crate::model::ReasoningStep> {
    bundle
        .reasoning_steps
        .iter()
        .min_by(|a, b| unit(a.confidence).total_cmp(&unit(b.confidence)))
}

fn risk_level(overall: f64, inconsistencies: &[String], missing: &[String], warnings: &[String]) -> RiskLevel {
    if overall < 0.4 || !inconsistencies.is_empty() {
        RiskLevel::High
    } else if overall < 0.7 || !missing.is_empty() || !warnings.is_empty() {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Derive lineage quality from whatever stages the bundle recorded.
pub fn assess(bundle: &ProvenanceBundle, variation_warning: f64) -> QualityMetrics {
    let stages = stage_confidences(bundle);
    let values: Vec<f64> = stages.values().copied().collect();
    let overall_confidence = harmonic_mean(&values);
    let inconsistencies = inconsistencies(bundle, &stages);
    let missing_information = missing_information(bundle);
    let confidence_warnings = confidence_warnings(bundle, &stages, variation_warning);
    let risk_level = risk_level(
        overall_confidence,
        &inconsistencies,
        &missing_information,
        &confidence_warnings,
    );

    QualityMetrics {
        overall_confidence,
        confidence_level: ConfidenceLevel::from_score(overall_confidence),
        source_reliability: source_reliability(&bundle.all_sources),
        reasoning_soundness: weakest_step(bundle).map(|s| unit(s.confidence)),
        stage_confidences: stages,
        risk_level,
        inconsistencies,
        missing_information,
        confidence_warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harmonic_mean_is_conservative() {
        let hm = harmonic_mean(&[0.9, 0.3]);
        assert!((hm - 0.45).abs() < 1e-9);
        assert!(hm < 0.6);
    }

    #[test]
    fn harmonic_mean_edges() {
        assert_eq!(harmonic_mean(&[]), 0.0);
        assert_eq!(harmonic_mean(&[0.8, 0.0]), 0.0);
        assert_eq!(harmonic_mean(&[f64::NAN, 0.5]), 0.0);
        assert!((harmonic_mean(&[0.6]) - 0.6).abs() < 1e-12);
        assert!((harmonic_mean(&[3.0, 1.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn risk_ladder() {
        let none: Vec<String> = Vec::new();
        let one = vec!["x".to_string()];
        assert_eq!(risk_level(0.9, &none, &none, &none), RiskLevel::Low);
        assert_eq!(risk_level(0.9, &none, &one, &none), RiskLevel::Medium);
        assert_eq!(risk_level(0.5, &none, &none, &none), RiskLevel::Medium);
        assert_eq!(risk_level(0.9, &one, &none, &none), RiskLevel::High);
        assert_eq!(risk_level(0.2, &none, &none, &none), RiskLevel::High);
    }
}
