//! Quality metrics and the evaluation result record.

use grimoire_core::config::QualityWeights;
use grimoire_core::models::{EvaluationStrategy, GateDecision};
use serde::{Deserialize, Serialize};

use crate::citation::CitationReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Unacceptable,
    Poor,
    Acceptable,
    Good,
    Excellent,
}

impl QualityLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.9 {
            Self::Excellent
        } else if score >= 0.75 {
            Self::Good
        } else if score >= 0.6 {
            Self::Acceptable
        } else if score >= 0.4 {
            Self::Poor
        } else {
            Self::Unacceptable
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Acceptable => "acceptable",
            Self::Poor => "poor",
            Self::Unacceptable => "unacceptable",
        }
    }
}

/// Nine component scores. The four core components are always present;
/// domain and confidence sub-scores only on the comprehensive path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub accuracy: f64,
    pub completeness: f64,
    pub relevance: f64,
    pub coherence: f64,
    /// Dice, numbers, and distances in the answer that the sources back up.
    pub rules_accuracy: Option<f64>,
    /// Game terms in the answer that the sources also use.
    pub terminology_accuracy: Option<f64>,
    pub source_authority: Option<f64>,
    /// Inverse of hedging language in the answer.
    pub answer_confidence: Option<f64>,
    /// Mean retrieval score of the sources.
    pub source_confidence: Option<f64>,
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

impl QualityMetrics {
    pub fn core(accuracy: f64, completeness: f64, relevance: f64, coherence: f64) -> Self {
        Self {
            accuracy,
            completeness,
            relevance,
            coherence,
            ..Self::default()
        }
    }

    /// Mean of the present domain sub-scores.
    pub fn domain_score(&self) -> Option<f64> {
        let parts: Vec<f64> = [self.rules_accuracy, self.terminology_accuracy, self.source_authority]
            .into_iter()
            .flatten()
            .map(clamp_unit)
            .collect();
        (!parts.is_empty()).then(|| parts.iter().sum::<f64>() / parts.len() as f64)
    }

    /// Weighted mean over the components that are present, clamped into `[0, 1]`.
    ///
    /// The domain weight drops out when no domain sub-score was computed, so a
    /// fast-path result is scored over the four core components only.
    pub fn overall_quality_score(&self, weights: &QualityWeights) -> f64 {
        let mut parts = vec![
            (self.accuracy, weights.accuracy),
            (self.completeness, weights.completeness),
            (self.relevance, weights.relevance),
            (self.coherence, weights.coherence),
        ];
        if let Some(domain) = self.domain_score() {
            parts.push((domain, weights.domain));
        }
        let (weighted, total) = parts.iter().fold((0.0, 0.0), |(sum, total), (score, weight)| {
            let weight = clamp_unit_weight(*weight);
            (sum + clamp_unit(*score) * weight, total + weight)
        });
        if total <= 0.0 {
            return 0.0;
        }
        clamp_unit(weighted / total)
    }

    pub fn quality_level(&self, weights: &QualityWeights) -> QualityLevel {
        QualityLevel::from_score(self.overall_quality_score(weights))
    }

    /// Name of the first component that is not a finite number.
    pub fn invalid_component(&self) -> Option<&'static str> {
        let named = [
            ("accuracy", Some(self.accuracy)),
            ("completeness", Some(self.completeness)),
            ("relevance", Some(self.relevance)),
            ("coherence", Some(self.coherence)),
            ("rules_accuracy", self.rules_accuracy),
            ("terminology_accuracy", self.terminology_accuracy),
            ("source_authority", self.source_authority),
            ("answer_confidence", self.answer_confidence),
            ("source_confidence", self.source_confidence),
        ];
        named
            .into_iter()
            .find(|(_, value)| value.is_some_and(|v| !v.is_finite()))
            .map(|(name, _)| name)
    }
}

fn clamp_unit_weight(weight: f64) -> f64 {
    if weight.is_finite() {
        weight.max(0.0)
    } else {
        0.0
    }
}

/// Outcome of one evaluation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub metrics: QualityMetrics,
    pub overall_score: f64,
    pub quality_level: QualityLevel,
    pub gate_decision: GateDecision,
    pub confidence: f64,
    pub strategy_used: EvaluationStrategy,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
    pub critical_failures: Vec<String>,
    #[serde(default)]
    pub citations: Option<CitationReport>,
    pub evaluation_time_ms: u64,
    /// Served from the result cache.
    pub cached: bool,
    /// Scoring failed or ran out of budget; the decision is the configured fallback.
    #[serde(default)]
    pub fallback_used: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_thresholds() {
        assert_eq!(QualityLevel::from_score(0.9), QualityLevel::Excellent);
        assert_eq!(QualityLevel::from_score(0.75), QualityLevel::Good);
        assert_eq!(QualityLevel::from_score(0.6), QualityLevel::Acceptable);
        assert_eq!(QualityLevel::from_score(0.4), QualityLevel::Poor);
        assert_eq!(QualityLevel::from_score(0.39), QualityLevel::Unacceptable);
    }

    #[test]
    fn overall_renormalises_without_domain() {
        let m = QualityMetrics::core(0.9, 0.85, 0.88, 0.8);
        let overall = m.overall_quality_score(&QualityWeights::default());
        assert!((overall - 0.865).abs() < 1e-9);
    }

    #[test]
    fn domain_component_joins_when_present() {
        let mut m = QualityMetrics::core(1.0, 1.0, 1.0, 1.0);
        m.rules_accuracy = Some(0.0);
        m.source_authority = Some(0.0);
        let overall = m.overall_quality_score(&QualityWeights::default());
        assert!((overall - 0.9).abs() < 1e-9);
        assert_eq!(m.domain_score(), Some(0.0));
    }

    #[test]
    fn out_of_range_components_are_clamped() {
        let m = QualityMetrics::core(7.0, -3.0, f64::NAN, 1.0);
        let overall = m.overall_quality_score(&QualityWeights::default());
        assert!((0.0..=1.0).contains(&overall));
        assert_eq!(m.invalid_component(), Some("relevance"));
    }
}
