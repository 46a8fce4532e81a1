//! The evaluation gate: metrics → overall score → `GateDecision`.

use std::time::{Duration, Instant};

use grimoire_core::config::{EvaluationConfig, QualityWeights};
use grimoire_core::deadline::Deadline;
use grimoire_core::errors::EvaluationError;
use grimoire_core::models::{
    Classification, DocChunk, EvalSettings, EvaluationStrategy, GateDecision,
};
use grimoire_core::text::word_count;
use grimoire_observability::evaluation_span;
use grimoire_observability::tracing_setup::events;
use tracing::{debug, warn};

use crate::cache::EvaluationCache;
use crate::citation::validate_citations;
use crate::metrics::{EvaluationResult, QualityLevel, QualityMetrics};
use crate::scoring::{comprehensive, fast, ScoringInput};

/// Confidence attached to a threshold-forced FAIL.
const THRESHOLD_FAIL_CONFIDENCE: f64 = 0.9;

/// Components below this earn a suggestion.
const SUGGESTION_FLOOR: f64 = 0.6;

#[derive(Debug, Clone, PartialEq)]
pub struct GateThresholds {
    pub min_accuracy: f64,
    pub min_overall: f64,
    pub min_rules_accuracy: f64,
    pub enable_domain_validation: bool,
    pub enable_source_validation: bool,
    pub require_good_quality: bool,
}

impl GateThresholds {
    pub fn from_config(config: &EvaluationConfig) -> Self {
        Self {
            min_accuracy: config.min_accuracy,
            min_overall: config.min_overall,
            min_rules_accuracy: config.min_rules_accuracy,
            enable_domain_validation: config.enable_domain_validation,
            enable_source_validation: config.enable_source_validation,
            require_good_quality: config.require_good_quality,
        }
    }

    pub fn from_settings(settings: &EvalSettings) -> Self {
        Self {
            min_accuracy: settings.min_accuracy,
            min_overall: settings.min_overall,
            min_rules_accuracy: settings.min_rules_accuracy,
            enable_domain_validation: settings.enable_domain_validation,
            enable_source_validation: settings.enable_source_validation,
            require_good_quality: settings.require_good_quality,
        }
    }
}

/// One answer to evaluate.
pub struct EvaluationRequest<'a> {
    pub query: &'a str,
    pub answer: &'a str,
    pub sources: &'a [DocChunk],
    pub classification: Option<&'a Classification>,
    /// Plan-level thresholds; the gate's config applies when absent.
    pub settings: Option<&'a EvalSettings>,
}

impl<'a> EvaluationRequest<'a> {
    pub fn new(query: &'a str, answer: &'a str, sources: &'a [DocChunk]) -> Self {
        Self {
            query,
            answer,
            sources,
            classification: None,
            settings: None,
        }
    }
}

/// Threshold rules first (any breach is a FAIL), then the quality level.
///
/// Returns the decision, its confidence, and the issues that drove it.
pub fn decide(
    metrics: &QualityMetrics,
    thresholds: &GateThresholds,
    weights: &QualityWeights,
) -> (GateDecision, f64, Vec<String>) {
    let overall = metrics.overall_quality_score(weights);
    let mut issues = Vec::new();
    if metrics.accuracy < thresholds.min_accuracy {
        issues.push(format!(
            "accuracy {:.2} below minimum {:.2}",
            metrics.accuracy, thresholds.min_accuracy
        ));
    }
    if overall < thresholds.min_overall {
        issues.push(format!(
            "overall quality {overall:.2} below minimum {:.2}",
            thresholds.min_overall
        ));
    }
    if thresholds.enable_domain_validation {
        if let Some(rules) = metrics.rules_accuracy.filter(|r| *r < thresholds.min_rules_accuracy) {
            issues.push(format!(
                "rules accuracy {rules:.2} below minimum {:.2}",
                thresholds.min_rules_accuracy
            ));
        }
    }
    if !issues.is_empty() {
        return (GateDecision::Fail, THRESHOLD_FAIL_CONFIDENCE, issues);
    }

    let (decision, confidence) = match QualityLevel::from_score(overall) {
        QualityLevel::Excellent => (GateDecision::Pass, 0.95),
        QualityLevel::Good => (GateDecision::Pass, 0.85),
        QualityLevel::Acceptable if thresholds.require_good_quality => {
            issues.push("quality is acceptable but good quality is required".to_string());
            (GateDecision::Review, 0.7)
        }
        QualityLevel::Acceptable => (GateDecision::Pass, 0.75),
        QualityLevel::Poor => {
            issues.push(format!("poor overall quality {overall:.2}"));
            (GateDecision::Review, 0.6)
        }
        QualityLevel::Unacceptable => {
            issues.push(format!("unacceptable overall quality {overall:.2}"));
            (GateDecision::Fail, 0.8)
        }
    };
    (decision, confidence, issues)
}

fn suggestions(metrics: &QualityMetrics) -> Vec<String> {
    let checks = [
        (metrics.accuracy, "ground claims in the retrieved sources"),
        (metrics.completeness, "address every part of the question"),
        (metrics.relevance, "stay on the entities the question names"),
        (metrics.coherence, "remove contradictory or repeated statements"),
    ];
    let mut out: Vec<String> = checks
        .iter()
        .filter(|(score, _)| *score < SUGGESTION_FLOOR)
        .map(|(_, hint)| hint.to_string())
        .collect();
    if metrics.rules_accuracy.is_some_and(|r| r < SUGGESTION_FLOOR) {
        out.push("check dice, DCs, and distances against the rules text".to_string());
    }
    out
}

pub struct EvaluationGate {
    config: EvaluationConfig,
    cache: EvaluationCache,
}

impl EvaluationGate {
    pub fn new(config: &EvaluationConfig) -> Self {
        Self {
            config: config.clone(),
            cache: EvaluationCache::new(config.cache_capacity, Duration::from_secs(config.cache_ttl_secs)),
        }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn cache(&self) -> &EvaluationCache {
        &self.cache
    }

    /// Adaptive evaluation takes the fast path for short answers or when the
    /// remaining request budget is smaller than the evaluation budget.
    pub fn resolve_strategy(&self, requested: EvaluationStrategy, answer: &str, deadline: &Deadline) -> EvaluationStrategy {
        match requested {
            EvaluationStrategy::Adaptive => {
                let short = word_count(answer) <= self.config.fast_path_max_answer_words;
                let tight = deadline
                    .remaining()
                    .is_some_and(|left| left < Duration::from_millis(self.config.max_evaluation_time_ms));
                if short || tight {
                    EvaluationStrategy::Fast
                } else {
                    EvaluationStrategy::Comprehensive
                }
            }
            other => other,
        }
    }

    pub fn evaluate(&self, request: &EvaluationRequest<'_>, deadline: &Deadline) -> Result<EvaluationResult, EvaluationError> {
        if !self.config.enabled {
            return Err(EvaluationError::Disabled);
        }
        let start = Instant::now();
        let thresholds = request
            .settings
            .map(GateThresholds::from_settings)
            .unwrap_or_else(|| GateThresholds::from_config(&self.config));
        let requested = request.settings.map_or(self.config.strategy, |s| s.strategy);
        let _span = evaluation_span!(requested.as_str()).entered();

        let key = EvaluationCache::key(request.query, request.answer, requested, thresholds.min_overall);
        if let Some(hit) = self.cache.get(&key) {
            debug!(decision = %hit.gate_decision, "evaluation cache hit");
            events::gate_decided(hit.gate_decision.as_str(), hit.overall_score, hit.confidence);
            return Ok(hit);
        }

        if request.answer.trim().is_empty() {
            let result = self.outcome_without_metrics(
                GateDecision::Retry,
                1.0,
                requested,
                "empty answer; regenerate".to_string(),
                start,
            );
            events::gate_decided(result.gate_decision.as_str(), 0.0, result.confidence);
            return Ok(result);
        }

        let budget = if self.config.max_evaluation_time_ms == 0 {
            deadline.clone()
        } else {
            deadline.child(Duration::from_millis(self.config.max_evaluation_time_ms))
        };
        let strategy = self.resolve_strategy(requested, request.answer, deadline);
        let metrics = match self.compute_metrics(request, strategy, &thresholds, &budget, start) {
            Ok(metrics) => metrics,
            Err(err) if self.config.fallback_on_timeout => {
                warn!(error = %err, fallback = %self.config.fallback_decision, "evaluation failed, using fallback decision");
                let mut result = self.outcome_without_metrics(
                    self.config.fallback_decision,
                    0.0,
                    strategy,
                    format!("evaluation failed: {err}"),
                    start,
                );
                result.fallback_used = true;
                events::gate_decided(result.gate_decision.as_str(), 0.0, result.confidence);
                return Ok(result);
            }
            Err(err) => return Err(err),
        };

        let weights = &self.config.quality_weights;
        let (mut decision, confidence, mut issues) = decide(&metrics, &thresholds, weights);

        let citations = (thresholds.enable_source_validation && !request.sources.is_empty())
            .then(|| validate_citations(request.answer, request.sources));
        if let Some(report) = citations.as_ref().filter(|r| r.has_unverified()) {
            for citation in &report.unverified {
                issues.push(format!("citation not found among retrieved sources: {citation}"));
            }
            if decision == GateDecision::Pass {
                decision = GateDecision::Review;
            }
        }

        let overall_score = metrics.overall_quality_score(weights);
        let result = EvaluationResult {
            quality_level: QualityLevel::from_score(overall_score),
            overall_score,
            gate_decision: decision,
            confidence,
            strategy_used: strategy,
            issues,
            suggestions: suggestions(&metrics),
            critical_failures: Vec::new(),
            citations,
            evaluation_time_ms: start.elapsed().as_millis() as u64,
            cached: false,
            fallback_used: false,
            metrics,
        };
        self.cache.insert(key, result.clone());
        events::gate_decided(decision.as_str(), overall_score, confidence);
        Ok(result)
    }

    fn compute_metrics(
        &self,
        request: &EvaluationRequest<'_>,
        strategy: EvaluationStrategy,
        thresholds: &GateThresholds,
        budget: &Deadline,
        start: Instant,
    ) -> Result<QualityMetrics, EvaluationError> {
        if budget.is_expired() {
            return Err(self.timeout(start));
        }
        let intent = request.classification.map(|c| c.intent);
        let input = ScoringInput::new(request.query, request.answer, request.sources, intent);
        let metrics = match strategy {
            EvaluationStrategy::Fast => Ok(fast::score(&input)),
            _ => {
                let include_domain = thresholds.enable_domain_validation
                    || request.classification.is_some_and(|c| c.domain.is_ttrpg());
                comprehensive::score(&input, include_domain, budget)
            }
        }
        .map_err(|err| {
            if budget.is_expired() {
                self.timeout(start)
            } else {
                err
            }
        })?;
        if let Some(metric) = metrics.invalid_component() {
            return Err(EvaluationError::InvalidMetric {
                metric: metric.to_string(),
            });
        }
        Ok(metrics)
    }

    fn timeout(&self, start: Instant) -> EvaluationError {
        EvaluationError::Timeout {
            elapsed_ms: start.elapsed().as_millis() as u64,
            budget_ms: self.config.max_evaluation_time_ms,
        }
    }

    fn outcome_without_metrics(
        &self,
        decision: GateDecision,
        confidence: f64,
        strategy: EvaluationStrategy,
        failure: String,
        start: Instant,
    ) -> EvaluationResult {
        EvaluationResult {
            metrics: QualityMetrics::default(),
            overall_score: 0.0,
            quality_level: QualityLevel::Unacceptable,
            gate_decision: decision,
            confidence,
            strategy_used: strategy,
            issues: Vec::new(),
            suggestions: Vec::new(),
            critical_failures: vec![failure],
            citations: None,
            evaluation_time_ms: start.elapsed().as_millis() as u64,
            cached: false,
            fallback_used: false,
        }
    }
}
