//! Comprehensive path: grounded accuracy, completeness, entity-aware
//! relevance, coherence, and confidence sub-scores.

use std::sync::LazyLock;

use grimoire_core::deadline::Deadline;
use grimoire_core::errors::EvaluationError;
use grimoire_core::text::{content_token_set, sentences, word_count};
use grimoire_graph::entities::{extract_entities, mentions};
use regex::Regex;

use super::{coverage, domain, expected_answer_words, ScoringInput, NEUTRAL};
use crate::metrics::QualityMetrics;

/// Share of a sentence's tokens a source must cover for the sentence to count as supported.
const SUPPORT_THRESHOLD: f64 = 0.5;

static ALWAYS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(always|every time|in all cases|without exception)\b").unwrap());
static NEVER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(never|under no circumstances|in no case)\b").unwrap());
static CAN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bcan\s+(\w+)").unwrap());
static CANNOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:cannot|can't|can not)\s+(\w+)").unwrap());
static CONNECTOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(because|therefore|however|thus|since|so that|as a result|which means|then)\b").unwrap()
});
static HEDGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(maybe|might|possibly|perhaps|probably|i think|not sure|unclear|i believe|it seems)\b").unwrap()
});
static DIRECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(yes|no)\b").unwrap());

pub fn score(
    input: &ScoringInput<'_>,
    include_domain: bool,
    deadline: &Deadline,
) -> Result<QualityMetrics, EvaluationError> {
    let check = |stage: &str| {
        deadline.check(stage).map_err(|_| EvaluationError::ScoringFailed {
            reason: format!("deadline exceeded during {stage}"),
        })
    };

    check("accuracy")?;
    let accuracy = accuracy(input);
    check("completeness")?;
    let completeness = completeness(input);
    let relevance = relevance(input);
    check("coherence")?;
    let coherence = coherence(input.answer);

    let mut metrics = QualityMetrics::core(accuracy, completeness, relevance, coherence);
    if include_domain {
        check("domain")?;
        metrics.rules_accuracy = Some(domain::rules_accuracy(input));
        metrics.terminology_accuracy = Some(domain::terminology_accuracy(input));
        metrics.source_authority = Some(domain::source_authority(input));
    }
    metrics.answer_confidence = Some(answer_confidence(input.answer));
    metrics.source_confidence = Some(source_confidence(input));
    Ok(metrics)
}

/// Mean per-sentence support: the best token coverage any one source gives a sentence.
fn accuracy(input: &ScoringInput<'_>) -> f64 {
    if input.sources.is_empty() {
        return NEUTRAL;
    }
    let source_sets: Vec<_> = input.sources.iter().map(|s| content_token_set(&s.text)).collect();
    let supports: Vec<f64> = sentences(input.answer)
        .into_iter()
        .map(content_token_set)
        .filter(|tokens| !tokens.is_empty())
        .map(|tokens| {
            let best = source_sets
                .iter()
                .map(|source| coverage(&tokens, source, 0.0))
                .fold(0.0, f64::max);
            if best >= SUPPORT_THRESHOLD {
                best.max(0.8)
            } else {
                best
            }
        })
        .collect();
    if supports.is_empty() {
        return 0.0;
    }
    supports.iter().sum::<f64>() / supports.len() as f64
}

/// Keyword coverage, length adequacy, and whether the answer opens by answering.
fn completeness(input: &ScoringInput<'_>) -> f64 {
    let keywords = coverage(&input.query_tokens, &input.answer_tokens, NEUTRAL);
    let expected = expected_answer_words(input.intent) as f64;
    let length = (word_count(input.answer) as f64 / expected).min(1.0);
    let direct = sentences(input.answer).first().map_or(0.0, |first| {
        let first_tokens = content_token_set(first);
        if DIRECT_RE.is_match(first) || input.query_tokens.iter().any(|t| first_tokens.contains(t)) {
            1.0
        } else {
            0.0
        }
    });
    0.5 * keywords + 0.3 * length + 0.2 * direct
}

/// Query coverage where recognised game entities count double.
fn relevance(input: &ScoringInput<'_>) -> f64 {
    let answer_lower = input.answer.to_lowercase();
    let entities = extract_entities(input.query);
    let entity_tokens: std::collections::HashSet<String> = entities
        .iter()
        .flat_map(|e| content_token_set(&e.text))
        .collect();

    let mut total = 0.0;
    let mut hit = 0.0;
    for entity in &entities {
        total += 2.0;
        if mentions(&answer_lower, &entity.text) {
            hit += 2.0;
        }
    }
    for token in input.query_tokens.iter().filter(|t| !entity_tokens.contains(*t)) {
        total += 1.0;
        if input.answer_tokens.contains(token) {
            hit += 1.0;
        }
    }
    if total == 0.0 {
        NEUTRAL
    } else {
        hit / total
    }
}

/// Starts at 0.7; logical connectors add, contradictions and repeated sentences subtract.
pub fn coherence(answer: &str) -> f64 {
    let parts = sentences(answer);
    if parts.is_empty() {
        return 0.0;
    }
    let connectors = CONNECTOR_RE.find_iter(answer).count().min(3) as f64;
    let contradictions = contradiction_count(answer) as f64;
    let mut seen = std::collections::HashSet::new();
    let repeats = parts
        .iter()
        .filter(|s| !seen.insert(s.to_lowercase()))
        .count() as f64;
    (0.7 + 0.1 * connectors - 0.25 * contradictions - 0.1 * repeats).clamp(0.0, 1.0)
}

/// Absolute always/never pairs and `can X` / `cannot X` on the same verb.
pub fn contradiction_count(answer: &str) -> usize {
    let absolute = usize::from(ALWAYS_RE.is_match(answer) && NEVER_RE.is_match(answer));
    let negated: std::collections::HashSet<String> = CANNOT_RE
        .captures_iter(answer)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_lowercase()))
        .collect();
    let modal = CAN_RE
        .captures_iter(answer)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_lowercase()))
        .filter(|verb| verb != "not" && negated.contains(verb))
        .collect::<std::collections::HashSet<_>>()
        .len();
    absolute + modal
}

fn answer_confidence(answer: &str) -> f64 {
    let hedges = HEDGE_RE.find_iter(answer).count() as f64;
    (1.0 - 0.2 * hedges).max(0.0)
}

fn source_confidence(input: &ScoringInput<'_>) -> f64 {
    if input.sources.is_empty() {
        return 0.0;
    }
    let sum: f64 = input.sources.iter().map(|s| s.score.clamp(0.0, 1.0)).sum();
    sum / input.sources.len() as f64
}

#[cfg(test)]
mod tests {
    use grimoire_core::models::{DocChunk, Intent};

    use super::*;

    fn sources() -> Vec<DocChunk> {
        vec![DocChunk::new(
            "phb-001",
            "Fireball. Range: 150 feet. Each creature in a 20-foot radius makes a Dexterity saving throw, taking 8d6 fire damage.",
            "phb",
        )
        .with_score(0.8)]
    }

    #[test]
    fn supported_sentences_raise_accuracy() {
        let sources = sources();
        let grounded = ScoringInput::new("fireball damage", "Fireball deals 8d6 fire damage.", &sources, None);
        let invented = ScoringInput::new("fireball damage", "Dragons hoard treasure in caves.", &sources, None);
        assert!(accuracy(&grounded) >= 0.8);
        assert_eq!(accuracy(&invented), 0.0);
    }

    #[test]
    fn contradictions_are_detected() {
        assert_eq!(contradiction_count("You can cast it. You cannot cast it."), 1);
        assert_eq!(contradiction_count("It always works. It never fails."), 1);
        assert_eq!(contradiction_count("You can cast it at higher levels."), 0);
        assert!(coherence("You can cast it. You cannot cast it.") < coherence("You can cast it."));
    }

    #[test]
    fn connectors_help_coherence() {
        let plain = coherence("Fireball hits an area. Creatures save.");
        let linked = coherence("Fireball hits an area, therefore creatures save because it explodes.");
        assert!(linked > plain);
    }

    #[test]
    fn entities_weigh_double_in_relevance() {
        let sources = sources();
        let input = ScoringInput::new("fireball range", "Fireball is a spell.", &sources, None);
        assert!((relevance(&input) - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn hedging_lowers_confidence() {
        assert_eq!(answer_confidence("It deals 8d6."), 1.0);
        assert!((answer_confidence("It might maybe deal 8d6.") - 0.6).abs() < 1e-9);
    }

    #[test]
    fn domain_scores_only_when_requested() {
        let sources = sources();
        let input = ScoringInput::new("fireball damage", "Fireball deals 8d6.", &sources, Some(Intent::FactLookup));
        let without = score(&input, false, &Deadline::none()).unwrap();
        let with = score(&input, true, &Deadline::none()).unwrap();
        assert!(without.domain_score().is_none());
        assert!(with.domain_score().is_some());
        assert_eq!(with.source_confidence, Some(0.8));
    }

    #[test]
    fn expired_deadline_fails_scoring() {
        let sources = sources();
        let input = ScoringInput::new("q", "a", &sources, None);
        let deadline = Deadline::none();
        deadline.cancel();
        assert!(matches!(
            score(&input, true, &deadline),
            Err(EvaluationError::ScoringFailed { .. })
        ));
    }
}
