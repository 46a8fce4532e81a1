//! Fast path: four cheap token heuristics, no domain sub-scores.

use grimoire_core::text::{sentences, word_count};

use super::{coverage, expected_answer_words, ScoringInput, NEUTRAL};
use crate::metrics::QualityMetrics;

pub fn score(input: &ScoringInput<'_>) -> QualityMetrics {
    let accuracy = if input.sources.is_empty() {
        NEUTRAL
    } else {
        coverage(&input.answer_tokens, &input.source_tokens, NEUTRAL)
    };
    let expected = expected_answer_words(input.intent) as f64;
    let completeness = (word_count(input.answer) as f64 / expected).min(1.0);
    let relevance = coverage(&input.query_tokens, &input.answer_tokens, NEUTRAL);
    let coherence = match sentences(input.answer).len() {
        0 => 0.0,
        1 => 0.8,
        _ => 1.0,
    };
    QualityMetrics::core(accuracy, completeness, relevance, coherence)
}
