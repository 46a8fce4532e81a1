//! TTRPG domain sub-scores: rules figures, terminology, and source authority.

use std::collections::HashSet;
use std::sync::LazyLock;

use grimoire_core::authority::{source_authority as authority_of, DEFAULT_SOURCE_AUTHORITY};
use grimoire_graph::entities::{extract_entities, mentions};
use regex::Regex;

use super::ScoringInput;

/// Dice, DCs, signed modifiers, distances, and levels.
static FIGURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d*d(?:4|6|8|10|12|20|100)\b|\bDC\s*\d+\b|[+-]\d+\b|\b\d+\s*(?:feet|foot|ft)\b|\b\d+(?:st|nd|rd|th)[- ]level\b")
        .unwrap()
});

fn figures(text: &str) -> HashSet<String> {
    FIGURE_RE
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase().split_whitespace().collect::<Vec<_>>().join(" "))
        .collect()
}

/// Share of the answer's rules figures that also appear in a source. 1.0 when it states none.
pub fn rules_accuracy(input: &ScoringInput<'_>) -> f64 {
    let claimed = figures(input.answer);
    if claimed.is_empty() {
        return 1.0;
    }
    let backed: HashSet<String> = input.sources.iter().flat_map(|s| figures(&s.text)).collect();
    claimed.iter().filter(|f| backed.contains(*f)).count() as f64 / claimed.len() as f64
}

/// Share of game entities named in the answer that the sources also name.
pub fn terminology_accuracy(input: &ScoringInput<'_>) -> f64 {
    let named: HashSet<String> = extract_entities(input.answer).into_iter().map(|e| e.text).collect();
    if named.is_empty() {
        return 1.0;
    }
    let source_text: Vec<String> = input.sources.iter().map(|s| s.text.to_lowercase()).collect();
    named
        .iter()
        .filter(|entity| source_text.iter().any(|text| mentions(text, entity)))
        .count() as f64
        / named.len() as f64
}

/// Mean authority of the sources.
pub fn source_authority(input: &ScoringInput<'_>) -> f64 {
    if input.sources.is_empty() {
        return DEFAULT_SOURCE_AUTHORITY;
    }
    input.sources.iter().map(|s| authority_of(&s.source)).sum::<f64>() / input.sources.len() as f64
}
