//! Graph-expansion boost: matched expansion terms multiply a chunk's score.

use grimoire_core::models::{normalize_scores, DocChunk, ExpansionSource, ExpansionTerm};
use grimoire_graph::entities::mentions;

/// Per-source contribution of a matched term, scaled by its confidence.
pub fn source_weight(source: ExpansionSource) -> f64 {
    match source {
        ExpansionSource::CrossRef => 0.3,
        ExpansionSource::Alias => 0.2,
        ExpansionSource::GraphRelation => 0.1,
    }
}

/// `min(1 + Σ weight(source) * confidence, max_boost)` over terms the text mentions.
pub fn boost_factor(text: &str, terms: &[ExpansionTerm], max_boost: f64) -> f64 {
    let lower = text.to_lowercase();
    let sum: f64 = terms
        .iter()
        .filter(|t| mentions(&lower, &t.term.to_lowercase()))
        .map(|t| source_weight(t.source) * t.confidence)
        .sum();
    (1.0 + sum).min(max_boost.max(1.0))
}

/// Boost every chunk in place and renormalise. Returns how many chunks were boosted.
pub fn apply_graph_boost(chunks: &mut [DocChunk], terms: &[ExpansionTerm], max_boost: f64) -> usize {
    if terms.is_empty() {
        return 0;
    }
    let mut boosted = 0;
    for chunk in chunks.iter_mut() {
        let factor = boost_factor(&chunk.text, terms, max_boost);
        if factor > 1.0 {
            chunk.score *= factor;
            boosted += 1;
        }
    }
    normalize_scores(chunks);
    boosted
}
