//! Vector family: raw retrieval similarity plus a lightweight lexical
//! "semantic" score, blended by intent.

use grimoire_core::models::Intent;
use grimoire_core::text::{content_token_set, jaccard, tokenize};
use serde::{Deserialize, Serialize};

use super::{bigrams, unit, SignalContext};

const JACCARD_WEIGHT: f64 = 0.6;
const BIGRAM_WEIGHT: f64 = 0.4;
const PHRASE_BONUS: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorSignals {
    pub similarity: f64,
    pub semantic: f64,
    pub score: f64,
}

/// (similarity, semantic) weights per intent.
fn intent_weights(intent: Option<Intent>) -> (f64, f64) {
    match intent {
        Some(Intent::FactLookup) => (0.7, 0.3),
        Some(Intent::MultiHopReasoning | Intent::Summarize) => (0.5, 0.5),
        Some(Intent::CreativeWrite) => (0.4, 0.6),
        _ => (0.6, 0.4),
    }
}

pub fn extract(ctx: &SignalContext<'_>, text: &str, similarity: f64) -> VectorSignals {
    let similarity = unit(similarity);
    let semantic = semantic_score(ctx, text);
    let (w_sim, w_sem) = intent_weights(ctx.intent);
    VectorSignals {
        similarity,
        semantic,
        score: unit(w_sim * similarity + w_sem * semantic),
    }
}

fn semantic_score(ctx: &SignalContext<'_>, text: &str) -> f64 {
    let chunk_tokens = content_token_set(text);
    let token_overlap = jaccard(&ctx.query_tokens, &chunk_tokens);

    let bigram_overlap = if ctx.query_bigrams.is_empty() {
        0.0
    } else {
        let chunk_bigrams = bigrams(text);
        let shared = ctx.query_bigrams.intersection(&chunk_bigrams).count();
        shared as f64 / ctx.query_bigrams.len() as f64
    };

    let mut score = JACCARD_WEIGHT * token_overlap + BIGRAM_WEIGHT * bigram_overlap;
    let phrase = tokenize(&ctx.query).join(" ");
    if phrase.contains(' ') && tokenize(text).join(" ").contains(&phrase) {
        score += PHRASE_BONUS;
    }
    unit(score)
}
