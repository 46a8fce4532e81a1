//! Metric computation for the two evaluation paths.
//!
//! The comprehensive path checks the deadline between components, so an
//! exhausted budget fails the evaluation instead of returning late.

pub mod comprehensive;
pub mod domain;
pub mod fast;

use std::collections::HashSet;

use grimoire_core::models::{DocChunk, Intent};
use grimoire_core::text::content_token_set;

/// Inputs shared by every scorer.
pub struct ScoringInput<'a> {
    pub query: &'a str,
    pub answer: &'a str,
    pub sources: &'a [DocChunk],
    pub intent: Option<Intent>,
    pub query_tokens: HashSet<String>,
    pub answer_tokens: HashSet<String>,
    pub source_tokens: HashSet<String>,
}

impl<'a> ScoringInput<'a> {
    pub fn new(query: &'a str, answer: &'a str, sources: &'a [DocChunk], intent: Option<Intent>) -> Self {
        let source_tokens = sources
            .iter()
            .flat_map(|s| content_token_set(&s.text))
            .collect();
        Self {
            query,
            answer,
            sources,
            intent,
            query_tokens: content_token_set(query),
            answer_tokens: content_token_set(answer),
            source_tokens,
        }
    }
}

/// Answer length (in words) that counts as complete for an intent.
pub fn expected_answer_words(intent: Option<Intent>) -> usize {
    match intent {
        Some(Intent::FactLookup) => 15,
        Some(Intent::ProceduralHowto | Intent::MultiHopReasoning) => 60,
        Some(Intent::CreativeWrite | Intent::Summarize) => 80,
        Some(Intent::CodeHelp) => 40,
        None => 30,
    }
}

/// Share of `needles` present in `haystack`; `empty` when there are no needles.
pub(crate) fn coverage(needles: &HashSet<String>, haystack: &HashSet<String>, empty: f64) -> f64 {
    if needles.is_empty() {
        return empty;
    }
    needles.iter().filter(|t| haystack.contains(*t)).count() as f64 / needles.len() as f64
}

/// Neutral score when there is nothing to compare against.
pub(crate) const NEUTRAL: f64 = 0.5;
