//! Content family: length fit, sentence shape, structure, authority
//! markers, and readability, scaled by a length penalty.

use std::sync::LazyLock;

use grimoire_core::models::Intent;
use grimoire_core::text::{sentences, word_count};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{unit, SignalContext};

const LENGTH_FIT_WEIGHT: f64 = 0.3;
const SENTENCE_WEIGHT: f64 = 0.2;
const STRUCTURE_WEIGHT: f64 = 0.15;
const AUTHORITY_WEIGHT: f64 = 0.15;
const READABILITY_WEIGHT: f64 = 0.2;

/// Sentence lengths (in words) that read best.
const SENTENCE_SWEET_SPOT: (f64, f64) = (10.0, 25.0);

static LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:[-*•]|\d+[.)])\s+\S").unwrap());
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*#{1,6}\s+\S").unwrap());
static TABLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*\|.*\|\s*$").unwrap());
static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*[A-Z][A-Za-z ]{1,30}:\s").unwrap());

static AUTHORITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(according to|as (?:stated|described) in|see (?:page|chapter)|page \d+|chapter \d+|player's handbook|dungeon master's guide|official|errata)\b",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContentSignals {
    pub length_fit: f64,
    pub sentence_quality: f64,
    pub structure: f64,
    pub authority: f64,
    pub readability: f64,
    pub length_penalty: f64,
    pub score: f64,
}

/// Ideal answer-source length in words for an intent.
pub fn ideal_word_range(intent: Option<Intent>) -> (usize, usize) {
    match intent {
        Some(Intent::FactLookup) => (20, 120),
        Some(Intent::ProceduralHowto) => (60, 300),
        Some(Intent::MultiHopReasoning) => (80, 400),
        Some(Intent::CreativeWrite) => (60, 400),
        Some(Intent::CodeHelp) => (30, 300),
        Some(Intent::Summarize) => (100, 500),
        None => (40, 250),
    }
}

pub fn extract(ctx: &SignalContext<'_>, text: &str) -> ContentSignals {
    let words = word_count(text);
    let (min, max) = ideal_word_range(ctx.intent);

    let length_fit = length_fit(words, min, max);
    let sentence_quality = sentence_quality(text);
    let structure = structure_score(text);
    let authority = (AUTHORITY_RE.find_iter(text).count() as f64 * 0.25).min(1.0);
    let readability = readability(text);
    let length_penalty = if words > max * 2 {
        0.5
    } else if words * 2 < min {
        0.7
    } else {
        1.0
    };

    let base = LENGTH_FIT_WEIGHT * length_fit
        + SENTENCE_WEIGHT * sentence_quality
        + STRUCTURE_WEIGHT * structure
        + AUTHORITY_WEIGHT * authority
        + READABILITY_WEIGHT * readability;

    ContentSignals {
        length_fit,
        sentence_quality,
        structure,
        authority,
        readability,
        length_penalty,
        score: unit(base * length_penalty),
    }
}

/// 1.0 inside `[min, max]`, decaying linearly to 0 at zero words or at `2 * max`.
fn length_fit(words: usize, min: usize, max: usize) -> f64 {
    let w = words as f64;
    if words >= min && words <= max {
        1.0
    } else if words < min {
        w / min.max(1) as f64
    } else {
        unit(1.0 - (w - max as f64) / max.max(1) as f64)
    }
}

fn sentence_quality(text: &str) -> f64 {
    let parts = sentences(text);
    if parts.is_empty() {
        return 0.0;
    }
    let avg = parts.iter().map(|s| word_count(s)).sum::<usize>() as f64 / parts.len() as f64;
    let (lo, hi) = SENTENCE_SWEET_SPOT;
    if (lo..=hi).contains(&avg) {
        1.0
    } else if avg < lo {
        avg / lo
    } else {
        unit(1.0 - (avg - hi) / hi)
    }
}

fn structure_score(text: &str) -> f64 {
    let features = [&*LIST_RE, &*HEADING_RE, &*TABLE_RE, &*LABEL_RE]
        .iter()
        .filter(|re| re.is_match(text))
        .count();
    (features as f64 * 0.34).min(1.0)
}

/// Flesch reading ease scaled into `[0, 1]`.
fn readability(text: &str) -> f64 {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let sentence_count = sentences(text).len().max(1) as f64;
    let syllables: usize = words.iter().map(|w| syllable_count(w)).sum();
    let word_total = words.len() as f64;
    let flesch =
        206.835 - 1.015 * (word_total / sentence_count) - 84.6 * (syllables as f64 / word_total);
    unit(flesch / 100.0)
}

/// Vowel groups, at least one per word.
fn syllable_count(word: &str) -> usize {
    let mut count = 0;
    let mut prev_vowel = false;
    for c in word.chars().flat_map(char::to_lowercase) {
        let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if vowel && !prev_vowel {
            count += 1;
        }
        prev_vowel = vowel;
    }
    count.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syllables_are_vowel_groups() {
        assert_eq!(syllable_count("fireball"), 3);
        assert_eq!(syllable_count("dnd"), 1);
        assert_eq!(syllable_count("reading"), 2);
    }

    #[test]
    fn length_fit_shape() {
        assert_eq!(length_fit(50, 20, 120), 1.0);
        assert_eq!(length_fit(10, 20, 120), 0.5);
        assert_eq!(length_fit(240, 20, 120), 0.0);
    }

    #[test]
    fn structure_counts_features() {
        assert_eq!(structure_score("plain prose"), 0.0);
        let rich = "# Spells\nDamage: 8d6\n- one\n| a | b |";
        assert_eq!(structure_score(rich), 1.0);
    }

    #[test]
    fn tiny_chunks_are_penalised() {
        let ctx = SignalContext::new("fireball", None, None, None, 1);
        let s = extract(&ctx, "Fire.");
        assert_eq!(s.length_penalty, 0.7);
        assert!(s.score >= 0.0 && s.score <= 1.0);
    }

    #[test]
    fn authority_markers_accumulate() {
        let ctx = SignalContext::new("fireball", None, None, None, 1);
        let s = extract(&ctx, "According to the Player's Handbook, see page 241.");
        assert_eq!(s.authority, 0.75);
    }
}
