//! Citation validation: citations written in the answer must name a retrieved
//! source, and retrieved sources should be referenced by the answer.
//!
//! Recognised forms: `[phb]`, `[phb-001]`, `(PHB p. 241)`, `(source: xge)`.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use grimoire_core::models::DocChunk;
use regex::Regex;
use serde::{Deserialize, Serialize};

static BRACKET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\[\]]{1,60})\]").unwrap());

static PAREN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\((?:source:\s*)?([a-z][\w' -]{1,40}?)(?:,?\s*(?:p\.|pg\.|page)\s*\d+)?\)").unwrap()
});

/// Result of cross-checking the answer's citations against the sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CitationReport {
    /// Every citation found in the answer, normalised.
    pub cited: Vec<String>,
    /// Citations that match a retrieved source id or name.
    pub verified: Vec<String>,
    /// Citations that match nothing that was retrieved.
    pub unverified: Vec<String>,
    /// Retrieved source names the answer never references.
    pub unreferenced_sources: Vec<String>,
    /// Share of citations that verified; 1.0 when the answer cites nothing.
    pub score: f64,
}

impl CitationReport {
    pub fn has_unverified(&self) -> bool {
        !self.unverified.is_empty()
    }
}

fn normalize(citation: &str) -> String {
    citation
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

/// Citations in `answer`, normalised and deduplicated, in first-seen order.
pub fn extract_citations(answer: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    BRACKET_RE
        .captures_iter(answer)
        .chain(PAREN_RE.captures_iter(answer))
        .filter_map(|caps| caps.get(1).map(|m| normalize(m.as_str())))
        .filter(|c| !c.is_empty() && seen.insert(c.clone()))
        .collect()
}

pub fn validate_citations(answer: &str, sources: &[DocChunk]) -> CitationReport {
    let cited = extract_citations(answer);
    let known: BTreeSet<String> = sources
        .iter()
        .flat_map(|s| [normalize(&s.source), normalize(&s.id)])
        .filter(|k| !k.is_empty())
        .collect();

    let (verified, unverified): (Vec<String>, Vec<String>) =
        cited.iter().cloned().partition(|c| matches_known(c, &known));

    let answer_norm = normalize(answer);
    let padded = format!("_{answer_norm}_");
    let names: BTreeSet<String> = sources
        .iter()
        .map(|s| normalize(&s.source))
        .filter(|s| !s.is_empty())
        .collect();
    let unreferenced_sources = names
        .into_iter()
        .filter(|name| !padded.contains(&format!("_{name}_")))
        .collect();

    let score = if cited.is_empty() {
        1.0
    } else {
        verified.len() as f64 / cited.len() as f64
    };
    CitationReport {
        cited,
        verified,
        unverified,
        unreferenced_sources,
        score,
    }
}

/// Exact id or source name, or a citation that leads with a known source name (`phb_241`).
fn matches_known(citation: &str, known: &BTreeSet<String>) -> bool {
    known.contains(citation)
        || known
            .iter()
            .any(|k| citation.starts_with(&format!("{k}_")))
}
