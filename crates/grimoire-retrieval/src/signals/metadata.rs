//! Metadata family: field completeness and a rank-position prior.
//!
//! Position depends on the candidate's slot in this rerank call, so these
//! signals are never cached.

use grimoire_core::models::DocChunk;
use serde::{Deserialize, Serialize};

use super::unit;

const FIELDS: [&str; 5] = ["source", "page", "section", "title", "type"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetadataSignals {
    pub completeness: f64,
    pub position_prior: f64,
    pub score: f64,
}

pub fn extract(chunk: &DocChunk, rank: usize, candidates: usize) -> MetadataSignals {
    let present = FIELDS
        .iter()
        .filter(|field| match **field {
            "source" => !chunk.source.is_empty() || has_field(chunk, "source"),
            other => has_field(chunk, other),
        })
        .count();
    let completeness = present as f64 / FIELDS.len() as f64;
    let position_prior = if candidates == 0 {
        0.0
    } else {
        unit(1.0 - rank as f64 / candidates as f64)
    };
    MetadataSignals {
        completeness,
        position_prior,
        score: unit((completeness + position_prior) / 2.0),
    }
}

fn has_field(chunk: &DocChunk, key: &str) -> bool {
    chunk
        .metadata
        .get(key)
        .is_some_and(|v| !v.is_null() && v.as_str() != Some(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completeness_counts_present_fields() {
        let chunk = DocChunk::new("a", "text", "phb")
            .with_metadata(serde_json::json!({"page": 241, "section": "", "type": "spell"}));
        let s = extract(&chunk, 0, 4);
        assert!((s.completeness - 0.6).abs() < 1e-9);
        assert_eq!(s.position_prior, 1.0);
    }

    #[test]
    fn later_ranks_get_a_lower_prior() {
        let chunk = DocChunk::new("a", "text", "");
        assert_eq!(extract(&chunk, 3, 4).position_prior, 0.25);
        assert_eq!(extract(&chunk, 0, 0).position_prior, 0.0);
        assert_eq!(extract(&chunk, 0, 4).completeness, 0.0);
    }
}
