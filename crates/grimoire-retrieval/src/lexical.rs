//! Local lexical scan over `<ingest_root>/<env>/*.json` chunk files.
//!
//! Two schemas are accepted: `{"chunks": [{id, text, ...}]}` and
//! `{"enriched_chunks": [{chunk_id, content, ...}]}`. Unreadable or malformed
//! files are skipped with a warning.

use std::collections::HashSet;
use std::path::Path;

use grimoire_core::errors::RetrievalError;
use grimoire_core::models::{normalize_scores, sort_best_first, DocChunk};
use grimoire_core::text::{content_token_set, tokenize};
use serde::Deserialize;
use tracing::{debug, warn};

/// Multiplier when the whole query phrase appears verbatim.
pub const PHRASE_BOOST: f64 = 1.2;
/// Multiplier for table-type chunks.
pub const TABLE_BOOST: f64 = 1.1;

#[derive(Debug, Deserialize)]
struct ChunkFile {
    #[serde(default)]
    chunks: Vec<ChunkRecord>,
    #[serde(default)]
    enriched_chunks: Vec<ChunkRecord>,
}

#[derive(Debug, Deserialize)]
struct ChunkRecord {
    #[serde(alias = "chunk_id")]
    id: String,
    #[serde(alias = "content")]
    text: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    metadata: serde_json::Value,
}

impl ChunkRecord {
    fn into_chunk(self, fallback_source: &str) -> DocChunk {
        let source = self
            .source
            .or_else(|| self.metadata.get("source").and_then(|s| s.as_str()).map(str::to_string))
            .unwrap_or_else(|| fallback_source.to_string());
        DocChunk::new(self.id, self.text, source).with_metadata(self.metadata)
    }
}

/// Load every chunk under `env_dir`, files in name order, stopping at `scan_limit` chunks.
pub fn load_chunks(env_dir: &Path, scan_limit: usize) -> Result<Vec<DocChunk>, RetrievalError> {
    let entries = std::fs::read_dir(env_dir).map_err(|e| RetrievalError::ScanFailed {
        reason: format!("{}: {e}", env_dir.display()),
    })?;
    let mut files: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    let mut chunks = Vec::new();
    for path in files {
        if chunks.len() >= scan_limit {
            break;
        }
        let fallback_source = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str::<ChunkFile>(&raw).map_err(|e| e.to_string()));
        match parsed {
            Ok(file) => {
                let records = file.chunks.into_iter().chain(file.enriched_chunks);
                let remaining = scan_limit - chunks.len();
                chunks.extend(records.take(remaining).map(|r| r.into_chunk(&fallback_source)));
            }
            Err(reason) => warn!(path = %path.display(), reason = %reason, "skipping unreadable chunk file"),
        }
    }
    debug!(env_dir = %env_dir.display(), chunks = chunks.len(), "chunk files scanned");
    Ok(chunks)
}

/// Score `chunks` against `search_text` and return those with any overlap, best-first.
///
/// Score = fraction of query content tokens present in the chunk, times the phrase
/// and table boosts, normalised into `[0, 1]`.
pub fn score_chunks(chunks: Vec<DocChunk>, search_text: &str, phrase: &str) -> Vec<DocChunk> {
    let query_tokens = content_token_set(search_text);
    if query_tokens.is_empty() {
        return Vec::new();
    }
    let phrase = normalized_phrase(phrase);

    let mut scored: Vec<DocChunk> = chunks
        .into_iter()
        .filter_map(|chunk| {
            let score = lexical_score(&chunk, &query_tokens, phrase.as_deref());
            (score > 0.0).then(|| chunk.with_score(score))
        })
        .collect();
    normalize_scores(&mut scored);
    sort_best_first(&mut scored);
    scored
}

/// Raw, unnormalised score of one chunk.
pub fn lexical_score(chunk: &DocChunk, query_tokens: &HashSet<String>, phrase: Option<&str>) -> f64 {
    let chunk_tokens: HashSet<String> = tokenize(&chunk.text).into_iter().collect();
    let present = query_tokens.iter().filter(|t| chunk_tokens.contains(*t)).count();
    if present == 0 {
        return 0.0;
    }
    let mut score = present as f64 / query_tokens.len() as f64;
    if let Some(phrase) = phrase {
        if tokenize(&chunk.text).join(" ").contains(phrase) {
            score *= PHRASE_BOOST;
        }
    }
    if is_table(chunk) {
        score *= TABLE_BOOST;
    }
    score
}

/// Multi-word phrases only; single words are already covered by token overlap.
fn normalized_phrase(phrase: &str) -> Option<String> {
    let tokens = tokenize(phrase);
    (tokens.len() >= 2).then(|| tokens.join(" "))
}

fn is_table(chunk: &DocChunk) -> bool {
    ["type", "chunk_type"]
        .iter()
        .any(|key| chunk.metadata_str(key) == Some("table"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_fraction() {
        let chunk = DocChunk::new("1", "Fireball deals fire damage", "phb");
        let tokens = content_token_set("fireball damage range");
        let score = lexical_score(&chunk, &tokens, None);
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn phrase_and_table_boosts() {
        let tokens = content_token_set("spell slots");
        let plain = DocChunk::new("1", "slots for each spell", "phb");
        let phrase = DocChunk::new("2", "Wizard spell slots", "phb");
        let table = DocChunk::new("3", "Wizard spell slots", "phb")
            .with_metadata(serde_json::json!({"type": "table"}));
        let p = normalized_phrase("spell slots");
        assert_eq!(lexical_score(&plain, &tokens, p.as_deref()), 1.0);
        assert!((lexical_score(&phrase, &tokens, p.as_deref()) - 1.2).abs() < 1e-9);
        assert!((lexical_score(&table, &tokens, p.as_deref()) - 1.32).abs() < 1e-9);
    }

    #[test]
    fn scored_output_is_normalised_and_filtered() {
        let chunks = vec![
            DocChunk::new("a", "Wizard spell slots", "phb")
                .with_metadata(serde_json::json!({"type": "table"})),
            DocChunk::new("b", "spell", "phb"),
            DocChunk::new("c", "tavern", "phb"),
        ];
        let scored = score_chunks(chunks, "spell slots", "spell slots");
        let ids: Vec<_> = scored.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(scored[0].score, 1.0);
        assert!(scored.iter().all(|c| c.score <= 1.0));
    }

    #[test]
    fn stop_word_only_query_scores_nothing() {
        let chunks = vec![DocChunk::new("a", "the and of", "phb")];
        assert!(score_chunks(chunks, "the of", "the of").is_empty());
    }
}
