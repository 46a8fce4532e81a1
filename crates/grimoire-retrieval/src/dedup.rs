//! Duplicate detection by truncated token signature.

use std::collections::HashSet;

use grimoire_core::models::DocChunk;
use grimoire_core::text::tokenize;

/// The first `tokens` lowercased tokens of `text`, space-joined.
pub fn signature(text: &str, tokens: usize) -> String {
    tokenize(text).into_iter().take(tokens).collect::<Vec<_>>().join(" ")
}

/// Keep the first chunk per signature. Input order is preserved, so sort best-first beforehand.
pub fn dedup_chunks(chunks: Vec<DocChunk>, tokens: usize) -> Vec<DocChunk> {
    let mut seen = HashSet::new();
    chunks
        .into_iter()
        .filter(|chunk| {
            let sig = signature(&chunk.text, tokens);
            // Chunks with no tokens are never considered duplicates of each other.
            sig.is_empty() || seen.insert(sig)
        })
        .collect()
}
