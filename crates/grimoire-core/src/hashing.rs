use sha2::{Digest, Sha256};

/// Plan-cache key: SHA-256 hex digest of the trimmed query.
///
/// Exact matching only. Surrounding whitespace never changes the key.
pub fn query_hash(query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.trim().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// blake3 hex digest of arbitrary content.
pub fn content_hash(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

/// blake3 digest over several parts, separated so `("ab","c")` != `("a","bc")`.
pub fn composite_hash(parts: &[&str]) -> String {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
