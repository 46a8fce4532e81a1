use serde::{Deserialize, Serialize};

use crate::errors::GrimoireResult;

/// Filters passed through to the vector store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorFilters {
    pub query_text: String,
    pub scan_limit: usize,
    #[serde(default)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A single similarity-search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    pub chunk_id: String,
    pub content: String,
    pub score: f64,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Opaque similarity-search provider.
///
/// The retriever treats an unavailable store or an error as "no results" and
/// falls back to scanning local artifacts.
pub trait IVectorStore: Send + Sync {
    /// Cheap reachability probe.
    fn is_available(&self) -> bool;

    /// Top-`top_k` hits, best first. `vector` may be absent for text-only stores.
    fn query(
        &self,
        vector: Option<&[f32]>,
        top_k: usize,
        filters: &VectorFilters,
    ) -> GrimoireResult<Vec<VectorHit>>;
}
