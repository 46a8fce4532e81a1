/// grimoire version string.
pub const GRIMOIRE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Guardrail: maximum candidates requested from any retrieval backend.
pub const MAX_VECTOR_K: usize = 50;

/// Guardrail: maximum results a single retrieval may return.
pub const MAX_RETRIEVAL_LIMIT: usize = 50;

/// Guardrail: maximum graph traversal depth a plan may request.
pub const MAX_GRAPH_DEPTH: usize = 3;

/// Breadth-first expansion bounds.
pub const EXPANSION_BFS_MAX_DEPTH: usize = 2;
pub const EXPANSION_BFS_MAX_NODES: usize = 50;
pub const EXPANSION_TERMS_PER_NODE: usize = 3;

/// Number of expansion terms rendered into the expanded query string.
pub const EXPANDED_QUERY_TERMS: usize = 5;

/// Expansion confidences by source.
pub const ALIAS_ENTITY_CONFIDENCE: f64 = 0.9;
pub const ALIAS_TOKEN_CONFIDENCE: f64 = 0.8;
pub const GRAPH_RELATION_CONFIDENCE: f64 = 0.6;

/// Graph artifact file names.
pub const GRAPH_SNAPSHOT_FILE: &str = "graph_snapshot.json";
pub const ALIAS_MAP_FILE: &str = "alias_map.json";
