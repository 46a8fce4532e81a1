//! Span definitions per pipeline stage: planning, retrieval, rerank, evaluation, provenance.

/// Create a planning span.
#[macro_export]
macro_rules! planning_span {
    ($query_hash:expr) => {
        tracing::info_span!("grimoire.planning", query_hash = %$query_hash)
    };
}

/// Create a retrieval span.
#[macro_export]
macro_rules! retrieval_span {
    ($query_hash:expr, $limit:expr) => {
        tracing::info_span!("grimoire.retrieval", query_hash = %$query_hash, limit = $limit)
    };
}

/// Create a rerank span.
#[macro_export]
macro_rules! rerank_span {
    ($strategy:expr, $candidates:expr) => {
        tracing::info_span!("grimoire.rerank", strategy = %$strategy, candidates = $candidates)
    };
}

/// Create an evaluation span.
#[macro_export]
macro_rules! evaluation_span {
    ($strategy:expr) => {
        tracing::info_span!("grimoire.evaluation", strategy = %$strategy)
    };
}

/// Create a provenance span.
#[macro_export]
macro_rules! provenance_span {
    ($session_id:expr) => {
        tracing::info_span!("grimoire.provenance", session_id = %$session_id)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const PLANNING: &str = "grimoire.planning";
    pub const RETRIEVAL: &str = "grimoire.retrieval";
    pub const RERANK: &str = "grimoire.rerank";
    pub const EVALUATION: &str = "grimoire.evaluation";
    pub const PROVENANCE: &str = "grimoire.provenance";
}
