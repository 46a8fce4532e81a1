//! # grimoire-retrieval
//!
//! Candidate retrieval and reranking:
//! - vector store (when reachable) or lexical scan of local ingestion artifacts
//! - graph-expansion boost and graph-aware rescaling
//! - token-signature deduplication
//! - four signal families fused by the hybrid reranker

pub mod boost;
pub mod dedup;
pub mod lexical;
pub mod rerank;
pub mod retriever;
pub mod signals;

pub use rerank::{HybridReranker, RerankOutput, RerankStats, RerankedResult};
pub use retriever::{RetrievalOutcome, RetrievalSource, Retriever};
pub use signals::RerankingSignals;
