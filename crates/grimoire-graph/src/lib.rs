//! # grimoire-graph
//!
//! Graph subsystem: loads per-job graph snapshots from ingestion artifacts,
//! indexes them with petgraph, expands queries with aliases, cross-references,
//! and graph neighbourhoods, and rescales candidates by graph proximity.

pub mod entities;
pub mod expansion;
pub mod indexed;
pub mod model;
pub mod ranker;
pub mod store;

pub use entities::extract_entities;
pub use expansion::GraphQueryExpander;
pub use indexed::IndexedGraph;
pub use model::LoadedGraph;
pub use ranker::GraphAwareRanker;
pub use store::GraphArtifactStore;
