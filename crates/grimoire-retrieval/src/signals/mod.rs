//! Signal extractors for the hybrid reranker.
//!
//! Each family reduces its sub-signals to one scalar in `[0, 1]` with fixed
//! internal weights. Families are pure functions of a shared `SignalContext`
//! and one chunk; the reranker owns caching and fusion.

pub mod content;
pub mod domain;
pub mod graph;
pub mod metadata;
pub mod vector;

use std::collections::HashSet;

use grimoire_core::models::{
    Classification, Domain, ExpansionTerm, Intent, QueryGraphAnalysis, QueryPlan,
};
use grimoire_core::text::{content_token_set, tokenize};
use grimoire_graph::model::LoadedGraph;
use grimoire_graph::ranker::{analyze_with, neighbor_titles};
use serde::{Deserialize, Serialize};

pub use content::ContentSignals;
pub use domain::DomainSignals;
pub use graph::GraphSignals;
pub use metadata::MetadataSignals;
pub use vector::VectorSignals;

/// Query-side inputs shared by every extractor for one rerank call.
pub struct SignalContext<'a> {
    pub query: String,
    pub query_lower: String,
    pub query_tokens: HashSet<String>,
    pub query_bigrams: HashSet<(String, String)>,
    pub intent: Option<Intent>,
    pub domain: Option<Domain>,
    pub analysis: Option<QueryGraphAnalysis>,
    pub graph: Option<&'a LoadedGraph>,
    pub expansion_terms: &'a [ExpansionTerm],
    pub neighbor_titles: Vec<String>,
    /// Candidate count, for position priors.
    pub candidates: usize,
}

impl<'a> SignalContext<'a> {
    pub fn new(
        query: &str,
        plan: Option<&'a QueryPlan>,
        classification: Option<&Classification>,
        graph: Option<&'a LoadedGraph>,
        candidates: usize,
    ) -> Self {
        let classification = classification.or(plan.map(|p| &p.classification));
        let expansion = plan.and_then(|p| p.graph_expansion.as_ref());
        // Plans without a stored analysis get one computed against the snapshot.
        let analysis = expansion
            .and_then(|g| g.analysis.clone())
            .or_else(|| graph.map(|g| analyze_with(Some(g), query, classification)));
        let neighbor_titles = match (graph, analysis.as_ref()) {
            (Some(graph), Some(analysis)) => neighbor_titles(graph, analysis),
            _ => Vec::new(),
        };
        Self {
            query: query.to_string(),
            query_lower: query.to_lowercase(),
            query_tokens: content_token_set(query),
            query_bigrams: bigrams(query),
            intent: classification.map(|c| c.intent),
            domain: classification.map(|c| c.domain),
            analysis,
            graph,
            expansion_terms: expansion.map(|g| g.terms.as_slice()).unwrap_or(&[]),
            neighbor_titles,
            candidates,
        }
    }
}

/// Adjacent token pairs of `text`.
pub fn bigrams(text: &str) -> HashSet<(String, String)> {
    let tokens = tokenize(text);
    tokens
        .windows(2)
        .map(|w| (w[0].clone(), w[1].clone()))
        .collect()
}

/// Position-independent families, cacheable per `(query, chunk, strategy)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSignals {
    pub vector: VectorSignals,
    pub graph: GraphSignals,
    pub content: ContentSignals,
    pub domain: DomainSignals,
}

impl CachedSignals {
    pub fn extract(ctx: &SignalContext<'_>, text: &str, source: &str, score: f64) -> Self {
        Self {
            vector: vector::extract(ctx, text, score),
            graph: graph::extract(ctx, text),
            content: content::extract(ctx, text),
            domain: domain::extract(ctx, text, source),
        }
    }
}

/// Every signal computed for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankingSignals {
    pub vector: VectorSignals,
    pub graph: GraphSignals,
    pub content: ContentSignals,
    pub domain: DomainSignals,
    pub metadata: MetadataSignals,
}

impl RerankingSignals {
    pub fn from_parts(cached: CachedSignals, metadata: MetadataSignals) -> Self {
        Self {
            vector: cached.vector,
            graph: cached.graph,
            content: cached.content,
            domain: cached.domain,
            metadata,
        }
    }
}

/// Clamp into `[0, 1]`, mapping NaN to 0.
pub(crate) fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
