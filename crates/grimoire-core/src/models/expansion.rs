use std::fmt;

use serde::{Deserialize, Serialize};

/// Where an expansion term came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionSource {
    Alias,
    CrossRef,
    GraphRelation,
}

impl ExpansionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alias => "alias",
            Self::CrossRef => "cross_ref",
            Self::GraphRelation => "graph_relation",
        }
    }
}

/// Expansion strategy requested from the graph expander.
///
/// `None` is only ever produced as a recommendation; asking the expander to
/// run with it yields no terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionStrategy {
    None,
    Alias,
    CrossRef,
    Graph,
    Hybrid,
}

impl ExpansionStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Alias => "alias",
            Self::CrossRef => "cross_ref",
            Self::Graph => "graph",
            Self::Hybrid => "hybrid",
        }
    }

    pub fn includes_alias(self) -> bool {
        matches!(self, Self::Alias | Self::Hybrid)
    }

    pub fn includes_cross_ref(self) -> bool {
        matches!(self, Self::CrossRef | Self::Hybrid)
    }

    pub fn includes_graph(self) -> bool {
        matches!(self, Self::Graph | Self::Hybrid)
    }
}

impl fmt::Display for ExpansionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An additional search term derived from the graph snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionTerm {
    pub term: String,
    pub source: ExpansionSource,
    pub confidence: f64,
    /// The query entity or token that produced this term.
    pub original_term: String,
}

/// Result of expanding a query. Transient, per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandedQuery {
    pub original_query: String,
    pub expanded_query: String,
    pub expansion_terms: Vec<ExpansionTerm>,
    pub strategy: ExpansionStrategy,
    /// Entities recognised in the original query (lowercased).
    pub entities: Vec<String>,
    pub processing_time_ms: f64,
}

impl ExpandedQuery {
    /// An expansion that adds nothing: used when no graph data is available.
    pub fn unexpanded(query: &str, strategy: ExpansionStrategy) -> Self {
        Self {
            original_query: query.to_string(),
            expanded_query: query.to_string(),
            expansion_terms: Vec::new(),
            strategy,
            entities: Vec::new(),
            processing_time_ms: 0.0,
        }
    }

    pub fn is_expanded(&self) -> bool {
        !self.expansion_terms.is_empty()
    }
}
