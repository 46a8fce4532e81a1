//! Graph Query Expander: alias, cross-reference, and graph-neighbourhood terms.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use grimoire_core::constants::{
    ALIAS_ENTITY_CONFIDENCE, ALIAS_TOKEN_CONFIDENCE, EXPANDED_QUERY_TERMS,
    EXPANSION_BFS_MAX_DEPTH, EXPANSION_BFS_MAX_NODES, EXPANSION_TERMS_PER_NODE,
    GRAPH_RELATION_CONFIDENCE,
};
use grimoire_core::models::{ExpandedQuery, ExpansionSource, ExpansionStrategy, ExpansionTerm};
use grimoire_core::text::{content_tokens, is_stop_word, tokenize};
use tracing::debug;

use crate::entities::extract_entities;
use crate::model::LoadedGraph;
use crate::store::GraphArtifactStore;

/// Expands queries against the current graph snapshot of one environment.
pub struct GraphQueryExpander {
    store: Arc<GraphArtifactStore>,
}

impl GraphQueryExpander {
    pub fn new(store: Arc<GraphArtifactStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<GraphArtifactStore> {
        &self.store
    }

    /// Expand `query` using the latest snapshot. Without a snapshot the query comes back unexpanded.
    pub fn expand_query(
        &self,
        query: &str,
        strategy: ExpansionStrategy,
        max_expansions: usize,
        min_confidence: f64,
    ) -> ExpandedQuery {
        let graph = self.store.load_graph_snapshot(None);
        expand_with(graph.as_deref(), query, strategy, max_expansions, min_confidence)
    }
}

/// Expand `query` against an already-loaded graph.
pub fn expand_with(
    graph: Option<&LoadedGraph>,
    query: &str,
    strategy: ExpansionStrategy,
    max_expansions: usize,
    min_confidence: f64,
) -> ExpandedQuery {
    let started = Instant::now();
    let Some(graph) = graph else {
        return ExpandedQuery::unexpanded(query, strategy);
    };
    if strategy == ExpansionStrategy::None || query.trim().is_empty() {
        return ExpandedQuery::unexpanded(query, strategy);
    }

    let entities: Vec<String> = extract_entities(query).into_iter().map(|e| e.text).collect();
    let tokens: Vec<String> = content_tokens(query)
        .into_iter()
        .filter(|t| !entities.contains(t))
        .collect();

    let mut candidates = Vec::new();
    if strategy.includes_alias() {
        alias_terms(graph, &entities, &tokens, &mut candidates);
    }
    if strategy.includes_cross_ref() {
        cross_ref_terms(graph, &entities, &mut candidates);
    }
    if strategy.includes_graph() {
        graph_terms(graph, &entities, &mut candidates);
    }

    let query_words: Vec<String> = tokenize(query);
    let terms = finalize_terms(candidates, &entities, &query_words, max_expansions, min_confidence);
    let expanded_query = render_expanded_query(query, &terms);

    debug!(
        strategy = %strategy,
        entities = entities.len(),
        terms = terms.len(),
        "query expanded"
    );

    ExpandedQuery {
        original_query: query.to_string(),
        expanded_query,
        expansion_terms: terms,
        strategy,
        entities,
        processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
    }
}

fn push(out: &mut Vec<ExpansionTerm>, term: &str, source: ExpansionSource, confidence: f64, original: &str) {
    out.push(ExpansionTerm {
        term: term.to_string(),
        source,
        confidence,
        original_term: original.to_string(),
    });
}

/// Direct and reverse alias lookups: whole entities at 0.9, single tokens at 0.8.
fn alias_terms(graph: &LoadedGraph, entities: &[String], tokens: &[String], out: &mut Vec<ExpansionTerm>) {
    let lookups = entities
        .iter()
        .map(|e| (e, ALIAS_ENTITY_CONFIDENCE))
        .chain(tokens.iter().map(|t| (t, ALIAS_TOKEN_CONFIDENCE)));
    for (original, confidence) in lookups {
        let (direct, reverse) = graph.aliases_for(original);
        for term in direct.iter().chain(reverse.iter()) {
            push(out, term, ExpansionSource::Alias, confidence, original);
        }
    }
}

/// Both endpoints of every cross-reference mentioning an entity; confidence inherited.
fn cross_ref_terms(graph: &LoadedGraph, entities: &[String], out: &mut Vec<ExpansionTerm>) {
    for entity in entities {
        for xref in graph.cross_refs_mentioning(entity) {
            for endpoint in [&xref.source_element, &xref.target_element] {
                push(out, endpoint, ExpansionSource::CrossRef, xref.confidence, entity);
            }
        }
    }
}

/// Title terms of nodes within two hops of any node mentioning an entity.
fn graph_terms(graph: &LoadedGraph, entities: &[String], out: &mut Vec<ExpansionTerm>) {
    for entity in entities {
        let seeds = graph.nodes_matching(entity);
        if seeds.is_empty() {
            continue;
        }
        let reached = graph
            .index
            .neighborhood(&seeds, EXPANSION_BFS_MAX_DEPTH, EXPANSION_BFS_MAX_NODES);
        for node in reached {
            let Some(title) = graph.title_of(&node.node_id) else {
                continue;
            };
            let words = tokenize(title)
                .into_iter()
                .filter(|w| w.chars().count() > 1 && !is_stop_word(w))
                .take(EXPANSION_TERMS_PER_NODE);
            for word in words {
                push(out, &word, ExpansionSource::GraphRelation, GRAPH_RELATION_CONFIDENCE, entity);
            }
        }
    }
}

/// Filter by confidence, drop terms already in the query, dedup case-insensitively
/// keeping the most confident, sort descending, truncate.
fn finalize_terms(
    candidates: Vec<ExpansionTerm>,
    entities: &[String],
    query_words: &[String],
    max_expansions: usize,
    min_confidence: f64,
) -> Vec<ExpansionTerm> {
    let mut best: HashMap<String, ExpansionTerm> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for candidate in candidates {
        if !candidate.confidence.is_finite() || candidate.confidence < min_confidence {
            continue;
        }
        let key = candidate.term.trim().to_lowercase();
        if key.is_empty() || entities.contains(&key) || query_words.contains(&key) {
            continue;
        }
        match best.get_mut(&key) {
            Some(existing) => {
                if candidate.confidence > existing.confidence {
                    *existing = candidate;
                }
            }
            None => {
                order.push(key.clone());
                best.insert(key, candidate);
            }
        }
    }

    let mut terms: Vec<ExpansionTerm> = order.into_iter().filter_map(|k| best.remove(&k)).collect();
    // Stable sort keeps discovery order among equal confidences.
    terms.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    terms.truncate(max_expansions);
    terms
}

/// `(original) OR ("t1" OR "t2" ...)` over the top terms; the original query when there are none.
pub fn render_expanded_query(query: &str, terms: &[ExpansionTerm]) -> String {
    if terms.is_empty() {
        return query.to_string();
    }
    let quoted: Vec<String> = terms
        .iter()
        .take(EXPANDED_QUERY_TERMS)
        .map(|t| format!("\"{}\"", t.term))
        .collect();
    format!("({}) OR ({})", query, quoted.join(" OR "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(t: &str, c: f64) -> ExpansionTerm {
        ExpansionTerm {
            term: t.into(),
            source: ExpansionSource::Alias,
            confidence: c,
            original_term: "x".into(),
        }
    }

    #[test]
    fn finalize_dedups_case_insensitively_keeping_max() {
        let terms = finalize_terms(
            vec![term("Mage", 0.8), term("mage", 0.9), term("arcanist", 0.85)],
            &[],
            &[],
            10,
            0.5,
        );
        let got: Vec<_> = terms.iter().map(|t| (t.term.as_str(), t.confidence)).collect();
        assert_eq!(got, vec![("mage", 0.9), ("arcanist", 0.85)]);
    }

    #[test]
    fn finalize_filters_and_truncates() {
        let terms = finalize_terms(
            vec![term("a1", 0.4), term("b1", 0.7), term("c1", 0.6), term("d1", 0.9)],
            &[],
            &[],
            2,
            0.5,
        );
        let got: Vec<_> = terms.iter().map(|t| t.term.as_str()).collect();
        assert_eq!(got, vec!["d1", "b1"]);
    }

    #[test]
    fn finalize_drops_terms_already_in_query() {
        let terms = finalize_terms(
            vec![term("Fireball", 0.9), term("evocation", 0.6)],
            &["fireball".to_string()],
            &["evocation".to_string()],
            10,
            0.0,
        );
        assert!(terms.is_empty());
    }

    #[test]
    fn render_uses_top_five() {
        let terms: Vec<_> = (0..7).map(|i| term(&format!("t{i}"), 0.9)).collect();
        let rendered = render_expanded_query("q", &terms);
        assert_eq!(rendered, r#"(q) OR ("t0" OR "t1" OR "t2" OR "t3" OR "t4")"#);
        assert_eq!(render_expanded_query("q", &[]), "q");
    }

    #[test]
    fn absent_graph_returns_unexpanded() {
        let expanded = expand_with(None, "what is fireball", ExpansionStrategy::Hybrid, 10, 0.5);
        assert!(expanded.expansion_terms.is_empty());
        assert_eq!(expanded.expanded_query, "what is fireball");
    }
}
