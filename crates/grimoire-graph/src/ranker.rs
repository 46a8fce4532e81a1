//! Graph-Aware Ranker: query analysis (entities, relationships, cross-reference links),
//! expansion strategy recommendation, and proximity-based candidate rescaling.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use grimoire_core::models::{
    normalize_scores, sort_best_first, Classification, DocChunk, Domain, EntityLink,
    ExpansionStrategy, Intent, QueryGraphAnalysis, RelationshipKind, RelationshipPattern,
};
use regex::Regex;
use tracing::debug;

use crate::entities::{extract_entities, mentions};
use crate::model::LoadedGraph;
use crate::store::GraphArtifactStore;

static COMPARISON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(vs\.?|versus|compared? (?:to|with)|comparison|differences? between|differ|better than|which is better)\b",
    )
    .unwrap()
});

static ENUMERATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(list(?: of)?|all|every|what are the|types of|kinds of)\b").unwrap()
});

static PROCEDURAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(how (?:do|does|to|can)|steps?|process|in order to|when can)\b").unwrap()
});

static DEFINITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(what is|what's|define|definition of|meaning of|explain)\b").unwrap()
});

fn relationship_patterns() -> [(RelationshipKind, &'static Regex); 4] {
    [
        (RelationshipKind::Comparison, &*COMPARISON_RE),
        (RelationshipKind::Enumeration, &*ENUMERATION_RE),
        (RelationshipKind::Procedural, &*PROCEDURAL_RE),
        (RelationshipKind::Definition, &*DEFINITION_RE),
    ]
}

/// Rescale weights for the three proximity components.
const COVERAGE_WEIGHT: f64 = 0.25;
const CO_OCCURRENCE_WEIGHT: f64 = 0.15;
const NEIGHBOR_WEIGHT: f64 = 0.10;

pub struct GraphAwareRanker {
    store: Arc<GraphArtifactStore>,
}

impl GraphAwareRanker {
    pub fn new(store: Arc<GraphArtifactStore>) -> Self {
        Self { store }
    }

    pub fn analyze_query(&self, query: &str, classification: Option<&Classification>) -> QueryGraphAnalysis {
        let graph = self.store.load_graph_snapshot(None);
        analyze_with(graph.as_deref(), query, classification)
    }

    /// Rescale `chunks` in place; returns how many scores changed.
    pub fn rescale(&self, chunks: &mut [DocChunk], analysis: &QueryGraphAnalysis) -> usize {
        let graph = self.store.load_graph_snapshot(None);
        rescale_with(graph.as_deref(), chunks, analysis)
    }
}

/// Relationship patterns present in `query`, one per kind.
pub fn find_relationships(query: &str) -> Vec<RelationshipPattern> {
    relationship_patterns()
        .into_iter()
        .filter_map(|(kind, re)| {
            re.find(query).map(|m| RelationshipPattern {
                kind,
                trigger: m.as_str().to_lowercase(),
            })
        })
        .collect()
}

/// Extract entities and relationships and recommend an expansion strategy.
pub fn analyze_with(
    graph: Option<&LoadedGraph>,
    query: &str,
    classification: Option<&Classification>,
) -> QueryGraphAnalysis {
    let entities = extract_entities(query);
    let relationships = find_relationships(query);

    let mut entity_links = Vec::new();
    if let Some(graph) = graph {
        for (i, a) in entities.iter().enumerate() {
            for b in entities.iter().skip(i + 1) {
                for xref in graph
                    .snapshot
                    .cross_references
                    .iter()
                    .filter(|x| x.connects(&a.text, &b.text))
                {
                    entity_links.push(EntityLink {
                        source: a.text.clone(),
                        target: b.text.clone(),
                        ref_type: xref.ref_type.clone(),
                        confidence: xref.confidence,
                    });
                }
            }
        }
    }

    let mut analysis = QueryGraphAnalysis {
        entities,
        relationships,
        entity_links,
        recommended_strategy: ExpansionStrategy::Hybrid,
    };
    analysis.recommended_strategy = recommend_strategy(&analysis, classification, graph);
    debug!(
        entities = analysis.entities.len(),
        relationships = analysis.relationships.len(),
        links = analysis.entity_links.len(),
        recommended = %analysis.recommended_strategy,
        "query graph analysis"
    );
    analysis
}

/// `none` for admin/code-help, `cross_ref` for multi-entity comparisons, `alias` for a
/// single aliased entity, `graph` for multi-typed or relational queries, else `hybrid`.
pub fn recommend_strategy(
    analysis: &QueryGraphAnalysis,
    classification: Option<&Classification>,
    graph: Option<&LoadedGraph>,
) -> ExpansionStrategy {
    if let Some(c) = classification {
        if c.domain == Domain::Admin || c.intent == Intent::CodeHelp {
            return ExpansionStrategy::None;
        }
    }
    let entity_count = analysis.entities.len();
    if entity_count >= 2 && analysis.has_relationship(RelationshipKind::Comparison) {
        return ExpansionStrategy::CrossRef;
    }
    let relational = entity_count >= 1
        && (analysis.has_relationship(RelationshipKind::Enumeration)
            || analysis.has_relationship(RelationshipKind::Procedural));
    if entity_count == 1 && !relational {
        let aliased = graph.is_some_and(|g| g.has_alias_entry(&analysis.entities[0].text));
        if aliased {
            return ExpansionStrategy::Alias;
        }
    }
    if analysis.distinct_categories() >= 2 || relational {
        return ExpansionStrategy::Graph;
    }
    ExpansionStrategy::Hybrid
}

/// Per-chunk graph proximity in [0, 1]: entity coverage, linked-pair co-occurrence,
/// and mentions of one-hop graph neighbours of the query entities.
pub fn proximity_score(
    graph: Option<&LoadedGraph>,
    text: &str,
    analysis: &QueryGraphAnalysis,
    neighbor_titles: &[String],
) -> f64 {
    if analysis.entities.is_empty() {
        return 0.0;
    }
    let lower = text.to_lowercase();
    let mentioned: HashSet<&str> = analysis
        .entities
        .iter()
        .map(|e| e.text.as_str())
        .filter(|e| mentions(&lower, e))
        .collect();
    let coverage = mentioned.len() as f64 / analysis.entities.len() as f64;

    let co_occurrence = if !analysis.entity_links.is_empty() {
        let hits = analysis
            .entity_links
            .iter()
            .filter(|l| mentioned.contains(l.source.as_str()) && mentioned.contains(l.target.as_str()))
            .count();
        hits as f64 / analysis.entity_links.len() as f64
    } else if let Some(graph) = graph {
        // Cross-references whose other endpoint also shows up in the chunk.
        let hits = mentioned
            .iter()
            .flat_map(|e| graph.cross_refs_mentioning(*e))
            .filter(|x| {
                mentions(&lower, &x.source_element.to_lowercase())
                    && mentions(&lower, &x.target_element.to_lowercase())
            })
            .count();
        (hits as f64 * 0.5).min(1.0)
    } else {
        0.0
    };

    let neighbor_hits = neighbor_titles.iter().filter(|t| mentions(&lower, t)).count();
    let neighbors = (neighbor_hits as f64 * 0.25).min(1.0);

    (COVERAGE_WEIGHT * coverage + CO_OCCURRENCE_WEIGHT * co_occurrence + NEIGHBOR_WEIGHT * neighbors)
        / (COVERAGE_WEIGHT + CO_OCCURRENCE_WEIGHT + NEIGHBOR_WEIGHT)
}

/// Lowercased titles of nodes one hop from any node titled after a query entity.
pub fn neighbor_titles(graph: &LoadedGraph, analysis: &QueryGraphAnalysis) -> Vec<String> {
    let entity_texts: Vec<String> = analysis.entity_texts();
    let seeds: Vec<String> = entity_texts.iter().flat_map(|e| graph.nodes_titled(e)).collect();
    let mut titles: Vec<String> = graph
        .index
        .neighborhood(&seeds, 1, usize::MAX)
        .into_iter()
        .filter_map(|n| graph.title_of(&n.node_id).map(str::to_lowercase))
        .filter(|t| !entity_texts.contains(t))
        .collect();
    titles.sort();
    titles.dedup();
    titles
}

/// Multiply each score by `1 + proximity * 0.5`, renormalise, and re-sort best-first.
pub fn rescale_with(
    graph: Option<&LoadedGraph>,
    chunks: &mut [DocChunk],
    analysis: &QueryGraphAnalysis,
) -> usize {
    if analysis.entities.is_empty() || chunks.is_empty() {
        return 0;
    }
    let neighbors = graph.map(|g| neighbor_titles(g, analysis)).unwrap_or_default();
    let mut changed = 0;
    for chunk in chunks.iter_mut() {
        let proximity = proximity_score(graph, &chunk.text, analysis, &neighbors);
        if proximity > 0.0 {
            chunk.score *= 1.0 + proximity * 0.5;
            changed += 1;
        }
    }
    normalize_scores(chunks);
    sort_best_first(chunks);
    changed
}
