//! Graph family: proximity to query entities, relationship-shape fit, and
//! cross-reference coverage. All zero without a loaded snapshot.

use std::sync::LazyLock;

use grimoire_core::models::{ExpansionSource, QueryGraphAnalysis, RelationshipKind};
use grimoire_graph::entities::mentions;
use grimoire_graph::ranker::proximity_score;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{unit, SignalContext};

const PROXIMITY_WEIGHT: f64 = 0.4;
const RELATIONSHIP_WEIGHT: f64 = 0.35;
const CROSS_REF_WEIGHT: f64 = 0.25;

/// Cross-reference hits that saturate the sub-signal.
const CROSS_REF_SATURATION: f64 = 3.0;

static LIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:[-*•]|\d+[.)])\s+\S").unwrap());

static STEP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(first|then|next|finally|step|must|before|after)\b").unwrap());

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSignals {
    pub proximity: f64,
    pub relationship: f64,
    pub cross_ref: f64,
    pub score: f64,
}

pub fn extract(ctx: &SignalContext<'_>, text: &str) -> GraphSignals {
    let (Some(graph), Some(analysis)) = (ctx.graph, ctx.analysis.as_ref()) else {
        return GraphSignals::default();
    };
    let lower = text.to_lowercase();

    let proximity = unit(proximity_score(Some(graph), text, analysis, &ctx.neighbor_titles));
    let relationship = relationship_score(analysis, &lower);

    let term_hits = ctx
        .expansion_terms
        .iter()
        .filter(|t| t.source == ExpansionSource::CrossRef)
        .filter(|t| mentions(&lower, &t.term.to_lowercase()))
        .count();
    let pair_hits = analysis
        .entities
        .iter()
        .filter(|e| mentions(&lower, &e.text))
        .flat_map(|e| graph.cross_refs_mentioning(&e.text))
        .filter(|x| {
            mentions(&lower, &x.source_element.to_lowercase())
                && mentions(&lower, &x.target_element.to_lowercase())
        })
        .count();
    let cross_ref = ((term_hits + pair_hits) as f64 / CROSS_REF_SATURATION).min(1.0);

    GraphSignals {
        proximity,
        relationship,
        cross_ref,
        score: unit(
            PROXIMITY_WEIGHT * proximity
                + RELATIONSHIP_WEIGHT * relationship
                + CROSS_REF_WEIGHT * cross_ref,
        ),
    }
}

/// Best fit between the query's relationship patterns and the chunk's shape.
fn relationship_score(analysis: &QueryGraphAnalysis, lower: &str) -> f64 {
    let mentioned = analysis
        .entities
        .iter()
        .filter(|e| mentions(lower, &e.text))
        .count();
    analysis
        .relationships
        .iter()
        .map(|r| match r.kind {
            RelationshipKind::Comparison if mentioned >= 2 => 1.0,
            RelationshipKind::Enumeration if LIST_RE.is_match(lower) => 0.8,
            RelationshipKind::Procedural if STEP_RE.is_match(lower) => 0.8,
            RelationshipKind::Definition
                if mentioned >= 1 && (lower.contains(" is ") || lower.contains(" are ")) =>
            {
                0.7
            }
            _ => 0.0,
        })
        .fold(0.0, f64::max)
}
