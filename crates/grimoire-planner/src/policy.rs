//! Retrieval policy: per-domain base settings, complexity scaling, configured overrides,
//! intent heuristics, and guardrail clamping.

use grimoire_core::config::PolicyOverride;
use grimoire_core::constants::{MAX_GRAPH_DEPTH, MAX_VECTOR_K};
use grimoire_core::models::{Classification, Complexity, Domain, Intent, RerankMode, RetrievalStrategy};

/// Base policy for a domain before complexity and intent adjustments.
fn base_policy(domain: Domain) -> RetrievalStrategy {
    let (vector_top_k, graph_depth, rerank_mode) = match domain {
        Domain::TtrpgRules => (10, 1, RerankMode::Semantic),
        Domain::TtrpgLore => (12, 2, RerankMode::Mmr),
        Domain::TechCode => (8, 0, RerankMode::None),
        Domain::Admin => (5, 0, RerankMode::None),
        Domain::General => (10, 1, RerankMode::Mmr),
    };
    RetrievalStrategy {
        vector_top_k,
        rerank_mode,
        graph_depth,
        use_graph: graph_depth > 0,
        lexical_fallback: true,
    }
}

/// Resolve the retrieval strategy for a classification.
///
/// Order: domain base, complexity scaling, the most specific matching override,
/// intent heuristics, then clamping to `[1, MAX_VECTOR_K]` and `[0, MAX_GRAPH_DEPTH]`.
pub fn resolve_policy(classification: &Classification, overrides: &[PolicyOverride]) -> RetrievalStrategy {
    let mut strategy = base_policy(classification.domain);

    match classification.complexity {
        Complexity::Low => {}
        Complexity::Medium => strategy.vector_top_k = scale(strategy.vector_top_k, 3, 2),
        Complexity::High => {
            strategy.vector_top_k = strategy.vector_top_k.saturating_mul(2);
            strategy.graph_depth = strategy.graph_depth.saturating_add(1);
        }
    }

    if let Some(rule) = most_specific_override(classification, overrides) {
        if let Some(k) = rule.vector_top_k {
            strategy.vector_top_k = k;
        }
        if let Some(mode) = rule.rerank_mode {
            strategy.rerank_mode = mode;
        }
        if let Some(depth) = rule.graph_depth {
            strategy.graph_depth = depth;
            strategy.use_graph = depth > 0;
        }
    }

    apply_heuristics(&mut strategy, classification);
    clamp(&mut strategy);
    strategy
}

fn most_specific_override<'a>(
    classification: &Classification,
    overrides: &'a [PolicyOverride],
) -> Option<&'a PolicyOverride> {
    overrides
        .iter()
        .filter(|o| o.matches(classification.domain, classification.intent, classification.complexity))
        // Later entries win ties so TOML files can refine earlier rules.
        .max_by_key(|o| o.specificity())
}

/// Intent/complexity adjustments layered over the resolved base.
pub fn apply_heuristics(strategy: &mut RetrievalStrategy, classification: &Classification) {
    match classification.intent {
        Intent::FactLookup if classification.complexity == Complexity::Low => {
            strategy.graph_depth = 0;
            strategy.use_graph = false;
        }
        Intent::MultiHopReasoning => {
            strategy.graph_depth = strategy.graph_depth.saturating_add(1).max(2);
            strategy.use_graph = true;
            strategy.rerank_mode = RerankMode::Semantic;
        }
        Intent::CreativeWrite => {
            strategy.vector_top_k = strategy.vector_top_k.saturating_mul(2);
            strategy.rerank_mode = RerankMode::Mmr;
        }
        Intent::Summarize => strategy.vector_top_k = scale(strategy.vector_top_k, 3, 2),
        Intent::CodeHelp => {
            strategy.graph_depth = 0;
            strategy.use_graph = false;
        }
        _ => {}
    }
}

fn clamp(strategy: &mut RetrievalStrategy) {
    strategy.vector_top_k = strategy.vector_top_k.clamp(1, MAX_VECTOR_K);
    strategy.graph_depth = strategy.graph_depth.min(MAX_GRAPH_DEPTH);
    if strategy.graph_depth == 0 {
        strategy.use_graph = false;
    }
}

/// `value * num / den`, rounded up.
fn scale(value: usize, num: usize, den: usize) -> usize {
    value.saturating_mul(num).div_ceil(den)
}
