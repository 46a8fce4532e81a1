use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use grimoire_core::config::GraphConfig;
use grimoire_core::models::ExpansionStrategy;
use grimoire_graph::expansion::expand_with;
use grimoire_graph::{GraphArtifactStore, LoadedGraph};
use proptest::prelude::*;
use test_fixtures::{ingest_root, FIXTURE_ENV};

static GRAPH: LazyLock<Arc<LoadedGraph>> = LazyLock::new(|| {
    GraphArtifactStore::new(ingest_root(), FIXTURE_ENV, &GraphConfig::default())
        .load_graph_snapshot(None)
        .unwrap()
});

const WORDS: &[&str] = &[
    "fireball", "wizard", "sorcerer", "counterspell", "shield", "mage", "dexterity",
    "saving", "throw", "what", "is", "the", "compare", "vs", "list", "all", "spells",
    "magic", "missile", "ac", "hp",
];

fn strategy() -> impl Strategy<Value = ExpansionStrategy> {
    prop_oneof![
        Just(ExpansionStrategy::Alias),
        Just(ExpansionStrategy::CrossRef),
        Just(ExpansionStrategy::Graph),
        Just(ExpansionStrategy::Hybrid),
    ]
}

fn query() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS), 1..8).prop_map(|w| w.join(" "))
}

proptest! {
    #[test]
    fn terms_respect_bounds(
        q in query(),
        s in strategy(),
        max in 0usize..15,
        min_conf in 0.0f64..1.0,
    ) {
        let expanded = expand_with(Some(&GRAPH), &q, s, max, min_conf);
        prop_assert!(expanded.expansion_terms.len() <= max);
        for term in &expanded.expansion_terms {
            prop_assert!(term.confidence >= min_conf);
        }
    }

    #[test]
    fn terms_are_unique_case_insensitively(q in query(), s in strategy()) {
        let expanded = expand_with(Some(&GRAPH), &q, s, 50, 0.0);
        let mut seen = HashSet::new();
        for term in &expanded.expansion_terms {
            prop_assert!(seen.insert(term.term.to_lowercase()), "duplicate term {}", term.term);
        }
    }

    #[test]
    fn terms_sorted_by_confidence(q in query(), s in strategy()) {
        let expanded = expand_with(Some(&GRAPH), &q, s, 50, 0.0);
        for pair in expanded.expansion_terms.windows(2) {
            prop_assert!(pair[0].confidence >= pair[1].confidence);
        }
    }

    #[test]
    fn none_strategy_is_identity(q in query()) {
        let expanded = expand_with(Some(&GRAPH), &q, ExpansionStrategy::None, 10, 0.5);
        prop_assert_eq!(expanded.expanded_query, q);
        prop_assert!(expanded.expansion_terms.is_empty());
    }
}
