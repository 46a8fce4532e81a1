use std::sync::Arc;

use grimoire_core::config::GrimoireConfig;
use grimoire_core::constants::{MAX_GRAPH_DEPTH, MAX_VECTOR_K};
use grimoire_core::models::{Classification, Complexity, Domain, Intent};
use grimoire_planner::{classify, resolve_policy, InMemoryPlanCache, QueryPlanner};
use proptest::prelude::*;

fn planner() -> QueryPlanner {
    QueryPlanner::new(&GrimoireConfig::default(), Arc::new(InMemoryPlanCache::new()), None)
}

fn classification() -> impl Strategy<Value = Classification> {
    (
        prop::sample::select(Intent::ALL.to_vec()),
        prop::sample::select(Domain::ALL.to_vec()),
        prop::sample::select(vec![Complexity::Low, Complexity::Medium, Complexity::High]),
    )
        .prop_map(|(i, d, c)| Classification::new(i, d, c, false, 0.7))
}

proptest! {
    #[test]
    fn whitespace_never_changes_the_plan_key(q in "[a-z]{1,12}( [a-z]{1,12}){0,6}", pad in "[ \t\n]{0,4}") {
        let planner = planner();
        let a = planner.resolve(&format!("{pad}{q}{pad}")).unwrap();
        let b = planner.resolve(&q).unwrap();
        prop_assert_eq!(&a.plan.query_hash, &b.plan.query_hash);
        prop_assert!(b.cache_hit);
        prop_assert_eq!(b.plan.hit_count, a.plan.hit_count + 1);
    }

    #[test]
    fn hit_count_never_decreases(q in "[a-z]{1,10}( [a-z]{1,10}){0,4}", n in 2usize..6) {
        let planner = planner();
        let mut last = None;
        for _ in 0..n {
            let count = planner.get_plan(&q).unwrap().hit_count;
            if let Some(prev) = last {
                prop_assert!(count > prev);
            }
            last = Some(count);
        }
    }

    #[test]
    fn policy_respects_guardrails(c in classification()) {
        let s = resolve_policy(&c, &[]);
        prop_assert!((1..=MAX_VECTOR_K).contains(&s.vector_top_k));
        prop_assert!(s.graph_depth <= MAX_GRAPH_DEPTH);
        prop_assert!(!s.use_graph || s.graph_depth > 0);
    }

    #[test]
    fn classifier_confidence_in_range(q in ".{0,80}") {
        let c = classify(&q);
        prop_assert!((0.5..=0.95).contains(&c.confidence));
    }
}
