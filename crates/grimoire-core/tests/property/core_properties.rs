use chrono::{Duration, Utc};
use grimoire_core::hashing::{content_hash, query_hash};
use grimoire_core::models::*;
use proptest::prelude::*;

fn plan_with(query: &str, ttl: u64) -> QueryPlan {
    QueryPlan {
        query: query.to_string(),
        query_hash: query_hash(query),
        classification: Classification::new(
            Intent::FactLookup,
            Domain::General,
            Complexity::Low,
            false,
            0.6,
        ),
        retrieval_strategy: RetrievalStrategy {
            vector_top_k: 10,
            rerank_mode: RerankMode::Mmr,
            graph_depth: 1,
            use_graph: true,
            lexical_fallback: true,
        },
        model_config: ModelConfig {
            model: "small-instruct".into(),
            tier: ModelTier::Small,
            temperature: 0.3,
            max_tokens: 512,
            reasoning: false,
        },
        graph_expansion: None,
        reranking_config: None,
        provenance_config: None,
        eval_config: None,
        created_at: Utc::now(),
        cache_ttl: ttl,
        hit_count: 0,
    }
}

proptest! {
    #[test]
    fn query_hash_ignores_surrounding_whitespace(
        core in "[a-zA-Z0-9 ?]{1,60}",
        lead in "[ \t\n]{0,4}",
        trail in "[ \t\n]{0,4}",
    ) {
        let padded = format!("{lead}{core}{trail}");
        prop_assert_eq!(query_hash(&padded), query_hash(core.trim()));
    }

    #[test]
    fn content_hash_is_deterministic(s in ".{0,200}") {
        prop_assert_eq!(content_hash(&s), content_hash(&s));
    }

    #[test]
    fn plan_roundtrip_preserves_identity(query in "[a-z ]{1,40}", ttl in 1u64..100_000) {
        let plan = plan_with(&query, ttl);
        let json = serde_json::to_string(&plan).unwrap();
        let back: QueryPlan = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(&back.query_hash, &plan.query_hash);
        prop_assert_eq!(back.classification, plan.classification);
        prop_assert_eq!(&back.retrieval_strategy, &plan.retrieval_strategy);
    }

    #[test]
    fn plan_expiry_is_monotonic(ttl in 1u64..10_000, offset_ms in 0i64..20_000_000) {
        let plan = plan_with("q", ttl);
        let at = plan.created_at + Duration::milliseconds(offset_ms);
        let later = at + Duration::milliseconds(1);
        if plan.is_expired_at(at) {
            prop_assert!(plan.is_expired_at(later));
        }
        prop_assert_eq!(plan.is_expired_at(at), offset_ms > (ttl as i64) * 1000);
    }

    #[test]
    fn classification_confidence_in_unit_range(c in proptest::num::f64::ANY) {
        let cls = Classification::new(Intent::Summarize, Domain::General, Complexity::High, false, c);
        prop_assert!((0.0..=1.0).contains(&cls.confidence));
    }

    #[test]
    fn normalized_scores_stay_in_unit_range(scores in proptest::collection::vec(0.0f64..50.0, 1..20)) {
        let mut chunks: Vec<DocChunk> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| DocChunk::new(format!("c{i}"), "text", "src").with_score(*s))
            .collect();
        normalize_scores(&mut chunks);
        for chunk in &chunks {
            prop_assert!((0.0..=1.0).contains(&chunk.score));
        }
    }
}
