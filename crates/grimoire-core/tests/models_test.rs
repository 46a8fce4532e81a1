use chrono::{Duration, Utc};
use grimoire_core::hashing::query_hash;
use grimoire_core::models::*;

// ----- Helpers -----

fn sample_plan(ttl: u64) -> QueryPlan {
    let query = "How does counterspell interact with fireball?";
    QueryPlan {
        query: query.to_string(),
        query_hash: query_hash(query),
        classification: Classification::new(
            Intent::MultiHopReasoning,
            Domain::TtrpgRules,
            Complexity::Medium,
            false,
            0.8,
        ),
        retrieval_strategy: RetrievalStrategy {
            vector_top_k: 15,
            rerank_mode: RerankMode::Semantic,
            graph_depth: 2,
            use_graph: true,
            lexical_fallback: true,
        },
        model_config: ModelConfig {
            model: "large-reasoning".into(),
            tier: ModelTier::Large,
            temperature: 0.2,
            max_tokens: 2048,
            reasoning: true,
        },
        graph_expansion: None,
        reranking_config: Some(RerankingConfig::for_strategy(RerankingStrategy::GraphEnhanced)),
        provenance_config: Some(ProvenanceSettings::default()),
        eval_config: Some(EvalSettings::default()),
        created_at: Utc::now(),
        cache_ttl: ttl,
        hit_count: 0,
    }
}

// ----- Classification -----

#[test]
fn classification_clamps_confidence() {
    let c = Classification::new(Intent::FactLookup, Domain::General, Complexity::Low, false, 1.7);
    assert_eq!(c.confidence, 1.0);
    let c = Classification::new(Intent::FactLookup, Domain::General, Complexity::Low, false, -2.0);
    assert_eq!(c.confidence, 0.0);
    let c = Classification::new(Intent::FactLookup, Domain::General, Complexity::Low, false, f64::NAN);
    assert_eq!(c.confidence, 0.0);
}

#[test]
fn enums_serialize_snake_case() {
    assert_eq!(serde_json::to_string(&Intent::MultiHopReasoning).unwrap(), "\"multi_hop_reasoning\"");
    assert_eq!(serde_json::to_string(&Domain::TtrpgRules).unwrap(), "\"ttrpg_rules\"");
    assert_eq!(serde_json::to_string(&GateDecision::Review).unwrap(), "\"REVIEW\"");
    assert_eq!(serde_json::to_string(&RerankingStrategy::HybridFull).unwrap(), "\"hybrid_full\"");
}

// ----- QueryPlan -----

#[test]
fn plan_ttl_boundary() {
    let plan = sample_plan(1);
    let t0 = plan.created_at;
    assert!(!plan.is_expired_at(t0 + Duration::milliseconds(500)));
    assert!(plan.is_expired_at(t0 + Duration::seconds(2)));
}

#[test]
fn plan_at_exact_ttl_is_still_live() {
    let plan = sample_plan(10);
    assert!(!plan.is_expired_at(plan.created_at + Duration::seconds(10)));
}

#[test]
fn hit_count_only_increases() {
    let mut plan = sample_plan(60);
    plan.increment_hit_count();
    plan.increment_hit_count();
    assert_eq!(plan.hit_count, 2);
    plan.hit_count = u64::MAX;
    plan.increment_hit_count();
    assert_eq!(plan.hit_count, u64::MAX);
}

#[test]
fn plan_roundtrips_through_json() {
    let plan = sample_plan(3600);
    let json = serde_json::to_string(&plan).unwrap();
    let back: QueryPlan = serde_json::from_str(&json).unwrap();
    assert_eq!(back.query_hash, plan.query_hash);
    assert_eq!(back.classification, plan.classification);
    assert_eq!(back.retrieval_strategy, plan.retrieval_strategy);
    assert_eq!(back, plan);
}

#[test]
fn search_query_prefers_expansion_when_present() {
    let mut plan = sample_plan(60);
    assert_eq!(plan.search_query(), plan.query);
    plan.graph_expansion = Some(GraphExpansion {
        strategy: ExpansionStrategy::Alias,
        expanded_query: "(fireball) OR (\"fire ball\")".into(),
        terms: vec![ExpansionTerm {
            term: "fire ball".into(),
            source: ExpansionSource::Alias,
            confidence: 0.9,
            original_term: "fireball".into(),
        }],
        entities: vec!["fireball".into()],
        analysis: None,
    });
    assert_eq!(plan.search_query(), "(fireball) OR (\"fire ball\")");
}

// ----- Weights -----

#[test]
fn strategy_default_weights_sum_to_one() {
    for strategy in [
        RerankingStrategy::VectorOnly,
        RerankingStrategy::GraphEnhanced,
        RerankingStrategy::DomainAware,
        RerankingStrategy::HybridFull,
    ] {
        let w = strategy.default_weights();
        assert!(w.is_valid());
        assert!((w.sum() - 1.0).abs() < 1e-9, "{strategy:?} sums to {}", w.sum());
    }
}

#[test]
fn vector_only_ignores_graph() {
    assert_eq!(RerankingStrategy::VectorOnly.default_weights().graph, 0.0);
}

// ----- Chunks -----

#[test]
fn normalize_scores_rescales_by_max() {
    let mut chunks = vec![
        DocChunk::new("a", "x", "phb").with_score(2.0),
        DocChunk::new("b", "y", "phb").with_score(1.0),
    ];
    normalize_scores(&mut chunks);
    assert_eq!(chunks[0].score, 1.0);
    assert_eq!(chunks[1].score, 0.5);
}

#[test]
fn normalize_scores_zeroes_non_finite_scores() {
    let mut chunks = vec![
        DocChunk::new("nan", "x", "phb").with_score(f64::NAN),
        DocChunk::new("inf", "y", "phb").with_score(f64::INFINITY),
        DocChunk::new("ok", "z", "phb").with_score(0.4),
    ];
    normalize_scores(&mut chunks);
    sort_best_first(&mut chunks);
    assert_eq!(chunks[0].id, "ok");
    assert_eq!(chunks[0].score, 0.4);
    assert_eq!(chunks[1].score, 0.0);
    assert_eq!(chunks[2].score, 0.0);
    assert_eq!(sanitize_score(f64::NAN), 0.0);
    assert_eq!(sanitize_score(1.7), 1.0);
}

#[test]
fn sort_best_first_breaks_ties_by_id() {
    let mut chunks = vec![
        DocChunk::new("b", "x", "").with_score(0.5),
        DocChunk::new("a", "y", "").with_score(0.5),
        DocChunk::new("c", "z", "").with_score(0.9),
    ];
    sort_best_first(&mut chunks);
    let ids: Vec<_> = chunks.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
}

// ----- Graph -----

#[test]
fn cross_reference_matching_is_case_insensitive() {
    let xref = CrossReference {
        ref_id: "x1".into(),
        source_element: "Wizard".into(),
        target_element: "Fireball".into(),
        ref_type: "can_cast".into(),
        confidence: 0.85,
        context: String::new(),
    };
    assert!(xref.mentions("wizard"));
    assert!(xref.mentions("FIREBALL"));
    assert!(!xref.mentions("rogue"));
    assert!(!xref.mentions(""));
    assert!(xref.connects("fireball", "wizard"));
    assert!(!xref.connects("fireball", "rogue"));
}
