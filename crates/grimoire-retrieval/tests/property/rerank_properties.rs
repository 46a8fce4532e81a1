use grimoire_core::config::RerankerConfig;
use grimoire_core::deadline::Deadline;
use grimoire_core::models::{DocChunk, RerankingConfig, RerankingStrategy};
use grimoire_retrieval::HybridReranker;
use proptest::prelude::*;

const WORDS: &[&str] = &[
    "fireball", "wizard", "sorcerer", "damage", "8d6", "saving", "throw", "dexterity", "DC", "15",
    "feet", "spell", "the", "tavern", "ale", "page", "241", "level", "slots", "shield",
];
const SOURCES: &[&str] = &["phb", "srd", "homebrew", "xge", ""];

fn text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS), 0..40).prop_map(|w| w.join(" "))
}

fn chunks() -> impl Strategy<Value = Vec<DocChunk>> {
    prop::collection::vec((text(), prop::sample::select(SOURCES), 0.0f64..1.0), 0..30).prop_map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(i, (text, source, score))| DocChunk::new(format!("c{i}"), text, source).with_score(score))
            .collect()
    })
}

fn strategy() -> impl Strategy<Value = RerankingStrategy> {
    prop::sample::select(vec![
        RerankingStrategy::VectorOnly,
        RerankingStrategy::GraphEnhanced,
        RerankingStrategy::DomainAware,
        RerankingStrategy::HybridFull,
    ])
}

fn uncached() -> HybridReranker {
    let mut config = RerankerConfig::default();
    config.enable_caching = false;
    HybridReranker::new(&config, None)
}

proptest! {
    #[test]
    fn output_is_bounded_and_sorted(
        query in text(),
        input in chunks(),
        strategy in strategy(),
        cap in 1usize..25,
    ) {
        let mut config = RerankingConfig::for_strategy(strategy);
        config.max_results_to_rerank = cap;
        let out = uncached().rerank(&query, &input, &config, None, None, &Deadline::none()).unwrap();
        prop_assert!(out.results.len() <= cap);
        prop_assert_eq!(out.results.len(), input.len().min(cap));
        for r in &out.results {
            prop_assert!((0.0..=1.0).contains(&r.final_score));
        }
        for w in out.results.windows(2) {
            prop_assert!(w[0].final_score >= w[1].final_score);
        }
    }

    #[test]
    fn parallel_matches_sequential(
        query in text(),
        input in chunks(),
        strategy in strategy(),
    ) {
        let mut config = RerankingConfig::for_strategy(strategy);
        config.parallel = true;
        let parallel = uncached().rerank(&query, &input, &config, None, None, &Deadline::none()).unwrap();
        config.parallel = false;
        let sequential = uncached().rerank(&query, &input, &config, None, None, &Deadline::none()).unwrap();
        let p: Vec<_> = parallel.results.iter().map(|r| (r.chunk.id.clone(), r.final_score)).collect();
        let s: Vec<_> = sequential.results.iter().map(|r| (r.chunk.id.clone(), r.final_score)).collect();
        prop_assert_eq!(p, s);
    }
}
