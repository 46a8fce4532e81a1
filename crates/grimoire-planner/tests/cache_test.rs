use chrono::{Duration, Utc};
use grimoire_core::config::ModelRoutingConfig;
use grimoire_core::hashing::query_hash;
use grimoire_core::models::QueryPlan;
use grimoire_core::traits::IPlanCache;
use grimoire_planner::{classify, resolve_policy, route_model, FilePlanCache, InMemoryPlanCache};

// ----- Helpers -----

fn plan(query: &str, age_secs: i64, ttl: u64) -> QueryPlan {
    let classification = classify(query);
    QueryPlan {
        query: query.to_string(),
        query_hash: query_hash(query),
        classification,
        retrieval_strategy: resolve_policy(&classification, &[]),
        model_config: route_model(&classification, &ModelRoutingConfig::default()),
        graph_expansion: None,
        reranking_config: None,
        provenance_config: None,
        eval_config: None,
        created_at: Utc::now() - Duration::seconds(age_secs),
        cache_ttl: ttl,
        hit_count: 3,
    }
}

/// Shared contract checks run against every adapter.
fn exercise(cache: &dyn IPlanCache) {
    let live = plan("what is a wizard", 0, 3_600);
    cache.put(&live).unwrap();
    let fetched = cache.get(&live.query_hash).unwrap().expect("live plan");
    assert_eq!(fetched.query_hash, live.query_hash);
    assert_eq!(fetched.classification, live.classification);
    assert_eq!(fetched.retrieval_strategy, live.retrieval_strategy);
    assert_eq!(fetched.hit_count, 3);

    let stale = plan("what is a sorcerer", 10, 1);
    cache.put(&stale).unwrap();
    assert!(cache.get(&stale.query_hash).unwrap().is_none());

    cache.put(&plan("old one", 10, 1)).unwrap();
    cache.put(&plan("old two", 10, 1)).unwrap();
    assert_eq!(cache.cleanup_expired().unwrap(), 2);

    let stats = cache.stats();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.expired_evictions, 3);

    assert!(cache.remove(&live.query_hash).unwrap());
    cache.put(&plan("a", 0, 60)).unwrap();
    cache.put(&plan("b", 0, 60)).unwrap();
    assert_eq!(cache.clear().unwrap(), 2);
    assert_eq!(cache.stats().entries, 0);
}

// ----- Contract -----

#[test]
fn in_memory_adapter_contract() {
    exercise(&InMemoryPlanCache::new());
}

#[test]
fn file_adapter_contract() {
    let dir = tempfile::tempdir().unwrap();
    exercise(&FilePlanCache::open(dir.path()).unwrap());
}

// ----- File adapter -----

#[test]
fn file_entries_are_named_by_query_hash() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FilePlanCache::open(dir.path()).unwrap();
    let p = plan("fireball", 0, 60);
    cache.put(&p).unwrap();
    let path = dir.path().join(format!("{}.json", query_hash("fireball")));
    assert!(path.is_file());
    // No temp files left behind.
    let leftovers = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
        .count();
    assert_eq!(leftovers, 0);
}

#[test]
fn file_entries_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let p = plan("fireball", 0, 60);
    FilePlanCache::open(dir.path()).unwrap().put(&p).unwrap();
    let reopened = FilePlanCache::open(dir.path()).unwrap();
    assert_eq!(reopened.get(&p.query_hash).unwrap().unwrap(), p);
}

#[test]
fn corrupt_entries_are_deleted_and_counted() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FilePlanCache::open(dir.path()).unwrap();
    let path = dir.path().join("deadbeef.json");
    std::fs::write(&path, "not json").unwrap();

    assert!(cache.get("deadbeef").unwrap().is_none());
    assert!(!path.exists());
    let stats = cache.stats();
    assert_eq!(stats.corrupt_evictions, 1);
    assert_eq!(stats.misses, 1);
}

#[test]
fn cleanup_also_evicts_corrupt_entries() {
    let dir = tempfile::tempdir().unwrap();
    let cache = FilePlanCache::open(dir.path()).unwrap();
    std::fs::write(dir.path().join("broken.json"), "{").unwrap();
    cache.put(&plan("fresh", 0, 60)).unwrap();
    assert_eq!(cache.cleanup_expired().unwrap(), 0);
    assert_eq!(cache.stats().corrupt_evictions, 1);
    assert_eq!(cache.stats().entries, 1);
}
