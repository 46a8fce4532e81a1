mod plan_cache;
mod vector_store;

pub use plan_cache::{IPlanCache, PlanCacheStats};
pub use vector_store::{IVectorStore, VectorFilters, VectorHit};
