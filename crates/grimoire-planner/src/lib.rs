//! # grimoire-planner
//!
//! Turns a raw query into a cached `QueryPlan`: heuristic classification,
//! retrieval policy resolution, model routing, optional graph expansion,
//! and persistence through an `IPlanCache` adapter.

pub mod cache;
pub mod classifier;
pub mod planner;
pub mod policy;
pub mod routing;

pub use cache::{FilePlanCache, InMemoryPlanCache};
pub use classifier::classify;
pub use planner::{PlanLookup, QueryPlanner};
pub use policy::resolve_policy;
pub use routing::route_model;
