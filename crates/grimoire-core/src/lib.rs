//! # grimoire-core
//!
//! Foundation crate for the grimoire query-orchestration core.
//! Defines all shared types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod authority;
pub mod config;
pub mod constants;
pub mod deadline;
pub mod errors;
pub mod hashing;
pub mod models;
pub mod text;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::GrimoireConfig;
pub use deadline::{CancellationToken, Deadline, DeadlineExceeded};
pub use errors::{GrimoireError, GrimoireResult};
pub use models::{Classification, Complexity, DocChunk, Domain, Intent, QueryPlan};
