use serde::{Deserialize, Serialize};

use super::defaults;
use crate::models::{Complexity, Domain, Intent, RerankMode};

/// Which `IPlanCache` adapter the engine builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanCacheBackend {
    File,
    Memory,
}

/// Query planner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Base plan TTL in seconds before domain/intent adjustment.
    pub default_ttl_secs: u64,
    /// Multiplier applied to rules-domain plans.
    pub rules_ttl_multiplier: u64,
    /// Divisor applied to creative or high-complexity plans.
    pub volatile_ttl_divisor: u64,
    pub cache_backend: PlanCacheBackend,
    pub models: ModelRoutingConfig,
    /// Per-(domain, intent, complexity) retrieval policy overrides.
    pub policy_overrides: Vec<PolicyOverride>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: defaults::DEFAULT_PLAN_CACHE_TTL_SECS,
            rules_ttl_multiplier: defaults::DEFAULT_RULES_TTL_MULTIPLIER,
            volatile_ttl_divisor: defaults::DEFAULT_VOLATILE_TTL_DIVISOR,
            cache_backend: PlanCacheBackend::File,
            models: ModelRoutingConfig::default(),
            policy_overrides: Vec::new(),
        }
    }
}

/// Model names per routing tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelRoutingConfig {
    pub small: String,
    pub medium: String,
    pub large: String,
    pub code: String,
}

impl Default for ModelRoutingConfig {
    fn default() -> Self {
        Self {
            small: defaults::DEFAULT_SMALL_MODEL.to_string(),
            medium: defaults::DEFAULT_MEDIUM_MODEL.to_string(),
            large: defaults::DEFAULT_LARGE_MODEL.to_string(),
            code: defaults::DEFAULT_CODE_MODEL.to_string(),
        }
    }
}

/// A retrieval policy override. `intent` and `complexity` act as wildcards when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyOverride {
    pub domain: Domain,
    #[serde(default)]
    pub intent: Option<Intent>,
    #[serde(default)]
    pub complexity: Option<Complexity>,
    #[serde(default)]
    pub vector_top_k: Option<usize>,
    #[serde(default)]
    pub rerank_mode: Option<RerankMode>,
    #[serde(default)]
    pub graph_depth: Option<usize>,
}

impl PolicyOverride {
    pub fn matches(&self, domain: Domain, intent: Intent, complexity: Complexity) -> bool {
        self.domain == domain
            && self.intent.map_or(true, |i| i == intent)
            && self.complexity.map_or(true, |c| c == complexity)
    }

    /// More specific overrides win over wildcard ones.
    pub fn specificity(&self) -> u8 {
        u8::from(self.intent.is_some()) + u8::from(self.complexity.is_some())
    }
}
