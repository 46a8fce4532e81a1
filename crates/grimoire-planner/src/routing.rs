//! Model routing for the external generation step.

use grimoire_core::config::ModelRoutingConfig;
use grimoire_core::models::{Classification, Complexity, Domain, Intent, ModelConfig, ModelTier};

/// Temperature ceiling for rules-domain plans.
const RULES_MAX_TEMPERATURE: f64 = 0.3;

/// Pick a model tier, sampling temperature, and token budget for a classification.
pub fn route_model(classification: &Classification, models: &ModelRoutingConfig) -> ModelConfig {
    let is_code = classification.intent == Intent::CodeHelp || classification.domain == Domain::TechCode;
    let (tier, temperature, max_tokens, reasoning) = if is_code {
        (ModelTier::Code, 0.2, 2048, false)
    } else {
        match (classification.intent, classification.complexity) {
            (Intent::MultiHopReasoning, _) | (_, Complexity::High) => (ModelTier::Large, 0.3, 2048, true),
            (Intent::CreativeWrite, _) => (ModelTier::Medium, 0.9, 1536, false),
            (Intent::Summarize, _) => (ModelTier::Medium, 0.3, 1024, false),
            (Intent::FactLookup, Complexity::Low) => (ModelTier::Small, 0.1, 512, false),
            _ => (ModelTier::Medium, 0.4, 1024, false),
        }
    };

    let temperature = if classification.domain == Domain::TtrpgRules {
        f64::min(temperature, RULES_MAX_TEMPERATURE)
    } else {
        temperature
    };

    let model = match tier {
        ModelTier::Small => &models.small,
        ModelTier::Medium => &models.medium,
        ModelTier::Large => &models.large,
        ModelTier::Code => &models.code,
    };

    ModelConfig {
        model: model.clone(),
        tier,
        temperature,
        max_tokens,
        reasoning,
    }
}
