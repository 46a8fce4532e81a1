//! Domain family: TTRPG entity-category overlap, rules density, and source authority.

use std::sync::LazyLock;

use grimoire_core::authority::source_authority;
use grimoire_core::models::EntityCategory;
use grimoire_core::text::word_count;
use grimoire_graph::entities::category_counts;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{unit, SignalContext};

const CATEGORY_WEIGHT: f64 = 0.4;
const RULES_WEIGHT: f64 = 0.3;
const AUTHORITY_WEIGHT: f64 = 0.3;

/// Rules patterns per 100 words that saturate the density signal.
const RULES_DENSITY_SATURATION: f64 = 5.0;

static RULES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d*d(?:4|6|8|10|12|20|100)\b|\bDC\s*\d+|[+-]\d+\b|\b\d+\s*(?:feet|ft\.?)|\bsaving throws?\b|\b(?:advantage|disadvantage)\b|\bbonus action\b",
    )
    .unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainSignals {
    pub category_overlap: f64,
    pub rules_density: f64,
    pub source_authority: f64,
    pub score: f64,
}

pub fn category_weight(category: EntityCategory) -> f64 {
    match category {
        EntityCategory::Spell | EntityCategory::Mechanic => 1.0,
        EntityCategory::Class | EntityCategory::Condition => 0.9,
        EntityCategory::Ability => 0.8,
        EntityCategory::School | EntityCategory::Equipment => 0.7,
    }
}

pub fn extract(ctx: &SignalContext<'_>, text: &str, source: &str) -> DomainSignals {
    let category_overlap = category_overlap(ctx, text);
    let rules_density = rules_density(text);
    let source_authority = source_authority(source);
    DomainSignals {
        category_overlap,
        rules_density,
        source_authority,
        score: unit(
            CATEGORY_WEIGHT * category_overlap
                + RULES_WEIGHT * rules_density
                + AUTHORITY_WEIGHT * source_authority,
        ),
    }
}

/// Weighted share of the query's entity categories that also appear in the chunk.
fn category_overlap(ctx: &SignalContext<'_>, text: &str) -> f64 {
    let query_categories = category_counts(&ctx.query);
    if query_categories.is_empty() {
        return match ctx.domain {
            Some(domain) if domain.is_ttrpg() => 0.5,
            _ => 0.0,
        };
    }
    let chunk_categories = category_counts(text);
    let total: f64 = query_categories.keys().map(|c| category_weight(*c)).sum();
    let shared: f64 = query_categories
        .keys()
        .filter(|c| chunk_categories.contains_key(*c))
        .map(|c| category_weight(*c))
        .sum();
    unit(shared / total)
}

fn rules_density(text: &str) -> f64 {
    let words = word_count(text);
    if words == 0 {
        return 0.0;
    }
    let hits = RULES_RE.find_iter(text).count() as f64;
    let per_hundred = hits * 100.0 / words as f64;
    (per_hundred / RULES_DENSITY_SATURATION).min(1.0)
}

#[cfg(test)]
mod tests {
    use grimoire_core::models::Domain;

    use super::*;

    #[test]
    fn rules_text_is_dense() {
        let dense = "Each creature makes a DC 15 Dexterity saving throw, taking 8d6 fire damage in a 20-foot radius.";
        let prose = "The archmage lived in a quiet tower by the sea for many years.";
        assert!(rules_density(dense) > 0.9);
        assert_eq!(rules_density(prose), 0.0);
    }

    #[test]
    fn overlap_uses_category_weights() {
        let ctx = SignalContext::new("Can a wizard cast fireball?", None, None, None, 1);
        let partial = category_overlap(&ctx, "Fireball is an evocation spell.");
        assert!((partial - 1.0 / 1.9).abs() < 1e-9);
        assert_eq!(category_overlap(&ctx, "A wizard casts fireball."), 1.0);
    }

    #[test]
    fn query_without_entities_uses_domain_prior() {
        let mut ctx = SignalContext::new("tell me a story", None, None, None, 1);
        assert_eq!(category_overlap(&ctx, "anything"), 0.0);
        ctx.domain = Some(Domain::TtrpgLore);
        assert_eq!(category_overlap(&ctx, "anything"), 0.5);
    }

    #[test]
    fn authority_comes_from_source() {
        let ctx = SignalContext::new("fireball", None, None, None, 1);
        assert_eq!(extract(&ctx, "text", "phb").source_authority, 1.0);
        assert_eq!(extract(&ctx, "text", "homebrew_lore").source_authority, 0.3);
    }
}
