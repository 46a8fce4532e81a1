//! Typed TTRPG entity recognition with fixed regular-expression categories.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use grimoire_core::models::{EntityCategory, TypedEntity};
use regex::Regex;

static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(artificer|barbarian|bard|cleric|druid|fighter|monk|paladin|ranger|rogue|sorcerer|warlock|wizard)s?\b",
    )
    .unwrap()
});

static SPELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(fireball|fire bolt|magic missile|counterspell|shield|cure wounds|healing word|eldritch blast|mage hand|lightning bolt|misty step|detect magic|dispel magic|charm person|hold person|thunderwave|sacred flame|polymorph|identify|guidance|haste|bless|sleep|wish)s?\b",
    )
    .unwrap()
});

static SCHOOL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(abjuration|conjuration|divination|enchantment|evocation|illusion|necromancy|transmutation)\b",
    )
    .unwrap()
});

static MECHANIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(saving throw|ability check|attack roll|armor class|hit point|spell slot|proficiency bonus|short rest|long rest|critical hit|opportunity attack|bonus action|advantage|disadvantage|concentration|cantrip|initiative|spellcasting|reaction|ritual)s?\b",
    )
    .unwrap()
});

static EQUIPMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(longsword|shortsword|greatsword|greataxe|handaxe|dagger|rapier|quarterstaff|longbow|shortbow|crossbow|chain mail|plate armor|leather armor|scale mail|spellbook|component pouch|arcane focus|holy symbol)s?\b",
    )
    .unwrap()
});

static ABILITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(strength|dexterity|constitution|intelligence|wisdom|charisma)\b").unwrap()
});

static CONDITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(blinded|charmed|deafened|frightened|grappled|incapacitated|invisible|paralyzed|petrified|poisoned|prone|restrained|stunned|unconscious|exhaustion)\b",
    )
    .unwrap()
});

fn category_regex(category: EntityCategory) -> &'static Regex {
    match category {
        EntityCategory::Class => &CLASS_RE,
        EntityCategory::Spell => &SPELL_RE,
        EntityCategory::School => &SCHOOL_RE,
        EntityCategory::Mechanic => &MECHANIC_RE,
        EntityCategory::Equipment => &EQUIPMENT_RE,
        EntityCategory::Ability => &ABILITY_RE,
        EntityCategory::Condition => &CONDITION_RE,
    }
}

/// Recognise typed entities in `text`, ordered by position, first occurrence of each text only.
///
/// Entity text is the lowercased singular form (`"Wizards"` → `"wizard"`).
pub fn extract_entities(text: &str) -> Vec<TypedEntity> {
    let mut found = Vec::new();
    for category in EntityCategory::ALL {
        for caps in category_regex(category).captures_iter(text) {
            if let Some(m) = caps.get(1) {
                found.push(TypedEntity {
                    text: m.as_str().to_lowercase(),
                    category,
                    start: m.start(),
                    end: m.end(),
                });
            }
        }
    }
    found.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.category.cmp(&b.category)));
    let mut seen = HashSet::new();
    found.retain(|e| seen.insert(e.text.clone()));
    found
}

/// Number of entity mentions per category (repeats counted).
pub fn category_counts(text: &str) -> BTreeMap<EntityCategory, usize> {
    let mut counts = BTreeMap::new();
    for category in EntityCategory::ALL {
        let n = category_regex(category).find_iter(text).count();
        if n > 0 {
            counts.insert(category, n);
        }
    }
    counts
}

/// Whether `text` mentions `entity` as a whole word (case-insensitive).
pub fn mentions(text_lower: &str, entity_lower: &str) -> bool {
    if entity_lower.is_empty() {
        return false;
    }
    text_lower.match_indices(entity_lower).any(|(idx, _)| {
        let before = text_lower[..idx].chars().next_back();
        let after = text_lower[idx + entity_lower.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
