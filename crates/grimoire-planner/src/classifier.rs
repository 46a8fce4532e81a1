//! Heuristic query classification: keyword tables, length rules, and a dice-notation check.

use std::collections::HashSet;
use std::sync::LazyLock;

use grimoire_core::models::{Classification, Complexity, Domain, Intent};
use grimoire_core::text::tokenize;
use regex::Regex;

/// Domain keywords in priority order. Ties go to the earlier entry.
const DOMAIN_KEYWORDS: &[(Domain, &[&str])] = &[
    (
        Domain::Admin,
        &[
            "admin", "reindex", "re-index", "restart", "purge", "ingest", "ingestion", "cache",
            "health", "status", "deploy", "config", "configuration", "logs",
        ],
    ),
    (
        Domain::TechCode,
        &[
            "code", "function", "compile", "compiler", "rust", "python", "javascript", "api",
            "script", "regex", "stack trace", "traceback", "exception", "bug", "json", "sql",
        ],
    ),
    (
        Domain::TtrpgRules,
        &[
            "rule", "rules", "spell", "spells", "cast", "casting", "saving throw", "attack roll",
            "ability check", "armor class", "hit points", "damage", "action", "bonus action",
            "reaction", "advantage", "disadvantage", "concentration", "spell slot", "level",
            "proficiency", "initiative", "condition", "cantrip", "ritual", "dc",
        ],
    ),
    (
        Domain::TtrpgLore,
        &[
            "lore", "history", "deity", "god", "gods", "pantheon", "kingdom", "city", "realm",
            "plane", "legend", "faction", "forgotten realms", "waterdeep", "dragon", "dragons",
            "npc", "campaign", "setting", "story",
        ],
    ),
];

/// Intent keywords in priority order; `FactLookup` is the fallback.
const INTENT_KEYWORDS: &[(Intent, &[&str])] = &[
    (
        Intent::Summarize,
        &["summarize", "summarise", "summary", "overview", "tldr", "recap", "in brief"],
    ),
    (
        Intent::CodeHelp,
        &[
            "code", "function", "compile", "debug", "implement", "script", "regex", "stack trace",
            "refactor", "error message",
        ],
    ),
    (
        Intent::CreativeWrite,
        &[
            "write", "create", "generate", "invent", "describe a", "story", "poem", "backstory",
            "come up with", "brainstorm", "homebrew",
        ],
    ),
    (
        Intent::MultiHopReasoning,
        &[
            "compare", "versus", "vs", "difference", "differences", "why", "interact",
            "interaction", "combine", "combo", "stack", "both", "better", "relationship",
        ],
    ),
    (
        Intent::ProceduralHowto,
        &["how do", "how to", "how does", "how can", "steps", "step by step", "process", "guide"],
    ),
];

static DICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b\d*d(4|6|8|10|12|20|100)\b").unwrap());

static TOOL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(calculate|compute|roll|average damage|probability|odds)\b").unwrap()
});

const LOW_COMPLEXITY_MAX_WORDS: usize = 6;
const MEDIUM_COMPLEXITY_MAX_WORDS: usize = 15;

/// Classify a raw query. Pure and infallible; an empty query classifies as a low-confidence fact lookup.
pub fn classify(query: &str) -> Classification {
    let lower = query.to_lowercase();
    let tokens: Vec<String> = tokenize(&lower);
    let token_set: HashSet<&str> = tokens.iter().map(String::as_str).collect();

    let (domain, domain_hits) = best_match(DOMAIN_KEYWORDS, &lower, &token_set, Domain::General);
    let (intent, intent_hits) =
        best_match(INTENT_KEYWORDS, &lower, &token_set, Intent::FactLookup);

    let mut complexity = match tokens.len() {
        n if n <= LOW_COMPLEXITY_MAX_WORDS => Complexity::Low,
        n if n <= MEDIUM_COMPLEXITY_MAX_WORDS => Complexity::Medium,
        _ => Complexity::High,
    };
    if intent == Intent::MultiHopReasoning && complexity == Complexity::Low {
        complexity = Complexity::Medium;
    }

    let needs_tools = domain == Domain::Admin || DICE_RE.is_match(query) || TOOL_RE.is_match(query);
    let confidence = (0.5 + 0.1 * (domain_hits + intent_hits) as f64).min(0.95);

    Classification::new(intent, domain, complexity, needs_tools, confidence)
}

/// Highest keyword hit count wins; earlier entries win ties. Returns the fallback with zero hits.
fn best_match<T: Copy>(
    table: &[(T, &[&str])],
    lower: &str,
    tokens: &HashSet<&str>,
    fallback: T,
) -> (T, usize) {
    let mut best = (fallback, 0usize);
    for &(label, keywords) in table {
        let hits = keywords.iter().filter(|kw| keyword_present(kw, lower, tokens)).count();
        if hits > best.1 {
            best = (label, hits);
        }
    }
    best
}

/// Single words match whole tokens; phrases match as substrings.
fn keyword_present(keyword: &str, lower: &str, tokens: &HashSet<&str>) -> bool {
    if keyword.contains(' ') {
        lower.contains(keyword)
    } else {
        tokens.contains(keyword)
    }
}
