use std::fmt;

use serde::{Deserialize, Serialize};

/// The six coarse query intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    FactLookup,
    ProceduralHowto,
    MultiHopReasoning,
    CreativeWrite,
    CodeHelp,
    Summarize,
}

impl Intent {
    pub const ALL: [Intent; 6] = [
        Self::FactLookup,
        Self::ProceduralHowto,
        Self::MultiHopReasoning,
        Self::CreativeWrite,
        Self::CodeHelp,
        Self::Summarize,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FactLookup => "fact_lookup",
            Self::ProceduralHowto => "procedural_howto",
            Self::MultiHopReasoning => "multi_hop_reasoning",
            Self::CreativeWrite => "creative_write",
            Self::CodeHelp => "code_help",
            Self::Summarize => "summarize",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content domain a query belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    TtrpgRules,
    TtrpgLore,
    TechCode,
    Admin,
    General,
}

impl Domain {
    pub const ALL: [Domain; 5] = [
        Self::TtrpgRules,
        Self::TtrpgLore,
        Self::TechCode,
        Self::Admin,
        Self::General,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TtrpgRules => "ttrpg_rules",
            Self::TtrpgLore => "ttrpg_lore",
            Self::TechCode => "tech_code",
            Self::Admin => "admin",
            Self::General => "general",
        }
    }

    /// Whether the domain covers tabletop game content.
    pub fn is_ttrpg(self) -> bool {
        matches!(self, Self::TtrpgRules | Self::TtrpgLore)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of a raw query. Produced once per query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    pub domain: Domain,
    pub complexity: Complexity,
    pub needs_tools: bool,
    /// Heuristic confidence in [0.0, 1.0].
    pub confidence: f64,
}

impl Classification {
    /// Build a classification, clamping confidence into [0.0, 1.0].
    pub fn new(
        intent: Intent,
        domain: Domain,
        complexity: Complexity,
        needs_tools: bool,
        confidence: f64,
    ) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            intent,
            domain,
            complexity,
            needs_tools,
            confidence,
        }
    }
}
