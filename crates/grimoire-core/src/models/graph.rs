//! Graph snapshot data and query-level graph analysis types.
//!
//! A `GraphSnapshot` is immutable once loaded; the artifact store owns it and
//! hands out shared read-only references.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::expansion::ExpansionStrategy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub node_type: String,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub edge_id: String,
    pub source_id: String,
    pub target_id: String,
    pub edge_type: String,
    pub weight: f64,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// A confidence-scored relationship between two named content elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossReference {
    pub ref_id: String,
    pub source_element: String,
    pub target_element: String,
    pub ref_type: String,
    pub confidence: f64,
    #[serde(default)]
    pub context: String,
}

impl CrossReference {
    /// Whether either endpoint names `entity` (case-insensitive, whole or partial).
    pub fn mentions(&self, entity: &str) -> bool {
        let entity = entity.to_lowercase();
        if entity.is_empty() {
            return false;
        }
        element_matches(&self.source_element, &entity)
            || element_matches(&self.target_element, &entity)
    }

    /// Whether this reference links `a` and `b`, in either direction.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        let a = a.to_lowercase();
        let b = b.to_lowercase();
        (element_matches(&self.source_element, &a) && element_matches(&self.target_element, &b))
            || (element_matches(&self.source_element, &b)
                && element_matches(&self.target_element, &a))
    }
}

fn element_matches(element: &str, entity_lower: &str) -> bool {
    let element = element.to_lowercase();
    element == entity_lower || element.contains(entity_lower) || entity_lower.contains(&element)
}

/// Immutable per-ingestion-job graph snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub job_id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    pub nodes: HashMap<String, GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub cross_references: Vec<CrossReference>,
    /// term → set of aliases. Terms are stored lowercased.
    pub aliases: HashMap<String, BTreeSet<String>>,
}

impl GraphSnapshot {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.cross_references.is_empty() && self.aliases.is_empty()
    }
}

/// Typed entity categories recognised in queries and text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Class,
    Spell,
    School,
    Mechanic,
    Equipment,
    Ability,
    Condition,
}

impl EntityCategory {
    pub const ALL: [EntityCategory; 7] = [
        Self::Class,
        Self::Spell,
        Self::School,
        Self::Mechanic,
        Self::Equipment,
        Self::Ability,
        Self::Condition,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Spell => "spell",
            Self::School => "school",
            Self::Mechanic => "mechanic",
            Self::Equipment => "equipment",
            Self::Ability => "ability",
            Self::Condition => "condition",
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity recognised in a query, with its byte span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedEntity {
    /// Lowercased entity text.
    pub text: String,
    pub category: EntityCategory,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    Comparison,
    Enumeration,
    Procedural,
    Definition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipPattern {
    pub kind: RelationshipKind,
    /// The phrase that triggered the pattern.
    pub trigger: String,
}

/// A cross-reference found between two entities of the same query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityLink {
    pub source: String,
    pub target: String,
    pub ref_type: String,
    pub confidence: f64,
}

/// Graph-aware analysis of a query, carried on the plan for downstream boosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryGraphAnalysis {
    pub entities: Vec<TypedEntity>,
    pub relationships: Vec<RelationshipPattern>,
    pub entity_links: Vec<EntityLink>,
    pub recommended_strategy: ExpansionStrategy,
}

impl QueryGraphAnalysis {
    pub fn entity_texts(&self) -> Vec<String> {
        self.entities.iter().map(|e| e.text.clone()).collect()
    }

    pub fn has_relationship(&self, kind: RelationshipKind) -> bool {
        self.relationships.iter().any(|r| r.kind == kind)
    }

    pub fn distinct_categories(&self) -> usize {
        let cats: BTreeSet<EntityCategory> = self.entities.iter().map(|e| e.category).collect();
        cats.len()
    }
}
