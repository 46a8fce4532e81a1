//! On-disk artifact schemas and the in-memory loaded graph.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use grimoire_core::models::{CrossReference, GraphEdge, GraphNode, GraphSnapshot};
use serde::Deserialize;

use crate::indexed::IndexedGraph;

/// `graph_snapshot.json`. Node ids are the map keys.
#[derive(Debug, Deserialize)]
pub struct SnapshotFile {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub nodes: HashMap<String, NodeRecord>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
    #[serde(default)]
    pub cross_references: Vec<CrossReference>,
}

#[derive(Debug, Deserialize)]
pub struct NodeRecord {
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

/// `alias_map.json`.
#[derive(Debug, Deserialize)]
pub struct AliasMapFile {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub aliases: HashMap<String, Vec<String>>,
}

impl SnapshotFile {
    /// Build the immutable snapshot. `fallback_job_id` is the job directory name.
    pub fn into_snapshot(self, fallback_job_id: &str, aliases: Option<AliasMapFile>) -> GraphSnapshot {
        let nodes = self
            .nodes
            .into_iter()
            .map(|(id, record)| {
                let node = GraphNode {
                    id: id.clone(),
                    node_type: record.node_type,
                    title: record.title,
                    content: record.content,
                    parent_id: record.parent_id,
                    children: record.children,
                    metadata: record.metadata,
                };
                (id, node)
            })
            .collect();
        GraphSnapshot {
            job_id: self.job_id.unwrap_or_else(|| fallback_job_id.to_string()),
            created_at: self.created_at,
            nodes,
            edges: self.edges,
            cross_references: self.cross_references,
            aliases: aliases.map(normalize_aliases).unwrap_or_default(),
        }
    }
}

/// Lowercase and trim terms and aliases, dropping empties and self-aliases.
fn normalize_aliases(file: AliasMapFile) -> HashMap<String, BTreeSet<String>> {
    let mut out: HashMap<String, BTreeSet<String>> = HashMap::new();
    for (term, aliases) in file.aliases {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            continue;
        }
        let entry = out.entry(term.clone()).or_default();
        for alias in aliases {
            let alias = alias.trim().to_lowercase();
            if !alias.is_empty() && alias != term {
                entry.insert(alias);
            }
        }
    }
    out.retain(|_, aliases| !aliases.is_empty());
    out
}

/// A parsed snapshot together with its traversal index.
#[derive(Debug)]
pub struct LoadedGraph {
    pub snapshot: GraphSnapshot,
    pub index: IndexedGraph,
    pub loaded_at: DateTime<Utc>,
}

impl LoadedGraph {
    pub fn new(snapshot: GraphSnapshot) -> Self {
        let index = IndexedGraph::from_snapshot(&snapshot);
        Self {
            snapshot,
            index,
            loaded_at: Utc::now(),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.snapshot.job_id
    }

    /// Ids of nodes whose title or content mentions `entity` (case-insensitive), sorted.
    pub fn nodes_matching(&self, entity: &str) -> Vec<String> {
        let entity = entity.to_lowercase();
        if entity.is_empty() {
            return Vec::new();
        }
        let mut ids: Vec<String> = self
            .snapshot
            .nodes
            .values()
            .filter(|node| {
                node.title.to_lowercase().contains(&entity)
                    || node
                        .content
                        .as_deref()
                        .is_some_and(|c| c.to_lowercase().contains(&entity))
            })
            .map(|node| node.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Ids of nodes whose title mentions `entity`, sorted. Narrower than [`Self::nodes_matching`].
    pub fn nodes_titled(&self, entity: &str) -> Vec<String> {
        let entity = entity.to_lowercase();
        if entity.is_empty() {
            return Vec::new();
        }
        let mut ids: Vec<String> = self
            .snapshot
            .nodes
            .values()
            .filter(|node| node.title.to_lowercase().contains(&entity))
            .map(|node| node.id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn title_of(&self, node_id: &str) -> Option<&str> {
        self.snapshot.nodes.get(node_id).map(|n| n.title.as_str())
    }

    /// Cross-references with either endpoint naming `entity`.
    pub fn cross_refs_mentioning<'a>(
        &'a self,
        entity: &'a str,
    ) -> impl Iterator<Item = &'a CrossReference> + 'a {
        self.snapshot
            .cross_references
            .iter()
            .filter(move |x| x.mentions(entity))
    }

    /// Aliases of `term`, plus terms that list `term` as an alias.
    pub fn aliases_for(&self, term: &str) -> (Vec<String>, Vec<String>) {
        let term = term.to_lowercase();
        let direct: Vec<String> = self
            .snapshot
            .aliases
            .get(&term)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        let mut reverse: Vec<String> = self
            .snapshot
            .aliases
            .iter()
            .filter(|(_, aliases)| aliases.contains(&term))
            .map(|(key, _)| key.clone())
            .collect();
        reverse.sort();
        (direct, reverse)
    }

    pub fn has_alias_entry(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.snapshot.aliases.contains_key(&term)
            || self.snapshot.aliases.values().any(|a| a.contains(&term))
    }
}
