//! petgraph::StableGraph index over a snapshot for bounded traversal.

use std::collections::{HashMap, HashSet, VecDeque};

use grimoire_core::models::GraphSnapshot;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::{Directed, Direction};

/// Weight on a graph edge.
#[derive(Debug, Clone)]
pub struct EdgeWeight {
    pub edge_type: String,
    pub weight: f64,
}

/// Edge type used for parent/child links not already present as edges.
pub const HIERARCHY_EDGE: &str = "contains";

pub type SnapshotGraph = StableGraph<String, EdgeWeight, Directed>;

/// A node reached by traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachedNode {
    pub node_id: String,
    pub depth: usize,
}

/// Indexed access to the snapshot graph. Node weights are node ids.
#[derive(Debug, Default)]
pub struct IndexedGraph {
    pub graph: SnapshotGraph,
    pub node_index: HashMap<String, NodeIndex>,
}

impl IndexedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every node; edges (and parent/child links) whose endpoints are unknown are skipped.
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Self {
        let mut indexed = Self::new();
        let mut ids: Vec<&String> = snapshot.nodes.keys().collect();
        ids.sort();
        for id in ids {
            indexed.ensure_node(id);
        }

        for edge in &snapshot.edges {
            if let (Some(a), Some(b)) = (
                indexed.get_node(&edge.source_id),
                indexed.get_node(&edge.target_id),
            ) {
                indexed.graph.add_edge(
                    a,
                    b,
                    EdgeWeight {
                        edge_type: edge.edge_type.clone(),
                        weight: edge.weight,
                    },
                );
            }
        }

        let mut parents: Vec<_> = snapshot.nodes.values().collect();
        parents.sort_by(|a, b| a.id.cmp(&b.id));
        for node in parents {
            let links = node
                .children
                .iter()
                .map(|child| (node.id.as_str(), child.as_str()))
                .chain(node.parent_id.iter().map(|p| (p.as_str(), node.id.as_str())));
            for (parent, child) in links {
                if let (Some(a), Some(b)) = (indexed.get_node(parent), indexed.get_node(child)) {
                    if indexed.graph.find_edge(a, b).is_none() {
                        indexed.graph.add_edge(
                            a,
                            b,
                            EdgeWeight {
                                edge_type: HIERARCHY_EDGE.to_string(),
                                weight: 1.0,
                            },
                        );
                    }
                }
            }
        }
        indexed
    }

    pub fn ensure_node(&mut self, node_id: &str) -> NodeIndex {
        if let Some(&idx) = self.node_index.get(node_id) {
            return idx;
        }
        let idx = self.graph.add_node(node_id.to_string());
        self.node_index.insert(node_id.to_string(), idx);
        idx
    }

    pub fn get_node(&self, node_id: &str) -> Option<NodeIndex> {
        self.node_index.get(node_id).copied()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn undirected_neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .neighbors_directed(idx, Direction::Outgoing)
            .chain(self.graph.neighbors_directed(idx, Direction::Incoming))
    }

    /// Breadth-first neighbourhood of `start_ids`, ignoring edge direction.
    ///
    /// At most `max_nodes` nodes are visited (seeds included) and nothing deeper
    /// than `max_depth` is reached. Seeds are not returned.
    pub fn neighborhood(
        &self,
        start_ids: &[String],
        max_depth: usize,
        max_nodes: usize,
    ) -> Vec<ReachedNode> {
        let mut reached = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();

        for id in start_ids {
            if visited.len() >= max_nodes {
                break;
            }
            if let Some(idx) = self.get_node(id) {
                if visited.insert(idx) {
                    queue.push_back((idx, 0usize));
                }
            }
        }

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            let mut neighbors: Vec<NodeIndex> = self.undirected_neighbors(current).collect();
            neighbors.sort_by_key(|n| self.graph[*n].clone());
            for neighbor in neighbors {
                if visited.len() >= max_nodes {
                    return reached;
                }
                if !visited.insert(neighbor) {
                    continue;
                }
                reached.push(ReachedNode {
                    node_id: self.graph[neighbor].clone(),
                    depth: depth + 1,
                });
                queue.push_back((neighbor, depth + 1));
            }
        }
        reached
    }

    /// Undirected hop distance between two nodes, if within `max_depth`.
    pub fn hop_distance(&self, from: &str, to: &str, max_depth: usize) -> Option<usize> {
        let start = self.get_node(from)?;
        let goal = self.get_node(to)?;
        if start == goal {
            return Some(0);
        }
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([(start, 0usize)]);
        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for neighbor in self.undirected_neighbors(current) {
                if neighbor == goal {
                    return Some(depth + 1);
                }
                if visited.insert(neighbor) {
                    queue.push_back((neighbor, depth + 1));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grimoire_core::models::{GraphEdge, GraphNode};

    fn node(id: &str) -> GraphNode {
        GraphNode {
            id: id.into(),
            node_type: "test".into(),
            title: id.to_uppercase(),
            content: None,
            parent_id: None,
            children: Vec::new(),
            metadata: serde_json::Value::Null,
        }
    }

    fn edge(a: &str, b: &str) -> GraphEdge {
        GraphEdge {
            edge_id: format!("{a}-{b}"),
            source_id: a.into(),
            target_id: b.into(),
            edge_type: "rel".into(),
            weight: 1.0,
            metadata: serde_json::Value::Null,
        }
    }

    /// a - b - c - d, plus e hanging off a.
    fn chain() -> IndexedGraph {
        let mut snapshot = GraphSnapshot::default();
        for id in ["a", "b", "c", "d", "e"] {
            snapshot.nodes.insert(id.into(), node(id));
        }
        snapshot.edges = vec![edge("a", "b"), edge("b", "c"), edge("c", "d"), edge("e", "a")];
        IndexedGraph::from_snapshot(&snapshot)
    }

    #[test]
    fn neighborhood_respects_depth() {
        let g = chain();
        let reached = g.neighborhood(&["a".into()], 2, 50);
        let ids: Vec<_> = reached.iter().map(|r| (r.node_id.as_str(), r.depth)).collect();
        assert_eq!(ids, vec![("b", 1), ("e", 1), ("c", 2)]);
    }

    #[test]
    fn neighborhood_respects_node_budget() {
        let g = chain();
        // Seed counts toward the budget.
        let reached = g.neighborhood(&["a".into()], 3, 2);
        assert_eq!(reached.len(), 1);
    }

    #[test]
    fn unknown_seed_reaches_nothing() {
        let g = chain();
        assert!(g.neighborhood(&["zzz".into()], 2, 50).is_empty());
    }

    #[test]
    fn hop_distance_is_undirected() {
        let g = chain();
        assert_eq!(g.hop_distance("d", "a", 3), Some(3));
        assert_eq!(g.hop_distance("d", "a", 2), None);
        assert_eq!(g.hop_distance("b", "b", 0), Some(0));
    }

    #[test]
    fn hierarchy_links_become_edges() {
        let mut snapshot = GraphSnapshot::default();
        let mut parent = node("p");
        parent.children = vec!["c".into()];
        snapshot.nodes.insert("p".into(), parent);
        snapshot.nodes.insert("c".into(), node("c"));
        let g = IndexedGraph::from_snapshot(&snapshot);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.hop_distance("c", "p", 1), Some(1));
    }
}
