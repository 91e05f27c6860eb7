//! Request ordering graph.
//!
//! Ordering constraints say one request must run before another. This module
//! puts them on a petgraph graph of [`RequestId`]s so cycles can be reported.

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::core::ApichainError;
use crate::grammar::RequestId;

/// Color states for cycle detection using DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Node has not been visited.
    White,
    /// Node is currently being visited (in the DFS stack).
    Gray,
    /// Node has been fully visited.
    Black,
}

/// Directed graph of requests; an edge `a -> b` means `a` runs after `b`.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<RequestId, ()>,
    node_map: HashMap<RequestId, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_node(&mut self, node: RequestId) -> NodeIndex {
        if let Some(&index) = self.node_map.get(&node) {
            index
        } else {
            let index = self.graph.add_node(node.clone());
            self.node_map.insert(node, index);
            index
        }
    }

    /// Record that `from` must run after `to`.
    pub fn add_dependency(&mut self, from: RequestId, to: RequestId) {
        let from_idx = self.ensure_node(from);
        let to_idx = self.ensure_node(to);

        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    /// Detect cycles using DFS with colors.
    ///
    /// Nodes are visited in sorted order so the reported cycle is stable.
    ///
    /// # Errors
    ///
    /// Returns [`ApichainError::CircularDependency`] with the cycle path.
    pub fn detect_cycles(&self) -> Result<(), ApichainError> {
        let mut colors: HashMap<NodeIndex, Color> =
            self.graph.node_indices().map(|n| (n, Color::White)).collect();
        let mut path: Vec<NodeIndex> = Vec::new();

        let mut roots: Vec<NodeIndex> = self.graph.node_indices().collect();
        roots.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));

        for node in roots {
            if matches!(colors.get(&node), Some(Color::White))
                && let Some(cycle) = self.dfs_visit(node, &mut colors, &mut path)
            {
                let chain =
                    cycle.iter().map(|n| self.graph[*n].to_string()).collect::<Vec<_>>().join(" → ");
                return Err(ApichainError::CircularDependency {
                    chain,
                });
            }
        }

        Ok(())
    }

    fn dfs_visit(
        &self,
        node: NodeIndex,
        colors: &mut HashMap<NodeIndex, Color>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Vec<NodeIndex>> {
        colors.insert(node, Color::Gray);
        path.push(node);

        let mut neighbors: Vec<NodeIndex> = self.graph.neighbors(node).collect();
        neighbors.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));

        for neighbor in neighbors {
            match colors.get(&neighbor) {
                Some(Color::Gray) => {
                    let start = path.iter().position(|n| *n == neighbor).unwrap_or(0);
                    let mut cycle = path[start..].to_vec();
                    cycle.push(neighbor);
                    return Some(cycle);
                }
                Some(Color::White) => {
                    if let Some(cycle) = self.dfs_visit(neighbor, colors, path) {
                        return Some(cycle);
                    }
                }
                _ => {}
            }
        }

        path.pop();
        colors.insert(node, Color::Black);
        None
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}
