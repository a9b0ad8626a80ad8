//! Weighted similarity graph over submission ids.
//!
//! Nodes are submission ids; an undirected edge carries the similarity score
//! between its endpoints. Edges below the configured threshold are dropped at
//! insertion time, so every edge in the graph is a reportable match.
//!
//! Iteration order is insertion order throughout. Cluster enumeration and
//! representative tie-breaks depend on it, so the node list is kept as an
//! ordered vector with a hash side index rather than a bare hash map.

use std::collections::{HashMap, HashSet};

/// Undirected weighted graph gated by a similarity threshold.
#[derive(Debug, Clone)]
pub struct SimilarityGraph {
    threshold: f64,
    /// Node ids in insertion order.
    nodes: Vec<String>,
    /// Adjacency lists in neighbour insertion order. Symmetric by construction.
    adjacency: HashMap<String, Vec<(String, f64)>>,
}

impl SimilarityGraph {
    /// Create an empty graph. Edges with weight below `threshold` are ignored.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            nodes: Vec::new(),
            adjacency: HashMap::new(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Add a node. Idempotent.
    pub fn add_node(&mut self, node: &str) {
        if !self.adjacency.contains_key(node) {
            self.nodes.push(node.to_string());
            self.adjacency.insert(node.to_string(), Vec::new());
        }
    }

    /// Add an undirected edge. A no-op when the weight is below the threshold
    /// or the endpoints coincide (the graph never holds self-loops).
    /// Re-adding an edge overwrites its weight.
    pub fn add_edge(&mut self, a: &str, b: &str, weight: f64) {
        if weight < self.threshold || a == b {
            return;
        }
        self.add_node(a);
        self.add_node(b);
        if let Some(list) = self.adjacency.get_mut(a) {
            set_weight(list, b, weight);
        }
        if let Some(list) = self.adjacency.get_mut(b) {
            set_weight(list, a, weight);
        }
    }

    /// All node ids in insertion order.
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: &str) -> bool {
        self.adjacency.contains_key(node)
    }

    /// Neighbours of a node with their edge weights, in insertion order.
    /// Empty for unknown nodes.
    pub fn neighbors(&self, node: &str) -> &[(String, f64)] {
        self.adjacency.get(node).map_or(&[], Vec::as_slice)
    }

    /// Weight of the edge between two nodes, or 0.0 when absent.
    pub fn edge_weight(&self, a: &str, b: &str) -> f64 {
        self.neighbors(a)
            .iter()
            .find(|(n, _)| n == b)
            .map_or(0.0, |(_, w)| *w)
    }

    /// Remove a node and unlink it from every neighbour.
    pub fn remove_node(&mut self, node: &str) {
        let Some(edges) = self.adjacency.remove(node) else {
            return;
        };
        for (neighbor, _) in edges {
            if let Some(list) = self.adjacency.get_mut(&neighbor) {
                list.retain(|(n, _)| n != node);
            }
        }
        self.nodes.retain(|n| n != node);
    }

    /// Arithmetic mean of a node's edge weights, 0.0 when isolated or unknown.
    pub fn average_similarity(&self, node: &str) -> f64 {
        let edges = self.neighbors(node);
        if edges.is_empty() {
            return 0.0;
        }
        let total: f64 = edges.iter().map(|(_, w)| w).sum();
        total / edges.len() as f64
    }

    /// New graph over the given node set, carrying every edge whose both
    /// endpoints are in the set. Nodes without a qualifying edge are omitted.
    pub fn subgraph(&self, nodes: &[String]) -> Self {
        let keep: HashSet<&str> = nodes.iter().map(String::as_str).collect();
        let mut sub = Self::new(self.threshold);
        for node in nodes {
            for (neighbor, weight) in self.neighbors(node) {
                if keep.contains(neighbor.as_str()) {
                    sub.add_edge(node, neighbor, *weight);
                }
            }
        }
        sub
    }

    /// Dense adjacency matrix in the graph's iteration order.
    pub fn adjacency_matrix(&self) -> (Vec<String>, Vec<Vec<f64>>) {
        let nodes = self.nodes.clone();
        let position: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.as_str(), i))
            .collect();

        let mut matrix = vec![vec![0.0; nodes.len()]; nodes.len()];
        for (i, node) in nodes.iter().enumerate() {
            for (neighbor, weight) in self.neighbors(node) {
                if let Some(&j) = position.get(neighbor.as_str()) {
                    matrix[i][j] = *weight;
                }
            }
        }
        (nodes, matrix)
    }
}

fn set_weight(list: &mut Vec<(String, f64)>, neighbor: &str, weight: f64) {
    if let Some(entry) = list.iter_mut().find(|(n, _)| n == neighbor) {
        entry.1 = weight;
    } else {
        list.push((neighbor.to_string(), weight));
    }
}
