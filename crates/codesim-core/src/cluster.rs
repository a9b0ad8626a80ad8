//! Connected-component clustering over the similarity graph.

use crate::graph::SimilarityGraph;
use std::collections::{HashSet, VecDeque};

/// Groups mutually reachable submissions into clusters.
#[derive(Debug, Clone)]
pub struct Clustering {
    min_cluster_size: usize,
}

impl Default for Clustering {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Clustering {
    pub fn new(min_cluster_size: usize) -> Self {
        Self { min_cluster_size }
    }

    /// Find connected components via breadth-first flooding.
    ///
    /// Components smaller than `min_cluster_size` are discarded. Cluster order
    /// follows the graph's node insertion order.
    pub fn find_clusters(&self, graph: &SimilarityGraph) -> Vec<Vec<String>> {
        let mut visited = HashSet::new();
        let mut clusters = Vec::new();

        for node in graph.nodes() {
            if visited.contains(node.as_str()) {
                continue;
            }
            let cluster = bfs(graph, node, &mut visited);
            if cluster.len() >= self.min_cluster_size {
                clusters.push(cluster);
            }
        }
        clusters
    }

    /// Depth-first variant of [`Clustering::find_clusters`]. Yields the same
    /// components as sets; member order within a cluster may differ.
    pub fn find_clusters_dfs(&self, graph: &SimilarityGraph) -> Vec<Vec<String>> {
        let mut visited = HashSet::new();
        let mut clusters = Vec::new();

        for node in graph.nodes() {
            if visited.contains(node.as_str()) {
                continue;
            }
            let mut cluster = Vec::new();
            dfs(graph, node, &mut visited, &mut cluster);
            if cluster.len() >= self.min_cluster_size {
                clusters.push(cluster);
            }
        }
        clusters
    }

    /// Re-cluster at a custom threshold: copy every edge of `graph` whose
    /// weight is at least `threshold` into a fresh graph, then flood it.
    pub fn find_clusters_with_threshold(
        &self,
        graph: &SimilarityGraph,
        threshold: f64,
    ) -> Vec<Vec<String>> {
        let mut filtered = SimilarityGraph::new(threshold);
        // Each undirected edge is seen from both endpoints and inserted twice;
        // weights are idempotent so the duplicate insert is harmless.
        for node in graph.nodes() {
            for (neighbor, weight) in graph.neighbors(node) {
                if *weight >= threshold {
                    filtered.add_edge(node, neighbor, *weight);
                }
            }
        }
        self.find_clusters(&filtered)
    }

    /// Cluster at several thresholds, strictest first.
    /// Returns `(threshold, clusters)` pairs in descending threshold order.
    pub fn hierarchical_clustering(
        &self,
        graph: &SimilarityGraph,
        thresholds: &[f64],
    ) -> Vec<(f64, Vec<Vec<String>>)> {
        let mut sorted: Vec<f64> = thresholds.to_vec();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

        sorted
            .into_iter()
            .map(|threshold| {
                let clusters = self.find_clusters_with_threshold(graph, threshold);
                (threshold, clusters)
            })
            .collect()
    }
}

fn bfs(graph: &SimilarityGraph, start: &str, visited: &mut HashSet<String>) -> Vec<String> {
    let mut queue = VecDeque::from([start.to_string()]);
    let mut cluster = Vec::new();

    while let Some(node) = queue.pop_front() {
        if visited.contains(&node) {
            continue;
        }
        visited.insert(node.clone());
        for (neighbor, _) in graph.neighbors(&node) {
            if !visited.contains(neighbor) {
                queue.push_back(neighbor.clone());
            }
        }
        cluster.push(node);
    }
    cluster
}

fn dfs(graph: &SimilarityGraph, node: &str, visited: &mut HashSet<String>, cluster: &mut Vec<String>) {
    if visited.contains(node) {
        return;
    }
    visited.insert(node.to_string());
    cluster.push(node.to_string());
    for (neighbor, _) in graph.neighbors(node) {
        if !visited.contains(neighbor) {
            dfs(graph, neighbor, visited, cluster);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(graph: &mut SimilarityGraph, a: &str, b: &str, c: &str, w: f64) {
        graph.add_edge(a, b, w);
        graph.add_edge(b, c, w);
        graph.add_edge(a, c, w);
    }

    #[test]
    fn test_two_triangles_two_clusters() {
        let mut graph = SimilarityGraph::new(0.5);
        triangle(&mut graph, "a", "b", "c", 0.9);
        triangle(&mut graph, "d", "e", "f", 0.8);

        let clusters = Clustering::default().find_clusters(&graph);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0], ["a", "b", "c"]);
        assert_eq!(clusters[1], ["d", "e", "f"]);
    }

    #[test]
    fn test_min_cluster_size_filters_singletons() {
        let mut graph = SimilarityGraph::new(0.5);
        graph.add_node("lonely");
        graph.add_edge("a", "b", 0.9);

        let clusters = Clustering::default().find_clusters(&graph);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0], ["a", "b"]);
    }

    #[test]
    fn test_bfs_and_dfs_agree_as_sets() {
        let mut graph = SimilarityGraph::new(0.5);
        graph.add_edge("a", "b", 0.9);
        graph.add_edge("b", "c", 0.8);
        graph.add_edge("d", "e", 0.7);

        let clustering = Clustering::default();
        let bfs_clusters = clustering.find_clusters(&graph);
        let dfs_clusters = clustering.find_clusters_dfs(&graph);
        assert_eq!(bfs_clusters.len(), dfs_clusters.len());
        for (b, d) in bfs_clusters.iter().zip(&dfs_clusters) {
            let b_set: HashSet<&String> = b.iter().collect();
            let d_set: HashSet<&String> = d.iter().collect();
            assert_eq!(b_set, d_set);
        }
    }

    #[test]
    fn test_clusters_are_disjoint() {
        let mut graph = SimilarityGraph::new(0.5);
        triangle(&mut graph, "a", "b", "c", 0.9);
        graph.add_edge("c", "d", 0.6);
        graph.add_edge("x", "y", 0.7);

        let clusters = Clustering::default().find_clusters(&graph);
        let mut seen = HashSet::new();
        for cluster in &clusters {
            for node in cluster {
                assert!(seen.insert(node.clone()), "{node} appears twice");
            }
        }
    }

    #[test]
    fn test_threshold_variant_splits_weak_links() {
        let mut graph = SimilarityGraph::new(0.5);
        graph.add_edge("a", "b", 0.9);
        graph.add_edge("b", "c", 0.6);

        let clustering = Clustering::default();
        assert_eq!(clustering.find_clusters(&graph)[0].len(), 3);

        let strict = clustering.find_clusters_with_threshold(&graph, 0.8);
        assert_eq!(strict.len(), 1);
        assert_eq!(strict[0], ["a", "b"]);
    }

    #[test]
    fn test_hierarchical_descending_order() {
        let mut graph = SimilarityGraph::new(0.5);
        graph.add_edge("a", "b", 0.9);
        graph.add_edge("b", "c", 0.6);

        let levels = Clustering::default().hierarchical_clustering(&graph, &[0.6, 0.8]);
        assert_eq!(levels[0].0, 0.8);
        assert_eq!(levels[1].0, 0.6);
        assert_eq!(levels[0].1, [["a", "b"]]);
        assert_eq!(levels[1].1.len(), 1);
        assert_eq!(levels[1].1[0].len(), 3);
    }
}
