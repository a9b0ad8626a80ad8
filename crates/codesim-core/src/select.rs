//! Greedy representative selection within a cluster.

use crate::graph::SimilarityGraph;
use std::collections::HashSet;

/// Picks a small set of submissions that summarise a cluster.
#[derive(Debug, Clone)]
pub struct GreedySelection {
    max_representatives: usize,
}

impl Default for GreedySelection {
    fn default() -> Self {
        Self::new(2)
    }
}

impl GreedySelection {
    pub fn new(max_representatives: usize) -> Self {
        Self { max_representatives }
    }

    /// Select representatives by mean edge weight to the rest of the cluster.
    ///
    /// Clusters of size at most `max_representatives` are returned verbatim.
    /// Ties keep the cluster's input order (the sort is stable).
    pub fn select_representatives(
        &self,
        cluster: &[String],
        graph: &SimilarityGraph,
    ) -> Vec<String> {
        if cluster.is_empty() {
            return Vec::new();
        }
        if cluster.len() <= self.max_representatives {
            return cluster.to_vec();
        }

        let mut scored: Vec<(&String, f64)> = cluster
            .iter()
            .map(|node| (node, average_similarity(node, cluster, graph)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(self.max_representatives)
            .map(|(node, _)| node.clone())
            .collect()
    }

    /// Select representatives that together cover as much of the cluster as
    /// possible: repeatedly pick the node connected to the most uncovered
    /// members, then mark it and its neighbours covered. When coverage stalls
    /// before `max_representatives` is reached, top up by average similarity.
    pub fn select_representatives_coverage(
        &self,
        cluster: &[String],
        graph: &SimilarityGraph,
    ) -> Vec<String> {
        if cluster.is_empty() {
            return Vec::new();
        }
        if cluster.len() <= self.max_representatives {
            return cluster.to_vec();
        }

        let mut covered: HashSet<&str> = HashSet::new();
        let mut representatives: Vec<String> = Vec::new();

        while representatives.len() < self.max_representatives && covered.len() < cluster.len() {
            let mut best: Option<&String> = None;
            let mut best_coverage: i64 = -1;

            for node in cluster {
                if representatives.contains(node) {
                    continue;
                }
                let coverage = cluster
                    .iter()
                    .filter(|other| {
                        *other != node
                            && !covered.contains(other.as_str())
                            && graph.edge_weight(node, other.as_str()) > 0.0
                    })
                    .count() as i64;
                if coverage > best_coverage {
                    best_coverage = coverage;
                    best = Some(node);
                }
            }

            let Some(best_node) = best else { break };
            if best_coverage == 0 {
                break;
            }

            representatives.push(best_node.clone());
            covered.insert(best_node.as_str());
            for other in cluster {
                if other != best_node
                    && !covered.contains(other.as_str())
                    && graph.edge_weight(best_node, other) > 0.0
                {
                    covered.insert(other.as_str());
                }
            }
        }

        // Coverage stalled: fill remaining slots by average similarity.
        if representatives.len() < self.max_representatives {
            let mut remaining: Vec<(&String, f64)> = cluster
                .iter()
                .filter(|node| !representatives.contains(*node))
                .map(|node| (node, average_similarity(node, cluster, graph)))
                .collect();
            remaining.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

            for (node, _) in remaining {
                if representatives.len() >= self.max_representatives {
                    break;
                }
                representatives.push(node.clone());
            }
        }

        representatives
    }
}

/// Mean edge weight from `node` to every other cluster member (0.0 when no edge).
fn average_similarity(node: &str, cluster: &[String], graph: &SimilarityGraph) -> f64 {
    let mut total = 0.0;
    let mut count = 0usize;
    for other in cluster {
        if other != node {
            total += graph.edge_weight(node, other);
            count += 1;
        }
    }
    if count == 0 { 0.0 } else { total / count as f64 }
}
