//! Detector facade: orchestrates tokenisation, fingerprinting, graph updates,
//! clustering, and representative selection behind one submission API.

use crate::fingerprint::RabinKarp;
use crate::metadata::{self, MetadataRecord};
use anyhow::{Context, Result};
use codesim_core::btree::BPlusTree;
use codesim_core::cluster::Clustering;
use codesim_core::config::{DetectorConfig, SimilarityConfig};
use codesim_core::graph::SimilarityGraph;
use codesim_core::select::GreedySelection;
use codesim_parser::tokenize::CodeParser;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use walkdir::WalkDir;

/// One submission inside a reported cluster, joined against its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterMember {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataRecord>,
}

/// A cluster of mutually similar submissions with its representatives.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterResult {
    pub cluster: Vec<ClusterMember>,
    pub representatives: Vec<String>,
}

/// Similarity score for one unordered pair of submissions.
#[derive(Debug, Clone, Serialize)]
pub struct PairSimilarity {
    pub first: String,
    pub second: String,
    pub similarity: f64,
}

/// Near-duplicate detector over a growing set of submissions.
///
/// Submissions are immutable once added and live for the detector's lifetime.
/// The token mapping keeps insertion order, which fixes cluster enumeration
/// order and representative tie-breaks. Not re-entrant.
pub struct Detector {
    parser: CodeParser,
    fingerprinter: RabinKarp,
    graph: SimilarityGraph,
    clustering: Clustering,
    selection: GreedySelection,
    metadata_store: BPlusTree<MetadataRecord>,
    /// `(id, tokens)` in insertion order.
    submissions: Vec<(String, Vec<String>)>,
    /// id → slot in `submissions`.
    index: HashMap<String, usize>,
    threshold: f64,
}

impl Detector {
    /// Detector with the given similarity threshold and default settings for
    /// everything else.
    pub fn new(threshold: f64) -> Self {
        let config = DetectorConfig {
            similarity: SimilarityConfig {
                threshold,
                ..SimilarityConfig::default()
            },
            ..DetectorConfig::default()
        };
        Self::with_config(&config)
    }

    pub fn with_config(config: &DetectorConfig) -> Self {
        Self {
            parser: CodeParser::new(),
            fingerprinter: RabinKarp::new(config.similarity.k_gram_size),
            graph: SimilarityGraph::new(config.similarity.threshold),
            clustering: Clustering::new(config.clustering.min_cluster_size),
            selection: GreedySelection::new(config.clustering.max_representatives),
            metadata_store: BPlusTree::new(config.metadata.btree_order),
            submissions: Vec::new(),
            index: HashMap::new(),
            threshold: config.similarity.threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// The underlying similarity graph.
    pub fn graph(&self) -> &SimilarityGraph {
        &self.graph
    }

    /// Submission ids in insertion order.
    pub fn submission_ids(&self) -> impl Iterator<Item = &str> {
        self.submissions.iter().map(|(id, _)| id.as_str())
    }

    /// Normalised tokens of a submission, if present.
    pub fn tokens(&self, id: &str) -> Option<&[String]> {
        self.index
            .get(id)
            .map(|&slot| self.submissions[slot].1.as_slice())
    }

    /// Add a submission and score it against every prior one.
    ///
    /// The id is the file's basename. An unreadable file still becomes a
    /// submission, with zero tokens and no edges. Metadata, when present and
    /// non-empty, is stored in the B+ tree. Returns the id.
    pub fn add_submission(&mut self, path: &Path, metadata: Option<MetadataRecord>) -> String {
        let id = path.file_name().map_or_else(
            || path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        );
        let tokens = self.parser.parse_file(path);

        match self.index.get(&id) {
            Some(&slot) => self.submissions[slot].1 = tokens,
            None => {
                self.index.insert(id.clone(), self.submissions.len());
                self.submissions.push((id.clone(), tokens));
            }
        }

        if let Some(record) = metadata
            && !record.is_empty()
        {
            self.metadata_store.insert(id.clone(), record);
        }

        self.update_graph(&id);
        id
    }

    /// Score the newest submission against every other; the graph silently
    /// drops pairs below the threshold.
    fn update_graph(&mut self, new_id: &str) {
        let slot = self.index[new_id];
        let new_tokens = &self.submissions[slot].1;
        for (existing_id, existing_tokens) in &self.submissions {
            if existing_id == new_id {
                continue;
            }
            let similarity = self
                .fingerprinter
                .calculate_similarity(new_tokens, existing_tokens);
            tracing::debug!("similarity {new_id} <-> {existing_id}: {similarity:.4}");
            self.graph.add_edge(new_id, existing_id, similarity);
        }
    }

    /// Cluster the current submissions and select representatives.
    ///
    /// Only clusters with more than one member are reported. Each member is
    /// joined against its metadata record, absent when none was provided.
    pub fn detect_plagiarism(&self) -> Vec<ClusterResult> {
        let clusters = self.clustering.find_clusters(&self.graph);

        let mut results = Vec::new();
        for cluster in clusters {
            if cluster.len() <= 1 {
                continue;
            }
            let representatives = self.selection.select_representatives(&cluster, &self.graph);
            let members = cluster
                .into_iter()
                .map(|id| {
                    let metadata = self.metadata_store.search(&id).cloned();
                    ClusterMember { id, metadata }
                })
                .collect();
            results.push(ClusterResult {
                cluster: members,
                representatives,
            });
        }
        results
    }

    /// Add every regular file directly inside `directory` (in file-name order,
    /// so results are reproducible), then run detection.
    ///
    /// `metadata_file` uses the sidecar format of [`metadata::load_metadata_file`];
    /// a missing file is treated as absent.
    pub fn batch_process(
        &mut self,
        directory: &Path,
        metadata_file: Option<&Path>,
    ) -> Result<Vec<ClusterResult>> {
        let records = metadata_file
            .map(metadata::load_metadata_file)
            .unwrap_or_default();

        for entry in WalkDir::new(directory)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.with_context(|| {
                format!("failed to list submissions in {}", directory.display())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let record = records.get(name.as_str()).cloned();
            self.add_submission(entry.path(), record);
        }

        Ok(self.detect_plagiarism())
    }

    /// Recomputed Jaccard score between two stored submissions.
    /// `None` when either id is unknown.
    pub fn similarity_between(&self, first: &str, second: &str) -> Option<f64> {
        let a = &self.submissions[*self.index.get(first)?].1;
        let b = &self.submissions[*self.index.get(second)?].1;
        Some(self.fingerprinter.calculate_similarity(a, b))
    }

    /// Similarity of every unordered pair of submissions, in insertion order.
    pub fn pairwise_similarities(&self) -> Vec<PairSimilarity> {
        let mut pairs = Vec::new();
        for (i, (first, first_tokens)) in self.submissions.iter().enumerate() {
            for (second, second_tokens) in &self.submissions[i + 1..] {
                pairs.push(PairSimilarity {
                    first: first.clone(),
                    second: second.clone(),
                    similarity: self
                        .fingerprinter
                        .calculate_similarity(first_tokens, second_tokens),
                });
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_submission_returns_basename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub_a.py");
        std::fs::write(&path, "x = 1\n").unwrap();

        let mut detector = Detector::new(0.7);
        let id = detector.add_submission(&path, None);
        assert_eq!(id, "sub_a.py");
        assert_eq!(detector.submission_ids().collect::<Vec<_>>(), ["sub_a.py"]);
    }

    #[test]
    fn test_unreadable_submission_has_no_tokens_or_edges() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.py");
        std::fs::write(&good, "def f(a):\n    return a\n").unwrap();

        let mut detector = Detector::new(0.1);
        detector.add_submission(&good, None);
        let id = detector.add_submission(&dir.path().join("missing.py"), None);

        assert_eq!(detector.tokens(&id), Some(&[][..]));
        assert!(detector.graph().neighbors(&id).is_empty());
        assert!(detector.detect_plagiarism().is_empty());
    }

    #[test]
    fn test_similarity_between_unknown_id() {
        let detector = Detector::new(0.7);
        assert_eq!(detector.similarity_between("a", "b"), None);
    }
}
