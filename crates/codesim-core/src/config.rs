//! Configuration for detection and clustering settings.
//!
//! Load order: `.codesim/config.toml` → environment variables → defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level detector configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub similarity: SimilarityConfig,
    pub clustering: ClusteringConfig,
    pub metadata: MetadataConfig,
}

/// Similarity scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Minimum Jaccard score for two submissions to be linked in the graph.
    pub threshold: f64,
    /// Window size in tokens for k-gram fingerprinting.
    pub k_gram_size: usize,
}

/// Clustering and representative selection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Minimum number of submissions for a connected component to be reported.
    pub min_cluster_size: usize,
    /// Maximum number of representatives selected per cluster.
    pub max_representatives: usize,
}

/// Metadata index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Order of the B+ tree backing the metadata store.
    /// Values below 3 are raised to 3 when the tree is built.
    pub btree_order: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            threshold: 0.70,
            k_gram_size: 5,
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: 2,
            max_representatives: 2,
        }
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self { btree_order: 4 }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl DetectorConfig {
    /// Load config from `.codesim/config.toml` in the given root, with env var
    /// overrides. Falls back to defaults if no config file exists.
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join(".codesim").join("config.toml");

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        // Environment variable overrides
        env_override("CODESIM_THRESHOLD", &mut config.similarity.threshold);
        env_override("CODESIM_KGRAM_SIZE", &mut config.similarity.k_gram_size);
        env_override(
            "CODESIM_MIN_CLUSTER_SIZE",
            &mut config.clustering.min_cluster_size,
        );
        env_override(
            "CODESIM_MAX_REPRESENTATIVES",
            &mut config.clustering.max_representatives,
        );
        env_override("CODESIM_BTREE_ORDER", &mut config.metadata.btree_order);

        Ok(config)
    }
}
