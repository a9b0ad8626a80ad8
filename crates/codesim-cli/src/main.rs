//! CLI binary for codesim: scan submission directories for near-duplicate code.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use codesim_core::config::DetectorConfig;
use codesim_detect::detector::{ClusterResult, Detector};
use codesim_detect::fingerprint::RabinKarp;
use codesim_parser::tokenize::CodeParser;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "codesim", about = "Near-duplicate detector for code submissions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a directory of submissions and report clusters of similar code
    Scan {
        /// Directory containing submission files
        directory: PathBuf,

        /// Metadata sidecar file (defaults to <directory>/metadata.txt when present)
        #[arg(short, long)]
        metadata: Option<PathBuf>,

        /// Similarity threshold in [0, 1] (overrides config)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Emit raw results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare two files and print their similarity
    Compare {
        /// First file
        first: PathBuf,

        /// Second file
        second: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            directory,
            metadata,
            threshold,
            json,
        } => cmd_scan(&directory, metadata, threshold, json),
        Commands::Compare { first, second } => cmd_compare(&first, &second),
    }
}

fn cmd_scan(
    directory: &Path,
    metadata: Option<PathBuf>,
    threshold: Option<f64>,
    json: bool,
) -> Result<()> {
    let mut config = DetectorConfig::load(directory)
        .with_context(|| format!("failed to load config for {}", directory.display()))?;
    if let Some(threshold) = threshold {
        config.similarity.threshold = threshold;
    }

    // Mirror the conventional layout: a metadata.txt next to the submissions.
    let metadata = metadata.or_else(|| {
        let conventional = directory.join("metadata.txt");
        conventional.is_file().then_some(conventional)
    });

    let mut detector = Detector::with_config(&config);
    let results = detector
        .batch_process(directory, metadata.as_deref())
        .with_context(|| format!("failed to scan {}", directory.display()))?;
    tracing::info!(
        "scored {} submissions at threshold {}",
        detector.submission_ids().count(),
        detector.threshold()
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    print_results(&detector, &results);
    Ok(())
}

fn print_results(detector: &Detector, results: &[ClusterResult]) {
    if results.is_empty() {
        println!("No clusters of similar submissions found.");
    } else {
        println!("Found {} clusters of similar submissions:", results.len());
        for (i, result) in results.iter().enumerate() {
            println!();
            println!("CLUSTER {} ({} submissions):", i + 1, result.cluster.len());
            for member in &result.cluster {
                let marker = if result.representatives.contains(&member.id) {
                    "*"
                } else {
                    " "
                };
                let metadata = member.metadata.as_ref().map_or(String::new(), |record| {
                    let fields: Vec<String> =
                        record.iter().map(|(k, v)| format!("{k}={v}")).collect();
                    format!(" [{}]", fields.join(", "))
                });
                println!("  {marker} {}{metadata}", member.id);
            }

            println!("  Similarity within cluster:");
            for (a, b, similarity) in cluster_pairs(detector, result) {
                println!("    - {a} and {b}: {:.2}%", similarity * 100.0);
            }
        }
    }

    println!();
    println!("Pairwise similarity across all submissions:");
    for pair in detector.pairwise_similarities() {
        let flag = if pair.similarity >= detector.threshold() {
            " [above threshold]"
        } else {
            ""
        };
        println!(
            "  - {} and {}: {:.2}%{flag}",
            pair.first,
            pair.second,
            pair.similarity * 100.0
        );
    }
}

/// Recomputed similarity for every pair inside one cluster.
fn cluster_pairs<'a>(
    detector: &Detector,
    result: &'a ClusterResult,
) -> Vec<(&'a str, &'a str, f64)> {
    let mut pairs = Vec::new();
    for (i, first) in result.cluster.iter().enumerate() {
        for second in &result.cluster[i + 1..] {
            if let Some(similarity) = detector.similarity_between(&first.id, &second.id) {
                pairs.push((first.id.as_str(), second.id.as_str(), similarity));
            }
        }
    }
    pairs
}

fn cmd_compare(first: &Path, second: &Path) -> Result<()> {
    let config = DetectorConfig::load(Path::new("."))?;
    let parser = CodeParser::new();
    let fingerprinter = RabinKarp::new(config.similarity.k_gram_size);

    let first_tokens = parser.parse_file(first);
    let second_tokens = parser.parse_file(second);
    let similarity = fingerprinter.calculate_similarity(&first_tokens, &second_tokens);

    println!(
        "{} and {}: {:.2}% similarity",
        first.display(),
        second.display(),
        similarity * 100.0
    );
    Ok(())
}
