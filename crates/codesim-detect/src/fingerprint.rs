//! Rabin-Karp style k-gram fingerprinting and Jaccard similarity.
//!
//! Every window of `k` consecutive tokens is hashed into a 128-bit digest;
//! two submissions are compared by set Jaccard over their digest sets. The
//! digests are counted as sets, never multisets: a k-gram repeated many times
//! within one file contributes a single element, which keeps the score (and
//! thus any configured threshold) stable under repetition.

use std::collections::HashMap;

/// Fingerprint of one submission: digest → ascending k-gram start positions.
pub type FingerprintIndex = HashMap<u128, Vec<usize>>;

/// A literal-verified run of matching tokens between two submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMatch {
    /// Start position in the first token list.
    pub pos1: usize,
    /// Start position in the second token list.
    pub pos2: usize,
    /// Length of the matching run, at least the k-gram size.
    pub len: usize,
}

/// K-gram hashing and similarity scoring.
#[derive(Debug, Clone)]
pub struct RabinKarp {
    k_gram_size: usize,
}

impl Default for RabinKarp {
    fn default() -> Self {
        Self::new(5)
    }
}

impl RabinKarp {
    pub fn new(k_gram_size: usize) -> Self {
        Self { k_gram_size }
    }

    pub fn k_gram_size(&self) -> usize {
        self.k_gram_size
    }

    /// Build the fingerprint index for a token list. Empty when the list is
    /// shorter than the k-gram size.
    pub fn fingerprint(&self, tokens: &[String]) -> FingerprintIndex {
        let mut index = FingerprintIndex::new();
        if tokens.len() < self.k_gram_size {
            return index;
        }
        for start in 0..=tokens.len() - self.k_gram_size {
            let k_gram = tokens[start..start + self.k_gram_size].join(" ");
            index.entry(hash_k_gram(&k_gram)).or_default().push(start);
        }
        index
    }

    /// Jaccard similarity of two token lists over their k-gram digest sets:
    /// `|H1 ∩ H2| / (|H1| + |H2| − |H1 ∩ H2|)`.
    ///
    /// Returns 0.0 when either list is empty or too short to fingerprint.
    /// Symmetric; identical lists of at least `k` tokens score 1.0.
    pub fn calculate_similarity(&self, tokens1: &[String], tokens2: &[String]) -> f64 {
        if tokens1.is_empty() || tokens2.is_empty() {
            return 0.0;
        }
        let index1 = self.fingerprint(tokens1);
        let index2 = self.fingerprint(tokens2);
        if index1.is_empty() || index2.is_empty() {
            return 0.0;
        }

        let shared = index1
            .keys()
            .filter(|hash| index2.contains_key(*hash))
            .count();
        let union = index1.len() + index2.len() - shared;
        if union == 0 {
            return 0.0;
        }
        shared as f64 / union as f64
    }

    /// Find maximal matching token runs between two lists.
    ///
    /// Each shared digest is verified literally (hash collisions are cheap to
    /// rule out here), extended forward greedily, and overlapping runs are
    /// merged. Best-effort reporting helper; the clustering pipeline does not
    /// depend on it.
    pub fn find_matching_sequences(
        &self,
        tokens1: &[String],
        tokens2: &[String],
    ) -> Vec<TokenMatch> {
        if tokens1.is_empty() || tokens2.is_empty() {
            return Vec::new();
        }
        let index1 = self.fingerprint(tokens1);
        let index2 = self.fingerprint(tokens2);
        let k = self.k_gram_size;

        let mut matches = Vec::new();
        for (hash, positions1) in &index1 {
            let Some(positions2) = index2.get(hash) else {
                continue;
            };
            for &pos1 in positions1 {
                for &pos2 in positions2 {
                    if tokens1[pos1..pos1 + k] == tokens2[pos2..pos2 + k] {
                        let len = extend_match(tokens1, tokens2, pos1, pos2, k);
                        matches.push(TokenMatch { pos1, pos2, len });
                    }
                }
            }
        }
        merge_overlapping(matches)
    }
}

fn hash_k_gram(k_gram: &str) -> u128 {
    u128::from_be_bytes(md5::compute(k_gram.as_bytes()).0)
}

/// Extend a verified k-gram match forward while tokens keep agreeing.
fn extend_match(
    tokens1: &[String],
    tokens2: &[String],
    pos1: usize,
    pos2: usize,
    k: usize,
) -> usize {
    let mut len = k;
    while pos1 + len < tokens1.len()
        && pos2 + len < tokens2.len()
        && tokens1[pos1 + len] == tokens2[pos2 + len]
    {
        len += 1;
    }
    len
}

/// Sort matches by `(pos1, pos2)` and merge runs that overlap in both lists.
fn merge_overlapping(mut matches: Vec<TokenMatch>) -> Vec<TokenMatch> {
    if matches.is_empty() {
        return matches;
    }
    matches.sort_by_key(|m| (m.pos1, m.pos2));

    let mut merged = Vec::new();
    let mut current = matches[0];
    for m in matches.into_iter().skip(1) {
        if m.pos1 < current.pos1 + current.len && m.pos2 < current.pos2 + current.len {
            current.len = current.len.max(m.pos1 - current.pos1 + m.len);
        } else {
            merged.push(current);
            current = m;
        }
    }
    merged.push(current);
    merged
}
