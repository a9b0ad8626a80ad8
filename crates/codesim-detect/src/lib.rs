//! Detection pipeline: k-gram fingerprinting, Jaccard similarity scoring,
//! and the detector facade joining clusters against stored metadata.

pub mod detector;
pub mod fingerprint;
pub mod metadata;
