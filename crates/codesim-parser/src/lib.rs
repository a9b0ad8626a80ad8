//! Normalising code tokeniser for near-duplicate detection.
//!
//! Strips comments, collapses string literals to a sentinel, and renames
//! identifiers positionally so that trivially edited copies of a file produce
//! identical token streams.

pub mod languages;
pub mod tokenize;
