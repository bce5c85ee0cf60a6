//! Unsupervised statistical stemming.
//!
//! Words of a sorted vocabulary are grouped into classes sharing a prefix,
//! linked by how often their suffix pairs occur, and clustered greedily
//! around high-degree pivots. Every cluster receives the longest common
//! prefix of its members as stem.

/// Undirected weighted graph with degree-ordered pivot selection.
pub mod weighted_graph;

/// The suffix-pair clustering stemmer.
pub mod gras;

pub use gras::{stem_tokens, PairScope, StemmerConfig, SuffixClusterStemmer};
pub use weighted_graph::WeightedGraph;
