//! Character n-gram graph language identification.
//!
//! A `LanguageGraph` is a weighted multigraph over character n-grams:
//! - Nodes count how often an n-gram was seen per language
//! - Edges count how often one n-gram followed another per language
//! - Totals keep, per language, the sum of node and edge occurrences
//!
//! Classification walks the n-gram path of a text through the graph and
//! scores each language relative to the size of its own training data.

/// N-gram extraction and text normalization.
pub mod ngrams;

/// The n-gram graph, its configuration and scoring.
pub mod graph;

/// JSON model files and binary caches.
pub mod persistence;

/// Parallel bulk training from corpus folders.
pub mod training;

/// Language detection strategy and batch identification.
pub mod detector;

pub use detector::{dominant_language, identify_languages, LanguageDetector};
pub use graph::{LanguageGraph, LanguageGraphConfig, LanguageTotals, ScoringMode};
