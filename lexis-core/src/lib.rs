//! Lexical and topical mining of chat corpora.
//!
//! This crate provides three independent statistical engines:
//! - A character n-gram graph language identifier (`language`)
//! - An unsupervised suffix-clustering stemmer (`stemming`)
//! - Collapsed Gibbs sampling topic models, one topic per document or
//!   one topic per token (`topics`)
//!
//! Tokenization, storage and export live outside the crate. Callers feed
//! raw message strings, vocabularies and stemmed token lists in.

/// Crate-wide error type.
pub mod error;

/// Aggregated configuration for all engines.
pub mod config;

/// Character n-gram language identification.
///
/// Training, weighted path scoring, persistence and batch detection.
pub mod language;

/// Statistical stemming by suffix-pair graph clustering.
pub mod stemming;

/// Topic models inferred by collapsed Gibbs sampling.
pub mod topics;

/// I/O utilities (corpus files, cache paths).
///
/// Not exposed
pub(crate) mod io;

pub use error::{LexisError, Result};
