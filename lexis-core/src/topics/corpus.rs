use std::collections::HashMap;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{LexisError, Result};

/// Bijection between words and dense ids, in first-occurrence order.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
	ids: HashMap<String, usize>,
	words: Vec<String>,
}

impl From<Vec<String>> for Vocabulary {
	fn from(words: Vec<String>) -> Self {
		let mut vocabulary = Self::default();
		for word in words {
			vocabulary.intern(&word);
		}
		vocabulary
	}
}

impl From<Vocabulary> for Vec<String> {
	fn from(vocabulary: Vocabulary) -> Self {
		vocabulary.words
	}
}

impl Vocabulary {
	/// Returns the id of `word`, assigning the next free one if unseen.
	pub fn intern(&mut self, word: &str) -> usize {
		if let Some(&id) = self.ids.get(word) {
			return id;
		}
		let id = self.words.len();
		self.ids.insert(word.to_owned(), id);
		self.words.push(word.to_owned());
		id
	}

	pub fn id(&self, word: &str) -> Option<usize> {
		self.ids.get(word).copied()
	}

	/// # Panics
	/// Panics if `id` was not handed out by this vocabulary.
	pub fn word(&self, id: usize) -> &str {
		&self.words[id]
	}

	pub fn words(&self) -> &[String] {
		&self.words
	}

	pub fn len(&self) -> usize {
		self.words.len()
	}

	pub fn is_empty(&self) -> bool {
		self.words.is_empty()
	}
}

/// Documents as sequences of vocabulary ids.
///
/// # Invariants
/// - Every document holds at least one token
/// - `source_indices[d]` is the position of document `d` in the caller's input
#[derive(Clone, Debug)]
pub struct Corpus {
	vocabulary: Vocabulary,
	documents: Vec<Vec<usize>>,
	source_indices: Vec<usize>,
}

impl Corpus {
	/// Builds a corpus from tokenized (usually stemmed) documents.
	///
	/// Empty tokens are ignored. Documents left without tokens are skipped,
	/// and `source_indices` records where the kept ones came from.
	///
	/// # Errors
	/// Returns `EmptyCorpus` if no document holds a token.
	pub fn new<D, S>(documents: &[D]) -> Result<Self>
	where
		D: AsRef<[S]>,
		S: AsRef<str>,
	{
		let mut vocabulary = Vocabulary::default();
		let mut kept = Vec::with_capacity(documents.len());
		let mut source_indices = Vec::with_capacity(documents.len());

		for (index, document) in documents.iter().enumerate() {
			let ids: Vec<usize> = document
				.as_ref()
				.iter()
				.map(AsRef::as_ref)
				.filter(|token| !token.is_empty())
				.map(|token| vocabulary.intern(token))
				.collect();

			if ids.is_empty() {
				warn!("skipping empty document {}", index);
				continue;
			}
			kept.push(ids);
			source_indices.push(index);
		}

		if kept.is_empty() {
			return Err(LexisError::EmptyCorpus);
		}

		let corpus = Self { vocabulary, documents: kept, source_indices };
		info!(
			"corpus built: {} documents, {} tokens, {} distinct words",
			corpus.len(),
			corpus.token_count(),
			corpus.vocabulary.len()
		);
		Ok(corpus)
	}

	/// Builds a corpus from raw strings, splitting each on whitespace.
	pub fn from_texts<S: AsRef<str>>(texts: &[S]) -> Result<Self> {
		let documents: Vec<Vec<&str>> = texts.iter().map(|text| text.as_ref().split_whitespace().collect()).collect();
		Self::new(&documents)
	}

	pub fn vocabulary(&self) -> &Vocabulary {
		&self.vocabulary
	}

	pub fn documents(&self) -> &[Vec<usize>] {
		&self.documents
	}

	pub fn source_indices(&self) -> &[usize] {
		&self.source_indices
	}

	/// Number of (non-empty) documents.
	pub fn len(&self) -> usize {
		self.documents.len()
	}

	pub fn is_empty(&self) -> bool {
		self.documents.is_empty()
	}

	/// Total number of token occurrences.
	pub fn token_count(&self) -> usize {
		self.documents.iter().map(Vec::len).sum()
	}
}
