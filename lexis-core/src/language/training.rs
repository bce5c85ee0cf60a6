use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::{debug, info, warn};

use super::graph::{LanguageGraph, LanguageGraphConfig};
use crate::error::{LexisError, Result};
use crate::io;

impl LanguageGraph {
	/// Builds a graph from every `*.txt` corpus file of a folder.
	///
	/// # Parameters
	/// - `folder`: Directory holding one corpus file per language.
	///   The language label is the file name without extension (`en.txt` → `en`).
	///
	/// # Behavior
	/// - Each file is loaded through `from_corpus_file` (binary cache aware).
	/// - Per-language graphs are merged into the returned graph.
	///
	/// # Errors
	/// - Returns an error if the path is not a directory.
	/// - Returns an error if a corpus file or its cache cannot be read.
	pub fn from_folder<P: AsRef<Path>>(folder: P, config: LanguageGraphConfig) -> Result<Self> {
		config.validate()?;
		let folder = io::resolve_folder(folder.as_ref());

		if !folder.is_dir() {
			return Err(LexisError::Io(std::io::Error::new(
				std::io::ErrorKind::InvalidInput,
				format!("Expected a directory, got: {}", folder.display()),
			)));
		}

		let mut graph = Self::empty(config.clone());
		for path in io::list_corpus_files(&folder, "txt")? {
			let partial = Self::from_corpus_file(&path, config.clone())?;
			graph.merge(&partial)?;
		}

		info!(
			"trained language graph from {}: {} n-grams, {} languages",
			folder.display(),
			graph.node_len(),
			graph.languages().count()
		);
		Ok(graph)
	}

	/// Loads the graph of a single-language corpus file.
	///
	/// - If a `.bin` cache exists next to the file, was built with the same `n`
	///   and holds only this file's language, it is loaded instead of retraining.
	/// - Otherwise the file is trained in parallel and the cache is (re)written.
	pub fn from_corpus_file<P: AsRef<Path>>(path: P, config: LanguageGraphConfig) -> Result<Self> {
		let language = io::language_label(&path)?;
		let cache = io::cache_path(&path)?;

		if cache.exists() {
			let mut graph = Self::from_binary(&cache)?;
			let same_language = graph.languages().all(|cached| cached == language);
			if graph.config().n == config.n && same_language {
				debug!("language '{}' loaded from cache {}", language, cache.display());
				graph.set_config(config)?;
				return Ok(graph);
			}
			if same_language {
				warn!(
					"ignoring cache {} built with n = {} (expected {})",
					cache.display(),
					graph.config().n,
					config.n
				);
			} else {
				warn!("ignoring cache {} holding other languages than '{}'", cache.display(), language);
			}
		}

		let documents = io::read_documents(&path)?;
		debug!("training language '{}' on {} documents", language, documents.len());
		let graph = Self::train_parallel(&documents, &language, config)?;
		graph.save_binary(&cache)?;
		Ok(graph)
	}

	/// Trains a graph on many documents of one language using all cores.
	///
	/// # Behavior
	/// - Splits the documents into chunks (CPU cores × 8).
	/// - Spawns one thread per chunk, each building a partial graph.
	/// - Merges the partial graphs as they arrive.
	///
	/// # Notes
	/// - Counts are identical to sequential training; only interning order differs.
	pub fn train_parallel(documents: &[String], language: &str, config: LanguageGraphConfig) -> Result<Self> {
		config.validate()?;
		let mut graph = Self::empty(config.clone());
		if documents.is_empty() {
			return Ok(graph);
		}

		let chunks = num_cpus::get() * 8;
		let chunk_size = documents.len().div_ceil(chunks);

		let (tx, rx) = mpsc::channel();
		for chunk in documents.chunks(chunk_size) {
			let tx = tx.clone();
			let chunk: Vec<String> = chunk.to_vec();
			let language = language.to_owned();
			let config = config.clone();

			thread::spawn(move || {
				let mut partial = LanguageGraph::empty(config);
				for document in &chunk {
					partial.add_document(document, &language);
				}
				// The receiver outlives every sender
				let _ = tx.send(partial);
			});
		}
		drop(tx);

		for partial in rx.iter() {
			graph.merge(&partial)?;
		}

		Ok(graph)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;

	#[test]
	fn parallel_training_matches_sequential() {
		let documents: Vec<String> = (0..200)
			.map(|i| format!("message number {} with some shared words", i % 7))
			.chain(["hello world".to_owned(), "bye".to_owned()])
			.collect();

		let parallel = LanguageGraph::train_parallel(&documents, "en", LanguageGraphConfig::default()).unwrap();
		let mut sequential = LanguageGraph::new(LanguageGraphConfig::default()).unwrap();
		for document in &documents {
			sequential.add_document(document, "en");
		}

		assert_eq!(parallel.to_model_file(), sequential.to_model_file());
	}

	#[test]
	fn folder_training_labels_languages_by_file() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("en.txt"), "hello world\nhow are you\n").unwrap();
		fs::write(dir.path().join("fr.txt"), "bonjour le monde\ncomment allez vous\n").unwrap();
		fs::write(dir.path().join("notes.md"), "ignored").unwrap();

		let graph = LanguageGraph::from_folder(dir.path(), LanguageGraphConfig::default()).unwrap();
		let mut languages: Vec<&str> = graph.languages().collect();
		languages.sort();
		assert_eq!(languages, vec!["en", "fr"]);
		assert!(dir.path().join("en.bin").exists());

		let scores = graph.classify("hello you");
		assert!(scores.get("en").copied().unwrap_or(0.0) > scores.get("fr").copied().unwrap_or(0.0));
	}

	#[test]
	fn cache_is_reused() {
		let dir = tempfile::tempdir().unwrap();
		let corpus = dir.path().join("en.txt");
		fs::write(&corpus, "hello world\n").unwrap();

		let first = LanguageGraph::from_corpus_file(&corpus, LanguageGraphConfig::default()).unwrap();
		// The corpus changes but the cache still answers
		fs::write(&corpus, "completely different\n").unwrap();
		let second = LanguageGraph::from_corpus_file(&corpus, LanguageGraphConfig::default()).unwrap();
		assert_eq!(first.to_model_file(), second.to_model_file());
	}

	#[test]
	fn cache_of_another_language_is_retrained() {
		let dir = tempfile::tempdir().unwrap();
		let english = dir.path().join("en.txt");
		fs::write(&english, "hello world\n").unwrap();
		LanguageGraph::from_corpus_file(&english, LanguageGraphConfig::default()).unwrap();

		let german = dir.path().join("de.txt");
		fs::write(&german, "hallo welt\n").unwrap();
		fs::copy(dir.path().join("en.bin"), dir.path().join("de.bin")).unwrap();

		let graph = LanguageGraph::from_corpus_file(&german, LanguageGraphConfig::default()).unwrap();
		assert_eq!(graph.languages().collect::<Vec<_>>(), vec!["de"]);
		assert_eq!(graph.node_count("hal", "de"), Some(1));

		// The cache was rewritten for the right language
		let cached = LanguageGraph::from_binary(dir.path().join("de.bin")).unwrap();
		assert_eq!(cached.languages().collect::<Vec<_>>(), vec!["de"]);
	}

	#[test]
	fn folder_must_exist() {
		let dir = tempfile::tempdir().unwrap();
		let missing = dir.path().join("nope");
		assert!(LanguageGraph::from_folder(&missing, LanguageGraphConfig::default()).is_err());
	}
}
