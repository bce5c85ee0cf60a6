use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use super::graph::{LanguageGraph, LanguageGraphConfig, LanguageTotals};
use crate::error::{LexisError, Result};

/// On-disk layout of a language model.
///
/// ```text
/// {
///   "graph":   { ngram: { "nodes": { lang: count }, "edges": { target: { lang: count } } } },
///   "counter": { lang: { "nodes": total, "edges": total } }
/// }
/// ```
///
/// Every field is required; a file missing one fails to load as a whole.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub(crate) struct ModelFile {
	graph: BTreeMap<String, NgramRecord>,
	counter: BTreeMap<String, CounterRecord>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct NgramRecord {
	nodes: BTreeMap<String, u64>,
	edges: BTreeMap<String, BTreeMap<String, u64>>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct CounterRecord {
	nodes: u64,
	edges: u64,
}

impl LanguageGraph {
	/// Projects the graph onto the sorted, string-keyed file layout.
	pub(crate) fn to_model_file(&self) -> ModelFile {
		let mut graph = BTreeMap::new();

		for (id, node) in self.nodes.iter().enumerate() {
			let nodes = node
				.counts
				.iter()
				.map(|(language, count)| (self.languages.label(language).to_owned(), count))
				.collect();
			let edges = node
				.edges
				.iter()
				.map(|(target, counts)| {
					let counts = counts
						.iter()
						.map(|(language, count)| (self.languages.label(language).to_owned(), count))
						.collect();
					(self.ngrams.label(*target).to_owned(), counts)
				})
				.collect();
			graph.insert(self.ngrams.label(id as u32).to_owned(), NgramRecord { nodes, edges });
		}

		let counter = self
			.languages
			.labels()
			.zip(&self.totals)
			.map(|(language, totals)| {
				(language.to_owned(), CounterRecord { nodes: totals.nodes, edges: totals.edges })
			})
			.collect();

		ModelFile { graph, counter }
	}

	/// Rebuilds a graph from the file layout.
	///
	/// # Behavior
	/// - Languages are registered from `counter` first.
	/// - An edge target that has no record of its own is still created as a node.
	/// - Both ends of an edge get a (possibly zero) count for the edge's language.
	///
	/// # Errors
	/// Returns an error if a language is used in `graph` but missing from `counter`.
	fn from_model_file(file: ModelFile, config: LanguageGraphConfig) -> Result<Self> {
		let mut graph = Self::new(config)?;

		for (language, counter) in &file.counter {
			let id = graph.intern_language(language);
			graph.totals[id as usize] = LanguageTotals { nodes: counter.nodes, edges: counter.edges };
		}

		for (ngram, record) in &file.graph {
			let source = graph.intern_ngram(ngram) as usize;

			for (language, count) in &record.nodes {
				let language = graph.known_language(language, ngram)?;
				graph.nodes[source].counts.set(language, *count);
			}

			for (target, counts) in &record.edges {
				let target = graph.intern_ngram(target);
				for (language, count) in counts {
					let language = graph.known_language(language, ngram)?;
					if graph.nodes[source].counts.get(language).is_none() {
						graph.nodes[source].counts.set(language, 0);
					}
					if graph.nodes[target as usize].counts.get(language).is_none() {
						graph.nodes[target as usize].counts.set(language, 0);
					}
					graph.nodes[source].edges.entry(target).or_default().set(language, *count);
				}
			}
		}

		Ok(graph)
	}

	fn known_language(&self, language: &str, ngram: &str) -> Result<u32> {
		self.languages.get(language).ok_or_else(|| {
			LexisError::MalformedModel(format!(
				"language '{}' used by n-gram '{}' has no counter entry",
				language, ngram
			))
		})
	}

	/// Serializes the graph to the JSON model layout.
	pub fn to_json_string(&self) -> Result<String> {
		Ok(serde_json::to_string(&self.to_model_file())?)
	}

	/// Parses a JSON model.
	///
	/// # Errors
	/// Returns an error if a required field is missing, a count is not an
	/// unsigned integer, or a language lacks its counter entry.
	pub fn from_json_str(json: &str, config: LanguageGraphConfig) -> Result<Self> {
		let file: ModelFile = serde_json::from_str(json)?;
		Self::from_model_file(file, config)
	}

	/// Loads a JSON model file into a new graph.
	pub fn from_json_file<P: AsRef<Path>>(path: P, config: LanguageGraphConfig) -> Result<Self> {
		let json = fs::read_to_string(&path)?;
		let graph = Self::from_json_str(&json, config)?;
		info!(
			"loaded language model {}: {} n-grams, {} languages",
			path.as_ref().display(),
			graph.node_len(),
			graph.languages.len()
		);
		Ok(graph)
	}

	/// Replaces the content of this graph with a JSON model file.
	///
	/// The current configuration is kept. On error the graph is left untouched.
	pub fn load_json<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
		*self = Self::from_json_file(path, self.config.clone())?;
		Ok(())
	}

	/// Writes the graph as a JSON model file.
	///
	/// # Returns
	/// - `Ok(true)` when the file was written
	/// - `Ok(false)` when the graph is empty; nothing is written
	pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
		if self.is_empty() {
			return Ok(false);
		}
		fs::write(&path, self.to_json_string()?)?;
		info!("saved language model to {}", path.as_ref().display());
		Ok(true)
	}

	/// Writes the graph, configuration included, as a compact postcard blob.
	pub fn save_binary<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let bytes = postcard::to_stdvec(self)?;
		fs::write(path, bytes)?;
		Ok(())
	}

	/// Reads a graph written by `save_binary`.
	pub fn from_binary<P: AsRef<Path>>(path: P) -> Result<Self> {
		let bytes = fs::read(path)?;
		let graph: Self = postcard::from_bytes(&bytes)?;
		graph.config.validate()?;
		if graph.nodes.len() != graph.ngrams.len() || graph.totals.len() != graph.languages.len() {
			return Err(LexisError::MalformedModel("binary model tables are out of sync".to_owned()));
		}
		graph.check_ids()?;
		Ok(graph)
	}

	/// Checks that every language and edge target id points into its table.
	fn check_ids(&self) -> Result<()> {
		let languages = self.languages.len();
		let ngrams = self.ngrams.len();

		for (id, node) in self.nodes.iter().enumerate() {
			let ngram = self.ngrams.label(id as u32);
			if !node.counts.is_well_formed(languages) {
				return Err(LexisError::MalformedModel(format!("bad language counts on n-gram '{}'", ngram)));
			}
			for (target, counts) in &node.edges {
				if *target as usize >= ngrams {
					return Err(LexisError::MalformedModel(format!(
						"n-gram '{}' has an edge to unknown id {}",
						ngram, target
					)));
				}
				if !counts.is_well_formed(languages) {
					return Err(LexisError::MalformedModel(format!("bad language counts on an edge of '{}'", ngram)));
				}
			}
		}
		Ok(())
	}
}
