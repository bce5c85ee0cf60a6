use std::collections::{BTreeMap, HashMap};

use log::debug;
use serde::{Deserialize, Serialize};

use super::ngrams::{extract_ngrams, normalize};
use crate::error::{LexisError, Result};

/// How per-language hits are turned into a score.
///
/// # Variants
/// - `Log`: `ln(hits) / ln(total)` per dimension, comparable across languages
///   trained on very different amounts of text.
/// - `Ratio`: `hits / total` per dimension.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
	#[default]
	Log,
	Ratio,
}

impl ScoringMode {
	/// Score contribution of one dimension (nodes or edges).
	///
	/// A dimension without hits, or without training data, contributes nothing.
	/// In log mode a total of 1 has no usable logarithm, so the plain ratio is used.
	/// Ratio terms are capped at 1: a text repeating n-grams can collect more
	/// hits than the language has occurrences.
	fn term(self, hits: u64, total: u64) -> f64 {
		if hits == 0 || total == 0 {
			return 0.0;
		}
		let ratio = hits as f64 / total as f64;
		match self {
			ScoringMode::Ratio => ratio.min(1.0),
			ScoringMode::Log if total == 1 => ratio,
			ScoringMode::Log => (hits as f64).ln() / (total as f64).ln(),
		}
	}
}

/// Configuration of a `LanguageGraph`.
///
/// # Invariants
/// - `n >= 1`
/// - `max_depth >= 1`
/// - `threshold` is finite and non-negative
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LanguageGraphConfig {
	/// Length of the character n-grams.
	pub n: usize,

	/// Maximum number of path steps walked during classification.
	///
	/// Texts with more n-grams than this are scored on their prefix only.
	pub max_depth: usize,

	/// Scoring formula.
	pub mode: ScoringMode,

	/// Minimum score for a language to be reported.
	threshold: f64,
}

impl Default for LanguageGraphConfig {
	fn default() -> Self {
		Self { n: 3, max_depth: 1000, mode: ScoringMode::Log, threshold: 0.0125 }
	}
}

impl LanguageGraphConfig {
	/// Returns the reporting threshold.
	pub fn threshold(&self) -> f64 {
		self.threshold
	}

	/// Sets the reporting threshold.
	///
	/// # Errors
	/// Returns an error if the value is negative or not finite.
	pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
		if !threshold.is_finite() || threshold < 0.0 {
			return Err(LexisError::InvalidConfig(format!(
				"threshold must be finite and >= 0, got {}",
				threshold
			)));
		}
		self.threshold = threshold;
		Ok(())
	}

	/// Checks every field, including the ones set directly or deserialized.
	pub fn validate(&self) -> Result<()> {
		if self.n == 0 {
			return Err(LexisError::InvalidConfig("n must be >= 1".to_owned()));
		}
		if self.max_depth == 0 {
			return Err(LexisError::InvalidConfig("max_depth must be >= 1".to_owned()));
		}
		if !self.threshold.is_finite() || self.threshold < 0.0 {
			return Err(LexisError::InvalidConfig(format!(
				"threshold must be finite and >= 0, got {}",
				self.threshold
			)));
		}
		Ok(())
	}
}

/// Node and edge occurrence totals of one language.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LanguageTotals {
	pub nodes: u64,
	pub edges: u64,
}

/// Bidirectional string ↔ dense id table.
///
/// Serialized as the plain list of labels; ids are positions in that list.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub(super) struct Interner {
	ids: HashMap<String, u32>,
	labels: Vec<String>,
}

impl From<Vec<String>> for Interner {
	fn from(labels: Vec<String>) -> Self {
		let ids = labels.iter().enumerate().map(|(id, label)| (label.clone(), id as u32)).collect();
		Self { ids, labels }
	}
}

impl From<Interner> for Vec<String> {
	fn from(interner: Interner) -> Self {
		interner.labels
	}
}

impl Interner {
	/// Returns the id of `label`, allocating the next one if unseen.
	/// The boolean is true when the label was new.
	fn intern(&mut self, label: &str) -> (u32, bool) {
		if let Some(id) = self.ids.get(label) {
			return (*id, false);
		}
		let id = self.labels.len() as u32;
		self.labels.push(label.to_owned());
		self.ids.insert(label.to_owned(), id);
		(id, true)
	}

	pub(super) fn get(&self, label: &str) -> Option<u32> {
		self.ids.get(label).copied()
	}

	pub(super) fn label(&self, id: u32) -> &str {
		&self.labels[id as usize]
	}

	pub(super) fn labels(&self) -> impl Iterator<Item = &str> {
		self.labels.iter().map(String::as_str)
	}

	pub(super) fn len(&self) -> usize {
		self.labels.len()
	}

	fn clear(&mut self) {
		self.ids.clear();
		self.labels.clear();
	}
}

/// Per-language counts, sorted by language id.
///
/// An explicit zero entry is kept apart from a missing one, so models loaded
/// from disk round-trip languages that never co-occurred.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub(super) struct LanguageCounts(Vec<(u32, u64)>);

impl LanguageCounts {
	pub(super) fn add(&mut self, language: u32, count: u64) {
		match self.0.binary_search_by_key(&language, |(id, _)| *id) {
			Ok(i) => self.0[i].1 += count,
			Err(i) => self.0.insert(i, (language, count)),
		}
	}

	pub(super) fn set(&mut self, language: u32, count: u64) {
		match self.0.binary_search_by_key(&language, |(id, _)| *id) {
			Ok(i) => self.0[i].1 = count,
			Err(i) => self.0.insert(i, (language, count)),
		}
	}

	pub(super) fn get(&self, language: u32) -> Option<u64> {
		self.0
			.binary_search_by_key(&language, |(id, _)| *id)
			.ok()
			.map(|i| self.0[i].1)
	}

	pub(super) fn iter(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
		self.0.iter().copied()
	}

	/// True when ids are strictly increasing and all below `languages`.
	pub(super) fn is_well_formed(&self, languages: usize) -> bool {
		self.0.windows(2).all(|pair| pair[0].0 < pair[1].0)
			&& self.0.last().is_none_or(|(id, _)| (*id as usize) < languages)
	}
}

/// One n-gram: its per-language occurrences and its outgoing transitions.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub(super) struct Node {
	pub(super) counts: LanguageCounts,
	pub(super) edges: HashMap<u32, LanguageCounts>,
}

/// Per-language hit accumulator filled while walking a text's n-gram path.
#[derive(Clone, Copy, Debug, Default)]
struct Hits {
	nodes: u64,
	edges: u64,
}

/// Weighted n-gram multigraph trained per language.
///
/// # Responsibilities
/// - Accumulate node and transition counts per language during training
/// - Score arbitrary text against every trained language
/// - Merge with another graph built with the same `n`
///
/// # Invariants
/// - `nodes[id]` belongs to the n-gram interned under `id`
/// - `totals[id]` belongs to the language interned under `id`
/// - For trained graphs, each language total equals the sum of its node
///   (resp. edge) counts
/// - Counts only grow, except through `drop_model`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LanguageGraph {
	pub(super) config: LanguageGraphConfig,
	pub(super) ngrams: Interner,
	pub(super) languages: Interner,
	pub(super) nodes: Vec<Node>,
	pub(super) totals: Vec<LanguageTotals>,
}

impl LanguageGraph {
	/// Creates an empty graph.
	///
	/// # Errors
	/// Returns an error if the configuration is invalid.
	pub fn new(config: LanguageGraphConfig) -> Result<Self> {
		config.validate()?;
		Ok(Self::empty(config))
	}

	/// Creates an empty graph from an already validated configuration.
	pub(super) fn empty(config: LanguageGraphConfig) -> Self {
		Self {
			config,
			ngrams: Interner::default(),
			languages: Interner::default(),
			nodes: Vec::new(),
			totals: Vec::new(),
		}
	}

	pub fn config(&self) -> &LanguageGraphConfig {
		&self.config
	}

	/// Replaces the scoring configuration.
	///
	/// # Errors
	/// Returns an error if the configuration is invalid, or if it changes `n`
	/// on a graph that already holds n-grams.
	pub fn set_config(&mut self, config: LanguageGraphConfig) -> Result<()> {
		config.validate()?;
		if config.n != self.config.n && !self.is_empty() {
			return Err(LexisError::Mismatch(format!(
				"cannot change n from {} to {} on a trained graph",
				self.config.n, config.n
			)));
		}
		self.config = config;
		Ok(())
	}

	/// True when nothing has been trained or loaded.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Number of distinct n-grams.
	pub fn node_len(&self) -> usize {
		self.nodes.len()
	}

	/// Trained languages, in first-seen order.
	pub fn languages(&self) -> impl Iterator<Item = &str> {
		self.languages.labels()
	}

	/// Node and edge totals of a language.
	pub fn totals(&self, language: &str) -> Option<LanguageTotals> {
		self.languages.get(language).map(|id| self.totals[id as usize])
	}

	/// Occurrences of `ngram` for `language`.
	///
	/// `Some(0)` means the language is recorded on the node with a zero count.
	pub fn node_count(&self, ngram: &str, language: &str) -> Option<u64> {
		let node = &self.nodes[self.ngrams.get(ngram)? as usize];
		node.counts.get(self.languages.get(language)?)
	}

	/// Occurrences of the transition `source → target` for `language`.
	pub fn edge_count(&self, source: &str, target: &str, language: &str) -> Option<u64> {
		let node = &self.nodes[self.ngrams.get(source)? as usize];
		let edge = node.edges.get(&self.ngrams.get(target)?)?;
		edge.get(self.languages.get(language)?)
	}

	pub(super) fn intern_ngram(&mut self, ngram: &str) -> u32 {
		let (id, new) = self.ngrams.intern(ngram);
		if new {
			self.nodes.push(Node::default());
		}
		id
	}

	pub(super) fn intern_language(&mut self, language: &str) -> u32 {
		let (id, new) = self.languages.intern(language);
		if new {
			self.totals.push(LanguageTotals::default());
		}
		id
	}

	/// Adds a training document for `language`.
	///
	/// # Behavior
	/// - Normalizes the text and splits it into n-grams.
	/// - Each n-gram increments its node count and the language node total.
	/// - Each consecutive pair increments its edge count and the language edge total.
	///
	/// # Notes
	/// - A text that normalizes to nothing is ignored; the language is not registered.
	pub fn add_document(&mut self, text: &str, language: &str) {
		let ngrams = extract_ngrams(&normalize(text), self.config.n);
		if ngrams.is_empty() {
			return;
		}

		let language = self.intern_language(language);
		let mut previous: Option<u32> = None;

		for ngram in &ngrams {
			let id = self.intern_ngram(ngram);
			self.nodes[id as usize].counts.add(language, 1);
			self.totals[language as usize].nodes += 1;

			if let Some(source) = previous {
				self.nodes[source as usize].edges.entry(id).or_default().add(language, 1);
				self.totals[language as usize].edges += 1;
			}
			previous = Some(id);
		}
	}

	/// Scores a text against every trained language.
	///
	/// # Returns
	/// A map `language → score` holding the languages whose score reaches the
	/// configured threshold. An untrained graph returns an empty map.
	///
	/// # Notes
	/// - At most `max_depth` n-grams of the path are walked; the remainder of
	///   a longer text does not influence the score.
	pub fn classify(&self, text: &str) -> BTreeMap<String, f64> {
		let mut scores = BTreeMap::new();
		if self.is_empty() {
			return scores;
		}

		let path: Vec<Option<u32>> = extract_ngrams(&normalize(text), self.config.n)
			.iter()
			.map(|ngram| self.ngrams.get(ngram))
			.collect();

		for (language, hits) in self.match_path(&path).into_iter().enumerate() {
			if hits.nodes == 0 && hits.edges == 0 {
				continue;
			}
			let totals = self.totals[language];
			let score = self.config.mode.term(hits.nodes, totals.nodes)
				+ self.config.mode.term(hits.edges, totals.edges);
			if score >= self.config.threshold {
				scores.insert(self.languages.label(language as u32).to_owned(), score);
			}
		}

		scores
	}

	/// Walks the n-gram path and sums node and edge counts per language.
	fn match_path(&self, path: &[Option<u32>]) -> Vec<Hits> {
		let mut hits = vec![Hits::default(); self.languages.len()];

		for (position, source) in path.iter().enumerate().take(self.config.max_depth) {
			let Some(source) = source else { continue };
			let node = &self.nodes[*source as usize];

			for (language, count) in node.counts.iter() {
				hits[language as usize].nodes += count;
			}

			if let Some(Some(target)) = path.get(position + 1) {
				if let Some(edge) = node.edges.get(target) {
					for (language, count) in edge.iter() {
						hits[language as usize].edges += count;
					}
				}
			}
		}

		hits
	}

	/// Merges another graph into this one.
	///
	/// # Notes
	/// - Both graphs must use the same `n`.
	/// - Node counts, edge counts and totals are summed.
	/// - The configuration of `self` is kept.
	///
	/// # Errors
	/// Returns an error if the n-gram lengths differ.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.config.n != other.config.n {
			return Err(LexisError::Mismatch(format!(
				"n mismatch: self={}, other={}",
				self.config.n, other.config.n
			)));
		}

		let language_ids: Vec<u32> = other.languages.labels().map(|l| self.intern_language(l)).collect();
		let ngram_ids: Vec<u32> = other.ngrams.labels().map(|g| self.intern_ngram(g)).collect();

		for (other_id, node) in other.nodes.iter().enumerate() {
			let id = ngram_ids[other_id] as usize;
			for (language, count) in node.counts.iter() {
				self.nodes[id].counts.add(language_ids[language as usize], count);
			}
			for (target, counts) in &node.edges {
				let edge = self.nodes[id].edges.entry(ngram_ids[*target as usize]).or_default();
				for (language, count) in counts.iter() {
					edge.add(language_ids[language as usize], count);
				}
			}
		}

		for (other_id, totals) in other.totals.iter().enumerate() {
			let own = &mut self.totals[language_ids[other_id] as usize];
			own.nodes += totals.nodes;
			own.edges += totals.edges;
		}

		debug!("merged graph: {} n-grams, {} languages", self.nodes.len(), self.languages.len());
		Ok(())
	}

	/// Clears nodes, edges and totals in one step.
	pub fn drop_model(&mut self) {
		self.ngrams.clear();
		self.languages.clear();
		self.nodes.clear();
		self.totals.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn trained() -> LanguageGraph {
		let mut graph = LanguageGraph::new(LanguageGraphConfig::default()).unwrap();
		graph.add_document("hello world", "en");
		graph.add_document("bonjour monde", "fr");
		graph
	}

	#[test]
	fn training_counts_nodes_and_edges() {
		let graph = trained();
		// "hello world" has 9 trigrams and 8 transitions
		assert_eq!(graph.totals("en"), Some(LanguageTotals { nodes: 9, edges: 8 }));
		assert_eq!(graph.node_count("hel", "en"), Some(1));
		assert_eq!(graph.node_count("hel", "fr"), None);
		assert_eq!(graph.edge_count("hel", "ell", "en"), Some(1));
		assert_eq!(graph.edge_count("ell", "hel", "en"), None);
	}

	#[test]
	fn empty_document_is_ignored() {
		let mut graph = LanguageGraph::new(LanguageGraphConfig::default()).unwrap();
		graph.add_document("  !!! 123 ", "en");
		assert!(graph.is_empty());
		assert_eq!(graph.totals("en"), None);
	}

	#[test]
	fn untrained_graph_scores_nothing() {
		let graph = LanguageGraph::new(LanguageGraphConfig::default()).unwrap();
		assert!(graph.classify("hello there").is_empty());
	}

	#[test]
	fn classify_prefers_trained_language() {
		let graph = trained();
		let scores = graph.classify("hello there");
		let en = scores.get("en").copied().unwrap_or(0.0);
		let fr = scores.get("fr").copied().unwrap_or(0.0);
		assert!(en > fr, "en={en} fr={fr}");
	}

	#[test]
	fn ratio_scores_are_bounded() {
		let mut graph = trained();
		let mut config = graph.config().clone();
		config.mode = ScoringMode::Ratio;
		config.set_threshold(0.0).unwrap();
		graph.set_config(config).unwrap();
		let scores = graph.classify("hello world");
		let en = scores["en"];
		assert!((en - 2.0).abs() < 1e-12, "a training text covers its whole corpus: {en}");
		for score in graph.classify("monde hello").values() {
			assert!((0.0..=2.0).contains(score));
		}
	}

	#[test]
	fn log_scores_never_see_zero_hits() {
		let mut graph = LanguageGraph::new(LanguageGraphConfig::default()).unwrap();
		graph.add_document("abc", "en");
		graph.add_document("zzzz", "xx");
		// a single node with a total of 1 and no edges
		let scores = graph.classify("abc");
		assert_eq!(scores.len(), 1);
		assert!(scores["en"].is_finite());
		assert!((scores["en"] - 1.0).abs() < 1e-12);
	}

	#[test]
	fn max_depth_truncates_the_walk() {
		let mut graph = LanguageGraph::new(LanguageGraphConfig::default()).unwrap();
		graph.add_document("aaaa", "x");
		graph.add_document("bbbb", "y");
		let mut config = graph.config().clone();
		config.max_depth = 2;
		config.mode = ScoringMode::Ratio;
		graph.set_config(config).unwrap();
		// only the first two n-grams ("aaa", "aab") are looked at
		let scores = graph.classify("aaabbbb");
		assert!(scores.contains_key("x"));
		assert!(!scores.contains_key("y"));
	}

	#[test]
	fn threshold_filters_weak_languages() {
		let mut graph = trained();
		let mut config = graph.config().clone();
		config.set_threshold(1.9).unwrap();
		graph.set_config(config).unwrap();
		assert!(graph.classify("hello there").is_empty());
	}

	#[test]
	fn merge_sums_counts() {
		let mut left = trained();
		let mut right = LanguageGraph::new(LanguageGraphConfig::default()).unwrap();
		right.add_document("hello", "en");
		right.add_document("hola mundo", "es");
		left.merge(&right).unwrap();
		assert_eq!(left.node_count("hel", "en"), Some(2));
		assert_eq!(left.totals("en"), Some(LanguageTotals { nodes: 12, edges: 10 }));
		assert!(left.totals("es").is_some());
	}

	#[test]
	fn merge_rejects_other_n() {
		let mut left = trained();
		let config = LanguageGraphConfig { n: 2, ..LanguageGraphConfig::default() };
		let right = LanguageGraph::new(config).unwrap();
		assert!(matches!(left.merge(&right), Err(LexisError::Mismatch(_))));
	}

	#[test]
	fn drop_model_clears_everything() {
		let mut graph = trained();
		graph.drop_model();
		assert!(graph.is_empty());
		assert_eq!(graph.languages().count(), 0);
		assert!(graph.classify("hello").is_empty());
	}

	#[test]
	fn language_counts_shape_is_checked() {
		assert!(LanguageCounts(vec![(0, 1), (2, 0)]).is_well_formed(3));
		assert!(LanguageCounts::default().is_well_formed(0));
		assert!(!LanguageCounts(vec![(2, 1), (0, 1)]).is_well_formed(3));
		assert!(!LanguageCounts(vec![(1, 1), (1, 2)]).is_well_formed(3));
		assert!(!LanguageCounts(vec![(0, 1), (3, 1)]).is_well_formed(3));
	}

	#[test]
	fn invalid_config_is_rejected() {
		let config = LanguageGraphConfig { n: 0, ..LanguageGraphConfig::default() };
		assert!(LanguageGraph::new(config).is_err());
		let mut config = LanguageGraphConfig::default();
		assert!(config.set_threshold(-1.0).is_err());
		assert!(config.set_threshold(f64::NAN).is_err());
	}
}
