use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Range;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::weighted_graph::WeightedGraph;
use crate::error::{LexisError, Result};

/// Where suffix-pair frequencies are tallied.
///
/// # Variants
/// - `Class`: each prefix class counts its own suffix pairs.
/// - `Vocabulary`: counts are pooled over every class, so a transformation
///   seen across many unrelated words (`ed`/`ing`) becomes frequent faster.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PairScope {
	#[default]
	Class,
	Vocabulary,
}

/// Parameters of the suffix-pair clustering stemmer.
///
/// # Invariants
/// - `l >= 1`
/// - `alpha >= 1`
/// - `delta` is finite and non-negative
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct StemmerConfig {
	/// Minimum common prefix length (in characters) of a class.
	pub l: usize,

	/// Minimum frequency for a suffix pair to link two words.
	pub alpha: u32,

	/// Scope of the suffix-pair tallies.
	pub pair_scope: PairScope,

	/// Minimum cohesion for a neighbor to join the pivot's cluster.
	delta: f64,
}

impl Default for StemmerConfig {
	fn default() -> Self {
		Self { l: 5, alpha: 4, pair_scope: PairScope::Class, delta: 0.8 }
	}
}

impl StemmerConfig {
	pub fn delta(&self) -> f64 {
		self.delta
	}

	/// Sets the cohesion cutoff.
	///
	/// # Errors
	/// Returns an error if the value is negative or not finite.
	pub fn set_delta(&mut self, delta: f64) -> Result<()> {
		if !delta.is_finite() || delta < 0.0 {
			return Err(LexisError::InvalidConfig(format!("delta must be finite and >= 0, got {}", delta)));
		}
		self.delta = delta;
		Ok(())
	}

	pub fn validate(&self) -> Result<()> {
		if self.l == 0 {
			return Err(LexisError::InvalidConfig("l must be >= 1".to_owned()));
		}
		if self.alpha == 0 {
			return Err(LexisError::InvalidConfig("alpha must be >= 1".to_owned()));
		}
		if !self.delta.is_finite() || self.delta < 0.0 {
			return Err(LexisError::InvalidConfig(format!("delta must be finite and >= 0, got {}", self.delta)));
		}
		Ok(())
	}
}

type SuffixPair<'a> = (&'a str, &'a str);

/// Stemmer inferring stems from suffix transformations shared by similar words.
///
/// # Behavior
/// 1. Partition the sorted vocabulary into classes sharing an `l`-character prefix.
/// 2. Count suffix pairs (what is left of two words after their longest common
///    prefix) and keep the ones seen at least `alpha` times.
/// 3. Link words of a class whose suffix pair is frequent, weighted by that frequency.
/// 4. Repeatedly take the highest-degree word as pivot, keep the neighbors whose
///    cohesion reaches `delta`, stem the cluster to its longest common prefix and
///    remove it from the graph.
///
/// Words outside every cluster stem to themselves.
#[derive(Clone, Debug)]
pub struct SuffixClusterStemmer {
	config: StemmerConfig,
}

impl SuffixClusterStemmer {
	/// # Errors
	/// Returns an error if the configuration is invalid.
	pub fn new(config: StemmerConfig) -> Result<Self> {
		config.validate()?;
		Ok(Self { config })
	}

	pub fn config(&self) -> &StemmerConfig {
		&self.config
	}

	/// Stems a set of words.
	///
	/// Input order and duplicates do not matter. The output maps every
	/// distinct input word to its stem and iterates in sorted order.
	pub fn stem<I, S>(&self, words: I) -> BTreeMap<String, String>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let vocabulary: BTreeSet<String> = words.into_iter().map(|w| w.as_ref().to_owned()).collect();
		let words: Vec<String> = vocabulary.into_iter().collect();
		let stems = self.stem_sorted(&words);
		words.into_iter().zip(stems).collect()
	}

	/// Stems a lexicographically sorted array of distinct words.
	///
	/// Returns one stem per input position.
	///
	/// # Notes
	/// - Sortedness is a precondition: classes are contiguous runs, so on
	///   unsorted input the class boundaries and the stems are undefined.
	pub fn stem_sorted(&self, words: &[String]) -> Vec<String> {
		if !words.is_sorted() {
			warn!("stemmer input is not sorted; class boundaries are undefined");
		}

		let classes = partition(words, self.config.l);
		info!("stemming {} words in {} classes", words.len(), classes.len());

		let pooled = (self.config.pair_scope == PairScope::Vocabulary)
			.then(|| suffix_pair_frequencies(words, &classes, self.config.alpha));

		let mut stems: Vec<Option<String>> = vec![None; words.len()];
		for class in &classes {
			let local;
			let frequencies = match &pooled {
				Some(frequencies) => frequencies,
				None => {
					local = suffix_pair_frequencies(words, std::slice::from_ref(class), self.config.alpha);
					&local
				}
			};

			let members = &words[class.clone()];
			let mut graph = build_graph(members, frequencies);
			self.cluster(&mut graph, members, &mut stems[class.clone()]);
		}

		words
			.iter()
			.zip(stems)
			.map(|(word, stem)| stem.unwrap_or_else(|| word.clone()))
			.collect()
	}

	/// Greedily drains a class graph into stem clusters.
	fn cluster(&self, graph: &mut WeightedGraph, members: &[String], stems: &mut [Option<String>]) {
		let mut clusters = 0;
		while let Some(pivot) = graph.max_degree_node() {
			let mut cluster = vec![pivot];

			let candidates: Vec<usize> = graph.neighbors(pivot).collect();
			for candidate in candidates {
				// The candidate is still linked to the pivot, so its degree is >= 1
				let cohesion =
					(1 + graph.common_neighbors(pivot, candidate)) as f64 / graph.degree(candidate) as f64;
				if cohesion >= self.config.delta {
					cluster.push(candidate);
				} else {
					graph.remove_edge(pivot, candidate);
				}
			}

			let stem = common_stem(cluster.iter().map(|&node| members[node].as_str()));
			for node in cluster {
				stems[node] = Some(stem.to_owned());
				graph.remove_node(node);
			}
			clusters += 1;
		}
		debug!("class of {} words split into {} clusters", members.len(), clusters);
	}
}

/// Maps tokens through a stem table; unknown tokens pass through unchanged.
pub fn stem_tokens<S: AsRef<str>>(stems: &BTreeMap<String, String>, tokens: &[S]) -> Vec<String> {
	tokens
		.iter()
		.map(|token| {
			let token = token.as_ref();
			stems.get(token).cloned().unwrap_or_else(|| token.to_owned())
		})
		.collect()
}

/// Splits the sorted words into maximal runs sharing their first `l` characters.
///
/// Words shorter than `l` never join a class; runs of a single word are dropped.
fn partition(words: &[String], l: usize) -> Vec<Range<usize>> {
	let mut classes = Vec::new();
	let mut start = 0;

	while start < words.len() {
		let Some(prefix) = prefix_of(&words[start], l) else {
			start += 1;
			continue;
		};

		let mut end = start + 1;
		while end < words.len() && prefix_of(&words[end], l) == Some(prefix) {
			end += 1;
		}
		if end - start >= 2 {
			classes.push(start..end);
		}
		start = end;
	}

	classes
}

/// First `l` characters of `word`, if it has that many.
fn prefix_of(word: &str, l: usize) -> Option<&str> {
	let end = word.char_indices().map(|(i, _)| i).chain(std::iter::once(word.len())).nth(l)?;
	Some(&word[..end])
}

/// Byte length of the longest common prefix, on character boundaries.
fn common_prefix_len(a: &str, b: &str) -> usize {
	a.char_indices()
		.zip(b.chars())
		.find(|((_, x), y)| x != y)
		.map(|((i, _), _)| i)
		.unwrap_or_else(|| a.len().min(b.len()))
}

/// Residual suffixes of two words after their longest common prefix.
fn suffix_pair<'a>(a: &'a str, b: &'a str) -> SuffixPair<'a> {
	let r = common_prefix_len(a, b);
	(&a[r..], &b[r..])
}

/// Counts suffix pairs over every word pair of the given classes and keeps
/// the ones reaching `alpha`.
fn suffix_pair_frequencies<'a>(
	words: &'a [String],
	classes: &[Range<usize>],
	alpha: u32,
) -> HashMap<SuffixPair<'a>, u32> {
	let mut counts: HashMap<SuffixPair<'a>, u32> = HashMap::new();
	for class in classes {
		for j in class.clone() {
			for k in j + 1..class.end {
				*counts.entry(suffix_pair(&words[j], &words[k])).or_insert(0) += 1;
			}
		}
	}
	counts.retain(|_, frequency| *frequency >= alpha);
	counts
}

/// One node per class member; an edge wherever the suffix pair is frequent.
fn build_graph<'a>(members: &'a [String], frequencies: &HashMap<SuffixPair<'a>, u32>) -> WeightedGraph {
	let mut graph = WeightedGraph::new(members.len());
	for j in 0..members.len() {
		for k in j + 1..members.len() {
			if let Some(frequency) = frequencies.get(&suffix_pair(&members[j], &members[k])) {
				graph.add_edge(j, k, *frequency);
			}
		}
	}
	graph
}

/// Longest common prefix of all words, narrowed from the first one.
fn common_stem<'a, I: Iterator<Item = &'a str>>(mut words: I) -> &'a str {
	let Some(mut stem) = words.next() else {
		return "";
	};
	for word in words {
		if !word.starts_with(stem) {
			stem = &stem[..common_prefix_len(stem, word)];
		}
	}
	stem
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn stemmer(l: usize, alpha: u32, delta: f64) -> SuffixClusterStemmer {
		let mut config = StemmerConfig { l, alpha, ..StemmerConfig::default() };
		config.set_delta(delta).unwrap();
		SuffixClusterStemmer::new(config).unwrap()
	}

	#[test]
	fn run_forms_share_a_stem() {
		let stems = stemmer(3, 1, 0.5).stem(["running", "runner", "runs", "jumps"]);
		assert_eq!(stems["running"], "run");
		assert_eq!(stems["runner"], "run");
		assert_eq!(stems["runs"], "run");
		assert_eq!(stems["jumps"], "jumps");
	}

	#[test]
	fn empty_input_gives_empty_mapping() {
		let stems = stemmer(3, 1, 0.5).stem(Vec::<String>::new());
		assert!(stems.is_empty());
	}

	#[test]
	fn short_words_stay_unclassed() {
		let stems = stemmer(5, 1, 0.5).stem(["run", "runs", "ran"]);
		assert_eq!(stems["run"], "run");
		assert_eq!(stems["runs"], "runs");
	}

	#[test]
	fn partition_keeps_runs_of_two_or_more() {
		let words: Vec<String> = ["ab", "abca", "abcb", "abd", "xyzq"].iter().map(|w| w.to_string()).collect();
		assert_eq!(partition(&words, 3), vec![1..3]);
		assert_eq!(partition(&words, 2), vec![0..4]);
	}

	#[test]
	fn prefixes_respect_char_boundaries() {
		assert_eq!(prefix_of("été", 2), Some("ét"));
		assert_eq!(prefix_of("été", 3), Some("été"));
		assert_eq!(prefix_of("été", 4), None);
		assert_eq!(suffix_pair("éteindre", "éteint"), ("dre", "t"));
		assert_eq!(suffix_pair("run", "runs"), ("", "s"));
	}

	#[test]
	fn alpha_filters_rare_suffix_pairs() {
		let words = ["walked", "walking", "talked", "talking", "jumped", "jumping"];

		// each class sees ("ed", "ing") once
		let per_class = stemmer(3, 2, 0.5).stem(words);
		assert!(per_class.iter().all(|(word, stem)| word == stem));

		let mut config = StemmerConfig { l: 3, alpha: 2, pair_scope: PairScope::Vocabulary, ..StemmerConfig::default() };
		config.set_delta(0.5).unwrap();
		let pooled = SuffixClusterStemmer::new(config).unwrap().stem(words);
		assert_eq!(pooled["walking"], "walk");
		assert_eq!(pooled["talked"], "talk");
		assert_eq!(pooled["jumped"], "jump");
	}

	#[test]
	fn low_cohesion_neighbors_wait_for_their_own_cluster() {
		let members: Vec<String> =
			["abca", "abcb", "abcc", "abxa", "abxb", "abxc"].iter().map(|w| w.to_string()).collect();
		let build = || {
			let mut graph = WeightedGraph::new(members.len());
			graph.add_edge(0, 1, 1);
			graph.add_edge(0, 2, 1);
			graph.add_edge(0, 3, 1);
			graph.add_edge(3, 4, 1);
			graph.add_edge(3, 5, 1);
			graph
		};

		let mut stems = vec![None; members.len()];
		stemmer(2, 1, 0.5).cluster(&mut build(), &members, &mut stems);
		let stems: Vec<String> = stems.into_iter().map(Option::unwrap).collect();
		assert_eq!(stems, vec!["abc", "abc", "abc", "abx", "abx", "abx"]);

		let mut stems = vec![None; members.len()];
		stemmer(2, 1, 0.0).cluster(&mut build(), &members, &mut stems);
		let stems: Vec<String> = stems.into_iter().map(Option::unwrap).collect();
		assert_eq!(stems, vec!["ab", "ab", "ab", "ab", "abxb", "abxc"]);
	}

	#[test]
	fn stem_tokens_passes_unknown_through() {
		let stems = BTreeMap::from([("runs".to_owned(), "run".to_owned())]);
		assert_eq!(stem_tokens(&stems, &["runs", "fast"]), vec!["run", "fast"]);
	}

	#[test]
	fn invalid_config_is_rejected() {
		assert!(SuffixClusterStemmer::new(StemmerConfig { l: 0, ..StemmerConfig::default() }).is_err());
		assert!(SuffixClusterStemmer::new(StemmerConfig { alpha: 0, ..StemmerConfig::default() }).is_err());
		assert!(StemmerConfig::default().set_delta(-0.1).is_err());
	}

	proptest! {
		#[test]
		fn every_word_maps_to_a_prefix_stem(
			words in proptest::collection::vec("[a-c]{1,6}", 0..30),
			l in 1usize..4,
			alpha in 1u32..3,
			delta in 0.0f64..1.5,
		) {
			let stems = stemmer(l, alpha, delta).stem(&words);
			let distinct: BTreeSet<&str> = words.iter().map(String::as_str).collect();
			prop_assert_eq!(stems.len(), distinct.len());
			for word in &distinct {
				let stem = &stems[*word];
				prop_assert!(!stem.is_empty());
				prop_assert!(word.starts_with(stem.as_str()), "{} -> {}", word, stem);
			}
		}
	}
}
