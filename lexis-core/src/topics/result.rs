use serde::{Deserialize, Serialize};

use super::corpus::Corpus;
use super::model::{TopicModelConfig, TopicModelKind};
use crate::error::Result;

/// Echo of the run's hyperparameters and corpus size.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TopicModelParameters {
	pub kind: TopicModelKind,
	pub num_topics: usize,
	pub alpha: f64,
	pub beta: f64,
	pub num_iterations: usize,
	pub top_words: usize,
	pub seed: Option<u64>,
	pub documents: usize,
	pub vocabulary_size: usize,
}

impl TopicModelParameters {
	fn new(config: &TopicModelConfig, corpus: &Corpus) -> Self {
		Self {
			kind: config.kind,
			num_topics: config.num_topics(),
			alpha: config.alpha(),
			beta: config.beta(),
			num_iterations: config.num_iterations,
			top_words: config.top_words(),
			seed: config.seed,
			documents: corpus.len(),
			vocabulary_size: corpus.vocabulary().len(),
		}
	}
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TopicWord {
	pub word: String,
	/// Smoothed probability, rounded to 6 decimal places.
	pub probability: f64,
}

/// The most probable words of one topic, best first.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TopicWords {
	pub topic: usize,
	pub words: Vec<TopicWord>,
}

/// Final state of a topic model run.
///
/// Documents are indexed as in the corpus (empty documents excluded);
/// `source_indices` maps them back to the caller's input.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TopicModelResult {
	pub parameters: TopicModelParameters,

	/// Word of each vocabulary id.
	pub vocabulary: Vec<String>,

	pub source_indices: Vec<usize>,

	/// Topic of every token, per document. One-topic-per-document models
	/// repeat the document topic for each token.
	pub topic_assignments: Vec<Vec<usize>>,

	pub top_words: Vec<TopicWords>,

	/// `[topic][word]`, smoothed; every row sums to 1.
	pub topic_word_probabilities: Vec<Vec<f64>>,

	/// `[topic][word]` raw counts.
	pub topic_word_counts: Vec<Vec<usize>>,

	/// `[document][topic]` raw counts. One-topic-per-document models hold a
	/// single 1 per row.
	pub doc_topic_counts: Vec<Vec<usize>>,

	/// `[document][topic]`, smoothed. Absent for one-topic-per-document
	/// models, whose counts already say everything.
	pub doc_topic_probabilities: Option<Vec<Vec<f64>>>,
}

impl TopicModelResult {
	/// Assembles a result from the sampler's count tables.
	pub(super) fn from_counts(
		config: &TopicModelConfig,
		corpus: &Corpus,
		topic_assignments: Vec<Vec<usize>>,
		topic_word_counts: &[Vec<usize>],
		topic_totals: &[usize],
		doc_topic_counts: Vec<Vec<usize>>,
		doc_topic_probabilities: Option<Vec<Vec<f64>>>,
	) -> Self {
		let vocabulary = corpus.vocabulary().words().to_vec();
		let beta = config.beta();
		let beta_v = beta * vocabulary.len() as f64;

		let topic_word_probabilities: Vec<Vec<f64>> = topic_word_counts
			.iter()
			.zip(topic_totals)
			.map(|(row, &total)| {
				let denominator = total as f64 + beta_v;
				row.iter().map(|&count| (count as f64 + beta) / denominator).collect()
			})
			.collect();

		let top_words = topic_word_counts
			.iter()
			.zip(&topic_word_probabilities)
			.enumerate()
			.map(|(topic, (counts, probabilities))| TopicWords {
				topic,
				words: top_words_of(counts, probabilities, &vocabulary, config.top_words()),
			})
			.collect();

		Self {
			parameters: TopicModelParameters::new(config, corpus),
			source_indices: corpus.source_indices().to_vec(),
			vocabulary,
			topic_assignments,
			top_words,
			topic_word_probabilities,
			topic_word_counts: topic_word_counts.to_vec(),
			doc_topic_counts,
			doc_topic_probabilities,
		}
	}

	/// Pretty-printed JSON export.
	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}

	/// The topic holding most tokens of a document.
	///
	/// Ties go to the lowest topic id; `None` for an unknown document.
	pub fn dominant_topic(&self, document: usize) -> Option<usize> {
		let row = self.doc_topic_counts.get(document)?;
		row.iter()
			.enumerate()
			.fold(None, |best: Option<(usize, usize)>, (topic, &count)| match best {
				Some((_, best_count)) if best_count >= count => best,
				_ => Some((topic, count)),
			})
			.map(|(topic, _)| topic)
	}
}

/// Ranks words by count (equivalently by smoothed probability), lower id first
/// among ties.
fn top_words_of(counts: &[usize], probabilities: &[f64], vocabulary: &[String], n: usize) -> Vec<TopicWord> {
	let mut ids: Vec<usize> = (0..counts.len()).collect();
	ids.sort_by(|a, b| counts[*b].cmp(&counts[*a]).then(a.cmp(b)));
	ids.into_iter()
		.take(n)
		.map(|id| TopicWord { word: vocabulary[id].clone(), probability: round6(probabilities[id]) })
		.collect()
}

fn round6(value: f64) -> f64 {
	(value * 1e6).round() / 1e6
}

#[cfg(test)]
mod tests {
	use super::*;

	fn result() -> TopicModelResult {
		let corpus = Corpus::from_texts(&["a b a", "c"]).unwrap();
		let config = TopicModelConfig::dmm(2, 2).unwrap();
		TopicModelResult::from_counts(
			&config,
			&corpus,
			vec![vec![0, 0, 0], vec![1]],
			&[vec![2, 1, 0], vec![0, 0, 1]],
			&[3, 1],
			vec![vec![1, 0], vec![0, 1]],
			None,
		)
	}

	#[test]
	fn probability_rows_are_normalized() {
		let result = result();
		for row in &result.topic_word_probabilities {
			let sum: f64 = row.iter().sum();
			assert!((sum - 1.0).abs() < 1e-9);
		}
	}

	#[test]
	fn top_words_are_ranked_and_rounded() {
		let result = result();
		let first: Vec<&str> = result.top_words[0].words.iter().map(|w| w.word.as_str()).collect();
		assert_eq!(first, vec!["a", "b"]);
		// (2 + 0.1) / (3 + 0.3)
		assert_eq!(result.top_words[0].words[0].probability, 0.636364);
		let second: Vec<&str> = result.top_words[1].words.iter().map(|w| w.word.as_str()).collect();
		assert_eq!(second, vec!["c", "a"]);
	}

	#[test]
	fn dominant_topic_reads_counts() {
		let result = result();
		assert_eq!(result.dominant_topic(0), Some(0));
		assert_eq!(result.dominant_topic(1), Some(1));
		assert_eq!(result.dominant_topic(2), None);
	}

	#[test]
	fn json_export_round_trips() {
		let result = result();
		let json = result.to_json().unwrap();
		assert!(json.contains("\"doc_topic_probabilities\": null"));
		let back: TopicModelResult = serde_json::from_str(&json).unwrap();
		assert_eq!(back.vocabulary, result.vocabulary);
		assert_eq!(back.doc_topic_counts, result.doc_topic_counts);
		assert_eq!(back.parameters.kind, TopicModelKind::Dmm);
		for (a, b) in back.topic_word_probabilities.iter().flatten().zip(result.topic_word_probabilities.iter().flatten()) {
			assert!((a - b).abs() < 1e-12);
		}
	}
}
