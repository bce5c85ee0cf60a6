use super::corpus::Corpus;
use super::model::{TopicModel, TopicModelConfig, TopicModelKind};
use super::result::TopicModelResult;
use super::sampler::TopicSampler;
use crate::error::{LexisError, Result};

/// Dirichlet Multinomial Mixture: every document belongs to exactly one topic.
///
/// Suited to short texts, where a message rarely mixes subjects.
///
/// # Invariants
/// - `doc_topic[k]` is the number of documents assigned to `k`
/// - `topic_word[k][w]` counts occurrences of `w` in documents assigned to `k`
/// - `topic_totals[k]` is the row sum of `topic_word[k]`
pub struct DocumentMixtureModel<'a> {
	corpus: &'a Corpus,
	config: TopicModelConfig,
	sampler: TopicSampler,

	assignments: Vec<usize>,
	doc_topic: Vec<usize>,
	topic_word: Vec<Vec<usize>>,
	topic_totals: Vec<usize>,

	/// Per token, how many times its word already appeared earlier in the document.
	repeats: Vec<Vec<usize>>,
}

impl<'a> DocumentMixtureModel<'a> {
	/// Creates the model and draws every document's initial topic uniformly.
	///
	/// # Errors
	/// Returns an error if the configuration is invalid or not a DMM one.
	pub fn new(corpus: &'a Corpus, config: TopicModelConfig) -> Result<Self> {
		config.validate()?;
		if config.kind != TopicModelKind::Dmm {
			return Err(LexisError::InvalidConfig(format!("expected a DMM configuration, got {:?}", config.kind)));
		}

		let k = config.num_topics();
		let v = corpus.vocabulary().len();
		let mut sampler = TopicSampler::new(config.seed);
		let assignments = corpus.documents().iter().map(|_| sampler.uniform(k)).collect();

		let mut model = Self {
			corpus,
			config,
			sampler,
			assignments,
			doc_topic: vec![0; k],
			topic_word: vec![vec![0; v]; k],
			topic_totals: vec![0; k],
			repeats: corpus.documents().iter().map(|document| repeat_ranks(document, v)).collect(),
		};

		for (d, document) in corpus.documents().iter().enumerate() {
			model.add(document, model.assignments[d]);
		}

		Ok(model)
	}

	fn add(&mut self, document: &[usize], topic: usize) {
		self.doc_topic[topic] += 1;
		for &word in document {
			self.topic_word[topic][word] += 1;
		}
		self.topic_totals[topic] += document.len();
	}

	fn remove(&mut self, document: &[usize], topic: usize) {
		self.doc_topic[topic] -= 1;
		for &word in document {
			self.topic_word[topic][word] -= 1;
		}
		self.topic_totals[topic] -= document.len();
	}

	/// Unnormalized log weight of `topic` for a document already removed from the counts.
	fn log_weight(&self, document: &[usize], repeats: &[usize], topic: usize) -> f64 {
		let alpha = self.config.alpha();
		let beta = self.config.beta();
		let beta_v = beta * self.corpus.vocabulary().len() as f64;

		let mut weight = (self.doc_topic[topic] as f64 + alpha).ln();
		for (position, (&word, &repeat)) in document.iter().zip(repeats).enumerate() {
			weight += (self.topic_word[topic][word] as f64 + beta + repeat as f64).ln();
			weight -= (self.topic_totals[topic] as f64 + beta_v + position as f64).ln();
		}
		weight
	}
}

impl TopicModel for DocumentMixtureModel<'_> {
	fn config(&self) -> &TopicModelConfig {
		&self.config
	}

	fn sweep(&mut self) {
		let corpus = self.corpus;
		let mut weights = vec![0.0; self.config.num_topics()];

		for (d, document) in corpus.documents().iter().enumerate() {
			self.remove(document, self.assignments[d]);

			let repeats = &self.repeats[d];
			for (topic, weight) in weights.iter_mut().enumerate() {
				*weight = self.log_weight(document, repeats, topic);
			}
			// Long documents underflow the product form
			let max = weights.iter().copied().fold(f64::NEG_INFINITY, f64::max);
			for weight in weights.iter_mut() {
				*weight = (*weight - max).exp();
			}

			let topic = self.sampler.sample(&weights);
			self.assignments[d] = topic;
			self.add(document, topic);
		}
	}

	fn result(&self) -> TopicModelResult {
		let k = self.config.num_topics();
		let topic_assignments = self
			.corpus
			.documents()
			.iter()
			.zip(&self.assignments)
			.map(|(document, &topic)| vec![topic; document.len()])
			.collect();
		let doc_topic_counts = self
			.assignments
			.iter()
			.map(|&topic| {
				let mut row = vec![0; k];
				row[topic] = 1;
				row
			})
			.collect();

		TopicModelResult::from_counts(
			&self.config,
			self.corpus,
			topic_assignments,
			&self.topic_word,
			&self.topic_totals,
			doc_topic_counts,
			None,
		)
	}
}

/// Number of earlier occurrences of each token's word within its document.
fn repeat_ranks(document: &[usize], vocabulary_size: usize) -> Vec<usize> {
	let mut seen = vec![0; vocabulary_size];
	document
		.iter()
		.map(|&word| {
			let repeat = seen[word];
			seen[word] += 1;
			repeat
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config(topics: usize, iterations: usize, seed: u64) -> TopicModelConfig {
		let mut config = TopicModelConfig::dmm(topics, 3).unwrap();
		config.num_iterations = iterations;
		config.seed = Some(seed);
		config
	}

	fn assert_consistent(model: &DocumentMixtureModel) {
		let k = model.config.num_topics();
		let mut doc_topic = vec![0; k];
		let mut topic_word = vec![vec![0; model.corpus.vocabulary().len()]; k];
		for (document, &topic) in model.corpus.documents().iter().zip(&model.assignments) {
			doc_topic[topic] += 1;
			for &word in document {
				topic_word[topic][word] += 1;
			}
		}
		assert_eq!(model.doc_topic, doc_topic);
		assert_eq!(model.topic_word, topic_word);
		for (row, total) in model.topic_word.iter().zip(&model.topic_totals) {
			assert_eq!(row.iter().sum::<usize>(), *total);
		}
		assert_eq!(model.doc_topic.iter().sum::<usize>(), model.corpus.len());
	}

	#[test]
	fn repeat_ranks_count_earlier_occurrences() {
		assert_eq!(repeat_ranks(&[0, 1, 0, 0, 2], 3), vec![0, 0, 1, 2, 0]);
	}

	#[test]
	fn counts_stay_consistent_after_every_sweep() {
		let corpus = Corpus::from_texts(&["a b a c", "b c", "d e d", "a", "e f f f"]).unwrap();
		let mut model = DocumentMixtureModel::new(&corpus, config(3, 0, 5)).unwrap();
		assert_consistent(&model);
		for _ in 0..30 {
			model.sweep();
			assert_consistent(&model);
		}
	}

	#[test]
	fn rejects_lda_configuration() {
		let corpus = Corpus::from_texts(&["a"]).unwrap();
		let config = TopicModelConfig::lda(2, 2).unwrap();
		assert!(DocumentMixtureModel::new(&corpus, config).is_err());
	}

	#[test]
	fn same_seed_same_result() {
		let corpus = Corpus::from_texts(&["a b", "c d", "a c", "b d e"]).unwrap();
		let first = DocumentMixtureModel::new(&corpus, config(2, 50, 17)).unwrap().infer();
		let second = DocumentMixtureModel::new(&corpus, config(2, 50, 17)).unwrap().infer();
		assert_eq!(first, second);
	}

	#[test]
	fn doc_topic_rows_are_one_hot() {
		let corpus = Corpus::from_texts(&["a b", "c d", "a c"]).unwrap();
		let result = DocumentMixtureModel::new(&corpus, config(4, 10, 2)).unwrap().infer();
		for (row, assignments) in result.doc_topic_counts.iter().zip(&result.topic_assignments) {
			assert_eq!(row.iter().sum::<usize>(), 1);
			let topic = row.iter().position(|&count| count == 1).unwrap();
			assert!(assignments.iter().all(|&t| t == topic));
		}
		assert!(result.doc_topic_probabilities.is_none());
	}

	#[test]
	fn long_documents_do_not_underflow() {
		let long = "a b c d e f g h ".repeat(200);
		let corpus = Corpus::from_texts(&[long.as_str(), "x y z", long.as_str()]).unwrap();
		let mut model = DocumentMixtureModel::new(&corpus, config(3, 0, 8)).unwrap();
		let document = &corpus.documents()[0];
		model.remove(document, model.assignments[0]);
		for topic in 0..3 {
			assert!(model.log_weight(document, &model.repeats[0], topic).is_finite());
		}
	}

	#[test]
	fn disjoint_documents_split_into_two_topics() {
		let texts = [
			"apple banana cherry apple",
			"banana cherry apple cherry",
			"apple cherry banana banana",
			"zebra yak xerus zebra",
			"yak xerus zebra yak",
			"xerus zebra yak xerus",
		];
		let corpus = Corpus::from_texts(&texts).unwrap();
		let result = DocumentMixtureModel::new(&corpus, config(2, 1000, 42)).unwrap().infer();

		let fruit = result.dominant_topic(0).unwrap();
		let animal = result.dominant_topic(3).unwrap();
		assert_ne!(fruit, animal);
		for d in 0..3 {
			assert_eq!(result.dominant_topic(d), Some(fruit));
			assert_eq!(result.dominant_topic(d + 3), Some(animal));
		}

		let words: Vec<&str> = result.top_words[fruit].words.iter().map(|w| w.word.as_str()).collect();
		assert!(words.iter().all(|w| ["apple", "banana", "cherry"].contains(w)));
	}
}
