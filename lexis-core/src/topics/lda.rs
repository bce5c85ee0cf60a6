use super::corpus::Corpus;
use super::model::{TopicModel, TopicModelConfig, TopicModelKind};
use super::result::TopicModelResult;
use super::sampler::TopicSampler;
use crate::error::{LexisError, Result};

/// Latent Dirichlet Allocation: every token carries its own topic.
///
/// # Invariants
/// - `doc_topic[d][k]` counts tokens of document `d` assigned to `k`
/// - `topic_word[k][w]` counts occurrences of `w` assigned to `k`
/// - `topic_totals[k]` is the row sum of `topic_word[k]`
pub struct LatentDirichletModel<'a> {
	corpus: &'a Corpus,
	config: TopicModelConfig,
	sampler: TopicSampler,

	assignments: Vec<Vec<usize>>,
	doc_topic: Vec<Vec<usize>>,
	topic_word: Vec<Vec<usize>>,
	topic_totals: Vec<usize>,
}

impl<'a> LatentDirichletModel<'a> {
	/// Creates the model and draws every token's initial topic uniformly.
	///
	/// # Errors
	/// Returns an error if the configuration is invalid or not an LDA one.
	pub fn new(corpus: &'a Corpus, config: TopicModelConfig) -> Result<Self> {
		config.validate()?;
		if config.kind != TopicModelKind::Lda {
			return Err(LexisError::InvalidConfig(format!("expected an LDA configuration, got {:?}", config.kind)));
		}

		let k = config.num_topics();
		let v = corpus.vocabulary().len();
		let mut sampler = TopicSampler::new(config.seed);
		let assignments = corpus
			.documents()
			.iter()
			.map(|document| document.iter().map(|_| sampler.uniform(k)).collect())
			.collect();

		let mut model = Self {
			corpus,
			config,
			sampler,
			assignments,
			doc_topic: vec![vec![0; k]; corpus.len()],
			topic_word: vec![vec![0; v]; k],
			topic_totals: vec![0; k],
		};

		for (d, document) in corpus.documents().iter().enumerate() {
			for (position, &word) in document.iter().enumerate() {
				model.add(d, word, model.assignments[d][position]);
			}
		}

		Ok(model)
	}

	fn add(&mut self, d: usize, word: usize, topic: usize) {
		self.doc_topic[d][topic] += 1;
		self.topic_word[topic][word] += 1;
		self.topic_totals[topic] += 1;
	}

	fn remove(&mut self, d: usize, word: usize, topic: usize) {
		self.doc_topic[d][topic] -= 1;
		self.topic_word[topic][word] -= 1;
		self.topic_totals[topic] -= 1;
	}

	/// `(n_dk + alpha) / (n_d + K alpha)` per document and topic.
	fn doc_topic_probabilities(&self) -> Vec<Vec<f64>> {
		let alpha = self.config.alpha();
		let k_alpha = alpha * self.config.num_topics() as f64;
		self.doc_topic
			.iter()
			.zip(self.corpus.documents())
			.map(|(row, document)| {
				let denominator = document.len() as f64 + k_alpha;
				row.iter().map(|&count| (count as f64 + alpha) / denominator).collect()
			})
			.collect()
	}
}

impl TopicModel for LatentDirichletModel<'_> {
	fn config(&self) -> &TopicModelConfig {
		&self.config
	}

	fn sweep(&mut self) {
		let corpus = self.corpus;
		let alpha = self.config.alpha();
		let beta = self.config.beta();
		let beta_v = beta * corpus.vocabulary().len() as f64;
		let mut weights = vec![0.0; self.config.num_topics()];

		for (d, document) in corpus.documents().iter().enumerate() {
			for (position, &word) in document.iter().enumerate() {
				self.remove(d, word, self.assignments[d][position]);

				for (topic, weight) in weights.iter_mut().enumerate() {
					*weight = (self.doc_topic[d][topic] as f64 + alpha) * (self.topic_word[topic][word] as f64 + beta)
						/ (self.topic_totals[topic] as f64 + beta_v);
				}

				let topic = self.sampler.sample(&weights);
				self.assignments[d][position] = topic;
				self.add(d, word, topic);
			}
		}
	}

	fn result(&self) -> TopicModelResult {
		TopicModelResult::from_counts(
			&self.config,
			self.corpus,
			self.assignments.clone(),
			&self.topic_word,
			&self.topic_totals,
			self.doc_topic.clone(),
			Some(self.doc_topic_probabilities()),
		)
	}
}
