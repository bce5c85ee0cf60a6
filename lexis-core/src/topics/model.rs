use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::corpus::Corpus;
use super::dmm::DocumentMixtureModel;
use super::lda::LatentDirichletModel;
use super::result::TopicModelResult;
use crate::error::{LexisError, Result};

/// Granularity of topic assignments.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TopicModelKind {
	/// One topic per document (Dirichlet Multinomial Mixture).
	Dmm,
	/// One topic per token (Latent Dirichlet Allocation).
	Lda,
}

impl TopicModelKind {
	fn default_alpha(self) -> f64 {
		match self {
			TopicModelKind::Dmm => 0.1,
			TopicModelKind::Lda => 0.01,
		}
	}
}

/// Parameters of one topic model run.
///
/// # Invariants
/// - `num_topics >= 1`
/// - `alpha > 0` and `beta > 0`, both finite
/// - `top_words >= 1`
///
/// # Notes
/// - `seed` makes a run reproducible; `None` seeds from the OS.
/// - When read from JSON, missing fields take the defaults of `kind`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(try_from = "TopicModelConfigFile")]
pub struct TopicModelConfig {
	pub kind: TopicModelKind,
	num_topics: usize,
	alpha: f64,
	beta: f64,
	pub num_iterations: usize,
	top_words: usize,
	pub seed: Option<u64>,
}

/// JSON shape of a `TopicModelConfig`, before defaults and validation.
#[derive(Deserialize)]
struct TopicModelConfigFile {
	kind: TopicModelKind,
	num_topics: usize,
	top_words: usize,
	alpha: Option<f64>,
	beta: Option<f64>,
	num_iterations: Option<usize>,
	seed: Option<u64>,
}

impl TryFrom<TopicModelConfigFile> for TopicModelConfig {
	type Error = LexisError;

	fn try_from(file: TopicModelConfigFile) -> Result<Self> {
		let mut config = Self::new(file.kind, file.num_topics, file.top_words)?;
		if let Some(alpha) = file.alpha {
			config.set_alpha(alpha)?;
		}
		if let Some(beta) = file.beta {
			config.set_beta(beta)?;
		}
		if let Some(num_iterations) = file.num_iterations {
			config.num_iterations = num_iterations;
		}
		config.seed = file.seed;
		Ok(config)
	}
}

impl TopicModelConfig {
	/// Creates a configuration with the defaults of `kind`:
	/// beta 0.1, 1000 iterations, alpha 0.1 (DMM) or 0.01 (LDA).
	///
	/// # Errors
	/// Returns an error if `num_topics` or `top_words` is zero.
	pub fn new(kind: TopicModelKind, num_topics: usize, top_words: usize) -> Result<Self> {
		let config = Self {
			kind,
			num_topics,
			alpha: kind.default_alpha(),
			beta: 0.1,
			num_iterations: 1000,
			top_words,
			seed: None,
		};
		config.validate()?;
		Ok(config)
	}

	pub fn dmm(num_topics: usize, top_words: usize) -> Result<Self> {
		Self::new(TopicModelKind::Dmm, num_topics, top_words)
	}

	pub fn lda(num_topics: usize, top_words: usize) -> Result<Self> {
		Self::new(TopicModelKind::Lda, num_topics, top_words)
	}

	pub fn num_topics(&self) -> usize {
		self.num_topics
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn beta(&self) -> f64 {
		self.beta
	}

	pub fn top_words(&self) -> usize {
		self.top_words
	}

	pub fn set_num_topics(&mut self, num_topics: usize) -> Result<()> {
		if num_topics == 0 {
			return Err(LexisError::InvalidConfig("num_topics must be >= 1".to_owned()));
		}
		self.num_topics = num_topics;
		Ok(())
	}

	/// Sets the document-topic smoothing.
	///
	/// # Errors
	/// Returns an error if the value is not strictly positive and finite.
	pub fn set_alpha(&mut self, alpha: f64) -> Result<()> {
		check_smoothing("alpha", alpha)?;
		self.alpha = alpha;
		Ok(())
	}

	/// Sets the topic-word smoothing.
	///
	/// # Errors
	/// Returns an error if the value is not strictly positive and finite.
	pub fn set_beta(&mut self, beta: f64) -> Result<()> {
		check_smoothing("beta", beta)?;
		self.beta = beta;
		Ok(())
	}

	pub fn set_top_words(&mut self, top_words: usize) -> Result<()> {
		if top_words == 0 {
			return Err(LexisError::InvalidConfig("top_words must be >= 1".to_owned()));
		}
		self.top_words = top_words;
		Ok(())
	}

	pub fn validate(&self) -> Result<()> {
		if self.num_topics == 0 {
			return Err(LexisError::InvalidConfig("num_topics must be >= 1".to_owned()));
		}
		if self.top_words == 0 {
			return Err(LexisError::InvalidConfig("top_words must be >= 1".to_owned()));
		}
		check_smoothing("alpha", self.alpha)?;
		check_smoothing("beta", self.beta)
	}

	/// Builds the model described by this configuration over `corpus`.
	///
	/// Topic assignments are initialized at random.
	pub fn build<'a>(&self, corpus: &'a Corpus) -> Result<Box<dyn TopicModel + 'a>> {
		let model: Box<dyn TopicModel + 'a> = match self.kind {
			TopicModelKind::Dmm => Box::new(DocumentMixtureModel::new(corpus, self.clone())?),
			TopicModelKind::Lda => Box::new(LatentDirichletModel::new(corpus, self.clone())?),
		};
		Ok(model)
	}
}

fn check_smoothing(name: &str, value: f64) -> Result<()> {
	if !value.is_finite() || value <= 0.0 {
		return Err(LexisError::InvalidConfig(format!("{} must be finite and > 0, got {}", name, value)));
	}
	Ok(())
}

/// A topic model inferred by collapsed Gibbs sampling.
///
/// Implementors only define one sampling sweep and how to read their
/// state out; the fixed-budget loop is shared.
pub trait TopicModel {
	fn config(&self) -> &TopicModelConfig;

	/// Resamples every latent topic assignment once.
	fn sweep(&mut self);

	/// Snapshot of the current state.
	fn result(&self) -> TopicModelResult;

	/// Runs `num_iterations` sweeps and returns the final state.
	///
	/// There is no convergence test; the iteration budget is the only bound.
	fn infer(&mut self) -> TopicModelResult {
		let iterations = self.config().num_iterations;
		info!(
			"{:?} inference: {} topics, {} iterations",
			self.config().kind,
			self.config().num_topics(),
			iterations
		);
		for iteration in 1..=iterations {
			self.sweep();
			if iteration % 100 == 0 {
				debug!("{:?} iteration {}/{}", self.config().kind, iteration, iterations);
			}
		}
		info!("{:?} inference done", self.config().kind);
		self.result()
	}
}

/// Runs every configured model over the same corpus, in order.
///
/// # Errors
/// Returns the first configuration error met; no model runs after it.
pub fn run_models(corpus: &Corpus, configs: &[TopicModelConfig]) -> Result<Vec<TopicModelResult>> {
	configs.iter().map(|config| config.build(corpus).map(|mut model| model.infer())).collect()
}
