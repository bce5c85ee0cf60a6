//! Topic models over short documents, inferred by collapsed Gibbs sampling.
//!
//! Two models share one corpus representation and one result shape:
//! - `DocumentMixtureModel` assigns a single topic to every document
//! - `LatentDirichletModel` assigns a topic to every token
//!
//! Both run a fixed number of sweeps; a seed makes runs reproducible.

/// Vocabulary and id-encoded documents.
pub mod corpus;

/// Seedable categorical draws.
pub mod sampler;

/// Dirichlet Multinomial Mixture.
pub mod dmm;

/// Latent Dirichlet Allocation.
pub mod lda;

/// Inference output.
pub mod result;

/// Model configuration, the shared sampling loop and the multi-model runner.
pub mod model;

pub use corpus::{Corpus, Vocabulary};
pub use dmm::DocumentMixtureModel;
pub use lda::LatentDirichletModel;
pub use model::{run_models, TopicModel, TopicModelConfig, TopicModelKind};
pub use result::{TopicModelParameters, TopicModelResult, TopicWord, TopicWords};
pub use sampler::TopicSampler;
