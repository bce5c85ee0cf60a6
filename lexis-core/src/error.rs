use thiserror::Error;

/// Errors raised by the mining engines.
///
/// Every failure is either an I/O problem, a malformed persisted model or a
/// configuration mistake. Nothing here is transient, so nothing is retried.
#[derive(Error, Debug)]
pub enum LexisError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("binary model error: {0}")]
	Binary(#[from] postcard::Error),

	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	#[error("corpus contains no non-empty document")]
	EmptyCorpus,

	#[error("malformed model: {0}")]
	MalformedModel(String),

	#[error("model mismatch: {0}")]
	Mismatch(String),
}

pub type Result<T> = std::result::Result<T, LexisError>;
