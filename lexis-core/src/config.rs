use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::language::LanguageGraphConfig;
use crate::stemming::StemmerConfig;
use crate::topics::TopicModelConfig;

/// Settings of every engine, as read from one JSON file.
///
/// ```json
/// {
///   "language": { "n": 3, "threshold": 0.0125, "max_depth": 1000, "mode": "log" },
///   "stemmer":  { "l": 5, "alpha": 4, "delta": 0.8, "pair_scope": "class" },
///   "topics":   [ { "kind": "dmm", "num_topics": 10, "top_words": 10, "seed": 1 } ]
/// }
/// ```
///
/// Every section is optional and falls back to its defaults. No topic model
/// runs unless one is listed.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct LexisConfig {
	pub language: LanguageGraphConfig,
	pub stemmer: StemmerConfig,
	pub topics: Vec<TopicModelConfig>,
}

impl LexisConfig {
	/// Parses and validates a JSON configuration.
	pub fn from_json_str(json: &str) -> Result<Self> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	/// Loads and validates a JSON configuration file.
	///
	/// # Errors
	/// Returns an error if the file cannot be read, is not valid JSON or
	/// holds an invalid value.
	pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
		let config = Self::from_json_str(&fs::read_to_string(&path)?)?;
		info!("loaded configuration {}", path.as_ref().display());
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		self.language.validate()?;
		self.stemmer.validate()?;
		self.topics.iter().try_for_each(TopicModelConfig::validate)
	}
}
