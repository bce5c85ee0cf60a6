use std::collections::BTreeMap;
use std::thread;

use super::graph::LanguageGraph;

/// Anything able to score a text against a set of languages.
///
/// The n-gram graph is one implementation; an external detector can be
/// plugged in wherever a `LanguageDetector` is expected.
pub trait LanguageDetector {
	/// Returns `language → score`; an empty map means "unknown".
	fn detect(&self, text: &str) -> BTreeMap<String, f64>;
}

impl LanguageDetector for LanguageGraph {
	fn detect(&self, text: &str) -> BTreeMap<String, f64> {
		self.classify(text)
	}
}

/// Identifies the languages of a batch of messages.
///
/// Messages are split into one chunk per CPU core and scored on scoped
/// threads. The output is aligned with `texts`.
pub fn identify_languages<D, S>(detector: &D, texts: &[S]) -> Vec<BTreeMap<String, f64>>
where
	D: LanguageDetector + Sync,
	S: AsRef<str> + Sync,
{
	if texts.is_empty() {
		return Vec::new();
	}

	let chunk_size = texts.len().div_ceil(num_cpus::get().max(1));

	thread::scope(|scope| {
		let handles: Vec<_> = texts
			.chunks(chunk_size)
			.map(|chunk| {
				scope.spawn(move || chunk.iter().map(|text| detector.detect(text.as_ref())).collect::<Vec<_>>())
			})
			.collect();

		handles
			.into_iter()
			.flat_map(|handle| match handle.join() {
				Ok(scores) => scores,
				Err(payload) => std::panic::resume_unwind(payload),
			})
			.collect()
	})
}

/// Returns the best scoring language, if any.
///
/// Ties go to the language that sorts first.
pub fn dominant_language(scores: &BTreeMap<String, f64>) -> Option<(&str, f64)> {
	scores
		.iter()
		.fold(None, |best: Option<(&str, f64)>, (language, score)| match best {
			Some((_, best_score)) if best_score >= *score => best,
			_ => Some((language.as_str(), *score)),
		})
}
