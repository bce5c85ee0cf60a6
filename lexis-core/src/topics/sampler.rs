use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seedable source of topic draws.
///
/// Two samplers built from the same seed produce the same sequence of
/// draws. Without a seed the generator is seeded from the OS.
#[derive(Clone, Debug)]
pub struct TopicSampler {
	rng: StdRng,
}

impl TopicSampler {
	pub fn new(seed: Option<u64>) -> Self {
		let rng = match seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_os_rng(),
		};
		Self { rng }
	}

	/// Draws uniformly in `0..k`.
	///
	/// # Panics
	/// Panics if `k == 0`.
	pub fn uniform(&mut self, k: usize) -> usize {
		self.rng.random_range(0..k)
	}

	/// Draws an index with probability proportional to its weight.
	///
	/// # Notes
	/// - Weights must be non-negative.
	/// - A zero or non-finite total falls back to a uniform draw.
	///
	/// # Panics
	/// Panics if `weights` is empty.
	pub fn sample(&mut self, weights: &[f64]) -> usize {
		let total: f64 = weights.iter().sum();
		if !total.is_finite() || total <= 0.0 {
			return self.uniform(weights.len());
		}

		let threshold = self.rng.random::<f64>() * total;
		let mut cumulative = 0.0;
		for (index, weight) in weights.iter().enumerate() {
			cumulative += weight;
			if threshold < cumulative {
				return index;
			}
		}

		// Rounding can leave the threshold just above the last partial sum
		weights.iter().rposition(|weight| *weight > 0.0).unwrap_or(weights.len() - 1)
	}
}
