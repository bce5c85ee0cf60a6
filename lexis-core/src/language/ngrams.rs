/// Normalizes a raw message before n-gram extraction.
///
/// - Lowercases every character
/// - Turns digits, punctuation, symbols and control characters into separators
/// - Collapses separator runs into a single space and trims both ends
///
/// Combining marks are kept, so scripts that rely on them survive intact.
pub fn normalize(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut pending_space = false;

	for c in text.chars() {
		if is_separator(c) {
			pending_space = true;
			continue;
		}
		if pending_space && !out.is_empty() {
			out.push(' ');
		}
		pending_space = false;
		out.extend(c.to_lowercase());
	}

	out
}

fn is_separator(c: char) -> bool {
	c.is_whitespace() || c.is_numeric() || c.is_control() || c.is_ascii_punctuation() || is_symbol(c)
}

// Common non-ASCII punctuation seen in chat text.
fn is_symbol(c: char) -> bool {
	matches!(c, '«' | '»' | '“' | '”' | '‘' | '’' | '„' | '…' | '–' | '—' | '¡' | '¿' | '•' | '·')
}

/// Splits a normalized text into overlapping character n-grams.
///
/// - A sliding window of `n` characters produces `len - n + 1` n-grams
/// - A non-empty text shorter than `n` is padded with spaces into exactly one n-gram
/// - An empty text (or `n == 0`) yields nothing
///
/// # Notes
/// - UTF-8 safe: windows are taken over characters, not bytes.
pub fn extract_ngrams(text: &str, n: usize) -> Vec<String> {
	if n == 0 || text.is_empty() {
		return Vec::new();
	}

	let chars: Vec<char> = text.chars().collect();
	if chars.len() < n {
		let mut ngram: String = chars.iter().collect();
		ngram.extend(std::iter::repeat_n(' ', n - chars.len()));
		return vec![ngram];
	}

	chars.windows(n).map(|window| window.iter().collect()).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalize_collapses_noise() {
		assert_eq!(normalize("  Hello,   WORLD!! 42 times "), "hello world times");
		assert_eq!(normalize("...!!!"), "");
	}

	#[test]
	fn sliding_window_over_chars() {
		assert_eq!(extract_ngrams("hello", 3), vec!["hel", "ell", "llo"]);
		assert_eq!(extract_ngrams("добро", 4), vec!["добр", "обро"]);
	}

	#[test]
	fn short_text_is_padded() {
		assert_eq!(extract_ngrams("hi", 3), vec!["hi "]);
		assert_eq!(extract_ngrams("abc", 3), vec!["abc"]);
	}

	#[test]
	fn empty_text_has_no_ngrams() {
		assert!(extract_ngrams("", 3).is_empty());
		assert!(extract_ngrams("abc", 0).is_empty());
	}
}
