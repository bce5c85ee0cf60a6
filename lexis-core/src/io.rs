use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::{env, fs, io};

/// Reads a corpus file and returns one document per non-blank line.
///
/// - Lines are trimmed
/// - Blank lines are skipped
pub(crate) fn read_documents<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let reader = BufReader::new(File::open(filename)?);
	let mut documents = Vec::new();
	for line in reader.lines() {
		let line = line?;
		let line = line.trim();
		if !line.is_empty() {
			documents.push(line.to_owned());
		}
	}
	Ok(documents)
}

/// Builds the path of the binary cache that sits next to a corpus file.
///
/// Example:
/// `corpora/en.txt` → `corpora/en.bin`
pub(crate) fn cache_path<P: AsRef<Path>>(corpus_path: P) -> io::Result<PathBuf> {
	let corpus_path = corpus_path.as_ref();

	let parent = corpus_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = corpus_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Corpus path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension("bin");

	Ok(output)
}

/// Extracts the language label of a corpus file (its name without extension).
///
/// Examples:
/// - `"./corpora/en.txt"` → `"en"`
/// - `"de.txt"` → `"de"`
pub(crate) fn language_label<P: AsRef<Path>>(corpus_path: P) -> io::Result<String> {
	let stem = corpus_path
		.as_ref()
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Resolves a corpus folder.
///
/// `"."` and `"./"` resolve to the current working directory; anything else
/// is taken as-is.
pub(crate) fn resolve_folder(input: &Path) -> PathBuf {
	if input == Path::new(".") || input == Path::new("./") {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		input.to_path_buf()
	}
}

/// Lists the files of a folder carrying the given extension, sorted by name.
pub(crate) fn list_corpus_files<P: AsRef<Path>>(dir: P, extension: &str) -> io::Result<Vec<PathBuf>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();
		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			files.push(path);
		}
	}
	files.sort();

	Ok(files)
}
