use std::ffi::{CStr,CString};
use std::mem;
use std::path::Path;

use crate::error::{PipelineError,Result};
use crate::pipeline::{INPUT,OUTPUT,PIPE};
use crate::types::Word;

// glibc's GLOB_TILDE, which the libc crate does not export
const GLOB_TILDE: libc::c_int = 1 << 12;

fn has_magic(word: &str) -> bool {
	word.contains(['*', '?', '[', '~'])
}

fn expand_tilde(word: &str, home: &Path) -> String {
	if word == "~" {
		home.to_string_lossy().into_owned()
	} else if let Some(rest) = word.strip_prefix("~/") {
		home.join(rest).to_string_lossy().into_owned()
	} else {
		word.to_string()
	}
}

/// Matches `pattern` with glob(3). An unmatched pattern comes back as itself.
pub fn glob(pattern: &str) -> Vec<Word> {
	let c_pattern = match CString::new(pattern) {
		Ok(c) => c,
		Err(_) => return vec![pattern.to_string()],
	};
	let mut matches = vec![];
	unsafe {
		let mut g: libc::glob_t = mem::zeroed();
		if libc::glob(c_pattern.as_ptr(), libc::GLOB_NOCHECK | GLOB_TILDE, None, &mut g) == 0 {
			for i in 0 .. g.gl_pathc as usize {
				let p = *g.gl_pathv.add(i);
				matches.push(CStr::from_ptr(p).to_string_lossy().into_owned());
			}
		}
		libc::globfree(&mut g);
	}
	if matches.is_empty() {
		matches.push(pattern.to_string());
	}
	matches
}

fn is_operator(word: &str) -> bool {
	word == PIPE || word == INPUT || word == OUTPUT
}

/// Appends the matches of one pattern. A match spelled like an operator makes
/// the line invalid, since the parser could not tell it from one.
fn splice(out: &mut Vec<Word>, matches: Vec<Word>) -> Result<()> {
	if matches.iter().any(|m| is_operator(m)) {
		return Err(PipelineError::InvalidPipeline("glob matched an operator"));
	}
	out.extend(matches);
	Ok(())
}

/// Replaces every wildcard word after the program name with its matches, in
/// place.
pub fn expand(words: Vec<Word>, home: &Path) -> Result<Vec<Word>> {
	let mut out = Vec::with_capacity(words.len());
	for (i, word) in words.into_iter().enumerate() {
		if i == 0 || !has_magic(&word) {
			out.push(word);
		} else {
			splice(&mut out, glob(&expand_tilde(&word, home)))?;
		}
	}
	Ok(out)
}
