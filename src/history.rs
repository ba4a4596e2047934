use std::fs::{self,OpenOptions};
use std::io::{self,Write};
use std::path::PathBuf;

use crate::types::Word;

pub const DEFAULT_SHOWN: usize = 10;

/// Append-only log of executed command lines, one per line.
#[derive(Debug)]
pub struct History {
	file: PathBuf,
}

impl History {
	pub fn new(file: PathBuf) -> History {
		History { file: file }
	}

	pub fn store(&self, words: &[Word]) -> io::Result<()> {
		let mut f = OpenOptions::new().append(true).create(true).open(&self.file)?;
		writeln!(f, "{}", words.join(" "))
	}

	pub fn lines(&self) -> io::Result<Vec<String>> {
		match fs::read(&self.file) {
			Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).lines().map(|l| l.to_string()).collect()),
			Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(vec![]),
			Err(e) => Err(e),
		}
	}

	/// The last `n` lines with their indices.
	pub fn tail(&self, n: usize) -> io::Result<Vec<(usize, String)>> {
		let lines = self.lines()?;
		let start = lines.len().saturating_sub(n);
		Ok(lines.into_iter().enumerate().skip(start).collect())
	}

	/// Line `index`, or the most recent line when `index` is `None`.
	pub fn get(&self, index: Option<usize>) -> io::Result<Option<String>> {
		let mut lines = self.lines()?;
		Ok(match index {
			Some(i) if i < lines.len() => Some(lines.swap_remove(i)),
			Some(_) => None,
			None => lines.pop(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn words(line: &str) -> Vec<Word> {
		line.split_whitespace().map(|s| s.to_string()).collect()
	}

	#[test]
	fn store_then_read_back() {
		let dir = tempfile::tempdir().unwrap();
		let h = History::new(dir.path().join("h"));
		assert!(h.lines().unwrap().is_empty());
		h.store(&words("ls -l")).unwrap();
		h.store(&words("seq 1 3 | grep 2")).unwrap();
		assert_eq!(h.lines().unwrap(), vec!["ls -l", "seq 1 3 | grep 2"]);
	}

	#[test]
	fn tail_keeps_indices() {
		let dir = tempfile::tempdir().unwrap();
		let h = History::new(dir.path().join("h"));
		for i in 0 .. 5 {
			h.store(&[format!("echo {}", i)]).unwrap();
		}
		assert_eq!(h.tail(2).unwrap(), vec![(3, "echo 3".to_string()), (4, "echo 4".to_string())]);
		assert_eq!(h.tail(DEFAULT_SHOWN).unwrap().len(), 5);
	}

	#[test]
	fn get_by_index_or_last() {
		let dir = tempfile::tempdir().unwrap();
		let h = History::new(dir.path().join("h"));
		assert_eq!(h.get(None).unwrap(), None);
		h.store(&words("pwd")).unwrap();
		h.store(&words("ls")).unwrap();
		assert_eq!(h.get(Some(0)).unwrap(), Some("pwd".to_string()));
		assert_eq!(h.get(None).unwrap(), Some("ls".to_string()));
		assert_eq!(h.get(Some(7)).unwrap(), None);
	}
}
