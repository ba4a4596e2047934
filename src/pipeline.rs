use std::path::PathBuf;

use crate::error::{PipelineError,Result};
use crate::types::*;

pub const PIPE: &str = "|";
pub const INPUT: &str = "<";
pub const OUTPUT: &str = ">";

fn is_operator(word: &str) -> bool {
	word == PIPE || word == INPUT || word == OUTPUT
}

fn invalid<T>(reason: &'static str) -> Result<T> {
	Err(PipelineError::InvalidPipeline(reason))
}

/// Checks operator placement over the whole line before anything is split.
fn validate(words: &[Word]) -> Result<()> {
	let len = words.len();
	if len == 0 {
		return invalid("empty command");
	}
	if words[0] == PIPE || words[len - 1] == PIPE {
		return invalid("pipe at either end of the line");
	}
	let mut prev_pipe = false;
	for (i, word) in words.iter().enumerate() {
		match word.as_str() {
			PIPE => {
				if prev_pipe {
					return invalid("empty stage between pipes");
				}
				prev_pipe = true;
				continue;
			},
			INPUT => if i != 0 {
				return invalid("input redirection must start the line");
			},
			OUTPUT => {
				let store = i + 2 == len;
				let append = i + 3 == len && words[i + 1] == OUTPUT;
				if !store && !append {
					return invalid("output redirection must end the line");
				}
			},
			_ => {},
		}
		prev_pipe = false;
	}
	if words[0] == INPUT && (len < 2 || is_operator(&words[1])) {
		return invalid("input redirection without a file");
	}
	Ok(())
}

/// Splits one command line into stages at every `|`, moving a leading
/// `< file` onto the first stage and a trailing `> file` or `> > file` onto
/// the last one.
pub fn parse(words: &[Word]) -> Result<Pipeline> {
	validate(words)?;

	let mut rest = words;
	let mut input = None;
	if rest[0] == INPUT {
		input = Some(Redirect { target: PathBuf::from(&rest[1]), typ: RedirectType::Input });
		rest = &rest[2 ..];
	}

	let mut output = None;
	let n = rest.len();
	if n >= 2 && rest[n - 2] == OUTPUT {
		let append = n >= 3 && rest[n - 3] == OUTPUT;
		let typ = if append { RedirectType::Append } else { RedirectType::Output };
		output = Some(Redirect { target: PathBuf::from(&rest[n - 1]), typ: typ });
		rest = &rest[.. n - if append { 3 } else { 2 }];
	}

	let mut stages: Vec<Stage> = rest.split(|w| w == PIPE)
		.map(|argv| Stage { argv: argv.to_vec(), redirects: vec![] })
		.collect();
	if let Some(r) = input {
		stages[0].redirects.push(r);
	}
	if let Some(r) = output {
		let last = stages.len() - 1;
		stages[last].redirects.push(r);
	}
	Pipeline::new(stages)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn words(line: &str) -> Vec<Word> {
		line.split_whitespace().map(|s| s.to_string()).collect()
	}

	fn argvs(p: &Pipeline) -> Vec<Vec<&str>> {
		p.stages().iter().map(|s| s.argv.iter().map(|w| w.as_str()).collect()).collect()
	}

	#[test]
	fn single_command() {
		let p = parse(&words("ls -l /tmp")).unwrap();
		assert_eq!(argvs(&p), vec![vec!["ls", "-l", "/tmp"]]);
		assert!(p.input_file().is_none());
		assert!(p.output_file().is_none());
	}

	#[test]
	fn splits_on_pipes() {
		let line = words("seq 1 3 | grep 2 | wc -l");
		let p = parse(&line).unwrap();
		assert_eq!(argvs(&p), vec![vec!["seq", "1", "3"], vec!["grep", "2"], vec!["wc", "-l"]]);
		assert_eq!(p.len(), line.iter().filter(|w| *w == PIPE).count() + 1);
	}

	#[test]
	fn strips_redirections() {
		let p = parse(&words("< in.txt cat | sort > out.txt")).unwrap();
		assert_eq!(argvs(&p), vec![vec!["cat"], vec!["sort"]]);
		assert_eq!(p.input_file(), Some(std::path::Path::new("in.txt")));
		let out = p.output_file().unwrap();
		assert_eq!(out.target, PathBuf::from("out.txt"));
		assert_eq!(out.typ, RedirectType::Output);
		assert!(p.stages()[0].output().is_none());
		assert!(p.stages()[1].input().is_none());
	}

	#[test]
	fn double_arrow_appends() {
		let p = parse(&words("echo hi > > log")).unwrap();
		assert_eq!(argvs(&p), vec![vec!["echo", "hi"]]);
		assert_eq!(p.output_file().unwrap().typ, RedirectType::Append);
	}

	#[test]
	fn rejects_misplaced_operators() {
		for line in &["| ls", "ls |", "ls | | wc", "ls > out > out2", "ls < in", "<", "< in",
		              "< | cat", "< in > out", "> out", "ls | > out", "ls > >", "cat > out | wc",
		              "ls > a b"] {
			match parse(&words(line)) {
				Err(PipelineError::InvalidPipeline(_)) => {},
				other => panic!("{:?} parsed as {:?}", line, other),
			}
		}
	}

	#[test]
	fn rejects_empty_line() {
		assert!(matches!(parse(&[]), Err(PipelineError::InvalidPipeline(_))));
	}
}
