use std::path::{Path,PathBuf};

use crate::error::{PipelineError,Result};

pub type Word = String;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RedirectType { Input, Output, Append }

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Redirect {
	pub target: PathBuf,
	pub typ: RedirectType,
}

/// One program invocation. `argv[0]` is the program name or path; redirection
/// words never appear in `argv`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Stage {
	pub argv: Vec<Word>,
	pub redirects: Vec<Redirect>,
}

impl Stage {
	pub fn name(&self) -> &str {
		&self.argv[0]
	}

	pub fn input(&self) -> Option<&Path> {
		self.redirects.iter().find(|r| r.typ == RedirectType::Input).map(|r| r.target.as_path())
	}

	pub fn output(&self) -> Option<&Redirect> {
		self.redirects.iter().find(|r| r.typ != RedirectType::Input)
	}
}

/// Invariant: non-empty and every stage has a program. Only `stages[0]` may
/// carry an input redirect and only the last stage an output redirect.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Pipeline {
	stages: Vec<Stage>,
}

impl Pipeline {
	pub fn new(stages: Vec<Stage>) -> Result<Pipeline> {
		if stages.is_empty() {
			return Err(PipelineError::InvalidPipeline("empty command"));
		}
		if stages.iter().any(|s| s.argv.is_empty()) {
			return Err(PipelineError::InvalidPipeline("stage without a program"));
		}
		Ok(Pipeline { stages: stages })
	}

	pub fn stages(&self) -> &[Stage] {
		&self.stages
	}

	pub fn len(&self) -> usize {
		self.stages.len()
	}

	pub fn first(&self) -> &Stage {
		&self.stages[0]
	}

	pub fn last(&self) -> &Stage {
		&self.stages[self.stages.len() - 1]
	}

	pub fn input_file(&self) -> Option<&Path> {
		self.first().input()
	}

	pub fn output_file(&self) -> Option<&Redirect> {
		self.last().output()
	}
}
