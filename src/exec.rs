use std::collections::BTreeMap;
use std::ffi::CString;
use std::fmt;
use std::iter;
use std::path::PathBuf;

use nix::unistd::Pid;

use crate::channel::Channels;
use crate::error::{PipelineError,Result};
use crate::launch;
use crate::pipeline;
use crate::reap::{self,Reaped,StageStatus};
use crate::types::Word;

/// Exit statuses of a fully launched pipeline.
#[derive(Debug, PartialEq, Eq)]
pub struct PipelineResult {
	pub statuses: BTreeMap<usize, StageStatus>,
	pub program: PathBuf,
	pub status: StageStatus,
}

impl fmt::Display for PipelineResult {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{} exit status = {}", self.program.display(), self.status)
	}
}

/// Everything one command line did: the stages that ran (all of them reaped)
/// and the error that stopped it early, if any.
#[derive(Debug)]
pub struct Execution {
	pub reaped: Vec<Reaped>,
	pub error: Option<PipelineError>,
}

impl Execution {
	fn failed(e: PipelineError) -> Execution {
		Execution { reaped: vec![], error: Some(e) }
	}

	pub fn pids(&self) -> Vec<Pid> {
		self.reaped.iter().map(|r| r.pid).collect()
	}

	pub fn reap_failures(&self) -> impl Iterator<Item = &PipelineError> {
		self.reaped.iter().filter_map(|r| r.status.as_ref().err())
	}

	pub fn into_result(self) -> Result<PipelineResult> {
		if let Some(e) = self.error {
			return Err(e);
		}
		let mut reaped = self.reaped;
		let last = match reaped.pop() {
			Some(r) => r,
			None => return Err(PipelineError::InvalidPipeline("empty command")),
		};
		let status = last.status?;
		let statuses = reaped.into_iter()
			.filter_map(|r| r.status.ok().map(|s| (r.stage, s)))
			.chain(iter::once((last.stage, status)))
			.collect();
		Ok(PipelineResult { statuses: statuses, program: last.program, status: status })
	}
}

/// Parses, plumbs, launches and reaps one command line. Every process this
/// starts has been waited for by the time it returns.
pub fn execute(words: &[Word], path: &[PathBuf], env: &[CString]) -> Execution {
	let pipeline = match pipeline::parse(words) {
		Ok(p) => p,
		Err(e) => return Execution::failed(e),
	};
	let launch = {
		let mut channels = match Channels::build(&pipeline) {
			Ok(c) => c,
			Err(e) => return Execution::failed(e),
		};
		launch::launch(&pipeline, &mut channels, path, env)
		// endpoints of stages never started close here, before any wait
	};
	Execution { reaped: reap::reap_all(launch.launched), error: launch.error }
}

/// Runs one command line, printing `<program> exit status = <n>` on success or
/// a single diagnostic on stderr otherwise.
pub fn run_pipeline(words: &[Word], path: &[PathBuf], env: &[CString]) -> Result<PipelineResult> {
	let execution = execute(words, path, env);
	for e in execution.reap_failures() {
		eprintln!("{}", e);
	}
	match execution.into_result() {
		Ok(result) => {
			println!("{}", result);
			Ok(result)
		},
		Err(e) => {
			if !matches!(e, PipelineError::ReapFailed { .. }) {
				eprintln!("{}", e);
			}
			Err(e)
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn summary_line() {
		let mut statuses = BTreeMap::new();
		statuses.insert(0, StageStatus::Exited(0));
		let r = PipelineResult { statuses: statuses, program: PathBuf::from("/usr/bin/grep"), status: StageStatus::Exited(1) };
		assert_eq!(r.to_string(), "/usr/bin/grep exit status = 1");
	}

	#[test]
	fn failure_wins_over_partial_statuses() {
		let e = Execution::failed(PipelineError::CommandNotFound("nope".to_string()));
		assert!(e.pids().is_empty());
		assert!(matches!(e.into_result(), Err(PipelineError::CommandNotFound(_))));
	}
}
