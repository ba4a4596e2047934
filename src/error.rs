use std::{ffi,io};
use std::path::PathBuf;

use nix::errno::Errno;
use nix::unistd::Pid;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
	#[error("invalid pipe")]
	InvalidPipeline(&'static str),
	#[error("pipe: {0}")]
	PipeAllocationFailed(#[source] Errno),
	#[error("{0}: command not found")]
	CommandNotFound(String),
	#[error("{}: {source}", .program.display())]
	SpawnFailed { program: PathBuf, #[source] source: Errno },
	#[error("{}: No such file or directory", .0.display())]
	FileNotFound(PathBuf),
	#[error("{}: Permission denied", .0.display())]
	PermissionDenied(PathBuf),
	#[error("{}: {source}", .path.display())]
	Redirect { path: PathBuf, #[source] source: io::Error },
	#[error("waitpid {pid}: {source}")]
	ReapFailed { pid: Pid, #[source] source: Errno },
	#[error("{0}")]
	InvalidArgument(#[from] ffi::NulError),
}

impl PipelineError {
	pub fn from_open(path: PathBuf, e: io::Error) -> PipelineError {
		match e.kind() {
			io::ErrorKind::NotFound => PipelineError::FileNotFound(path),
			io::ErrorKind::PermissionDenied => PipelineError::PermissionDenied(path),
			_ => PipelineError::Redirect { path: path, source: e },
		}
	}
}

pub type Result<T> = std::result::Result<T, PipelineError>;
