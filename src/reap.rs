use std::fmt;
use std::path::PathBuf;

use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::{waitpid,WaitStatus};
use nix::unistd::Pid;
use tracing::{debug,warn};

use crate::error::PipelineError;
use crate::launch::Launched;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StageStatus {
	Exited(i32),
	Signaled(Signal),
}

impl StageStatus {
	/// Exit code for a normal exit, `-signo` for a signal death, so the two
	/// can never be confused.
	pub fn code(self) -> i32 {
		match self {
			StageStatus::Exited(code) => code,
			StageStatus::Signaled(sig) => -(sig as i32),
		}
	}

	pub fn success(self) -> bool {
		self == StageStatus::Exited(0)
	}
}

impl fmt::Display for StageStatus {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}", self.code())
	}
}

trait WaitStatusExt {
	fn terminal(self) -> Option<StageStatus>;
}

impl WaitStatusExt for WaitStatus {
	fn terminal(self) -> Option<StageStatus> {
		match self {
			WaitStatus::Exited(_, code) => Some(StageStatus::Exited(code)),
			WaitStatus::Signaled(_, sig, _) => Some(StageStatus::Signaled(sig)),
			_ => None,
		}
	}
}

#[derive(Debug)]
pub struct Reaped {
	pub pid: Pid,
	pub stage: usize,
	pub program: PathBuf,
	pub status: Result<StageStatus, PipelineError>,
}

fn wait_terminated(pid: Pid) -> Result<StageStatus, Errno> {
	loop {
		match waitpid(pid, None) {
			Ok(status) => if let Some(s) = status.terminal() {
				return Ok(s);
			},
			Err(Errno::EINTR) => {},
			Err(e) => return Err(e),
		}
	}
}

/// Waits for every launched stage in launch order. A failure on one stage is
/// recorded for that stage and the rest are still waited for.
pub fn reap_all(launched: Vec<Launched>) -> Vec<Reaped> {
	launched.into_iter().map(|l| {
		let status = wait_terminated(l.pid).map_err(|e| PipelineError::ReapFailed { pid: l.pid, source: e });
		match status {
			Ok(s) => debug!(stage = l.stage, pid = %l.pid, status = %s, "reaped"),
			Err(ref e) => warn!(stage = l.stage, error = %e, "reap failed"),
		}
		Reaped { pid: l.pid, stage: l.stage, program: l.program, status: status }
	}).collect()
}
