use std::ffi::CString;
use std::fs::File;
use std::io::Read;
use std::os::fd::{AsRawFd,RawFd};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path,PathBuf};
use std::ptr;

use libc::{self,c_char,c_void};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::wait::waitpid;
use nix::unistd::{self,ForkResult,Pid};
use tracing::debug;

use crate::channel::{Channels,StageIo};
use crate::error::{PipelineError,Result};
use crate::search;
use crate::types::{Pipeline,Stage,Word};

/// A stage whose program is running (or already finished) and still has to be
/// reaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launched {
	pub pid: Pid,
	pub stage: usize,
	pub program: PathBuf,
}

/// Outcome of launching a pipeline left to right. `error` is set when a stage
/// could not be started; no stage after it was attempted.
#[derive(Debug)]
pub struct Launch {
	pub launched: Vec<Launched>,
	pub error: Option<PipelineError>,
}

/// Everything `execve` needs, converted before forking so the child never
/// allocates.
struct ExecImage<'a> {
	path: CString,
	_argv: Vec<CString>,
	argv_ptrs: Vec<*const c_char>,
	envp_ptrs: Vec<*const c_char>,
	_env: &'a [CString],
}

impl<'a> ExecImage<'a> {
	fn new(program: &Path, args: &[Word], env: &'a [CString]) -> Result<ExecImage<'a>> {
		let path = CString::new(program.as_os_str().as_bytes())?;
		let argv = args.iter().map(|a| CString::new(a.as_bytes())).collect::<std::result::Result<Vec<_>, _>>()?;
		let mut argv_ptrs: Vec<*const c_char> = argv.iter().map(|a| a.as_ptr()).collect();
		argv_ptrs.push(ptr::null());
		let mut envp_ptrs: Vec<*const c_char> = env.iter().map(|e| e.as_ptr()).collect();
		envp_ptrs.push(ptr::null());
		Ok(ExecImage { path: path, _argv: argv, argv_ptrs: argv_ptrs, envp_ptrs: envp_ptrs, _env: env })
	}
}

unsafe fn report_and_exit(status: RawFd, errno: Errno) -> ! {
	let bytes = (errno as i32).to_ne_bytes();
	libc::write(status, bytes.as_ptr() as *const c_void, bytes.len());
	libc::_exit(127)
}

unsafe fn redirect(fd: RawFd, target: RawFd, status: RawFd) {
	if fd == target {
		// dup2 onto itself keeps close-on-exec
		if libc::fcntl(fd, libc::F_SETFD, 0) < 0 {
			report_and_exit(status, Errno::last());
		}
	} else if let Err(e) = unistd::dup2(fd, target) {
		report_and_exit(status, e);
	}
}

/// Runs in the forked child: only async-signal-safe calls from here on.
unsafe fn exec_child(image: &ExecImage, stdin: Option<RawFd>, stdout: Option<RawFd>, status: RawFd) -> ! {
	// the Rust runtime ignores SIGPIPE and the disposition survives exec
	libc::signal(libc::SIGPIPE, libc::SIG_DFL);
	if let Some(fd) = stdin {
		redirect(fd, libc::STDIN_FILENO, status);
	}
	if let Some(fd) = stdout {
		redirect(fd, libc::STDOUT_FILENO, status);
	}
	libc::execve(image.path.as_ptr(), image.argv_ptrs.as_ptr(), image.envp_ptrs.as_ptr());
	report_and_exit(status, Errno::last())
}

fn reap_failed_child(pid: Pid) {
	loop {
		match waitpid(pid, None) {
			Err(Errno::EINTR) => continue,
			_ => break,
		}
	}
}

/// Forks and execs one stage. `io` is consumed: the parent's copies of the
/// stage's descriptors are closed before this returns, on every path.
fn spawn(image: &ExecImage, program: &Path, io: StageIo) -> Result<Pid> {
	let spawn_failed = |e| PipelineError::SpawnFailed { program: program.to_path_buf(), source: e };
	let (status_read, status_write) = unistd::pipe2(OFlag::O_CLOEXEC).map_err(PipelineError::PipeAllocationFailed)?;
	let stdin = io.stdin.as_ref().map(|fd| fd.as_raw_fd());
	let stdout = io.stdout.as_ref().map(|fd| fd.as_raw_fd());

	match unsafe { unistd::fork() }.map_err(spawn_failed)? {
		ForkResult::Child => unsafe {
			exec_child(image, stdin, stdout, status_write.as_raw_fd())
		},
		ForkResult::Parent { child } => {
			drop(status_write);
			drop(io);
			let mut reply = vec![];
			let mut status = File::from(status_read);
			if let Err(e) = status.read_to_end(&mut reply) {
				debug!(pid = %child, error = %e, "could not read exec status");
			}
			if reply.len() >= 4 {
				reap_failed_child(child);
				let code = i32::from_ne_bytes([reply[0], reply[1], reply[2], reply[3]]);
				return Err(spawn_failed(Errno::from_raw(code)));
			}
			Ok(child)
		},
	}
}

fn launch_stage(stage: &Stage, io: StageIo, path: &[PathBuf], env: &[CString]) -> Result<(Pid, PathBuf)> {
	let program = match search::lookup(stage.name(), path) {
		Some(p) => p,
		None => return Err(PipelineError::CommandNotFound(stage.name().to_string())),
	};
	let image = ExecImage::new(&program, &stage.argv, env)?;
	let pid = spawn(&image, &program, io)?;
	Ok((pid, program))
}

/// Spawns the stages in order. Stage `i` takes its endpoints out of
/// `channels` right before it is forked; whatever is left in `channels` on
/// return belongs to stages that were never started.
pub fn launch(pipeline: &Pipeline, channels: &mut Channels, path: &[PathBuf], env: &[CString]) -> Launch {
	let mut launched = Vec::with_capacity(pipeline.len());
	for (i, stage) in pipeline.stages().iter().enumerate() {
		let io = channels.take(i);
		match launch_stage(stage, io, path, env) {
			Ok((pid, program)) => {
				debug!(stage = i, pid = %pid, program = %program.display(), "spawned");
				launched.push(Launched { pid: pid, stage: i, program: program });
			},
			Err(e) => {
				debug!(stage = i, error = %e, "launch aborted");
				return Launch { launched: launched, error: Some(e) };
			},
		}
	}
	Launch { launched: launched, error: None }
}
