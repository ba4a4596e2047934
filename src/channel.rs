use std::fs::OpenOptions;
use std::os::fd::OwnedFd;
use std::path::Path;

use nix::fcntl::OFlag;
use nix::unistd;
use tracing::debug;

use crate::error::{PipelineError,Result};
use crate::types::{Pipeline,Redirect,RedirectType};

/// Anonymous pipe joining stage `i` (writer) to stage `i + 1` (reader).
#[derive(Debug)]
struct Channel {
	read: Option<OwnedFd>,
	write: Option<OwnedFd>,
}

/// The descriptors one stage gets on stdin and stdout. Whatever is `None`
/// stays inherited from the shell.
#[derive(Debug, Default)]
pub struct StageIo {
	pub stdin: Option<OwnedFd>,
	pub stdout: Option<OwnedFd>,
}

/// Every descriptor a pipeline needs, owned until handed to a stage. All of
/// them are close-on-exec, so a program only ever sees what was `dup2`'d onto
/// its stdin or stdout.
#[derive(Debug)]
pub struct Channels {
	pipes: Vec<Channel>,
	input: Option<OwnedFd>,
	output: Option<OwnedFd>,
}

fn open_redirect(path: &Path, typ: RedirectType) -> Result<OwnedFd> {
	let mut oopt = OpenOptions::new();
	let _ = match typ {
		RedirectType::Input => oopt.read(true),
		RedirectType::Output => oopt.write(true).create(true).truncate(true),
		RedirectType::Append => oopt.append(true).create(true),
	};
	let file = oopt.open(path).map_err(|e| PipelineError::from_open(path.to_path_buf(), e))?;
	Ok(OwnedFd::from(file))
}

impl Channels {
	pub fn build(pipeline: &Pipeline) -> Result<Channels> {
		let mut pipes = Vec::with_capacity(pipeline.len() - 1);
		for _ in 1 .. pipeline.len() {
			let (read, write) = unistd::pipe2(OFlag::O_CLOEXEC).map_err(PipelineError::PipeAllocationFailed)?;
			pipes.push(Channel { read: Some(read), write: Some(write) });
		}
		let input = match pipeline.input_file() {
			Some(path) => Some(open_redirect(path, RedirectType::Input)?),
			None => None,
		};
		let output = match pipeline.output_file() {
			Some(&Redirect { ref target, typ }) => Some(open_redirect(target, typ)?),
			None => None,
		};
		debug!(pipes = pipes.len(), input = input.is_some(), output = output.is_some(), "allocated channels");
		Ok(Channels { pipes: pipes, input: input, output: output })
	}

	/// Moves the endpoints stage `i` owns out of the set. The parent drops them
	/// as soon as the stage is spawned.
	pub fn take(&mut self, i: usize) -> StageIo {
		let last = self.pipes.len();
		let stdin = if i == 0 {
			self.input.take()
		} else {
			self.pipes.get_mut(i - 1).and_then(|c| c.read.take())
		};
		let stdout = if i == last {
			self.output.take()
		} else {
			self.pipes.get_mut(i).and_then(|c| c.write.take())
		};
		StageIo { stdin: stdin, stdout: stdout }
	}

	/// Number of descriptors still held by the parent.
	pub fn open_count(&self) -> usize {
		let ends = self.pipes.iter().map(|c| c.read.is_some() as usize + c.write.is_some() as usize).sum::<usize>();
		ends + self.input.is_some() as usize + self.output.is_some() as usize
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs::{self,File};
	use std::io::{Read,Write};
	use std::os::fd::AsRawFd;
	use nix::errno::Errno;
	use nix::fcntl::{fcntl,FcntlArg,FdFlag};
	use nix::sys::resource::{getrlimit,setrlimit,Resource};
	use nix::sys::wait::{waitpid,WaitStatus};
	use nix::unistd::ForkResult;
	use crate::pipeline::parse;

	fn pipeline(line: &str) -> Pipeline {
		let words: Vec<String> = line.split_whitespace().map(|s| s.to_string()).collect();
		parse(&words).unwrap()
	}

	#[test]
	fn one_pipe_per_join() {
		let mut ch = Channels::build(&pipeline("a | b | c")).unwrap();
		assert_eq!(ch.open_count(), 4);
		let first = ch.take(0);
		assert!(first.stdin.is_none() && first.stdout.is_some());
		let middle = ch.take(1);
		assert!(middle.stdin.is_some() && middle.stdout.is_some());
		let last = ch.take(2);
		assert!(last.stdin.is_some() && last.stdout.is_none());
		assert_eq!(ch.open_count(), 0);
	}

	#[test]
	fn single_stage_needs_nothing() {
		let mut ch = Channels::build(&pipeline("ls")).unwrap();
		assert_eq!(ch.open_count(), 0);
		let io = ch.take(0);
		assert!(io.stdin.is_none() && io.stdout.is_none());
	}

	#[test]
	fn pipes_are_close_on_exec() {
		let mut ch = Channels::build(&pipeline("a | b")).unwrap();
		let io = ch.take(0);
		let fd = io.stdout.unwrap();
		let flags = FdFlag::from_bits_truncate(fcntl(fd.as_raw_fd(), FcntlArg::F_GETFD).unwrap());
		assert!(flags.contains(FdFlag::FD_CLOEXEC));
	}

	#[test]
	fn reader_sees_eof_once_writer_is_dropped() {
		let mut ch = Channels::build(&pipeline("a | b")).unwrap();
		let mut writer = File::from(ch.take(0).stdout.unwrap());
		let mut reader = File::from(ch.take(1).stdin.unwrap());
		writer.write_all(b"bytes\n").unwrap();
		drop(writer);
		let mut got = vec![];
		reader.read_to_end(&mut got).unwrap();
		assert_eq!(got, b"bytes\n");
	}

	#[test]
	fn endpoints_open_redirection_files() {
		let dir = tempfile::tempdir().unwrap();
		let input = dir.path().join("in.txt");
		let output = dir.path().join("out.txt");
		fs::write(&input, b"hello\n").unwrap();
		fs::write(&output, b"stale content\n").unwrap();
		let line = format!("< {} cat | sort > {}", input.display(), output.display());
		let mut ch = Channels::build(&pipeline(&line)).unwrap();
		assert_eq!(ch.open_count(), 4);
		// truncated on open
		assert_eq!(fs::read(&output).unwrap(), b"");
		let mut got = String::new();
		File::from(ch.take(0).stdin.unwrap()).read_to_string(&mut got).unwrap();
		assert_eq!(got, "hello\n");
	}

	#[test]
	fn append_keeps_existing_content() {
		let dir = tempfile::tempdir().unwrap();
		let output = dir.path().join("log");
		fs::write(&output, b"one\n").unwrap();
		let mut ch = Channels::build(&pipeline(&format!("echo > > {}", output.display()))).unwrap();
		File::from(ch.take(0).stdout.unwrap()).write_all(b"two\n").unwrap();
		assert_eq!(fs::read(&output).unwrap(), b"one\ntwo\n");
	}

	#[test]
	fn missing_input_file() {
		let dir = tempfile::tempdir().unwrap();
		let missing = dir.path().join("missing");
		match Channels::build(&pipeline(&format!("< {} cat | wc", missing.display()))) {
			Err(PipelineError::FileNotFound(p)) => assert_eq!(p, missing),
			other => panic!("unexpected {:?}", other),
		}
	}

	fn open_fds() -> usize {
		fs::read_dir("/proc/self/fd").map(|d| d.count()).unwrap_or(0)
	}

	// runs in a forked child, so the lowered limit never reaches other tests
	fn exhaust_descriptors(p: &Pipeline) -> i32 {
		let before = open_fds();
		let hard = match getrlimit(Resource::RLIMIT_NOFILE) {
			Ok((_, hard)) => hard,
			Err(_) => return 1,
		};
		if setrlimit(Resource::RLIMIT_NOFILE, before as libc::rlim_t + 8, hard).is_err() {
			return 2;
		}
		match Channels::build(p) {
			Err(PipelineError::PipeAllocationFailed(Errno::EMFILE)) => {},
			_ => return 3,
		}
		if open_fds() != before {
			return 4;
		}
		0
	}

	#[test]
	fn exhausted_descriptors_are_all_released() {
		let p = pipeline(&vec!["cat"; 64].join(" | "));
		match unsafe { unistd::fork() }.unwrap() {
			ForkResult::Child => {
				let code = exhaust_descriptors(&p);
				unsafe { libc::_exit(code) }
			},
			ForkResult::Parent { child } => {
				assert_eq!(waitpid(child, None).unwrap(), WaitStatus::Exited(child, 0));
			},
		}
	}
}
