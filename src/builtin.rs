use std::io::Write;
use std::path::Path;

use nix::unistd;

use crate::types::Word;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Flow { Continue, Exit(i32) }

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Builtin { Cd, Pwd, Exit }

impl Builtin {
	pub fn from_name(name: &str) -> Option<Builtin> {
		match name {
			"cd" => Some(Builtin::Cd),
			"pwd" => Some(Builtin::Pwd),
			"exit" => Some(Builtin::Exit),
			_ => None,
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			Builtin::Cd => "cd",
			Builtin::Pwd => "pwd",
			Builtin::Exit => "exit",
		}
	}

	/// `args` excludes the builtin's own name.
	pub fn run<O: Write, E: Write>(self, args: &[Word], home: &Path, out: &mut O, err: &mut E) -> Flow {
		match self {
			Builtin::Cd => builtin_cd(args, home, err),
			Builtin::Pwd => builtin_pwd(out, err),
			Builtin::Exit => builtin_exit(args, err),
		}
	}
}

fn builtin_cd<E: Write>(args: &[Word], home: &Path, err: &mut E) -> Flow {
	match args.first() {
		None => if unistd::chdir(home).is_err() {
			let _ = writeln!(err, "cd: {}: No such file or directory", home.display());
		},
		Some(dir) => if unistd::chdir(Path::new(dir)).is_err() {
			let _ = writeln!(err, "cd: {}: No such file or directory", dir);
		},
	}
	Flow::Continue
}

fn builtin_pwd<O: Write, E: Write>(out: &mut O, err: &mut E) -> Flow {
	let _ = match unistd::getcwd() {
		Ok(dir) => writeln!(out, "current directory is '{}'", dir.display()),
		Err(e) => writeln!(err, "pwd: {}", e),
	};
	Flow::Continue
}

/// Leading decimal integer, the way strtol reads it.
fn leading_int(s: &str) -> Option<i32> {
	let digits_from = if s.starts_with('-') || s.starts_with('+') { 1 } else { 0 };
	let end = s[digits_from ..].find(|c: char| !c.is_ascii_digit()).map_or(s.len(), |i| i + digits_from);
	s[.. end].parse().ok()
}

fn builtin_exit<E: Write>(args: &[Word], err: &mut E) -> Flow {
	let status = match args {
		[] => 0,
		[code] => {
			if code.parse::<i32>().is_err() {
				let _ = writeln!(err, "exit: {}: numeric argument required", code);
			}
			leading_int(code).unwrap_or(0)
		},
		_ => {
			let _ = writeln!(err, "exit: too many arguments");
			0
		},
	};
	Flow::Exit(status)
}
