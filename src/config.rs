use std::env;
use std::ffi::{CString,OsString};
use std::os::unix::ffi::OsStringExt;
use std::path::PathBuf;

pub const DEFAULT_PATH: &str = "/bin:/usr/bin";
const PATH_KEY: &str = "PATH";
const HOME_KEY: &str = "HOME";
const HISTORY_KEY: &str = "PISH_HISTORY";
const HISTORY_FILE: &str = ".pish_history";

/// Process-wide inputs, captured once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Config {
	pub path: Vec<PathBuf>,
	pub environment: Vec<CString>,
	pub home: PathBuf,
	pub history_file: PathBuf,
}

impl Config {
	pub fn from_env() -> Config {
		Config::from_vars(env::vars_os())
	}

	pub fn from_vars<I>(vars: I) -> Config where I: IntoIterator<Item = (OsString, OsString)> {
		let mut path: Option<Vec<PathBuf>> = None;
		let mut home = None;
		let mut history_file = None;
		let mut environment = vec![];
		for (k, v) in vars {
			match k.to_str() {
				Some(PATH_KEY) => path = Some(env::split_paths(&v).collect()),
				Some(HOME_KEY) => home = Some(PathBuf::from(&v)),
				Some(HISTORY_KEY) => history_file = Some(PathBuf::from(&v)),
				_ => {},
			}
			let mut entry = k;
			entry.push("=");
			entry.push(v);
			// an entry with a NUL byte cannot be passed to execve
			if let Ok(c) = CString::new(entry.into_vec()) {
				environment.push(c);
			}
		}
		let home = home.unwrap_or_else(|| PathBuf::from("/"));
		Config {
			path: path.unwrap_or_else(|| env::split_paths(DEFAULT_PATH).collect()),
			environment: environment,
			history_file: history_file.unwrap_or_else(|| home.join(HISTORY_FILE)),
			home: home,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn vars(pairs: &[(&str, &str)]) -> Vec<(OsString, OsString)> {
		pairs.iter().map(|&(k, v)| (OsString::from(k), OsString::from(v))).collect()
	}

	#[test]
	fn default_path_when_unset() {
		let c = Config::from_vars(vars(&[("HOME", "/home/u")]));
		assert_eq!(c.path, vec![PathBuf::from("/bin"), PathBuf::from("/usr/bin")]);
		assert_eq!(c.history_file, PathBuf::from("/home/u/.pish_history"));
	}

	#[test]
	fn path_and_environment_keep_order() {
		let c = Config::from_vars(vars(&[("PATH", "/opt/x:/bin"), ("LANG", "C"), ("PISH_HISTORY", "/tmp/h")]));
		assert_eq!(c.path, vec![PathBuf::from("/opt/x"), PathBuf::from("/bin")]);
		let env: Vec<&[u8]> = c.environment.iter().map(|e| e.as_bytes()).collect();
		assert_eq!(env, vec![&b"PATH=/opt/x:/bin"[..], &b"LANG=C"[..], &b"PISH_HISTORY=/tmp/h"[..]]);
		assert_eq!(c.history_file, PathBuf::from("/tmp/h"));
		assert_eq!(c.home, PathBuf::from("/"));
	}
}
