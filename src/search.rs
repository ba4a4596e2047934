use std::path::{Path,PathBuf};

use nix::unistd::{self,AccessFlags};

/// Exists, is a regular file, and may be executed by this process.
pub fn is_executable(path: &Path) -> bool {
	match path.metadata() {
		Ok(meta) => meta.is_file() && unistd::access(path, AccessFlags::X_OK).is_ok(),
		Err(_) => false,
	}
}

/// Resolves a program name against the search path. A name containing a `/`
/// is taken literally; otherwise the first executable candidate wins.
pub fn lookup(name: &str, path: &[PathBuf]) -> Option<PathBuf> {
	if name.contains('/') {
		let literal = PathBuf::from(name);
		return if is_executable(&literal) { Some(literal) } else { None };
	}
	path.iter()
		.map(|dir| dir.join(name))
		.find(|candidate| is_executable(candidate))
}
