use std::io;
use std::io::{BufRead,IsTerminal,Write};
use std::process;

use pish::builtin::Flow;
use pish::config::Config;
use pish::{eval,global,lexer};
use tracing_subscriber::EnvFilter;

const PROMPT: &'static [u8] = b"pish> ";

fn main() {
	tracing_subscriber::fmt()
		.with_writer(io::stderr)
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
		.init();

	let mut state = global::State::new(Config::from_env());
	let interactive = io::stdout().is_terminal();
	let mut stdout = io::stdout();
	let stdin = io::stdin();
	let mut stdin_locked = stdin.lock();
	loop {
		if interactive {
			let _ = stdout.write_all(PROMPT);
			let _ = stdout.flush();
		}
		let mut line: Vec<u8> = vec![];
		match stdin_locked.read_until(b'\n', &mut line) {
			Ok(0) => break,
			Ok(_) => {},
			Err(e) => {
				eprintln!("pish: {}", e);
				break;
			},
		}
		let words = lexer::tokenize(&String::from_utf8_lossy(&line));
		if let Flow::Exit(status) = eval::eval(&mut state, words) {
			process::exit(status);
		}
	}
}
