use std::io::{self,Write};

use tracing::warn;

use crate::builtin::{Builtin,Flow};
use crate::exec;
use crate::glob;
use crate::global::State;
use crate::history::DEFAULT_SHOWN;
use crate::lexer;
use crate::pipeline::{INPUT,OUTPUT,PIPE};
use crate::types::Word;

const HISTORY: &str = "history";
const REPLAY: &str = "!";

/// What a command line is, decided once from its program word.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Action {
	History,
	Replay,
	Builtin(Builtin),
	External,
}

/// The program word, looking past a leading `< file`.
fn program(words: &[Word]) -> Option<&str> {
	if words[0] == INPUT {
		words.get(2).map(|w| w.as_str())
	} else {
		Some(words[0].as_str())
	}
}

pub fn classify(words: &[Word]) -> Action {
	match program(words) {
		Some(HISTORY) => Action::History,
		Some(REPLAY) => Action::Replay,
		Some(name) => Builtin::from_name(name).map_or(Action::External, Action::Builtin),
		None => Action::External,
	}
}

fn is_redirected(words: &[Word]) -> bool {
	let len = words.len();
	words[0] == INPUT || (len > 2 && words[len - 2] == OUTPUT) || words.iter().any(|w| w == PIPE)
}

fn no_redirect(program: &str) {
	eprintln!("{}: I/O redirection not permitted for builtin commands", program);
}

fn store(state: &State, words: &[Word]) {
	if let Err(e) = state.history.store(words) {
		warn!(error = %e, "could not append to history");
	}
}

fn print_history<O: Write, E: Write>(state: &State, args: &[Word], out: &mut O, err: &mut E) {
	let n = match args {
		[] => DEFAULT_SHOWN,
		[n] => match n.parse() {
			Ok(n) => n,
			Err(_) => {
				let _ = writeln!(err, "history: {}: numeric argument required", n);
				return;
			},
		},
		_ => {
			let _ = writeln!(err, "history: too many arguments");
			return;
		},
	};
	match state.history.tail(n) {
		Ok(lines) => for (i, line) in lines {
			let _ = writeln!(out, "{}: {}", i, line);
		},
		Err(e) => {
			let _ = writeln!(err, "history: {}", e);
		},
	}
}

fn replay(state: &mut State, args: &[Word]) -> Flow {
	let index = match args {
		[] => None,
		// -1 counts back from the end; any other negative index matches nothing
		[n] => match n.parse::<i64>() {
			Ok(-1) => None,
			Ok(n) => match usize::try_from(n) {
				Ok(n) => Some(n),
				Err(_) => {
					eprintln!("!: event not found");
					return Flow::Continue;
				},
			},
			Err(_) => {
				eprintln!("!: {}: numeric argument required", n);
				return Flow::Continue;
			},
		},
		_ => {
			eprintln!("!: too many arguments");
			return Flow::Continue;
		},
	};
	match state.history.get(index) {
		Ok(Some(line)) => {
			println!("{}", line);
			eval(state, lexer::tokenize(&line))
		},
		Ok(None) => {
			eprintln!("!: event not found");
			Flow::Continue
		},
		Err(e) => {
			eprintln!("!: {}", e);
			Flow::Continue
		},
	}
}

/// Runs one lexed command line to completion.
pub fn eval(state: &mut State, words: Vec<Word>) -> Flow {
	if words.is_empty() {
		return Flow::Continue;
	}
	let redirected = is_redirected(&words);
	let action = classify(&words);

	// history commands run before the line is stored, so they never see themselves
	match action {
		Action::History => {
			if redirected {
				no_redirect(HISTORY);
			} else {
				print_history(state, &words[1 ..], &mut io::stdout(), &mut io::stderr());
			}
			store(state, &words);
			return Flow::Continue;
		},
		Action::Replay => {
			if redirected {
				no_redirect(REPLAY);
				return Flow::Continue;
			}
			return replay(state, &words[1 ..]);
		},
		_ => {},
	}

	store(state, &words);
	let words = match glob::expand(words, &state.config.home) {
		Ok(words) => words,
		Err(e) => {
			eprintln!("{}", e);
			return Flow::Continue;
		},
	};
	match action {
		Action::Builtin(b) if redirected => {
			no_redirect(b.name());
			Flow::Continue
		},
		Action::Builtin(b) => b.run(&words[1 ..], &state.config.home, &mut io::stdout(), &mut io::stderr()),
		_ => {
			let _ = exec::run_pipeline(&words, &state.config.path, &state.config.environment);
			Flow::Continue
		},
	}
}
