use crate::config::Config;
use crate::history::History;

pub struct State {
	pub config: Config,
	pub history: History,
}

impl State {
	pub fn new(config: Config) -> State {
		let history = History::new(config.history_file.clone());
		State { config: config, history: history }
	}
}
