use crate::types::Word;

struct Lexer<'a> {
	line: &'a str,
	i: usize,
}

impl<'a> Lexer<'a> {
	fn proceed_while<F>(&mut self, f: F) where F: Fn(u8) -> bool {
		while let Some(c) = self.line.as_bytes().get(self.i) {
			if !f(*c) { break; }
			self.i += 1;
		}
	}

	fn is_whitespace(c: u8) -> bool {
		match c {
			b' ' | b'\t' | b'\r' | b'\n' => true,
			_ => false,
		}
	}

	fn is_special(c: u8) -> bool {
		match c {
			b'!' | b'>' | b'<' | b'|' => true,
			_ => false,
		}
	}

	fn is_letter(c: u8) -> bool {
		!Lexer::is_special(c) && !Lexer::is_whitespace(c)
	}

	fn skip_whitespaces(&mut self) {
		self.proceed_while(Lexer::is_whitespace);
	}

	fn read_word(&mut self) -> Option<&'a str> {
		let orig = self.i;
		match self.line.as_bytes().get(self.i) {
			None => return None,
			Some(&c) if Lexer::is_special(c) => self.i += 1,
			Some(_) => self.proceed_while(Lexer::is_letter),
		}
		Some(&self.line[orig .. self.i])
	}
}

/// Splits a raw command line into words. `!`, `<`, `>` and `|` always form a
/// word of their own, even when glued to neighbouring characters.
pub fn tokenize(line: &str) -> Vec<Word> {
	let mut lexer = Lexer { line: line, i: 0 };
	let mut words = vec![];
	loop {
		lexer.skip_whitespaces();
		match lexer.read_word() {
			Some(word) => words.push(word.to_string()),
			None => break,
		}
	}
	words
}
