use crate::errors::{ShellError, ShellResult};
use tracing::trace;

/// Characters a backslash escapes inside double quotes.
const DOUBLE_QUOTE_ESCAPABLE: [char; 5] = ['"', '\\', '$', '`', '\n'];

/// One shell word after quote and escape removal.
///
/// `quoted` records whether any part of the word came from a quote or an
/// escape; operators such as `|` and `>` are only recognized on unquoted words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    text: String,
    quoted: bool,
}

impl Token {
    /// A bare word, eligible to be read as an operator.
    pub fn word(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: false,
        }
    }

    /// A word that was (at least partly) quoted or escaped.
    pub fn quoted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quoted: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_quoted(&self) -> bool {
        self.quoted
    }

    /// True when this token is the unquoted operator `op`.
    pub fn is_operator(&self, op: &str) -> bool {
        !self.quoted && self.text == op
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Unquoted,
    Single,
    Double,
}

struct Scanner {
    tokens: Vec<Token>,
    current: String,
    quoted: bool,
    mode: Mode,
    escaped: bool,
}

impl Scanner {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            current: String::new(),
            quoted: false,
            mode: Mode::Unquoted,
            escaped: false,
        }
    }

    fn feed(&mut self, input: &str) {
        for c in input.chars() {
            self.step(c);
        }
    }

    fn step(&mut self, c: char) {
        if self.escaped {
            self.escaped = false;
            if self.mode == Mode::Double && !DOUBLE_QUOTE_ESCAPABLE.contains(&c) {
                self.current.push('\\');
            }
            self.current.push(c);
            self.quoted = true;
            return;
        }

        match (self.mode, c) {
            (Mode::Single, '\'') => self.mode = Mode::Unquoted,
            (Mode::Single, _) => self.current.push(c),
            (Mode::Double, '"') => self.mode = Mode::Unquoted,
            (Mode::Double, '\\') => self.escaped = true,
            (Mode::Double, _) => self.current.push(c),
            (Mode::Unquoted, '\'') => {
                self.mode = Mode::Single;
                self.quoted = true;
            }
            (Mode::Unquoted, '"') => {
                self.mode = Mode::Double;
                self.quoted = true;
            }
            (Mode::Unquoted, '\\') => self.escaped = true,
            (Mode::Unquoted, ' ' | '\t') => self.finish_word(),
            (Mode::Unquoted, _) => self.current.push(c),
        }
    }

    fn finish_word(&mut self) {
        if !self.current.is_empty() || self.quoted {
            let text = std::mem::take(&mut self.current);
            self.tokens.push(Token {
                text,
                quoted: self.quoted,
            });
        }
        self.quoted = false;
    }

    fn in_quote(&self) -> bool {
        self.mode != Mode::Unquoted
    }

    fn finish(mut self) -> Vec<Token> {
        // A backslash left pending at end of input escapes nothing.
        self.finish_word();
        self.tokens
    }
}

/// Split one logical command line into words.
///
/// While a quote is still open at the end of the available text, the next
/// physical line is pulled from `continuation` and scanned as if it followed a
/// newline, in the same quote state. Running out of continuation lines with a
/// quote open is an error.
pub fn tokenize<F>(line: &str, mut continuation: F) -> ShellResult<Vec<Token>>
where
    F: FnMut() -> Option<String>,
{
    let mut scanner = Scanner::new();
    scanner.feed(line);

    while scanner.in_quote() {
        let next = continuation().ok_or(ShellError::UnterminatedQuote)?;
        trace!(mode = ?scanner.mode, "tokenize.continuation");
        scanner.feed("\n");
        scanner.feed(&next);
    }

    Ok(scanner.finish())
}

/// [`tokenize`] without a continuation source.
pub fn tokenize_line(line: &str) -> ShellResult<Vec<Token>> {
    tokenize(line, || None)
}

/// Strip tokens down to their text.
pub fn words(tokens: Vec<Token>) -> Vec<String> {
    tokens.into_iter().map(Token::into_string).collect()
}
