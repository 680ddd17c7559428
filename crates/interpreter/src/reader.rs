//! Reader: characters to S-expressions.
//!
//! Tokenizes the input one line at a time and assembles tokens into values.
//! End of input is represented by the reserved `#<eof-object>` symbol so
//! callers can pull expressions until they see the sentinel.

use std::io::BufRead;

use schemy_core::{Error, Result, Symbol, Value, reserved};

/// One lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Open,
    Close,
    Quote,
    Quasiquote,
    Unquote,
    UnquoteSplicing,
    Str(String),
    Atom(String),
    Eof,
}

/// Streaming S-expression reader over buffered input.
pub struct Reader<R> {
    input: R,
    line: Vec<char>,
    pos: usize,
    line_no: usize,
}

impl<R: BufRead> Reader<R> {
    pub fn new(input: R) -> Reader<R> {
        Reader { input, line: Vec::new(), pos: 0, line_no: 0 }
    }

    /// Read one S-expression; yields the eof sentinel once input is drained.
    pub fn read(&mut self) -> Result<Value> {
        let token = self.next_token()?;
        self.read_from(token)
    }

    /// Drop the rest of the current line. The REPL calls this after a
    /// syntax error so a garbled line cannot poison the next prompt.
    pub fn discard_line(&mut self) {
        self.pos = self.line.len();
    }

    fn read_from(&mut self, token: Token) -> Result<Value> {
        let res = reserved();
        match token {
            Token::Eof => Ok(Value::Sym(res.eof)),
            Token::Open => {
                let mut items = Vec::new();
                loop {
                    match self.next_token()? {
                        Token::Close => return Ok(Value::list(items)),
                        Token::Eof => {
                            return Err(Error::Syntax(
                                "unexpected end of input inside list".to_string(),
                            ));
                        }
                        tok => items.push(self.read_from(tok)?),
                    }
                }
            }
            Token::Close => {
                Err(Error::Syntax(format!("unexpected ')' on line {}", self.line_no)))
            }
            Token::Quote => self.read_quoted(res.quote),
            Token::Quasiquote => self.read_quoted(res.quasiquote),
            Token::Unquote => self.read_quoted(res.unquote),
            Token::UnquoteSplicing => self.read_quoted(res.unquote_splicing),
            Token::Str(text) => Ok(Value::str(&text)),
            Token::Atom(text) => Ok(parse_atom(&text)),
        }
    }

    fn read_quoted(&mut self, head: Symbol) -> Result<Value> {
        match self.next_token()? {
            Token::Eof => {
                Err(Error::Syntax(format!("unexpected end of input after {}", head.name())))
            }
            token => {
                let expr = self.read_from(token)?;
                Ok(Value::list(vec![Value::Sym(head), expr]))
            }
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        loop {
            if self.pos >= self.line.len() && !self.fill_line()? {
                return Ok(Token::Eof);
            }
            while self.pos < self.line.len() && self.line[self.pos].is_whitespace() {
                self.pos += 1;
            }
            if self.pos >= self.line.len() {
                continue;
            }
            match self.line[self.pos] {
                ';' => {
                    // Comment to end of line.
                    self.pos = self.line.len();
                }
                '(' => {
                    self.pos += 1;
                    return Ok(Token::Open);
                }
                ')' => {
                    self.pos += 1;
                    return Ok(Token::Close);
                }
                '\'' => {
                    self.pos += 1;
                    return Ok(Token::Quote);
                }
                '`' => {
                    self.pos += 1;
                    return Ok(Token::Quasiquote);
                }
                ',' => {
                    self.pos += 1;
                    if self.line.get(self.pos) == Some(&'@') {
                        self.pos += 1;
                        return Ok(Token::UnquoteSplicing);
                    }
                    return Ok(Token::Unquote);
                }
                '"' => return self.lex_string(),
                _ => return Ok(self.lex_atom()),
            }
        }
    }

    fn fill_line(&mut self) -> Result<bool> {
        let mut buf = String::new();
        let n = self
            .input
            .read_line(&mut buf)
            .map_err(|e| Error::Syntax(format!("cannot read input: {e}")))?;
        if n == 0 {
            return Ok(false);
        }
        self.line = buf.chars().collect();
        self.pos = 0;
        self.line_no += 1;
        Ok(true)
    }

    /// Strings must close on the line they open. `\\` and `\"` unescape;
    /// any other backslash pair is kept verbatim.
    fn lex_string(&mut self) -> Result<Token> {
        let start_line = self.line_no;
        self.pos += 1;
        let mut text = String::new();
        while self.pos < self.line.len() {
            match self.line[self.pos] {
                '"' => {
                    self.pos += 1;
                    return Ok(Token::Str(text));
                }
                '\\' => {
                    self.pos += 1;
                    match self.line.get(self.pos) {
                        Some('\\') => text.push('\\'),
                        Some('"') => text.push('"'),
                        Some(&c) => {
                            text.push('\\');
                            text.push(c);
                        }
                        None => break,
                    }
                    self.pos += 1;
                }
                c => {
                    text.push(c);
                    self.pos += 1;
                }
            }
        }
        Err(Error::Syntax(format!("unterminated string literal on line {start_line}")))
    }

    fn lex_atom(&mut self) -> Token {
        let start = self.pos;
        while self.pos < self.line.len() {
            let c = self.line[self.pos];
            if c.is_whitespace() || matches!(c, '(' | ')' | '\'' | '"' | '`' | ',' | ';') {
                break;
            }
            self.pos += 1;
        }
        Token::Atom(self.line[start..self.pos].iter().collect())
    }
}

/// Parse one atom: `#t`/`#f`, then integer, then float, else a symbol.
pub fn parse_atom(text: &str) -> Value {
    match text {
        "#t" => return Value::Bool(true),
        "#f" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(n) = text.parse::<i64>() {
        return Value::Int(n);
    }
    if looks_numeric(text) {
        if let Ok(x) = text.parse::<f64>() {
            return Value::Float(x);
        }
    }
    Value::Sym(Symbol::intern(text))
}

/// Guard against `f64::from_str` accepting spellings like `inf` and `NaN`,
/// which must stay symbols.
fn looks_numeric(text: &str) -> bool {
    let mut chars = text.chars();
    let first_ok = matches!(chars.next(), Some(c) if c.is_ascii_digit() || c == '+' || c == '-' || c == '.');
    first_ok
        && text.len() > 1
        && text.chars().all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
}
