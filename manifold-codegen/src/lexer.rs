//! Tokenizer for GraphQL SDL.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Name(String),
    Int(String),
    Float(String),
    /// Quoted or block string, escapes already processed.
    Str(String),
    Punct(char),
    Spread,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Name(n) => write!(f, "'{n}'"),
            Token::Int(v) | Token::Float(v) => write!(f, "number {v}"),
            Token::Str(_) => f.write_str("string"),
            Token::Punct(c) => write!(f, "'{c}'"),
            Token::Spread => f.write_str("'...'"),
            Token::Eof => f.write_str("end of file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            line,
            column,
            message: message.into(),
        }
    }

    fn skip_ignored(&mut self) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' | '\n' | '\r' | ',' | '\u{feff}' => {
                    self.bump();
                }
                '#' => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Result<Spanned, SyntaxError> {
        self.skip_ignored();
        let (line, column) = (self.line, self.column);
        let spanned = |token| Spanned {
            token,
            line,
            column,
        };

        let Some(c) = self.peek() else {
            return Ok(spanned(Token::Eof));
        };

        match c {
            '!' | '$' | '&' | '(' | ')' | ':' | '=' | '@' | '[' | ']' | '{' | '|' | '}' => {
                self.bump();
                Ok(spanned(Token::Punct(c)))
            }
            '.' => {
                if self.peek_at(1) == Some('.') && self.peek_at(2) == Some('.') {
                    self.pos_advance(3);
                    Ok(spanned(Token::Spread))
                } else {
                    Err(self.error(line, column, "unexpected '.'"))
                }
            }
            '"' => {
                if self.peek_at(1) == Some('"') && self.peek_at(2) == Some('"') {
                    self.block_string(line, column).map(|s| spanned(Token::Str(s)))
                } else {
                    self.string(line, column).map(|s| spanned(Token::Str(s)))
                }
            }
            c if c == '_' || c.is_ascii_alphabetic() => {
                let mut name = String::new();
                while let Some(c) = self.peek() {
                    if c == '_' || c.is_ascii_alphanumeric() {
                        name.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                Ok(spanned(Token::Name(name)))
            }
            c if c == '-' || c.is_ascii_digit() => self.number(line, column).map(spanned),
            other => Err(self.error(line, column, format!("unexpected character '{other}'"))),
        }
    }

    fn pos_advance(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    fn digits(&mut self, out: &mut String) -> usize {
        let mut count = 0;
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            out.push(c);
            self.bump();
            count += 1;
        }
        count
    }

    fn number(&mut self, line: usize, column: usize) -> Result<Token, SyntaxError> {
        let mut text = String::new();
        if self.peek() == Some('-') {
            text.push('-');
            self.bump();
        }
        if self.digits(&mut text) == 0 {
            return Err(self.error(line, column, "expected digit"));
        }
        let mut float = false;
        if self.peek() == Some('.') {
            float = true;
            text.push('.');
            self.bump();
            if self.digits(&mut text) == 0 {
                return Err(self.error(self.line, self.column, "expected digit after '.'"));
            }
        }
        if let Some(e @ ('e' | 'E')) = self.peek() {
            float = true;
            text.push(e);
            self.bump();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                text.push(sign);
                self.bump();
            }
            if self.digits(&mut text) == 0 {
                return Err(self.error(self.line, self.column, "expected exponent digits"));
            }
        }
        if self.peek().is_some_and(|c| c == '_' || c.is_ascii_alphabetic()) {
            return Err(self.error(self.line, self.column, "invalid number"));
        }
        Ok(if float {
            Token::Float(text)
        } else {
            Token::Int(text)
        })
    }

    fn string(&mut self, line: usize, column: usize) -> Result<String, SyntaxError> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error(line, column, "unterminated string")),
                Some('"') => return Ok(out),
                Some('\\') => {
                    let (el, ec) = (self.line, self.column);
                    let escaped = match self.bump() {
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some('/') => '/',
                        Some('b') => '\u{8}',
                        Some('f') => '\u{c}',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('u') => {
                            let mut hex = String::new();
                            for _ in 0..4 {
                                match self.bump() {
                                    Some(h) if h.is_ascii_hexdigit() => hex.push(h),
                                    _ => return Err(self.error(el, ec, "invalid unicode escape")),
                                }
                            }
                            u32::from_str_radix(&hex, 16)
                                .ok()
                                .and_then(char::from_u32)
                                .ok_or_else(|| self.error(el, ec, "invalid unicode escape"))?
                        }
                        _ => return Err(self.error(el, ec, "invalid escape sequence")),
                    };
                    out.push(escaped);
                }
                Some(c) => out.push(c),
            }
        }
    }

    fn block_string(&mut self, line: usize, column: usize) -> Result<String, SyntaxError> {
        self.pos_advance(3);
        let mut raw = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error(line, column, "unterminated block string")),
                Some('"') if self.peek_at(1) == Some('"') && self.peek_at(2) == Some('"') => {
                    self.pos_advance(3);
                    return Ok(dedent_block(&raw));
                }
                Some('\\')
                    if self.peek_at(1) == Some('"')
                        && self.peek_at(2) == Some('"')
                        && self.peek_at(3) == Some('"') =>
                {
                    self.pos_advance(4);
                    raw.push_str("\"\"\"");
                }
                Some(c) => {
                    raw.push(c);
                    self.bump();
                }
            }
        }
    }
}

/// Block string value: common indentation removed, blank first and last lines dropped.
///
/// Only spaces and tabs count as whitespace, both for indentation and for
/// blank lines.
fn dedent_block(raw: &str) -> String {
    const WS: [char; 2] = [' ', '\t'];
    let is_blank = |l: &str| l.trim_matches(WS).is_empty();
    let lines: Vec<&str> = raw.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect();
    let indent = lines
        .iter()
        .skip(1)
        .filter(|l| !is_blank(l))
        .map(|l| l.len() - l.trim_start_matches(WS).len())
        .min()
        .unwrap_or(0);

    let mut out: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, l)| match l.get(indent..) {
            Some(rest) if i > 0 => rest.trim_end_matches(WS),
            _ => l.trim_matches(WS),
        })
        .collect();
    while out.first().is_some_and(|l| l.is_empty()) {
        out.remove(0);
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

/// Split `src` into tokens, ending with [`Token::Eof`].
pub(crate) fn tokenize(src: &str) -> Result<Vec<Spanned>, SyntaxError> {
    let mut lexer = Lexer {
        chars: src.chars().collect(),
        pos: 0,
        line: 1,
        column: 1,
    };
    let mut out = Vec::new();
    loop {
        let t = lexer.next_token()?;
        let done = t.token == Token::Eof;
        out.push(t);
        if done {
            return Ok(out);
        }
    }
}
