//! Lexer module - Tokenization
//!
//! Single left-to-right scan with one character of lookahead. Besides the usual token
//! classes the lexer synthesizes NEWLINE / INDENT / DEDENT tokens from the layout of the
//! source so the parser can treat blocks like bracketed groups.

mod token;

pub use token::*;

use crate::error::LexicalError;
use log::{debug, trace};
use std::iter::Peekable;
use std::str::Chars;

/// Width of a tab stop when measuring indentation
const TAB_WIDTH: usize = 8;

/// Tokenize source code
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexicalError> {
    let tokens = Lexer::new(source).lex()?;
    debug!("lexer: produced {} tokens", tokens.len());
    Ok(tokens)
}

/// Decode the value of a STRING token from its raw lexeme (quotes included)
pub fn string_value(lexeme: &str) -> String {
    let mut chars = lexeme.chars();
    let quote = chars.next();
    let mut body: Vec<char> = chars.collect();
    if body.last().copied() == quote {
        body.pop();
    }

    let mut out = String::with_capacity(body.len());
    let mut iter = body.into_iter();
    while let Some(c) = iter.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match iter.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(c @ ('\\' | '"' | '\'')) => out.push(c),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Render a string value as a double-quoted lexeme that `string_value` reads back
pub fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render a float as `digits.digits` (never an exponent), so it lexes back as a NUMBER
pub fn float_lexeme(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') || !value.is_finite() {
        text
    } else {
        format!("{text}.0")
    }
}

struct Lexer<'src> {
    iter: Peekable<Chars<'src>>,
    line: usize,
    column: usize,
    /// Indentation widths of the open blocks; the bottom entry is always 0
    indents: Vec<usize>,
    /// Open parentheses; newlines inside them do not end the logical line
    paren_depth: usize,
    at_line_start: bool,
    tokens: Vec<Token>,
}

impl<'src> Lexer<'src> {
    fn new(src: &'src str) -> Self {
        Self {
            iter: src.chars().peekable(),
            line: 1,
            column: 1,
            indents: vec![0],
            paren_depth: 0,
            at_line_start: true,
            tokens: Vec::new(),
        }
    }

    fn lex(mut self) -> Result<Vec<Token>, LexicalError> {
        loop {
            if self.at_line_start && self.paren_depth == 0 {
                self.indentation()?;
                if self.at_line_start {
                    // blank or comment-only line, or end of input
                    if self.peek().is_none() {
                        break;
                    }
                    continue;
                }
            }

            let Some(c) = self.peek() else { break };
            let (line, column) = (self.line, self.column);
            match c {
                ' ' | '\t' | '\r' => {
                    self.advance();
                }
                '#' => self.skip_comment(),
                '\n' => {
                    self.advance();
                    if self.paren_depth == 0 {
                        self.push(TokenKind::Newline, "\n", line, column);
                        self.at_line_start = true;
                    }
                }
                '"' | '\'' => self.string(c)?,
                c if c.is_ascii_digit() => self.number()?,
                c if c.is_ascii_alphabetic() || c == '_' => self.identifier_or_keyword(),
                _ => self.symbol()?,
            }
        }
        self.finish();
        Ok(self.tokens)
    }

    /// Measures the leading whitespace of a line and emits INDENT / DEDENT tokens.
    ///
    /// Leaves `at_line_start` set when the line turns out to carry no tokens.
    fn indentation(&mut self) -> Result<(), LexicalError> {
        let mut width = 0;
        while let Some(c) = self.peek() {
            match c {
                ' ' => width += 1,
                '\t' => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
                '\r' | '\x0c' => {}
                _ => break,
            }
            self.advance();
        }

        match self.peek() {
            None => return Ok(()),
            Some('\n') => {
                self.advance();
                return Ok(());
            }
            Some('#') => {
                self.skip_comment();
                if self.peek() == Some('\n') {
                    self.advance();
                }
                return Ok(());
            }
            Some(_) => {}
        }

        self.at_line_start = false;
        let (line, column) = (self.line, self.column);
        let top = self.current_indent();
        if width > top {
            trace!("lexer: indent to {width} at line {line}");
            self.indents.push(width);
            self.push(TokenKind::Indent, "", line, column);
        } else if width < top {
            while self.current_indent() > width {
                self.indents.pop();
                self.push(TokenKind::Dedent, "", line, column);
            }
            if self.current_indent() != width {
                return Err(LexicalError::InconsistentDedent {
                    line,
                    column,
                    character: self.peek().unwrap_or(' '),
                });
            }
            trace!("lexer: dedent to {width} at line {line}");
        }
        Ok(())
    }

    fn string(&mut self, quote: char) -> Result<(), LexicalError> {
        let (line, column) = (self.line, self.column);
        let unterminated = LexicalError::UnterminatedString {
            line,
            column,
            quote,
        };
        let mut lexeme = String::new();
        lexeme.push(self.advance().unwrap_or(quote));
        loop {
            match self.peek() {
                None | Some('\n') => return Err(unterminated),
                Some('\\') => {
                    lexeme.push('\\');
                    self.advance();
                    match self.peek() {
                        None | Some('\n') => return Err(unterminated),
                        Some(escaped) => {
                            lexeme.push(escaped);
                            self.advance();
                        }
                    }
                }
                Some(c) => {
                    lexeme.push(c);
                    self.advance();
                    if c == quote {
                        break;
                    }
                }
            }
        }
        self.push(TokenKind::String, lexeme, line, column);
        Ok(())
    }

    fn number(&mut self) -> Result<(), LexicalError> {
        let (line, column) = (self.line, self.column);
        let mut lexeme = self.take_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') {
            let (dot_line, dot_column) = (self.line, self.column);
            self.advance();
            let fraction = self.take_while(|c| c.is_ascii_digit());
            if fraction.is_empty() {
                return Err(LexicalError::UnexpectedCharacter {
                    line: dot_line,
                    column: dot_column,
                    character: '.',
                });
            }
            lexeme.push('.');
            lexeme.push_str(&fraction);
        }
        self.push(TokenKind::Number, lexeme, line, column);
        Ok(())
    }

    fn identifier_or_keyword(&mut self) {
        let (line, column) = (self.line, self.column);
        let word = self.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let kind = if is_keyword(&word) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        };
        self.push(kind, word, line, column);
    }

    fn symbol(&mut self) -> Result<(), LexicalError> {
        let (line, column) = (self.line, self.column);
        let Some(c) = self.advance() else {
            return Ok(());
        };
        let (kind, lexeme) = match c {
            '+' | '*' | '/' | '=' | '<' | '>' => {
                if self.peek() == Some('=') {
                    self.advance();
                    (TokenKind::Operator, format!("{c}="))
                } else {
                    (TokenKind::Operator, c.to_string())
                }
            }
            '-' => match self.peek() {
                Some('=') => {
                    self.advance();
                    (TokenKind::Operator, "-=".to_string())
                }
                Some('>') => {
                    self.advance();
                    (TokenKind::Operator, "->".to_string())
                }
                _ => (TokenKind::Operator, "-".to_string()),
            },
            '%' => (TokenKind::Operator, "%".to_string()),
            '!' if self.peek() == Some('=') => {
                self.advance();
                (TokenKind::Operator, "!=".to_string())
            }
            '(' => {
                self.paren_depth += 1;
                (TokenKind::Delimiter, "(".to_string())
            }
            ')' => {
                self.paren_depth = self.paren_depth.saturating_sub(1);
                (TokenKind::Delimiter, ")".to_string())
            }
            ':' | ',' => (TokenKind::Delimiter, c.to_string()),
            _ => {
                return Err(LexicalError::UnexpectedCharacter {
                    line,
                    column,
                    character: c,
                })
            }
        };
        self.push(kind, lexeme, line, column);
        Ok(())
    }

    fn skip_comment(&mut self) {
        while !matches!(self.peek(), Some('\n') | None) {
            self.advance();
        }
    }

    /// Closes the last logical line and every open block, then appends EOF
    fn finish(&mut self) {
        let (line, column) = (self.line, self.column);
        if matches!(self.tokens.last(), Some(tok) if tok.kind != TokenKind::Newline) {
            self.push(TokenKind::Newline, "", line, column);
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(TokenKind::Dedent, "", line, column);
        }
        self.push(TokenKind::Eof, "", line, column);
    }
}

impl Lexer<'_> {
    fn peek(&mut self) -> Option<char> {
        self.iter.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.iter.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.advance();
        }
        out
    }

    fn current_indent(&self) -> usize {
        self.indents.last().copied().unwrap_or(0)
    }

    fn push(&mut self, kind: TokenKind, lexeme: impl Into<String>, line: usize, column: usize) {
        self.tokens.push(Token::new(kind, lexeme, line, column));
    }
}
