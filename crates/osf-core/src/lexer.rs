//! OSF tokenizer
//!
//! A pull-based cursor over the source text. The parser asks for one token at
//! a time and clones the lexer when it needs look-ahead; clones are cheap
//! because the lexer only borrows the source.
//!
//! Besides ordinary tokens the lexer offers two raw capture modes that the
//! parser switches into for content that is not OSF syntax: Markdown bodies of
//! `@doc` blocks ([`Lexer::raw_block_body`]) and pipe rows of `@table` blocks
//! ([`Lexer::rest_of_line`]).

use std::fmt;

use crate::error::{OsfError, Position, Result};

/// Token categories
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `[A-Za-z_][A-Za-z0-9_]*`
    Ident(String),
    /// A quoted string with escapes already decoded
    Str(String),
    /// A numeric lexeme, validated by the parser
    Number(String),
    At,
    LBrace,
    RBrace,
    Semicolon,
    Colon,
    Equals,
    LParen,
    RParen,
    Comma,
    Pipe,
    LBracket,
    RBracket,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "identifier '{}'", name),
            TokenKind::Str(_) => f.write_str("string"),
            TokenKind::Number(lexeme) => write!(f, "number '{}'", lexeme),
            TokenKind::At => f.write_str("'@'"),
            TokenKind::LBrace => f.write_str("'{'"),
            TokenKind::RBrace => f.write_str("'}'"),
            TokenKind::Semicolon => f.write_str("';'"),
            TokenKind::Colon => f.write_str("':'"),
            TokenKind::Equals => f.write_str("'='"),
            TokenKind::LParen => f.write_str("'('"),
            TokenKind::RParen => f.write_str("')'"),
            TokenKind::Comma => f.write_str("','"),
            TokenKind::Pipe => f.write_str("'|'"),
            TokenKind::LBracket => f.write_str("'['"),
            TokenKind::RBracket => f.write_str("']'"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

/// A token with its source span
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Position of the first character
    pub start: Position,
    /// Position just past the last character
    pub end: Position,
}

/// Tokenizer over a borrowed source string
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    src: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Current cursor position
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// The next character without consuming it
    pub fn peek_char(&self) -> Option<char> {
        self.src[self.offset..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.offset..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Skip whitespace and `//` line comments
    pub fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_second() == Some('/') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => return,
            }
        }
    }

    /// Look at the next token without consuming it
    pub fn peek_token(&self) -> Result<Token> {
        self.clone().next_token()
    }

    /// Consume and return the next token
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_trivia();
        let start = self.position();

        let Some(c) = self.peek_char() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                start,
                end: start,
            });
        };

        let kind = match c {
            '@' => self.punct(TokenKind::At),
            '{' => self.punct(TokenKind::LBrace),
            '}' => self.punct(TokenKind::RBrace),
            ';' => self.punct(TokenKind::Semicolon),
            ':' => self.punct(TokenKind::Colon),
            '=' => self.punct(TokenKind::Equals),
            '(' => self.punct(TokenKind::LParen),
            ')' => self.punct(TokenKind::RParen),
            ',' => self.punct(TokenKind::Comma),
            '|' => self.punct(TokenKind::Pipe),
            '[' => self.punct(TokenKind::LBracket),
            ']' => self.punct(TokenKind::RBracket),
            '"' | '\'' => TokenKind::Str(self.string(c)?),
            c if c.is_ascii_alphabetic() || c == '_' => TokenKind::Ident(self.identifier()),
            c if c.is_ascii_digit() => TokenKind::Number(self.number()),
            '-' if self.peek_second().is_some_and(|n| n.is_ascii_digit()) => {
                TokenKind::Number(self.number())
            }
            other => {
                return Err(OsfError::lex(
                    format!("Unexpected character '{}'", other.escape_debug()),
                    start,
                ))
            }
        };

        Ok(Token {
            kind,
            start,
            end: self.position(),
        })
    }

    fn punct(&mut self, kind: TokenKind) -> TokenKind {
        self.bump();
        kind
    }

    fn identifier(&mut self) -> String {
        let begin = self.offset;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        self.src[begin..self.offset].to_string()
    }

    /// Maximal run of number-like characters; strictness is checked later
    fn number(&mut self) -> String {
        let begin = self.offset;
        if self.peek_char() == Some('-') {
            self.bump();
        }
        while let Some(c) = self.peek_char() {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        self.src[begin..self.offset].to_string()
    }

    fn string(&mut self, quote: char) -> Result<String> {
        let open = self.position();
        self.bump();
        let mut out = String::new();

        loop {
            let c = match self.peek_char() {
                Some('\n' | '\r') | None => {
                    return Err(OsfError::lex("Unterminated string literal", open))
                }
                Some(c) => c,
            };
            if c == quote {
                self.bump();
                return Ok(out);
            }
            if c == '\\' {
                let escape_at = self.position();
                self.bump();
                out.push(self.escape(escape_at)?);
            } else {
                self.bump();
                out.push(c);
            }
        }
    }

    /// Decode the escape following a backslash
    fn escape(&mut self, at: Position) -> Result<char> {
        let Some(c) = self.bump() else {
            return Err(OsfError::lex("Unterminated string literal", at));
        };
        match c {
            'n' => Ok('\n'),
            't' => Ok('\t'),
            '\\' => Ok('\\'),
            '"' => Ok('"'),
            '\'' => Ok('\''),
            'x' => {
                let value = self.hex_digits(2, 'x', at)?;
                // Two hex digits are always a valid scalar value
                char::from_u32(value)
                    .ok_or_else(|| OsfError::lex(format!("Invalid escape \\x{:02X}", value), at))
            }
            'u' => {
                let value = self.hex_digits(4, 'u', at)?;
                match value {
                    0xD800..=0xDBFF => self.low_surrogate(value, at),
                    0xDC00..=0xDFFF => Err(OsfError::lex(
                        format!("Unpaired surrogate escape \\u{:04X}", value),
                        at,
                    )),
                    _ => char::from_u32(value).ok_or_else(|| {
                        OsfError::lex(format!("Invalid escape \\u{:04X}", value), at)
                    }),
                }
            }
            other => Err(OsfError::lex(
                format!("Unknown escape sequence '\\{}'", other.escape_debug()),
                at,
            )),
        }
    }

    fn low_surrogate(&mut self, high: u32, at: Position) -> Result<char> {
        let unpaired =
            || OsfError::lex(format!("Unpaired surrogate escape \\u{:04X}", high), at);

        if self.peek_char() != Some('\\') || self.peek_second() != Some('u') {
            return Err(unpaired());
        }
        let low_at = self.position();
        self.bump();
        self.bump();
        let low = self.hex_digits(4, 'u', low_at)?;
        if !(0xDC00..=0xDFFF).contains(&low) {
            return Err(unpaired());
        }

        let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
        char::from_u32(combined).ok_or_else(unpaired)
    }

    /// Read exactly `count` hex digits
    fn hex_digits(&mut self, count: usize, escape: char, at: Position) -> Result<u32> {
        let mut value = 0u32;
        for _ in 0..count {
            match self.peek_char().and_then(|c| c.to_digit(16)) {
                Some(digit) => {
                    self.bump();
                    value = value * 16 + digit;
                }
                None => {
                    return Err(OsfError::lex(
                        format!(
                            "Invalid \\{} escape: expected exactly {} hex digits",
                            escape, count
                        ),
                        at,
                    ))
                }
            }
        }
        Ok(value)
    }

    /// Capture raw text up to the `}` matching an already consumed `{`
    ///
    /// Nested braces are balanced. The closing brace is consumed. Returns
    /// `None` when the input ends first.
    pub fn raw_block_body(&mut self) -> Option<String> {
        let begin = self.offset;
        let mut depth = 0usize;
        while let Some(c) = self.peek_char() {
            match c {
                '{' => depth += 1,
                '}' if depth == 0 => {
                    let body = self.src[begin..self.offset].to_string();
                    self.bump();
                    return Some(body);
                }
                '}' => depth -= 1,
                _ => {}
            }
            self.bump();
        }
        None
    }

    /// Capture the rest of the current line, consuming the newline
    pub fn rest_of_line(&mut self) -> String {
        let begin = self.offset;
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
        let line = self.src[begin..self.offset].trim_end_matches('\r').to_string();
        self.bump();
        line
    }
}
