//! Property values and their typed coercions
//!
//! The grammar for values is shared by every block kind; the per-kind
//! builders then coerce a [`Value`] into the field type they need. Coercion
//! failures are reported at the value's own position.

use std::str::FromStr;

use osf_ast::{BlockKind, UnknownVariant};
use osf_validate::literal;

use crate::error::{OsfError, Position, Result};
use crate::lexer::TokenKind;

use super::Parser;

/// Deepest list/object nesting accepted inside one value
pub const MAX_VALUE_DEPTH: usize = 32;

/// A node with the position of its first token
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub pos: Position,
}

impl<T> Spanned<T> {
    pub fn new(node: T, pos: Position) -> Self {
        Self { node, pos }
    }
}

/// A property value as written in the source
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Number(f64),
    Bool(bool),
    /// A bare identifier, only meaningful for keyword properties
    Ident(String),
    List(Vec<Spanned<Value>>),
    Object(Vec<(Spanned<String>, Spanned<Value>)>),
}

impl Value {
    fn describe(&self) -> &'static str {
        match self {
            Value::Str(_) => "a string",
            Value::Number(_) => "a number",
            Value::Bool(_) => "a boolean",
            Value::Ident(_) => "a bare identifier",
            Value::List(_) => "a list",
            Value::Object(_) => "an object",
        }
    }
}

impl<'a> Parser<'a> {
    /// value := string | number | true | false | ident | list | object
    pub(super) fn value(&mut self) -> Result<Spanned<Value>> {
        let token = self.next()?;
        let pos = token.start;
        let node = match token.kind {
            TokenKind::Str(s) => Value::Str(s),
            TokenKind::Number(lexeme) => Value::Number(
                literal::parse_number(&lexeme).map_err(|issue| OsfError::validation(issue, Some(pos)))?,
            ),
            TokenKind::Ident(word) => match word.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::Ident(word),
            },
            TokenKind::LBracket => {
                self.enter(pos)?;
                let items = self.list_items();
                self.depth -= 1;
                Value::List(items?)
            }
            TokenKind::LBrace => {
                self.enter(pos)?;
                let entries = self.object_entries();
                self.depth -= 1;
                Value::Object(entries?)
            }
            other => {
                return Err(OsfError::parse(
                    format!("Expected a value, found {}", other),
                    pos,
                ))
            }
        };
        Ok(Spanned::new(node, pos))
    }

    fn enter(&mut self, pos: Position) -> Result<()> {
        if self.depth >= MAX_VALUE_DEPTH {
            return Err(OsfError::parse(
                format!("Value nesting exceeds {} levels", MAX_VALUE_DEPTH),
                pos,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    /// Items after `[`, up to and including `]`; a trailing comma is allowed
    fn list_items(&mut self) -> Result<Vec<Spanned<Value>>> {
        let mut items = Vec::new();
        loop {
            if self.peek()?.kind == TokenKind::RBracket {
                self.next()?;
                return Ok(items);
            }
            items.push(self.value()?);

            let token = self.next()?;
            match token.kind {
                TokenKind::Comma => {}
                TokenKind::RBracket => return Ok(items),
                other => {
                    return Err(OsfError::parse(
                        format!("Expected ',' or ']' in list, found {}", other),
                        token.start,
                    ))
                }
            }
        }
    }

    /// Entries after `{`, up to and including `}`
    ///
    /// Entries are `key: value` separated by `;` (or `,`); the separator may
    /// be omitted before the closing brace.
    fn object_entries(&mut self) -> Result<Vec<(Spanned<String>, Spanned<Value>)>> {
        let mut entries = Vec::new();
        loop {
            let token = self.next()?;
            let key = match token.kind {
                TokenKind::RBrace => return Ok(entries),
                TokenKind::Ident(name) => Spanned::new(name, token.start),
                other => {
                    return Err(OsfError::parse(
                        format!("Expected identifier or '}}' in object, found {}", other),
                        token.start,
                    ))
                }
            };
            self.expect(TokenKind::Colon, &format!("after key '{}'", key.node))?;
            let value = self.value()?;
            entries.push((key, value));

            let token = self.peek()?;
            match token.kind {
                TokenKind::Semicolon | TokenKind::Comma => {
                    self.next()?;
                }
                TokenKind::RBrace => {}
                other => {
                    return Err(OsfError::parse(
                        format!("Expected ';' or '}}' in object, found {}", other),
                        self.last_end,
                    ))
                }
            }
        }
    }
}

/// Identifies the property a value belongs to, for error messages
#[derive(Debug, Clone, Copy)]
pub struct Context<'k> {
    pub block: BlockKind,
    pub key: &'k str,
}

impl Context<'_> {
    fn mismatch(&self, expected: &str, value: &Spanned<Value>) -> OsfError {
        let hint = if matches!(value.node, Value::Ident(_)) {
            " (bare identifiers are only accepted for keyword properties)"
        } else {
            ""
        };
        OsfError::parse_in(
            self.block,
            format!(
                "Property '{}' of block {} expects {}, found {}{}",
                self.key,
                self.block,
                expected,
                value.node.describe(),
                hint
            ),
            value.pos,
        )
    }
}

impl Spanned<Value> {
    /// A quoted string
    pub fn into_string(self, cx: Context<'_>) -> Result<String> {
        match self.node {
            Value::Str(s) => Ok(s),
            _ => Err(cx.mismatch("a quoted string", &self)),
        }
    }

    /// A quoted string or a bare identifier
    pub fn into_name(self, cx: Context<'_>) -> Result<String> {
        match self.node {
            Value::Str(s) | Value::Ident(s) => Ok(s),
            _ => Err(cx.mismatch("a string or identifier", &self)),
        }
    }

    /// An enum keyword, quoted or bare
    pub fn into_keyword<T>(self, cx: Context<'_>) -> Result<T>
    where
        T: FromStr<Err = UnknownVariant>,
    {
        let pos = self.pos;
        let name = self.into_name(cx)?;
        literal::parse_keyword(&name)
            .map_err(|issue| OsfError::validation(issue.in_block(cx.block), Some(pos)))
    }

    pub fn into_bool(self, cx: Context<'_>) -> Result<bool> {
        match self.node {
            Value::Bool(b) => Ok(b),
            _ => Err(cx.mismatch("true or false", &self)),
        }
    }

    pub fn into_number(self, cx: Context<'_>) -> Result<f64> {
        match self.node {
            Value::Number(n) => Ok(n),
            _ => Err(cx.mismatch("a number", &self)),
        }
    }

    /// A positive whole number (line numbers, coordinates)
    pub fn into_positive(self, cx: Context<'_>) -> Result<u32> {
        let pos = self.pos;
        let n = self.into_number(cx)?;
        literal::positive_integer(n, cx.key)
            .map_err(|issue| OsfError::validation(issue.in_block(cx.block), Some(pos)))
    }

    pub fn into_list(self, cx: Context<'_>) -> Result<Vec<Spanned<Value>>> {
        match self.node {
            Value::List(items) => Ok(items),
            _ => Err(cx.mismatch("a list", &self)),
        }
    }

    pub fn into_object(self, cx: Context<'_>) -> Result<Vec<(Spanned<String>, Spanned<Value>)>> {
        match self.node {
            Value::Object(entries) => Ok(entries),
            _ => Err(cx.mismatch("an object", &self)),
        }
    }

    /// A list of quoted strings
    pub fn into_string_list(self, cx: Context<'_>) -> Result<Vec<String>> {
        self.into_list(cx)?
            .into_iter()
            .map(|item| item.into_string(cx))
            .collect()
    }

    /// A list of strings or bare identifiers
    pub fn into_name_list(self, cx: Context<'_>) -> Result<Vec<String>> {
        self.into_list(cx)?
            .into_iter()
            .map(|item| item.into_name(cx))
            .collect()
    }
}
