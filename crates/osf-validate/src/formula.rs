//! Formula syntax checking
//!
//! Formula cells are stored as opaque text and evaluated elsewhere, but they
//! must be well formed: either the whole expression parses or the cell is
//! rejected. The checker tokenises in one pass and then runs a small
//! recursive-descent grammar whose nesting depth is capped, so adversarial
//! input cannot drive it past linear time or blow the stack.
//!
//! ```text
//! expr       := comparison
//! comparison := concat (("=" | "<>" | "<" | ">" | "<=" | ">=") concat)*
//! concat     := additive ("&" additive)*
//! additive   := term (("+" | "-") term)*
//! term       := power (("*" | "/") power)*
//! power      := unary ("^" unary)*
//! unary      := ("+" | "-") unary | postfix
//! postfix    := primary "%"?
//! primary    := number | string | TRUE | FALSE | ref (":" ref)?
//!             | NAME "(" (expr ("," expr)*)? ")" | "(" expr ")"
//! ref        := "$"? letters "$"? digits
//! ```

use crate::{Result, ValidationIssue};

pub const FORMULA_CODE: &str = "OSF202";

/// Maximum nesting of parentheses, calls and unary operators
pub const MAX_FORMULA_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Number,
    Str,
    Bool,
    Ref,
    Name,
    Op(&'static str),
    LParen,
    RParen,
    Comma,
    Colon,
    Percent,
}

/// Check a formula expression (without its leading `=`)
pub fn check_formula(expr: &str) -> Result<()> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err(issue(expr, "formula is empty"));
    }

    let mut parser = FormulaParser {
        expr,
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    parser.expression()?;
    if parser.pos != tokens.len() {
        return Err(issue(expr, "unexpected trailing input"));
    }
    Ok(())
}

fn issue(expr: &str, reason: &str) -> ValidationIssue {
    ValidationIssue::new(
        FORMULA_CODE,
        format!("Invalid formula '={}': {}", expr, reason),
    )
}

fn tokenize(expr: &str) -> Result<Vec<Tok>> {
    let bytes = expr.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match b {
            b' ' | b'\t' => i += 1,
            b'(' => {
                tokens.push(Tok::LParen);
                i += 1;
            }
            b')' => {
                tokens.push(Tok::RParen);
                i += 1;
            }
            b',' | b';' => {
                tokens.push(Tok::Comma);
                i += 1;
            }
            b':' => {
                tokens.push(Tok::Colon);
                i += 1;
            }
            b'%' => {
                tokens.push(Tok::Percent);
                i += 1;
            }
            b'+' | b'-' | b'*' | b'/' | b'^' | b'&' | b'=' => {
                let op = match b {
                    b'+' => "+",
                    b'-' => "-",
                    b'*' => "*",
                    b'/' => "/",
                    b'^' => "^",
                    b'&' => "&",
                    _ => "=",
                };
                tokens.push(Tok::Op(op));
                i += 1;
            }
            b'<' | b'>' => {
                let next = bytes.get(i + 1).copied();
                let op = match (b, next) {
                    (b'<', Some(b'>')) => "<>",
                    (b'<', Some(b'=')) => "<=",
                    (b'>', Some(b'=')) => ">=",
                    (b'<', _) => "<",
                    _ => ">",
                };
                i += op.len();
                tokens.push(Tok::Op(op));
            }
            b'"' => {
                i += 1;
                loop {
                    match bytes.get(i) {
                        None => return Err(issue(expr, "unterminated string")),
                        // `""` is an escaped quote inside a formula string
                        Some(b'"') if bytes.get(i + 1) == Some(&b'"') => i += 2,
                        Some(b'"') => {
                            i += 1;
                            break;
                        }
                        Some(_) => i += 1,
                    }
                }
                tokens.push(Tok::Str);
            }
            b'0'..=b'9' | b'.' => {
                let start = i;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                if i < bytes.len() && bytes[i] == b'.' {
                    i += 1;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let text = &expr[start..i];
                if text == "." || text.matches('.').count() > 1 {
                    return Err(issue(expr, "malformed number"));
                }
                if i < bytes.len() && (bytes[i].is_ascii_alphabetic() || bytes[i] == b'.') {
                    return Err(issue(expr, "malformed number"));
                }
                tokens.push(Tok::Number);
            }
            b'$' | b'A'..=b'Z' | b'a'..=b'z' | b'_' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric()
                        || bytes[i] == b'$'
                        || bytes[i] == b'_'
                        || bytes[i] == b'.')
                {
                    i += 1;
                }
                let word = &expr[start..i];
                tokens.push(classify_word(expr, word)?);
            }
            _ => {
                let ch = expr[i..].chars().next().unwrap_or('?');
                return Err(issue(expr, &format!("unexpected character '{}'", ch)));
            }
        }
    }

    Ok(tokens)
}

fn classify_word(expr: &str, word: &str) -> Result<Tok> {
    if word.eq_ignore_ascii_case("TRUE") || word.eq_ignore_ascii_case("FALSE") {
        return Ok(Tok::Bool);
    }
    if is_cell_ref(word) {
        return Ok(Tok::Ref);
    }
    if !word.contains('$') && word.as_bytes()[0].is_ascii_alphabetic() {
        return Ok(Tok::Name);
    }
    Err(issue(expr, &format!("invalid reference '{}'", word)))
}

/// `$?letters$?digits` with at most 3 column letters and 7 row digits
fn is_cell_ref(word: &str) -> bool {
    let bytes = word.as_bytes();
    let mut i = 0;
    if bytes.get(i) == Some(&b'$') {
        i += 1;
    }
    let letters_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }
    let letters = i - letters_start;
    if bytes.get(i) == Some(&b'$') {
        i += 1;
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let digits = i - digits_start;

    i == bytes.len()
        && (1..=3).contains(&letters)
        && (1..=7).contains(&digits)
        && bytes[digits_start] != b'0'
}

struct FormulaParser<'a> {
    expr: &'a str,
    tokens: &'a [Tok],
    pos: usize,
    depth: usize,
}

impl FormulaParser<'_> {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_op(&mut self, ops: &[&str]) -> bool {
        match self.peek() {
            Some(Tok::Op(op)) if ops.contains(op) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_FORMULA_DEPTH {
            return Err(issue(self.expr, "expression nests too deeply"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn expression(&mut self) -> Result<()> {
        self.binary(0)
    }

    // Precedence levels, loosest first.
    const LEVELS: [&'static [&'static str]; 5] = [
        &["=", "<>", "<", ">", "<=", ">="],
        &["&"],
        &["+", "-"],
        &["*", "/"],
        &["^"],
    ];

    fn binary(&mut self, level: usize) -> Result<()> {
        if level == Self::LEVELS.len() {
            return self.unary();
        }
        self.binary(level + 1)?;
        while self.eat_op(Self::LEVELS[level]) {
            self.binary(level + 1)?;
        }
        Ok(())
    }

    fn unary(&mut self) -> Result<()> {
        if self.eat_op(&["+", "-"]) {
            self.enter()?;
            let result = self.unary();
            self.leave();
            return result;
        }
        self.primary()?;
        self.eat(&Tok::Percent);
        Ok(())
    }

    fn primary(&mut self) -> Result<()> {
        let Some(tok) = self.peek().cloned() else {
            return Err(issue(self.expr, "unexpected end of formula"));
        };
        self.pos += 1;

        match tok {
            Tok::Number | Tok::Str | Tok::Bool => Ok(()),
            Tok::Ref => {
                if self.eat(&Tok::Colon) && !self.eat(&Tok::Ref) {
                    return Err(issue(self.expr, "range must end with a cell reference"));
                }
                Ok(())
            }
            Tok::Name => {
                if !self.eat(&Tok::LParen) {
                    return Err(issue(self.expr, "unknown name; expected a cell reference or function call"));
                }
                self.enter()?;
                if !self.eat(&Tok::RParen) {
                    self.expression()?;
                    while self.eat(&Tok::Comma) {
                        self.expression()?;
                    }
                    if !self.eat(&Tok::RParen) {
                        return Err(issue(self.expr, "missing ')' after function arguments"));
                    }
                }
                self.leave();
                Ok(())
            }
            Tok::LParen => {
                self.enter()?;
                self.expression()?;
                if !self.eat(&Tok::RParen) {
                    return Err(issue(self.expr, "missing ')'"));
                }
                self.leave();
                Ok(())
            }
            _ => Err(issue(self.expr, "expected a value")),
        }
    }
}
