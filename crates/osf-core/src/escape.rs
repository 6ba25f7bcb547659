//! String escaping for OSF output
//!
//! One lookup decides how every character is written back out. Printable
//! ASCII is literal, the four named escapes cover backslash, double quote,
//! newline and tab, and everything else takes the shortest hex form that can
//! hold it.

use std::fmt::Write;

/// How a single character is written inside a double-quoted string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escape {
    /// Written as-is
    Literal(char),
    /// `\\`, `\"`, `\n` or `\t`
    Named(&'static str),
    /// `\xXX`
    Byte(u8),
    /// `\uXXXX`
    Unit(u16),
    /// `\uXXXX\uXXXX` surrogate pair
    Pair(u16, u16),
}

/// Choose the escape form for a character
pub fn escape_char(c: char) -> Escape {
    match c {
        '\\' => Escape::Named("\\\\"),
        '"' => Escape::Named("\\\""),
        '\n' => Escape::Named("\\n"),
        '\t' => Escape::Named("\\t"),
        ' '..='~' => Escape::Literal(c),
        _ => {
            let code = u32::from(c);
            if code < 0x100 {
                Escape::Byte(code as u8)
            } else if code <= 0xFFFF {
                Escape::Unit(code as u16)
            } else {
                let mut units = [0u16; 2];
                c.encode_utf16(&mut units);
                Escape::Pair(units[0], units[1])
            }
        }
    }
}

/// Append `text` as a double-quoted OSF string literal
pub fn write_quoted(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        match escape_char(c) {
            Escape::Literal(c) => out.push(c),
            Escape::Named(s) => out.push_str(s),
            Escape::Byte(b) => write!(out, "\\x{:02X}", b).unwrap(),
            Escape::Unit(u) => write!(out, "\\u{:04X}", u).unwrap(),
            Escape::Pair(hi, lo) => write!(out, "\\u{:04X}\\u{:04X}", hi, lo).unwrap(),
        }
    }
    out.push('"');
}

/// `text` as a double-quoted OSF string literal
pub fn quoted(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    write_quoted(&mut out, text);
    out
}

/// Escape a table cell for a pipe row
pub fn table_cell(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '|' => out.push_str("\\|"),
            '\\' => out.push_str("\\\\"),
            // Rows are single lines
            '\n' | '\r' => out.push(' '),
            c => out.push(c),
        }
    }
    out
}
