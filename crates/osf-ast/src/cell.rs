//! Spreadsheet cell addressing
//!
//! Sheets accept two coordinate notations, `A1` and `(row,col)`. Both are
//! normalised into a single [`CellRef`] key space by [`CellRef::from_a1`] and
//! [`CellRef::new`], so `B3` and `(3,2)` name the same cell.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 1-based cell coordinate. Ordered row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

/// A cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellValue {
    /// A literal string
    Text(String),
    /// A literal number
    Number(f64),
    /// A formula expression, stored without its leading `=`
    Formula(String),
}

impl CellValue {
    /// Classify a string literal: text beginning with `=` is a formula
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        match text.strip_prefix('=') {
            Some(expr) => CellValue::Formula(expr.to_string()),
            None => CellValue::Text(text),
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula(_))
    }
}

/// Error for malformed `A1` references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCellRef(pub String);

impl fmt::Display for InvalidCellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid cell reference '{}'", self.0)
    }
}

impl std::error::Error for InvalidCellRef {}

// Column letters are bijective base-26, so 7 letters already exceed u32.
const MAX_COLUMN_LETTERS: usize = 6;
const MAX_ROW_DIGITS: usize = 9;

impl CellRef {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse `A1` notation: column letters followed by a 1-based row number
    pub fn from_a1(text: &str) -> Result<Self, InvalidCellRef> {
        let invalid = || InvalidCellRef(text.to_string());

        let letters = text.bytes().take_while(|b| b.is_ascii_alphabetic()).count();
        let digits = &text[letters..];
        if letters == 0
            || letters > MAX_COLUMN_LETTERS
            || digits.is_empty()
            || digits.len() > MAX_ROW_DIGITS
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let col = column_index(&text[..letters]).ok_or_else(invalid)?;
        let row: u32 = digits.parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(invalid());
        }

        Ok(Self { row, col })
    }

    /// Render as `A1` notation
    pub fn to_a1(&self) -> String {
        format!("{}{}", column_letters(self.col), self.row)
    }
}

/// Convert column letters (`A`, `Z`, `AA`) to a 1-based index
pub fn column_index(letters: &str) -> Option<u32> {
    let mut index: u32 = 0;
    for b in letters.bytes() {
        if !b.is_ascii_alphabetic() {
            return None;
        }
        let digit = u32::from(b.to_ascii_uppercase() - b'A') + 1;
        index = index.checked_mul(26)?.checked_add(digit)?;
    }
    (index > 0).then_some(index)
}

/// Convert a 1-based column index to letters
pub fn column_letters(mut col: u32) -> String {
    let mut out = Vec::new();
    while col > 0 {
        let rem = (col - 1) % 26;
        out.push(b'A' + rem as u8);
        col = (col - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

impl FromStr for CellRef {
    type Err = InvalidCellRef;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_a1(s)
    }
}

// Serialised as `A1` text so sheets become plain JSON objects.
impl Serialize for CellRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_a1())
    }
}

impl<'de> Deserialize<'de> for CellRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        CellRef::from_a1(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a1_and_tuple_agree() {
        assert_eq!(CellRef::from_a1("A1").unwrap(), CellRef::new(1, 1));
        assert_eq!(CellRef::from_a1("D2").unwrap(), CellRef::new(2, 4));
        assert_eq!(CellRef::from_a1("AA10").unwrap(), CellRef::new(10, 27));
        assert_eq!(CellRef::from_a1("b3").unwrap(), CellRef::new(3, 2));
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letters(1), "A");
        assert_eq!(column_letters(26), "Z");
        assert_eq!(column_letters(27), "AA");
        assert_eq!(column_letters(52), "AZ");
        assert_eq!(column_letters(703), "AAA");
        for col in [1, 2, 25, 26, 27, 700, 703, 16384] {
            assert_eq!(column_index(&column_letters(col)), Some(col));
        }
    }

    #[test]
    fn test_invalid_refs() {
        for bad in ["", "1A", "A", "A0", "A1B", "ABCDEFG1", "A1234567890"] {
            assert!(CellRef::from_a1(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_formula_classification() {
        assert_eq!(
            CellValue::from_text("=B2+C2"),
            CellValue::Formula("B2+C2".into())
        );
        assert_eq!(CellValue::from_text("B2"), CellValue::Text("B2".into()));
    }

    #[test]
    fn test_serde_as_a1() {
        let json = serde_json::to_string(&CellRef::new(2, 4)).unwrap();
        assert_eq!(json, "\"D2\"");
        let back: CellRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CellRef::new(2, 4));
    }
}
