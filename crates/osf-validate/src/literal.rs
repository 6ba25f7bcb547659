//! Strict literal rules
//!
//! Numbers, enum keywords, coordinates and colours are checked here so the
//! parser and the document validators agree on one definition of "well
//! formed". Every check is a single forward scan.

use std::str::FromStr;
use std::sync::OnceLock;

use osf_ast::UnknownVariant;
use regex::Regex;

use crate::{Result, ValidationIssue};

pub const NUMBER_CODE: &str = "OSF210";
pub const KEYWORD_CODE: &str = "OSF211";
pub const INTEGER_CODE: &str = "OSF212";
pub const COLOR_CODE: &str = "OSF213";

/// Parse a numeric literal: `-?digits(.digits)?`
///
/// Anything else (multiple decimal points, exponents, trailing letters, a
/// dangling `.`) is rejected rather than partially read.
pub fn parse_number(lexeme: &str) -> Result<f64> {
    let invalid = || ValidationIssue::new(NUMBER_CODE, format!("Invalid number format '{}'", lexeme));

    let bytes = lexeme.as_bytes();
    let mut i = 0;
    if bytes.first() == Some(&b'-') {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == int_start {
        return Err(invalid());
    }

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == frac_start {
            return Err(invalid());
        }
    }

    if i != bytes.len() {
        return Err(invalid());
    }

    let value: f64 = lexeme.parse().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }
    Ok(value)
}

/// Parse an enum keyword, turning an unknown spelling into an issue
pub fn parse_keyword<T>(text: &str) -> Result<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    text.parse()
        .map_err(|err: UnknownVariant| ValidationIssue::new(KEYWORD_CODE, err.to_string()))
}

/// Require a positive whole number (cell coordinates, line numbers)
pub fn positive_integer(value: f64, what: &str) -> Result<u32> {
    if value.fract() == 0.0 && value >= 1.0 && value <= f64::from(u32::MAX) {
        Ok(value as u32)
    } else {
        Err(ValidationIssue::new(
            INTEGER_CODE,
            format!("{} must be a positive whole number, got {}", what, value),
        ))
    }
}

/// Check a chart colour: `#RGB`, `#RRGGBB` or a CSS colour name
pub fn check_color(color: &str) -> Result<()> {
    static COLOR_RE: OnceLock<Regex> = OnceLock::new();
    let color_re = COLOR_RE.get_or_init(|| {
        Regex::new(r"^(?:#(?:[0-9A-Fa-f]{3}|[0-9A-Fa-f]{6})|[A-Za-z]{1,32})$").unwrap()
    });

    if color_re.is_match(color) {
        Ok(())
    } else {
        Err(ValidationIssue::new(
            COLOR_CODE,
            format!("Invalid color '{}' (expected #RGB, #RRGGBB or a color name)", color),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osf_ast::{Alignment, ChartType};

    #[test]
    fn test_valid_numbers() {
        assert_eq!(parse_number("0").unwrap(), 0.0);
        assert_eq!(parse_number("100").unwrap(), 100.0);
        assert_eq!(parse_number("-3.25").unwrap(), -3.25);
        assert_eq!(parse_number("007").unwrap(), 7.0);
    }

    #[test]
    fn test_malformed_numbers() {
        for bad in ["1.2.3", "12abc", "5.", "-", "-.5", "1e5", "1_000", "", "0x10"] {
            let err = parse_number(bad).unwrap_err();
            assert_eq!(err.code, NUMBER_CODE, "{bad}");
            assert!(err.message.contains("Invalid number format"));
        }
    }

    #[test]
    fn test_keywords() {
        assert_eq!(parse_keyword::<ChartType>("pie").unwrap(), ChartType::Pie);
        assert_eq!(parse_keyword::<Alignment>("right").unwrap(), Alignment::Right);

        let err = parse_keyword::<Alignment>("justify").unwrap_err();
        assert_eq!(err.code, KEYWORD_CODE);
        assert!(err.message.contains("justify"));
    }

    #[test]
    fn test_positive_integer() {
        assert_eq!(positive_integer(3.0, "row").unwrap(), 3);
        assert!(positive_integer(0.0, "row").is_err());
        assert!(positive_integer(-1.0, "row").is_err());
        assert!(positive_integer(2.5, "row").is_err());
        assert!(positive_integer(1e12, "row").is_err());
    }

    #[test]
    fn test_colors() {
        assert!(check_color("#3B82F6").is_ok());
        assert!(check_color("#fff").is_ok());
        assert!(check_color("teal").is_ok());
        assert!(check_color("#12345").is_err());
        assert!(check_color("red; background: url(x)").is_err());
    }
}
