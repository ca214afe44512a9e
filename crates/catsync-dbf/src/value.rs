//! Per-type field decoding.
//!
//! Blank input decodes to `Some(FieldValue::Null)`; unparsable input is
//! `None`. The reader turns the latter into a [`crate::FieldDecodeError`] and
//! stores null.

use chrono::NaiveDate;
use serde::Serialize;

use crate::header::{FieldDescriptor, FieldType};

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Null,
}

impl FieldValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Text form of the value, `None` for null.
    ///
    /// Whole-number floats render without a fraction so numeric barcode
    /// columns never come out in exponent notation.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Integer(n) => Some(n.to_string()),
            Self::Float(f) if f.fract() == 0.0 && f.abs() < 1e18 => Some(format!("{f:.0}")),
            Self::Float(f) => Some(f.to_string()),
            Self::Date(d) => Some(d.format("%Y%m%d").to_string()),
            Self::Null => None,
        }
    }

    /// Numeric form of the value. Text is parsed leniently; dates have none.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            Self::Text(text) => parse_float(text),
            Self::Date(_) | Self::Null => None,
        }
    }
}

/// Decode one field's raw bytes according to its descriptor.
///
/// Returns `None` when the bytes are present but unparsable for the type.
#[must_use]
pub fn decode_field(descriptor: &FieldDescriptor, raw: &[u8]) -> Option<FieldValue> {
    let text = decode_latin1(raw);
    let trimmed = text.trim();

    match descriptor.field_type {
        FieldType::Numeric => parse_numeric(trimmed, descriptor.decimals),
        FieldType::Date => parse_date(trimmed),
        FieldType::Character | FieldType::Other(_) => Some(text_or_null(trimmed)),
    }
}

/// Single-byte Latin-1 decode. Every byte maps to the code point of the same value.
#[must_use]
pub fn decode_latin1(raw: &[u8]) -> String {
    raw.iter().map(|&b| char::from(b)).collect()
}

fn text_or_null(trimmed: &str) -> FieldValue {
    if trimmed.is_empty() {
        FieldValue::Null
    } else {
        FieldValue::Text(trimmed.to_string())
    }
}

/// Parse a numeric field. Blank is null; `decimals > 0` yields a float,
/// otherwise an integer.
#[must_use]
pub fn parse_numeric(trimmed: &str, decimals: u8) -> Option<FieldValue> {
    if trimmed.is_empty() {
        return Some(FieldValue::Null);
    }
    if decimals > 0 {
        parse_float(trimmed).map(FieldValue::Float)
    } else {
        trimmed.parse::<i64>().ok().map(FieldValue::Integer)
    }
}

/// Parse a date field: exactly eight ASCII digits as `YYYYMMDD`.
///
/// Blank is null. Anything else, including impossible calendar dates, is
/// unparsable.
#[must_use]
pub fn parse_date(trimmed: &str) -> Option<FieldValue> {
    if trimmed.is_empty() {
        return Some(FieldValue::Null);
    }
    if trimmed.len() != 8 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y%m%d")
        .ok()
        .map(FieldValue::Date)
}

fn parse_float(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn field(field_type: FieldType, length: u8, decimals: u8) -> FieldDescriptor {
        FieldDescriptor {
            name: "F".into(),
            field_type,
            length,
            decimals,
        }
    }

    #[rstest]
    #[case(b"WHITE BREAD 350G    ", Some(FieldValue::Text("WHITE BREAD 350G".into())))]
    #[case(b"   padded   ", Some(FieldValue::Text("padded".into())))]
    #[case(b"          ", Some(FieldValue::Null))]
    #[case(b"JALAPE\xD1O", Some(FieldValue::Text("JALAPE\u{d1}O".into())))]
    fn character_fields(#[case] raw: &[u8], #[case] expected: Option<FieldValue>) {
        let len = u8::try_from(raw.len()).unwrap();
        assert_eq!(decode_field(&field(FieldType::Character, len, 0), raw), expected);
    }

    #[rstest]
    #[case(b"     45.50", 2, Some(FieldValue::Float(45.5)))]
    #[case(b"      -3.5", 1, Some(FieldValue::Float(-3.5)))]
    #[case(b"      1234", 0, Some(FieldValue::Integer(1234)))]
    #[case(b"          ", 2, Some(FieldValue::Null))]
    #[case(b"   **.**  ", 2, None)]
    #[case(b"     12.50", 0, None)]
    #[case(b"\0\0\0\0\0\0\0\0\0\0", 2, None)]
    fn numeric_fields(#[case] raw: &[u8], #[case] decimals: u8, #[case] expected: Option<FieldValue>) {
        assert_eq!(decode_field(&field(FieldType::Numeric, 10, decimals), raw), expected);
    }

    #[rstest]
    #[case(b"20261019", Some(FieldValue::Date(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())))]
    #[case(b"        ", Some(FieldValue::Null))]
    #[case(b"20261399", None)]
    #[case(b"2026-1-9", None)]
    #[case(b"2026101 ", None)]
    fn date_fields(#[case] raw: &[u8], #[case] expected: Option<FieldValue>) {
        assert_eq!(decode_field(&field(FieldType::Date, 8, 0), raw), expected);
    }

    #[test]
    fn non_finite_numbers_are_unparsable() {
        assert_eq!(parse_numeric("inf", 2), None);
        assert_eq!(parse_numeric("NaN", 2), None);
    }

    #[test]
    fn whole_floats_render_without_exponent() {
        assert_eq!(
            FieldValue::Float(4_800_016_000_123.0).to_text().as_deref(),
            Some("4800016000123")
        );
        assert_eq!(FieldValue::Integer(42).to_text().as_deref(), Some("42"));
        assert_eq!(FieldValue::Null.to_text(), None);
    }

    #[test]
    fn text_prices_parse_as_numbers() {
        assert_eq!(FieldValue::Text("45.50".into()).as_f64(), Some(45.5));
        assert_eq!(FieldValue::Text("n/a".into()).as_f64(), None);
    }
}
