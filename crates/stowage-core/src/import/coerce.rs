use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::import::contract::ColumnType;
use crate::model::{f64_to_decimal, parse_decimal_text, CellValue, FieldValue};

/// Why a cell could not be coerced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoerceError {
    pub expected: ColumnType,
    pub text: String,
}

impl fmt::Display for CoerceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a valid {}", self.text, self.expected)
    }
}

/// Coerce one cell under a contracted column type.
///
/// `Ok(None)` means the cell is empty; the caller decides whether that is
/// allowed. A non-empty cell that cannot be read as the contracted type is
/// an error carrying the offending text.
pub fn coerce_cell(
    cell: &CellValue,
    column_type: ColumnType,
) -> Result<Option<FieldValue>, CoerceError> {
    if cell.is_empty() {
        return Ok(None);
    }

    let value = match column_type {
        ColumnType::String => cell.as_text().map(FieldValue::Text),
        ColumnType::Integer => coerce_integer(cell),
        ColumnType::Decimal => coerce_decimal(cell),
        ColumnType::Date => coerce_date(cell),
    };

    match value {
        Some(value) => Ok(Some(value)),
        None => Err(CoerceError {
            expected: column_type,
            text: cell.as_text().unwrap_or_default(),
        }),
    }
}

/// Coerce raw text (a contract default) the way cell text is coerced.
pub fn coerce_text(text: &str, column_type: ColumnType) -> Option<FieldValue> {
    let cell = CellValue::Text(text.to_string());
    coerce_cell(&cell, column_type).ok().flatten()
}

/// Integers read however the cell spells them: 12, 12.0 and "12.0" all
/// coerce to 12 and fractions truncate, the same rule count cleaning uses.
fn coerce_integer(cell: &CellValue) -> Option<FieldValue> {
    match cell {
        CellValue::Integer(i) => Some(FieldValue::Integer(*i)),
        CellValue::Number(f) => Some(FieldValue::Integer(*f as i64)),
        CellValue::Text(s) => parse_decimal_text(s)?
            .trunc()
            .to_i64()
            .map(FieldValue::Integer),
        _ => None,
    }
}

fn coerce_decimal(cell: &CellValue) -> Option<FieldValue> {
    match cell {
        CellValue::Number(f) => Some(FieldValue::Decimal(f64_to_decimal(*f))),
        CellValue::Integer(i) => Some(FieldValue::Decimal(Decimal::from(*i))),
        CellValue::Text(s) => parse_decimal_text(s).map(FieldValue::Decimal),
        _ => None,
    }
}

fn coerce_date(cell: &CellValue) -> Option<FieldValue> {
    match cell {
        CellValue::DateTime(dt) => Some(FieldValue::Date(dt.date())),
        CellValue::Text(s) => parse_date_text(s).map(FieldValue::Date),
        _ => None,
    }
}

/// Parse date text by trying each supported format in order. The order
/// decides ambiguous values: "02/03/2024" reads as 2 March 2024.
fn parse_date_text(s: &str) -> Option<NaiveDate> {
    let t = s.trim();

    for format in ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(t, format) {
            return Some(date);
        }
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(t, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    for format in ["%d-%m-%Y", "%m-%d-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(t, format) {
            return Some(date);
        }
    }

    None
}
