use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::model::{f64_to_decimal, parse_decimal_text, CellValue, FieldValue};
use crate::sniff::FieldSemantic;

/// Clean one matched cell per the target's semantic.
///
/// Returns `None` when the cell is empty, a placeholder, or does not parse
/// under the semantic. Cleaning failures are silent: the field is simply
/// absent from the record.
pub fn clean_cell(cell: &CellValue, semantic: FieldSemantic) -> Option<FieldValue> {
    match semantic {
        FieldSemantic::Volume | FieldSemantic::Weight => {
            clean_decimal(cell).map(FieldValue::Decimal)
        }
        FieldSemantic::Count => clean_count(cell).map(FieldValue::Integer),
        FieldSemantic::Currency => clean_currency(cell).map(FieldValue::Decimal),
        FieldSemantic::Text => clean_text(cell).map(FieldValue::Text),
    }
}

/// Placeholders spreadsheets use for "no value".
fn is_placeholder(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "nan" | "none" | "null")
}

fn clean_text(cell: &CellValue) -> Option<String> {
    let text = cell.as_text()?;
    if is_placeholder(&text) {
        return None;
    }
    Some(text)
}

fn clean_decimal(cell: &CellValue) -> Option<Decimal> {
    match cell {
        CellValue::Number(f) => Some(f64_to_decimal(*f)),
        CellValue::Integer(i) => Some(Decimal::from(*i)),
        CellValue::Text(s) => parse_decimal_text(s),
        _ => None,
    }
}

/// Counts accept whole numbers however the cell spells them: 12, 12.0 and
/// "12.0" all clean to 12. Fractions truncate.
fn clean_count(cell: &CellValue) -> Option<i64> {
    match cell {
        CellValue::Integer(i) => Some(*i),
        CellValue::Number(f) => Some(*f as i64),
        CellValue::Text(s) => parse_decimal_text(s)?.trunc().to_i64(),
        _ => None,
    }
}

/// Currency keeps digits, dots and commas, then parses like a decimal:
/// "USD 1,250.50" -> 1250.50.
fn clean_currency(cell: &CellValue) -> Option<Decimal> {
    match cell {
        CellValue::Number(f) => Some(f64_to_decimal(*f)),
        CellValue::Integer(i) => Some(Decimal::from(*i)),
        CellValue::Text(s) => {
            let kept: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
                .collect();
            parse_decimal_text(&kept)
        }
        _ => None,
    }
}
