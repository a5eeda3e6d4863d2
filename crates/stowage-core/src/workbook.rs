use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::model::CellValue;

/// One worksheet as a dense grid anchored at cell A1.
///
/// `rows[r][c]` is the cell at absolute row `r`, column `c`, regardless of
/// where the populated region of the sheet begins. Cells the file never
/// wrote are `Empty`, so positional column contracts stay truthful.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(name: &str, rows: Vec<Vec<CellValue>>) -> Sheet {
        Sheet {
            name: name.to_string(),
            rows,
        }
    }

    /// Cleaned copy used by header sniffing: text cells trimmed, then rows
    /// that are entirely empty dropped, then columns that are entirely empty
    /// dropped. Surviving rows and columns keep their relative order.
    pub fn trimmed(&self) -> Sheet {
        let mut rows: Vec<Vec<CellValue>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(trim_cell).collect::<Vec<_>>())
            .filter(|row| row.iter().any(|c| !c.is_empty()))
            .collect();

        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let keep: Vec<bool> = (0..width)
            .map(|c| {
                rows.iter()
                    .any(|row| row.get(c).map(|v| !v.is_empty()).unwrap_or(false))
            })
            .collect();
        for row in &mut rows {
            let mut col = 0;
            row.retain(|_| {
                let kept = keep[col];
                col += 1;
                kept
            });
        }

        Sheet {
            name: self.name.clone(),
            rows,
        }
    }
}

/// A workbook: named sheets in file order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Open any calamine-supported workbook (xlsx, xls, xlsb, ods) from an
    /// in-memory byte slice and decode every sheet.
    pub fn from_bytes(bytes: &[u8]) -> Result<Workbook, IngestError> {
        let cursor = Cursor::new(bytes);
        let mut workbook = open_workbook_auto_from_rs(cursor)
            .map_err(|e| IngestError::Workbook(format!("failed to open workbook: {e}")))?;

        let names: Vec<String> = workbook.sheet_names().to_owned();
        let mut sheets = Vec::with_capacity(names.len());
        for name in names {
            let range = workbook.worksheet_range(&name).map_err(|e| {
                IngestError::Workbook(format!("failed to read sheet '{name}': {e}"))
            })?;
            sheets.push(sheet_from_range(&name, &range));
        }

        Ok(Workbook { sheets })
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

fn sheet_from_range(name: &str, range: &calamine::Range<Data>) -> Sheet {
    // Range coordinates are absolute, so filling 0..=end keeps the grid
    // anchored at A1 even when the used region starts further in.
    let rows = match range.end() {
        Some((end_row, end_col)) => {
            let mut rows = Vec::with_capacity(end_row as usize + 1);
            for r in 0..=end_row {
                let mut cells = Vec::with_capacity(end_col as usize + 1);
                for c in 0..=end_col {
                    let cell = range
                        .get_value((r, c))
                        .map(decode_cell)
                        .unwrap_or(CellValue::Empty);
                    cells.push(cell);
                }
                rows.push(cells);
            }
            rows
        }
        None => Vec::new(),
    };

    Sheet {
        name: name.to_string(),
        rows,
    }
}

fn decode_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => CellValue::DateTime(ndt),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match parse_iso_datetime(s) {
            Some(ndt) => CellValue::DateTime(ndt),
            None => CellValue::Text(s.clone()),
        },
        // Formula errors (#N/A, #DIV/0!, ...) carry no usable value.
        Data::Error(_) => CellValue::Empty,
        other => CellValue::Text(format!("{other}")),
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    let raw = s.trim_end_matches('Z');
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    None
}

fn trim_cell(cell: &CellValue) -> CellValue {
    match cell {
        CellValue::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(trimmed.to_string())
            }
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.into())
    }

    #[test]
    fn trimmed_drops_empty_rows_then_columns() {
        let sheet = Sheet::new(
            "Sheet1",
            vec![
                vec![CellValue::Empty, text("  a  "), CellValue::Empty, text("b")],
                vec![CellValue::Empty, CellValue::Empty, CellValue::Empty, CellValue::Empty],
                vec![CellValue::Empty, text("c"), CellValue::Empty, CellValue::Empty],
            ],
        );

        let trimmed = sheet.trimmed();
        assert_eq!(trimmed.rows.len(), 2);
        assert_eq!(trimmed.rows[0], vec![text("a"), text("b")]);
        assert_eq!(trimmed.rows[1], vec![text("c"), CellValue::Empty]);
    }

    #[test]
    fn trimmed_treats_blank_text_as_empty() {
        let sheet = Sheet::new(
            "Sheet1",
            vec![
                vec![text("   "), text("x")],
                vec![text(" "), text("   ")],
            ],
        );

        let trimmed = sheet.trimmed();
        assert_eq!(trimmed.rows.len(), 1);
        assert_eq!(trimmed.rows[0], vec![text("x")]);
    }

    #[test]
    fn trimmed_keeps_row_and_column_order() {
        let sheet = Sheet::new(
            "Sheet1",
            vec![
                vec![text("first"), CellValue::Empty, text("second")],
                vec![text("third"), CellValue::Empty, text("fourth")],
            ],
        );

        let trimmed = sheet.trimmed();
        assert_eq!(trimmed.rows[0], vec![text("first"), text("second")]);
        assert_eq!(trimmed.rows[1], vec![text("third"), text("fourth")]);
    }

    #[test]
    fn iso_datetime_parsing() {
        assert_eq!(
            parse_iso_datetime("2024-12-30T14:30:00"),
            NaiveDate::from_ymd_opt(2024, 12, 30).unwrap().and_hms_opt(14, 30, 0)
        );
        assert_eq!(
            parse_iso_datetime("2024-12-30"),
            NaiveDate::from_ymd_opt(2024, 12, 30).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_iso_datetime("not a date"), None);
    }

    #[test]
    fn sheet_lookup_by_name() {
        let workbook = Workbook {
            sheets: vec![Sheet::new("Receipts", vec![]), Sheet::new("Loading", vec![])],
        };
        assert!(workbook.sheet("Loading").is_some());
        assert!(workbook.sheet("Missing").is_none());
    }
}
