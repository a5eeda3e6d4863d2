pub mod clean;
pub mod normalize;

use std::collections::{BTreeMap, HashMap};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::model::{CellValue, FieldValue};
use crate::workbook::Workbook;

/// Cleaning semantics for a target column.
///
/// Carried explicitly on the target so cleaning never has to guess from the
/// column caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSemantic {
    /// Cubic-metre style measures. Cleaned to exact decimals.
    Volume,
    /// Carton and package counts. Cleaned to integers.
    Count,
    /// Weights. Cleaned to exact decimals.
    Weight,
    /// Money amounts. Digits kept, currency symbols dropped.
    Currency,
    /// Free text.
    Text,
}

impl FieldSemantic {
    pub fn from_str_loose(s: &str) -> Option<FieldSemantic> {
        match s.trim().to_lowercase().as_str() {
            "volume" => Some(FieldSemantic::Volume),
            "count" => Some(FieldSemantic::Count),
            "weight" => Some(FieldSemantic::Weight),
            "currency" => Some(FieldSemantic::Currency),
            "text" => Some(FieldSemantic::Text),
            _ => None,
        }
    }

    /// Guess a semantic from a well-known logical column name.
    ///
    /// A construction convenience for `TargetColumn::named`; unknown names
    /// fall back to `Text`.
    pub fn infer(name: &str) -> FieldSemantic {
        match normalize::normalize_label(name).as_str() {
            "cbm" | "volume" | "vol" => FieldSemantic::Volume,
            "ctns" | "cartons" | "qty" | "quantity" | "pcs" | "packages" => FieldSemantic::Count,
            "weight" | "weight kg" | "gross weight" | "kg" => FieldSemantic::Weight,
            "amount" | "price" | "unit price" | "value" | "total" => FieldSemantic::Currency,
            _ => FieldSemantic::Text,
        }
    }
}

/// One logical column the caller wants out of a messy sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetColumn {
    /// Logical field name records are keyed by, e.g. "shipping_mark".
    pub name: String,
    /// How matched cells are cleaned.
    pub semantic: FieldSemantic,
}

impl TargetColumn {
    pub fn new(name: &str, semantic: FieldSemantic) -> TargetColumn {
        TargetColumn {
            name: name.to_string(),
            semantic,
        }
    }

    /// Target with the semantic inferred from the name.
    pub fn named(name: &str) -> TargetColumn {
        TargetColumn {
            name: name.to_string(),
            semantic: FieldSemantic::infer(name),
        }
    }

    /// Parse a "name" or "name:semantic" spec, as taken on a command line.
    pub fn parse(spec: &str) -> Result<TargetColumn, IngestError> {
        match spec.split_once(':') {
            Some((name, semantic)) => {
                let name = name.trim();
                if name.is_empty() {
                    return Err(IngestError::TargetInvalid(format!(
                        "'{spec}' has no column name"
                    )));
                }
                let semantic = FieldSemantic::from_str_loose(semantic).ok_or_else(|| {
                    IngestError::TargetInvalid(format!(
                        "unknown semantic in '{spec}' (expected volume, count, weight, currency or text)"
                    ))
                })?;
                Ok(TargetColumn::new(name, semantic))
            }
            None => {
                if spec.trim().is_empty() {
                    return Err(IngestError::TargetInvalid("empty target".into()));
                }
                Ok(TargetColumn::named(spec.trim()))
            }
        }
    }
}

/// Configuration for header sniffing and extraction.
#[derive(Debug, Clone)]
pub struct SniffOptions {
    /// How many leading rows of each sheet to scan for a header.
    pub max_header_search_rows: usize,
    /// Minimum fraction of targets a row must match to be a candidate.
    pub min_match_threshold: f64,
    /// Clean matched cells per their target semantic. When false, every
    /// non-empty matched cell is carried as its loose text.
    pub clean: bool,
}

impl Default for SniffOptions {
    fn default() -> SniffOptions {
        SniffOptions {
            max_header_search_rows: 20,
            min_match_threshold: 0.5,
            clean: true,
        }
    }
}

/// The header row selected for a workbook, and where its columns sit.
///
/// Row and column indexes refer to the trimmed grid of the winning sheet
/// (see `Sheet::trimmed`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderMatch {
    /// Sheet the header was found on.
    pub sheet: String,
    /// Position of that sheet within the workbook.
    pub sheet_index: usize,
    /// Row index of the header.
    pub header_row: usize,
    /// Fraction of targets that matched (matched / total).
    pub score: f64,
    /// Logical field name to column index, for every matched target.
    pub columns: BTreeMap<String, usize>,
}

/// One data row extracted below a sniffed header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    /// Row index within the trimmed grid.
    pub row: usize,
    /// Cleaned values keyed by logical field name. Only matched targets
    /// whose cell survived cleaning appear.
    pub fields: BTreeMap<String, FieldValue>,
}

/// A data row that produced no record, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: String,
}

/// Extraction result with diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetExtraction {
    /// The winning header, or None when no row met the threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<HeaderMatch>,
    pub records: Vec<ExtractedRecord>,
    pub skipped_rows: Vec<SkippedRow>,
}

impl SheetExtraction {
    fn empty() -> SheetExtraction {
        SheetExtraction {
            header: None,
            records: Vec::new(),
            skipped_rows: Vec::new(),
        }
    }
}

/// Find the row across all sheets that best matches the targets.
///
/// Sheets are scanned in file order, the first `max_header_search_rows` rows
/// of each trimmed grid. A row is a candidate when its score reaches the
/// threshold; a later candidate displaces the best only by strictly
/// exceeding its score, so ties keep the earlier row. Returns None when no
/// row qualifies, which is not an error.
pub fn find_header(
    workbook: &Workbook,
    targets: &[TargetColumn],
    options: &SniffOptions,
) -> Option<HeaderMatch> {
    if targets.is_empty() {
        return None;
    }

    let mut best: Option<HeaderMatch> = None;

    for (sheet_index, sheet) in workbook.sheets.iter().enumerate() {
        let trimmed = sheet.trimmed();
        let limit = options.max_header_search_rows.min(trimmed.rows.len());

        for (row_idx, row) in trimmed.rows.iter().take(limit).enumerate() {
            let columns = match_targets(row, targets);
            if columns.is_empty() {
                continue;
            }
            let score = columns.len() as f64 / targets.len() as f64;
            if score < options.min_match_threshold {
                continue;
            }
            debug!(
                "header candidate: sheet '{}' row {} score {:.2}",
                trimmed.name, row_idx, score
            );

            let displaces = match &best {
                None => true,
                Some(current) => score > current.score,
            };
            if displaces {
                best = Some(HeaderMatch {
                    sheet: trimmed.name.clone(),
                    sheet_index,
                    header_row: row_idx,
                    score,
                    columns,
                });
            }
        }
    }

    best
}

/// Match targets against one candidate row.
///
/// Each target independently takes the leftmost cell whose caption contains
/// it. Matching is deliberately permissive: a column matched by one target
/// stays available to every later target, so two targets may map to the
/// same column.
fn match_targets(row: &[CellValue], targets: &[TargetColumn]) -> BTreeMap<String, usize> {
    let mut columns = BTreeMap::new();

    for target in targets {
        for (col, cell) in row.iter().enumerate() {
            let Some(caption) = cell.as_text() else {
                continue;
            };
            if normalize::labels_match(&caption, &target.name) {
                columns.insert(target.name.clone(), col);
                break;
            }
        }
    }

    columns
}

/// Sniff out the header and extract typed records from the rows below it.
///
/// No header means an empty extraction, never an error. Rows whose matched
/// cells are all empty, and rows where no cell survives cleaning, land in
/// `skipped_rows` with a reason.
pub fn extract(
    workbook: &Workbook,
    targets: &[TargetColumn],
    options: &SniffOptions,
) -> SheetExtraction {
    let Some(header) = find_header(workbook, targets, options) else {
        return SheetExtraction::empty();
    };

    let by_name: HashMap<&str, &TargetColumn> =
        targets.iter().map(|t| (t.name.as_str(), t)).collect();
    let trimmed = workbook.sheets[header.sheet_index].trimmed();

    let mut records = Vec::new();
    let mut skipped_rows = Vec::new();

    for (row_idx, row) in trimmed.rows.iter().enumerate().skip(header.header_row + 1) {
        let mut fields = BTreeMap::new();
        let mut all_empty = true;

        for (name, &col) in &header.columns {
            let cell = row.get(col).cloned().unwrap_or(CellValue::Empty);
            if !cell.is_empty() {
                all_empty = false;
            }
            let Some(target) = by_name.get(name.as_str()) else {
                continue;
            };
            let value = if options.clean {
                clean::clean_cell(&cell, target.semantic)
            } else {
                cell.as_text().map(FieldValue::Text)
            };
            if let Some(value) = value {
                fields.insert(name.clone(), value);
            }
        }

        if all_empty {
            skipped_rows.push(SkippedRow {
                row: row_idx,
                reason: "all matched columns empty".into(),
            });
            continue;
        }
        if fields.is_empty() {
            skipped_rows.push(SkippedRow {
                row: row_idx,
                reason: "no value survived cleaning".into(),
            });
            continue;
        }

        records.push(ExtractedRecord {
            row: row_idx,
            fields,
        });
    }

    SheetExtraction {
        header: Some(header),
        records,
        skipped_rows,
    }
}
