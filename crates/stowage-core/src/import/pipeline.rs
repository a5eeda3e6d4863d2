use std::collections::HashMap;

use log::{debug, warn};
use uuid::Uuid;

use crate::error::IngestError;
use crate::import::coerce;
use crate::import::contract::{validate_contract, ColumnContract};
use crate::import::outcome::{ImportReport, ImportRowResult, ImportSummary, RowOutcome};
use crate::model::CellValue;
use crate::store::{ConsigneeDirectory, ImportCallback, ReceiptFields, ReceiptStore, StoreError};
use crate::workbook::Sheet;

/// Knobs for an import run.
#[derive(Default)]
pub struct ImportOptions {
    /// Coerce and deduplicate but skip all writes. Outcomes report what a
    /// real run would have done.
    pub dry_run: bool,
    /// Hooks fired once with the final report after the run completes.
    pub callbacks: Vec<Box<dyn ImportCallback>>,
}

/// A data row that survived coercion, ready to persist.
#[derive(Debug, Clone)]
pub struct CoercedRow {
    /// 1-based spreadsheet row number.
    pub row_number: usize,
    /// Natural key derived from the contract's key fields.
    pub key: String,
    /// Text of the mark field, resolved against the consignee directory
    /// before any write.
    pub mark: String,
    pub fields: ReceiptFields,
}

/// Outcome of the first import pass.
#[derive(Debug, Default)]
pub struct CollectedRows {
    /// Deduplicated rows in first-appearance order. A later duplicate
    /// replaces the fields of its first appearance in place, so only the
    /// last version of each key is ever persisted.
    pub rows: Vec<CoercedRow>,
    /// Results for rows that never reached the persistence pass.
    pub results: Vec<ImportRowResult>,
    /// Every data row examined, including duplicates absorbed by the dedup.
    pub total_rows: usize,
}

/// First pass: coerce every data row under the contract and deduplicate by
/// natural key.
///
/// The first sheet row is treated as a caption row and skipped; data rows
/// are numbered from 2 like the spreadsheet shows them. Rows whose
/// contracted cells are all empty are skipped, rows that fail coercion
/// become error results, and nothing is written anywhere.
pub fn collect_rows(
    sheet: &Sheet,
    contract: &ColumnContract,
) -> Result<CollectedRows, IngestError> {
    validate_contract(contract)?;

    let mut collected = CollectedRows::default();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for (idx, cells) in sheet.rows.iter().enumerate().skip(1) {
        let row_number = idx + 1;
        collected.total_rows += 1;

        let all_empty = contract
            .columns
            .iter()
            .all(|c| cells.get(c.index).map_or(true, CellValue::is_empty));
        if all_empty {
            collected.results.push(ImportRowResult {
                row: row_number,
                outcome: RowOutcome::Skipped,
                message: Some("empty row".into()),
            });
            continue;
        }

        let fields = match coerce_row(cells, contract) {
            Ok(fields) => fields,
            Err(message) => {
                warn!("{}: row {}: {}", sheet.name, row_number, message);
                collected.results.push(ImportRowResult {
                    row: row_number,
                    outcome: RowOutcome::Error,
                    message: Some(message),
                });
                continue;
            }
        };

        let key = natural_key(contract, &fields);
        let mark = fields
            .get(&contract.mark_field)
            .map(|v| v.as_text().trim().to_string())
            .unwrap_or_default();
        let row = CoercedRow {
            row_number,
            key: key.clone(),
            mark,
            fields,
        };

        match by_key.get(&key) {
            Some(&slot) => {
                debug!(
                    "{}: row {} replaces row {} under key '{}'",
                    sheet.name, row_number, collected.rows[slot].row_number, key
                );
                collected.rows[slot] = row;
            }
            None => {
                by_key.insert(key, collected.rows.len());
                collected.rows.push(row);
            }
        }
    }

    Ok(collected)
}

fn coerce_row(cells: &[CellValue], contract: &ColumnContract) -> Result<ReceiptFields, String> {
    let mut fields = ReceiptFields::new();
    for column in &contract.columns {
        let cell = cells.get(column.index).unwrap_or(&CellValue::Empty);
        match coerce::coerce_cell(cell, column.column_type) {
            Ok(Some(value)) => {
                fields.insert(column.field.clone(), value);
            }
            Ok(None) => {
                if let Some(default) = &column.default {
                    if let Some(value) = coerce::coerce_text(default, column.column_type) {
                        fields.insert(column.field.clone(), value);
                        continue;
                    }
                }
                if column.required {
                    return Err(format!("{} is required", column.field));
                }
            }
            Err(e) => return Err(format!("{}: {}", column.field, e)),
        }
    }
    Ok(fields)
}

/// Natural key for deduplication and upsert lookups.
///
/// Key field values are trimmed and lowercased so "ACME " and "acme" file
/// under the same receipt. Fields missing from the row contribute an empty
/// segment.
fn natural_key(contract: &ColumnContract, fields: &ReceiptFields) -> String {
    contract
        .key_fields
        .iter()
        .map(|k| {
            fields
                .get(k)
                .map(|v| v.as_text().trim().to_lowercase())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join("|")
}

enum PersistError {
    /// Backend is down. Aborts the whole run.
    Fatal(StoreError),
    /// This row failed; the run continues.
    Row(String),
}

fn classify_store_error(e: StoreError) -> PersistError {
    match e {
        StoreError::Unavailable(_) => PersistError::Fatal(e),
        other => PersistError::Row(other.to_string()),
    }
}

/// Second pass: upsert each collected row through the storage traits.
///
/// Per-row failures (unknown mark, rejected write) become error results.
/// `StoreError::Unavailable` aborts the run instead, since every remaining
/// row would fail the same way.
pub fn persist_rows(
    rows: &[CoercedRow],
    store: &dyn ReceiptStore,
    consignees: &dyn ConsigneeDirectory,
    options: &ImportOptions,
) -> Result<Vec<ImportRowResult>, IngestError> {
    let mut results = Vec::with_capacity(rows.len());
    for row in rows {
        let result = match persist_one(row, store, consignees, options.dry_run) {
            Ok(outcome) => ImportRowResult {
                row: row.row_number,
                outcome,
                message: None,
            },
            Err(PersistError::Row(message)) => {
                warn!("row {}: {}", row.row_number, message);
                ImportRowResult {
                    row: row.row_number,
                    outcome: RowOutcome::Error,
                    message: Some(message),
                }
            }
            Err(PersistError::Fatal(e)) => return Err(IngestError::Storage(e)),
        };
        results.push(result);
    }
    Ok(results)
}

fn persist_one(
    row: &CoercedRow,
    store: &dyn ReceiptStore,
    consignees: &dyn ConsigneeDirectory,
    dry_run: bool,
) -> Result<RowOutcome, PersistError> {
    if consignees
        .find_by_mark(&row.mark)
        .map_err(classify_store_error)?
        .is_none()
    {
        return Err(PersistError::Row(format!(
            "unknown shipping mark '{}'",
            row.mark
        )));
    }

    match store.find_existing(&row.key).map_err(classify_store_error)? {
        Some(_) => {
            if !dry_run {
                store
                    .update(&row.key, &row.fields)
                    .map_err(classify_store_error)?;
            }
            Ok(RowOutcome::Updated)
        }
        None => {
            if !dry_run {
                let tracking_id = Uuid::new_v4().to_string();
                store
                    .create(&row.key, &tracking_id, &row.fields)
                    .map_err(classify_store_error)?;
            }
            Ok(RowOutcome::Created)
        }
    }
}

/// Run both import passes over one sheet and assemble the report.
///
/// Results are sorted by row number, so coercion errors and persistence
/// outcomes interleave the way the rows appear in the sheet. Callbacks fire
/// once with the final report; a fatal storage error returns before they
/// run.
pub fn import_rows(
    sheet: &Sheet,
    contract: &ColumnContract,
    store: &dyn ReceiptStore,
    consignees: &dyn ConsigneeDirectory,
    options: &ImportOptions,
) -> Result<ImportReport, IngestError> {
    let collected = collect_rows(sheet, contract)?;
    let persisted = persist_rows(&collected.rows, store, consignees, options)?;

    let mut results = collected.results;
    results.extend(persisted);
    results.sort_by_key(|r| r.row);

    let summary = ImportSummary::from_results(collected.total_rows, &results);
    let report = ImportReport { summary, results };
    for callback in &options.callbacks {
        callback.on_import_complete(&report);
    }
    Ok(report)
}
