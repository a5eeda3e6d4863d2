pub mod error;
pub mod import;
pub mod model;
pub mod sniff;
pub mod store;
pub mod workbook;

use error::IngestError;
use import::contract::ColumnContract;
use import::outcome::ImportReport;
use import::pipeline::ImportOptions;
use sniff::{SheetExtraction, SniffOptions, TargetColumn};
use store::{ConsigneeDirectory, ReceiptStore};
use workbook::{Sheet, Workbook};

/// Main extraction entry point: sniff out the header row of a messy
/// spreadsheet and extract typed records below it.
///
/// Searches every sheet, picks the row that matches the targets best, and
/// cleans each matched column by its semantic. An empty extraction (no
/// header found anywhere) is a result, not an error.
pub fn sniff_workbook(
    bytes: &[u8],
    targets: &[TargetColumn],
    options: &SniffOptions,
) -> Result<SheetExtraction, IngestError> {
    let workbook = Workbook::from_bytes(bytes)?;
    Ok(sniff::extract(&workbook, targets, options))
}

/// Main import entry point: read a fixed-layout sheet and upsert its rows
/// through the storage traits.
///
/// `sheet` selects a sheet by name; `None` takes the first one. A workbook
/// with no sheets imports nothing.
pub fn import_workbook(
    bytes: &[u8],
    sheet: Option<&str>,
    contract: &ColumnContract,
    store: &dyn ReceiptStore,
    consignees: &dyn ConsigneeDirectory,
    options: &ImportOptions,
) -> Result<ImportReport, IngestError> {
    let workbook = Workbook::from_bytes(bytes)?;

    let fallback = Sheet::new("", Vec::new());
    let selected = match sheet {
        Some(name) => workbook
            .sheet(name)
            .ok_or_else(|| IngestError::Workbook(format!("sheet '{name}' not found")))?,
        None => workbook.sheets.first().unwrap_or(&fallback),
    };

    import::pipeline::import_rows(selected, contract, store, consignees, options)
}
