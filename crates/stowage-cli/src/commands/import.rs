use std::path::{Path, PathBuf};

use stowage_core::error::IngestError;
use stowage_core::import::{self, ColumnContract, ImportOptions};

use crate::output;
use crate::store::JsonFileStore;

pub fn run(
    input_file: PathBuf,
    contract: &str,
    store_file: PathBuf,
    sheet: Option<&str>,
    dry_run: bool,
    output_format: &str,
) -> Result<(), IngestError> {
    let bytes = std::fs::read(&input_file)?;
    let contract = resolve_contract(contract)?;
    let store = JsonFileStore::open(&store_file)?;

    let options = ImportOptions {
        dry_run,
        ..ImportOptions::default()
    };
    let report = stowage_core::import_workbook(&bytes, sheet, &contract, &store, &store, &options)?;

    match output_format {
        "json" => output::json::print(&report)?,
        _ => output::table::print_report(&report, dry_run),
    }
    Ok(())
}

/// A preset name if one matches, otherwise a path to a contract file.
fn resolve_contract(spec: &str) -> Result<ColumnContract, IngestError> {
    if import::PRESETS.contains(&spec) {
        import::load_preset(spec)
    } else {
        import::load_contract(Path::new(spec))
    }
}
