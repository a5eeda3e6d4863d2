use std::path::PathBuf;

use stowage_core::error::IngestError;
use stowage_core::sniff::{SniffOptions, TargetColumn};

use crate::output;

pub fn run(
    input_file: PathBuf,
    targets: Vec<String>,
    max_rows: usize,
    threshold: f64,
    raw: bool,
    output_format: &str,
) -> Result<(), IngestError> {
    let bytes = std::fs::read(&input_file)?;
    let targets = targets
        .iter()
        .map(|spec| TargetColumn::parse(spec))
        .collect::<Result<Vec<_>, _>>()?;
    let options = SniffOptions {
        max_header_search_rows: max_rows,
        min_match_threshold: threshold,
        clean: !raw,
    };

    let extraction = stowage_core::sniff_workbook(&bytes, &targets, &options)?;

    match output_format {
        "json" => output::json::print(&extraction),
        _ => {
            output::table::print_extraction(&extraction);
            Ok(())
        }
    }
}
