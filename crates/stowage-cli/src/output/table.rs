use stowage_core::import::{ImportReport, RowOutcome};
use stowage_core::sniff::SheetExtraction;

/// Row and column indexes are 0-based internally; printed positions are
/// 1-based like spreadsheet applications show them.
pub fn print_extraction(extraction: &SheetExtraction) {
    let Some(ref header) = extraction.header else {
        println!("No header row found.");
        return;
    };

    println!(
        "Header: sheet '{}', row {}, score {:.2}\n",
        header.sheet,
        header.header_row + 1,
        header.score
    );

    // Columns in sheet order.
    let mut columns: Vec<(&str, usize)> = header
        .columns
        .iter()
        .map(|(name, idx)| (name.as_str(), *idx))
        .collect();
    columns.sort_by_key(|&(_, idx)| idx);

    let mut widths: Vec<usize> = columns.iter().map(|(name, _)| name.len()).collect();
    for record in &extraction.records {
        for (i, (name, _)) in columns.iter().enumerate() {
            let len = record
                .fields
                .get(*name)
                .map(|v| v.to_string().len())
                .unwrap_or(1);
            widths[i] = widths[i].max(len);
        }
    }

    print!("  {:<5}", "Row");
    for (i, (name, _)) in columns.iter().enumerate() {
        print!("  {:<width$}", name, width = widths[i]);
    }
    println!();
    println!(
        "  {}",
        "-".repeat(5 + columns.len() * 2 + widths.iter().sum::<usize>())
    );

    for record in &extraction.records {
        print!("  {:<5}", record.row + 1);
        for (i, (name, _)) in columns.iter().enumerate() {
            let value = record
                .fields
                .get(*name)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".into());
            print!("  {:<width$}", value, width = widths[i]);
        }
        println!();
    }

    println!("\n{} record(s) extracted.", extraction.records.len());

    if !extraction.skipped_rows.is_empty() {
        println!("{} row(s) skipped:", extraction.skipped_rows.len());
        for skipped in &extraction.skipped_rows {
            println!("  row {}: {}", skipped.row + 1, skipped.reason);
        }
    }
}

pub fn print_report(report: &ImportReport, dry_run: bool) {
    for result in &report.results {
        let marker = match result.outcome {
            RowOutcome::Created => '+',
            RowOutcome::Updated => '~',
            RowOutcome::Skipped => '=',
            RowOutcome::Error => '!',
        };
        match &result.message {
            Some(message) => println!(
                "  {} row {:<5} {:<8} {}",
                marker,
                result.row,
                result.outcome.to_string(),
                message
            ),
            None => println!("  {} row {:<5} {}", marker, result.row, result.outcome),
        }
    }
    if !report.results.is_empty() {
        println!();
    }

    let summary = &report.summary;
    println!(
        "{} row(s): {} created, {} updated, {} skipped, {} error(s)",
        summary.total_rows, summary.created, summary.updated, summary.skipped, summary.errors
    );
    if summary.absorbed() > 0 {
        println!(
            "{} duplicate row(s) absorbed by later occurrences",
            summary.absorbed()
        );
    }
    if dry_run {
        println!("Dry run: nothing was written.");
    }
}
