use std::path::Path;

use stowage_core::error::IngestError;
use stowage_core::import::{builtin, load_contract};

pub fn list() -> Result<(), IngestError> {
    println!("Available column contracts:\n");
    for name in builtin::PRESETS {
        let contract = builtin::load_preset(name)?;
        println!(
            "  {:<16} v{}, {} columns, keyed by {}",
            name,
            contract.version,
            contract.columns.len(),
            contract.key_fields.join(" + ")
        );
        if let Some(ref desc) = contract.description {
            println!("                   {desc}");
        }
        println!();
    }
    Ok(())
}

pub fn show(name: &str) -> Result<(), IngestError> {
    let contract = builtin::load_preset(name)?;
    let json = serde_json::to_string_pretty(&contract)?;
    println!("{json}");
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), IngestError> {
    let contract = load_contract(file)?;

    println!("Contract '{}' (v{}) is valid.", contract.name, contract.version);
    println!("  Mark field: {}", contract.mark_field);
    println!("  Key fields: {}", contract.key_fields.join(", "));
    println!("  Columns:");
    for column in &contract.columns {
        let required = if column.required { ", required" } else { "" };
        let default = match &column.default {
            Some(d) => format!(", default '{d}'"),
            None => String::new(),
        };
        println!(
            "    {:>3}  {:<20} {}{}{}",
            column.index, column.field, column.column_type, required, default
        );
    }
    Ok(())
}
