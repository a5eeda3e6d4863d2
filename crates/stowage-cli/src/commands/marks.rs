use std::path::Path;

use stowage_core::error::IngestError;

use crate::store::JsonFileStore;

pub fn add(store_file: &Path, mark: &str, name: &str) -> Result<(), IngestError> {
    let store = JsonFileStore::open(store_file)?;
    store.add_consignee(mark, name)?;
    println!("Registered '{}' under mark '{}'.", name.trim(), mark.trim());
    Ok(())
}

pub fn list(store_file: &Path) -> Result<(), IngestError> {
    let store = JsonFileStore::open(store_file)?;
    let consignees = store.consignees();
    if consignees.is_empty() {
        println!("No consignees registered.");
        return Ok(());
    }

    let width = consignees
        .iter()
        .map(|c| c.shipping_mark.len())
        .max()
        .unwrap_or(10);
    for consignee in &consignees {
        println!(
            "  {:<width$}  {}",
            consignee.shipping_mark,
            consignee.name,
            width = width
        );
    }
    Ok(())
}
