use serde::Serialize;
use stowage_core::error::IngestError;

pub fn print<T: Serialize>(value: &T) -> Result<(), IngestError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
