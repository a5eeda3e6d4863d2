pub mod builtin;
pub mod coerce;
pub mod contract;
pub mod outcome;
pub mod pipeline;

pub use builtin::{load_preset, PRESETS};
pub use coerce::{coerce_cell, coerce_text, CoerceError};
pub use contract::{
    load_contract, parse_contract, parse_contract_str, validate_contract, ColumnContract,
    ColumnSpec, ColumnType,
};
pub use outcome::{ImportReport, ImportRowResult, ImportSummary, RowOutcome};
pub use pipeline::{
    collect_rows, import_rows, persist_rows, CoercedRow, CollectedRows, ImportOptions,
};
