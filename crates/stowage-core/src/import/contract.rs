use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::IngestError;
use crate::import::coerce;

/// Value type a contracted column coerces to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Integer,
    Decimal,
    Date,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::String => write!(f, "string"),
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Decimal => write!(f, "decimal"),
            ColumnType::Date => write!(f, "date"),
        }
    }
}

/// One fixed position in an import sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Zero-based column index in the sheet.
    pub index: usize,
    /// Logical field name the value lands under.
    pub field: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Reject rows where this field is empty.
    #[serde(default)]
    pub required: bool,
    /// Raw text applied when the cell is empty, coerced like cell text.
    #[serde(default)]
    pub default: Option<String>,
}

/// A caller-documented, fixed-position sheet layout.
///
/// Column meaning is positional; captions in the sheet are ignored. The
/// `key_fields` derive the natural key rows are deduplicated and upserted
/// by, and `mark_field` names the field that must resolve to a known
/// consignee shipping mark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnContract {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_mark_field")]
    pub mark_field: String,
    pub key_fields: Vec<String>,
    pub columns: Vec<ColumnSpec>,
}

fn default_version() -> u32 {
    1
}

fn default_mark_field() -> String {
    "shipping_mark".into()
}

/// Load a contract from a JSON file.
pub fn load_contract(path: &Path) -> Result<ColumnContract, IngestError> {
    let content = std::fs::read_to_string(path).map_err(|e| IngestError::ContractLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_contract(&content, path)
}

/// Parse a contract from a JSON string.
pub fn parse_contract(json: &str, source: &Path) -> Result<ColumnContract, IngestError> {
    let contract: ColumnContract =
        serde_json::from_str(json).map_err(|e| IngestError::ContractLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_contract(&contract)?;
    Ok(contract)
}

/// Parse a contract from a JSON string (no file path context).
pub fn parse_contract_str(json: &str) -> Result<ColumnContract, IngestError> {
    let contract: ColumnContract = serde_json::from_str(json).map_err(IngestError::Json)?;
    validate_contract(&contract)?;
    Ok(contract)
}

/// Validate that a contract is well-formed.
pub fn validate_contract(contract: &ColumnContract) -> Result<(), IngestError> {
    if contract.columns.is_empty() {
        return Err(IngestError::ContractInvalid(
            "columns must not be empty".into(),
        ));
    }

    let mut fields = HashSet::new();
    let mut indexes = HashSet::new();
    for column in &contract.columns {
        if column.field.is_empty() {
            return Err(IngestError::ContractInvalid(
                "column field name must not be empty".into(),
            ));
        }
        if !fields.insert(column.field.as_str()) {
            return Err(IngestError::ContractInvalid(format!(
                "duplicate field '{}'",
                column.field
            )));
        }
        if !indexes.insert(column.index) {
            return Err(IngestError::ContractInvalid(format!(
                "duplicate column index {} (field '{}')",
                column.index, column.field
            )));
        }
        if let Some(ref default) = column.default {
            if coerce::coerce_text(default, column.column_type).is_none() {
                return Err(IngestError::ContractInvalid(format!(
                    "default '{}' for field '{}' is not a valid {}",
                    default, column.field, column.column_type
                )));
            }
        }
    }

    if contract.key_fields.is_empty() {
        return Err(IngestError::ContractInvalid(
            "key_fields must not be empty".into(),
        ));
    }
    for key in &contract.key_fields {
        if !fields.contains(key.as_str()) {
            return Err(IngestError::ContractInvalid(format!(
                "key field '{}' is not a contracted column",
                key
            )));
        }
    }

    if !fields.contains(contract.mark_field.as_str()) {
        return Err(IngestError::ContractInvalid(format!(
            "mark field '{}' is not a contracted column",
            contract.mark_field
        )));
    }

    Ok(())
}
