use crate::error::IngestError;
use crate::import::contract::{parse_contract_str, ColumnContract};

const GOODS_RECEIPT_JSON: &str = include_str!("../../../../contracts/goods_receipt.json");
const LOADING_LIST_JSON: &str = include_str!("../../../../contracts/loading_list.json");

/// Names of the contracts shipped with the crate.
pub const PRESETS: &[&str] = &["goods_receipt", "loading_list"];

/// Load one of the built-in column contracts by name.
pub fn load_preset(name: &str) -> Result<ColumnContract, IngestError> {
    let json = match name {
        "goods_receipt" => GOODS_RECEIPT_JSON,
        "loading_list" => LOADING_LIST_JSON,
        other => {
            return Err(IngestError::ContractInvalid(format!(
                "unknown preset '{}'. Available: {}",
                other,
                PRESETS.join(", ")
            )))
        }
    };
    parse_contract_str(json)
}
