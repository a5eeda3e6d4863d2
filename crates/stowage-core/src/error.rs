use std::path::PathBuf;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read workbook: {0}")]
    Workbook(String),

    #[error("failed to load column contract from {path}: {reason}")]
    ContractLoad { path: PathBuf, reason: String },

    #[error("invalid column contract: {0}")]
    ContractInvalid(String),

    #[error("invalid target column: {0}")]
    TargetInvalid(String),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
