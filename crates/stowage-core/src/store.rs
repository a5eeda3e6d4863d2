use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::import::outcome::ImportReport;
use crate::model::FieldValue;

/// Field map persisted with a receipt.
pub type ReceiptFields = BTreeMap<String, FieldValue>;

/// A receipt as known to the storage backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReceipt {
    /// Natural key the receipt is filed under.
    pub key: String,
    /// Stable id minted when the receipt was first created. Updates keep it.
    pub tracking_id: String,
    pub fields: ReceiptFields,
}

/// A known customer, looked up by shipping mark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consignee {
    pub shipping_mark: String,
    pub name: String,
}

/// Storage backend failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// Backend cannot be reached at all. Aborts the import run.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Backend refused this record. Recorded against the row.
    #[error("rejected: {0}")]
    Rejected(String),

    /// A concurrent change collided with this write.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Receipt persistence used by the import pipeline.
pub trait ReceiptStore: Send + Sync {
    /// Look up a receipt by natural key.
    fn find_existing(&self, key: &str) -> Result<Option<StoredReceipt>, StoreError>;

    /// File a new receipt under a freshly minted tracking id.
    fn create(&self, key: &str, tracking_id: &str, fields: &ReceiptFields)
        -> Result<(), StoreError>;

    /// Overwrite the fields of an existing receipt.
    fn update(&self, key: &str, fields: &ReceiptFields) -> Result<(), StoreError>;
}

/// Consignee lookup. Resolution only: a miss must never create anything.
pub trait ConsigneeDirectory: Send + Sync {
    fn find_by_mark(&self, mark: &str) -> Result<Option<Consignee>, StoreError>;
}

/// Hook fired once with the final report after an import run completes.
///
/// Does not fire when the run aborts on a structural storage failure.
pub trait ImportCallback: Send + Sync {
    fn on_import_complete(&self, report: &ImportReport);
}
