use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use stowage_core::error::IngestError;
use stowage_core::store::{
    Consignee, ConsigneeDirectory, ReceiptFields, ReceiptStore, StoreError, StoredReceipt,
};

/// Receipt store and consignee directory backed by a single JSON file.
///
/// The whole document is loaded on open and rewritten after every mutation,
/// which is plenty for command-line imports.
pub struct JsonFileStore {
    path: PathBuf,
    document: Mutex<StoreDocument>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    /// Receipts by natural key.
    #[serde(default)]
    receipts: BTreeMap<String, StoredReceipt>,
    /// Consignees by lowercased shipping mark.
    #[serde(default)]
    consignees: BTreeMap<String, Consignee>,
}

impl JsonFileStore {
    /// Open a store file, starting empty when it does not exist yet.
    pub fn open(path: &Path) -> Result<JsonFileStore, IngestError> {
        let document = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreDocument::default(),
            Err(e) => return Err(IngestError::Io(e)),
        };
        Ok(JsonFileStore {
            path: path.to_path_buf(),
            document: Mutex::new(document),
        })
    }

    pub fn add_consignee(&self, mark: &str, name: &str) -> Result<(), IngestError> {
        let mut document = self.lock();
        document.consignees.insert(
            mark.trim().to_lowercase(),
            Consignee {
                shipping_mark: mark.trim().to_string(),
                name: name.trim().to_string(),
            },
        );
        self.save(&document)?;
        Ok(())
    }

    pub fn consignees(&self) -> Vec<Consignee> {
        self.lock().consignees.values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, StoreDocument> {
        self.document.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn save(&self, document: &StoreDocument) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(document)
            .map_err(|e| StoreError::Unavailable(format!("cannot encode store: {e}")))?;
        std::fs::write(&self.path, json).map_err(|e| {
            StoreError::Unavailable(format!("cannot write {}: {e}", self.path.display()))
        })
    }
}

impl ReceiptStore for JsonFileStore {
    fn find_existing(&self, key: &str) -> Result<Option<StoredReceipt>, StoreError> {
        Ok(self.lock().receipts.get(key).cloned())
    }

    fn create(
        &self,
        key: &str,
        tracking_id: &str,
        fields: &ReceiptFields,
    ) -> Result<(), StoreError> {
        let mut document = self.lock();
        document.receipts.insert(
            key.to_string(),
            StoredReceipt {
                key: key.to_string(),
                tracking_id: tracking_id.to_string(),
                fields: fields.clone(),
            },
        );
        self.save(&document)
    }

    fn update(&self, key: &str, fields: &ReceiptFields) -> Result<(), StoreError> {
        let mut document = self.lock();
        match document.receipts.get_mut(key) {
            Some(receipt) => receipt.fields = fields.clone(),
            None => {
                return Err(StoreError::Rejected(format!(
                    "no receipt under key '{key}'"
                )))
            }
        }
        self.save(&document)
    }
}

impl ConsigneeDirectory for JsonFileStore {
    fn find_by_mark(&self, mark: &str) -> Result<Option<Consignee>, StoreError> {
        Ok(self
            .lock()
            .consignees
            .get(&mark.trim().to_lowercase())
            .cloned())
    }
}
