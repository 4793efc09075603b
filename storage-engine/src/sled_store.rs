use async_trait::async_trait;
use shared::{Error, Result};
use std::path::Path;
use strata::domain::{Product, ProductId};
use strata::ports::RecordStore;
use tracing::debug;

/// Sled-backed durable store. Records are serialized as JSON under their
/// big-endian id so the tree iterates in key order.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open (or create) the store at `path`, creating the parent directory
    /// if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Internal(format!("Failed to create directory: {}", e)))?;
        }

        let db = sled::open(path)
            .map_err(|e| Error::Internal(format!("Failed to open Sled database: {}", e)))?;

        Ok(Self { db })
    }

    fn key_bytes(key: ProductId) -> [u8; 8] {
        key.to_be_bytes()
    }
}

#[async_trait]
impl RecordStore for SledStore {
    async fn get(&self, key: ProductId) -> Result<Option<Product>> {
        let value = self
            .db
            .get(Self::key_bytes(key))
            .map_err(|e| Error::Internal(format!("Failed to read record: {}", e)))?;

        match value {
            Some(bytes) => {
                let product: Product = serde_json::from_slice(&bytes)
                    .map_err(|e| Error::Internal(format!("Failed to deserialize record: {}", e)))?;
                Ok(Some(product))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: ProductId, value: Product) -> Result<()> {
        let bytes = serde_json::to_vec(&value)
            .map_err(|e| Error::Internal(format!("Failed to serialize record: {}", e)))?;

        self.db
            .insert(Self::key_bytes(key), bytes)
            .map_err(|e| Error::StoreUnavailable(format!("Failed to write record: {}", e)))?;

        self.db
            .flush_async()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("Failed to flush database: {}", e)))?;

        debug!(key, "record persisted");
        Ok(())
    }

    async fn delete(&self, key: ProductId) -> Result<bool> {
        let removed = self
            .db
            .remove(Self::key_bytes(key))
            .map_err(|e| Error::Internal(format!("Failed to delete record: {}", e)))?
            .is_some();

        self.db
            .flush_async()
            .await
            .map_err(|e| Error::Internal(format!("Failed to flush database: {}", e)))?;

        Ok(removed)
    }

    async fn exists(&self, key: ProductId) -> Result<bool> {
        self.db
            .contains_key(Self::key_bytes(key))
            .map_err(|e| Error::Internal(format!("Failed to check record: {}", e)))
    }
}
