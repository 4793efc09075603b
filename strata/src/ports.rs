#![deny(clippy::all)]

use crate::domain::{Product, ProductId, ReadOutcome};
use async_trait::async_trait;
use shared::{Result, TtlMs};

// Ports are the pluggable extension points for the cache transport and the
// durable store the strategies mediate between.

/// Port for the fast, volatile cache layer. Entries expire by TTL; an absent
/// or expired entry is a miss.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    async fn get(&self, key: ProductId) -> Result<Option<Product>>;
    async fn set(&self, key: ProductId, value: Product, ttl: Option<TtlMs>) -> Result<()>;
    async fn delete(&self, key: ProductId) -> Result<bool>;
    async fn clear(&self) -> Result<()>;

    /// Read-through shape: miss resolution happens inside the cache
    /// abstraction rather than in the calling policy. Implementations may
    /// override this with a single-flight loader.
    async fn get_or_load(
        &self,
        key: ProductId,
        ttl: Option<TtlMs>,
        loader: &dyn RecordStore,
    ) -> Result<Option<(Product, ReadOutcome)>> {
        if let Some(found) = self.get(key).await? {
            return Ok(Some((found, ReadOutcome::Hit)));
        }
        match loader.get(key).await? {
            Some(value) => {
                self.set(key, value.clone(), ttl).await?;
                Ok(Some((value, ReadOutcome::Miss)))
            }
            None => Ok(None),
        }
    }
}

/// Port for the slow, durable store. Authoritative source of truth.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    async fn get(&self, key: ProductId) -> Result<Option<Product>>;
    async fn put(&self, key: ProductId, value: Product) -> Result<()>;
    async fn delete(&self, key: ProductId) -> Result<bool>;

    async fn exists(&self, key: ProductId) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
