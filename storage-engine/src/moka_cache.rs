use async_trait::async_trait;
use moka::future::Cache;
use shared::{Error, Result, TtlMs};
use std::fmt::Debug;
use std::time::Duration;
use strata::domain::{Product, ProductId, ReadOutcome};
use strata::ports::{CacheStore, RecordStore};

/// Moka-based cache transport with TTL support.
/// Lock-free concurrent cache with optional size bound and a cache-wide TTL.
pub struct MokaCache {
    cache: Cache<ProductId, Product>,
}

impl MokaCache {
    /// Create a Moka cache with an optional entry bound and default TTL.
    pub fn new(name: &str, max_entries: Option<u64>, default_ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().name(name);

        if let Some(capacity) = max_entries {
            builder = builder.max_capacity(capacity);
        }

        if let Some(ttl) = default_ttl {
            builder = builder.time_to_live(ttl);
        }

        Self {
            cache: builder.build(),
        }
    }
}

#[async_trait]
impl CacheStore for MokaCache {
    async fn get(&self, key: ProductId) -> Result<Option<Product>> {
        // An expired entry is simply absent. Moka evicts it internally.
        Ok(self.cache.get(&key).await)
    }

    async fn set(&self, key: ProductId, value: Product, ttl: Option<TtlMs>) -> Result<()> {
        // Moka's TTL is configured cache-wide and restarts on every insert,
        // which is exactly the fresh-TTL-on-set behavior the strategies
        // need. A per-entry override is accepted but not honored.
        let _ = ttl;
        self.cache.insert(key, value).await;
        Ok(())
    }

    async fn delete(&self, key: ProductId) -> Result<bool> {
        Ok(self.cache.remove(&key).await.is_some())
    }

    async fn clear(&self) -> Result<()> {
        self.cache.invalidate_all();
        Ok(())
    }

    /// Single-flight read-through: concurrent misses for the same key share
    /// one loader call.
    async fn get_or_load(
        &self,
        key: ProductId,
        ttl: Option<TtlMs>,
        loader: &dyn RecordStore,
    ) -> Result<Option<(Product, ReadOutcome)>> {
        let _ = ttl;
        let entry = self
            .cache
            .entry(key)
            .or_try_insert_with(async {
                match loader.get(key).await {
                    Ok(Some(value)) => Ok(value),
                    Ok(None) => Err(Error::NotFound),
                    Err(err) => Err(err),
                }
            })
            .await;

        match entry {
            Ok(entry) => {
                let outcome = if entry.is_fresh() {
                    ReadOutcome::Miss
                } else {
                    ReadOutcome::Hit
                };
                Ok(Some((entry.into_value(), outcome)))
            }
            Err(err) => match err.as_ref() {
                Error::NotFound => Ok(None),
                Error::StoreUnavailable(msg) => Err(Error::StoreUnavailable(msg.clone())),
                other => Err(Error::Internal(other.to_string())),
            },
        }
    }
}

impl Debug for MokaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCache")
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}
