use crate::domain::{Product, ProductId, ReadOutcome};
use crate::metrics::MetricsCollector;
use crate::ports::{CacheStore, RecordStore};
use crate::strategy::{Policy, StrategyKind};
use crate::writeback::PendingWrites;
use async_trait::async_trait;
use shared::{Error, Result, TtlMs};
use std::sync::Arc;
use tracing::{debug, warn};

/// Demand-fill read shared by every policy except read-through: consult the
/// cache, fall back to the store on a miss and populate the cache with a
/// fresh TTL. Cache failures degrade to misses rather than failing the read;
/// the store stays authoritative.
async fn read_populate(
    cache: &dyn CacheStore,
    store: &dyn RecordStore,
    key: ProductId,
    ttl: Option<TtlMs>,
) -> Result<(Product, ReadOutcome)> {
    let cached = match cache.get(key).await {
        Ok(cached) => cached,
        Err(err) => {
            warn!(key, error = %err, "cache read failed, treating as miss");
            None
        }
    };
    if let Some(found) = cached {
        return Ok((found, ReadOutcome::Hit));
    }

    debug!(key, "cache miss, reading from store");
    let value = store.get(key).await?.ok_or(Error::NotFound)?;
    if let Err(err) = cache.set(key, value.clone(), ttl).await {
        warn!(key, error = %err, "failed to populate cache after store read");
    }
    Ok((value, ReadOutcome::Miss))
}

/// Cache-aside: readers demand-fill the cache; writers go to the store and
/// invalidate, never repopulate.
pub struct CacheAside {
    cache: Arc<dyn CacheStore>,
    store: Arc<dyn RecordStore>,
    ttl: Option<TtlMs>,
}

impl CacheAside {
    pub fn new(cache: Arc<dyn CacheStore>, store: Arc<dyn RecordStore>, ttl: Option<TtlMs>) -> Self {
        Self { cache, store, ttl }
    }
}

#[async_trait]
impl Policy for CacheAside {
    fn kind(&self) -> StrategyKind {
        StrategyKind::CacheAside
    }

    async fn read(&self, key: ProductId) -> Result<(Product, ReadOutcome)> {
        read_populate(self.cache.as_ref(), self.store.as_ref(), key, self.ttl).await
    }

    async fn write(&self, key: ProductId, value: Product) -> Result<()> {
        self.store.put(key, value).await?;
        if let Err(err) = self.cache.delete(key).await {
            warn!(key, error = %err, "cache invalidation failed after store write");
        }
        Ok(())
    }
}

/// Read-through: behaviorally the same as cache-aside, but the
/// miss-then-populate step belongs to the cache abstraction
/// (`CacheStore::get_or_load`) instead of being orchestrated here.
pub struct ReadThrough {
    cache: Arc<dyn CacheStore>,
    store: Arc<dyn RecordStore>,
    ttl: Option<TtlMs>,
}

impl ReadThrough {
    pub fn new(cache: Arc<dyn CacheStore>, store: Arc<dyn RecordStore>, ttl: Option<TtlMs>) -> Self {
        Self { cache, store, ttl }
    }
}

#[async_trait]
impl Policy for ReadThrough {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ReadThrough
    }

    async fn read(&self, key: ProductId) -> Result<(Product, ReadOutcome)> {
        self.cache
            .get_or_load(key, self.ttl, self.store.as_ref())
            .await?
            .ok_or(Error::NotFound)
    }

    async fn write(&self, key: ProductId, value: Product) -> Result<()> {
        self.store.put(key, value).await?;
        if let Err(err) = self.cache.delete(key).await {
            warn!(key, error = %err, "cache invalidation failed after store write");
        }
        Ok(())
    }
}

/// Write-through: store and cache are updated together. The store write is
/// the commit point; a cache update failure after it is a soft failure (the
/// entry goes stale until TTL expiry) and never fails the operation.
pub struct WriteThrough {
    cache: Arc<dyn CacheStore>,
    store: Arc<dyn RecordStore>,
    metrics: Arc<MetricsCollector>,
    ttl: Option<TtlMs>,
}

impl WriteThrough {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        store: Arc<dyn RecordStore>,
        metrics: Arc<MetricsCollector>,
        ttl: Option<TtlMs>,
    ) -> Self {
        Self {
            cache,
            store,
            metrics,
            ttl,
        }
    }
}

#[async_trait]
impl Policy for WriteThrough {
    fn kind(&self) -> StrategyKind {
        StrategyKind::WriteThrough
    }

    async fn read(&self, key: ProductId) -> Result<(Product, ReadOutcome)> {
        read_populate(self.cache.as_ref(), self.store.as_ref(), key, self.ttl).await
    }

    async fn write(&self, key: ProductId, value: Product) -> Result<()> {
        self.store.put(key, value.clone()).await?;
        if let Err(err) = self.cache.set(key, value, self.ttl).await {
            warn!(key, error = %err, "cache update failed after durable write, entry is stale");
            self.metrics.record_soft_failure(self.kind());
        }
        Ok(())
    }
}

/// Write-around: writes bypass the cache entirely. A stale entry may
/// legitimately survive a write until its TTL expires; that is the policy's
/// trade-off, not a bug.
pub struct WriteAround {
    cache: Arc<dyn CacheStore>,
    store: Arc<dyn RecordStore>,
    ttl: Option<TtlMs>,
}

impl WriteAround {
    pub fn new(cache: Arc<dyn CacheStore>, store: Arc<dyn RecordStore>, ttl: Option<TtlMs>) -> Self {
        Self { cache, store, ttl }
    }
}

#[async_trait]
impl Policy for WriteAround {
    fn kind(&self) -> StrategyKind {
        StrategyKind::WriteAround
    }

    async fn read(&self, key: ProductId) -> Result<(Product, ReadOutcome)> {
        read_populate(self.cache.as_ref(), self.store.as_ref(), key, self.ttl).await
    }

    async fn write(&self, key: ProductId, value: Product) -> Result<()> {
        self.store.put(key, value).await
    }
}

/// Write-back (write-behind): writes land in the cache and the pending
/// queue, then return immediately; the flusher persists them later. The
/// only variant whose write can succeed before the store is updated.
pub struct WriteBack {
    cache: Arc<dyn CacheStore>,
    store: Arc<dyn RecordStore>,
    pending: Arc<PendingWrites>,
    ttl: Option<TtlMs>,
}

impl WriteBack {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        store: Arc<dyn RecordStore>,
        pending: Arc<PendingWrites>,
        ttl: Option<TtlMs>,
    ) -> Self {
        Self {
            cache,
            store,
            pending,
            ttl,
        }
    }
}

#[async_trait]
impl Policy for WriteBack {
    fn kind(&self) -> StrategyKind {
        StrategyKind::WriteBack
    }

    async fn read(&self, key: ProductId) -> Result<(Product, ReadOutcome)> {
        // A pending write is newer than anything the store holds.
        if let Some(dirty) = self.pending.peek(key) {
            return Ok((dirty, ReadOutcome::Hit));
        }
        read_populate(self.cache.as_ref(), self.store.as_ref(), key, self.ttl).await
    }

    async fn write(&self, key: ProductId, value: Product) -> Result<()> {
        // The cache accept is the commit point for this variant.
        self.cache.set(key, value.clone(), self.ttl).await?;
        let depth = self.pending.enqueue(key, value);
        debug!(key, depth, "queued write for asynchronous persistence");
        Ok(())
    }
}
