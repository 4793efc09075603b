//! In-memory test doubles for the cache and store ports, with failure
//! injection for the soft-failure and retry paths.

use crate::domain::{Product, ProductId};
use crate::metrics::MetricsCollector;
use crate::ports::{CacheStore, RecordStore};
use crate::strategy::StrategyRegistry;
use crate::writeback::PendingWrites;
use async_trait::async_trait;
use shared::{Error, Result, TtlMs};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

pub fn product(id: ProductId, name: impl Into<String>) -> Product {
    Product::new(id, name, 9.99, "test product")
}

pub struct MemoryCache {
    entries: Mutex<HashMap<ProductId, (Product, Option<Instant>)>>,
    fail_sets: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            fail_sets: AtomicBool::new(false),
        }
    }

    pub fn fail_sets(&self, fail: bool) {
        self.fail_sets.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: ProductId) -> Result<Option<Product>> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(&key) {
            Some((_, Some(expires_at))) if Instant::now() >= *expires_at => {
                entries.remove(&key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: ProductId, value: Product, ttl: Option<TtlMs>) -> Result<()> {
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(Error::Internal("injected cache failure".to_string()));
        }
        let expires_at = ttl.map(|ttl| Instant::now() + ttl.as_duration());
        self.entries.lock().unwrap().insert(key, (value, expires_at));
        Ok(())
    }

    async fn delete(&self, key: ProductId) -> Result<bool> {
        Ok(self.entries.lock().unwrap().remove(&key).is_some())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.lock().unwrap().clear();
        Ok(())
    }
}

pub struct MemoryStore {
    records: Mutex<HashMap<ProductId, Product>>,
    /// Every successful put in arrival order, for ordering assertions.
    put_log: Mutex<Vec<(ProductId, Product)>>,
    fail_puts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            put_log: Mutex::new(Vec::new()),
            fail_puts: AtomicBool::new(false),
        }
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn puts_for(&self, key: ProductId) -> Vec<Product> {
        self.put_log
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, key: ProductId) -> Result<Option<Product>> {
        Ok(self.records.lock().unwrap().get(&key).cloned())
    }

    async fn put(&self, key: ProductId, value: Product) -> Result<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(Error::StoreUnavailable("injected store failure".to_string()));
        }
        self.put_log.lock().unwrap().push((key, value.clone()));
        self.records.lock().unwrap().insert(key, value);
        Ok(())
    }

    async fn delete(&self, key: ProductId) -> Result<bool> {
        Ok(self.records.lock().unwrap().remove(&key).is_some())
    }
}

/// A registry over in-memory doubles with a generous TTL and no flusher
/// attached; tests that need one spawn it against `registry.pending()`.
pub fn test_registry() -> (StrategyRegistry, Arc<MemoryCache>, Arc<MemoryStore>) {
    let cache = Arc::new(MemoryCache::new());
    let store = Arc::new(MemoryStore::new());
    let registry = StrategyRegistry::new(
        cache.clone(),
        store.clone(),
        Arc::new(MetricsCollector::new()),
        Arc::new(PendingWrites::new(1024)),
        Some(TtlMs(60_000)),
    );
    (registry, cache, store)
}
