use shared::config::Config;
use shared::{Result, TtlMs};
use std::sync::Arc;
use std::time::Duration;
use storage_engine::{MokaCache, SledStore};
use strata::metrics::MetricsCollector;
use strata::strategy::StrategyRegistry;
use strata::writeback::{FlusherConfig, FlusherHandle, PendingWrites, WriteBackFlusher};

/// Server state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<StrategyRegistry>,
    pub flusher: Arc<FlusherHandle>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let ttl = Duration::from_millis(config.cache_ttl_ms);
        let cache = Arc::new(MokaCache::new("products", None, Some(ttl)));

        let store_path = std::path::Path::new(&config.data_dir).join("products.sled");
        let store = Arc::new(SledStore::open(store_path)?);

        let metrics = Arc::new(MetricsCollector::new());
        let pending = Arc::new(PendingWrites::new(config.backpressure_threshold));

        let registry = Arc::new(StrategyRegistry::new(
            cache,
            store.clone(),
            metrics.clone(),
            pending.clone(),
            Some(TtlMs(config.cache_ttl_ms)),
        ));

        let flusher = Arc::new(WriteBackFlusher::spawn(
            pending,
            store,
            metrics,
            FlusherConfig {
                interval: Duration::from_millis(config.flush_interval_ms),
                write_timeout: Duration::from_millis(config.flush_timeout_ms),
            },
        ));

        Ok(Self { registry, flusher })
    }
}
