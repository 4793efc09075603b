mod policies;

pub use policies::{CacheAside, ReadThrough, WriteAround, WriteBack, WriteThrough};

use crate::domain::{Product, ProductId, ReadOutcome};
use crate::metrics::{MetricsCollector, Op, StrategySnapshot};
use crate::ports::{CacheStore, RecordStore};
use crate::writeback::PendingWrites;
use serde::{Deserialize, Serialize};
use shared::{Error, Result, TtlMs};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    CacheAside,
    ReadThrough,
    WriteThrough,
    WriteAround,
    WriteBack,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::CacheAside,
        StrategyKind::ReadThrough,
        StrategyKind::WriteThrough,
        StrategyKind::WriteAround,
        StrategyKind::WriteBack,
    ];

    pub const fn index(self) -> usize {
        match self {
            StrategyKind::CacheAside => 0,
            StrategyKind::ReadThrough => 1,
            StrategyKind::WriteThrough => 2,
            StrategyKind::WriteAround => 3,
            StrategyKind::WriteBack => 4,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            StrategyKind::CacheAside => "cache_aside",
            StrategyKind::ReadThrough => "read_through",
            StrategyKind::WriteThrough => "write_through",
            StrategyKind::WriteAround => "write_around",
            StrategyKind::WriteBack => "write_back",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cache_aside" => Ok(StrategyKind::CacheAside),
            "read_through" => Ok(StrategyKind::ReadThrough),
            "write_through" => Ok(StrategyKind::WriteThrough),
            "write_around" => Ok(StrategyKind::WriteAround),
            "write_back" => Ok(StrategyKind::WriteBack),
            other => Err(Error::InvalidStrategy(other.to_string())),
        }
    }
}

/// One cache-consistency policy: how reads and writes propagate between the
/// cache and the durable store. Policies only implement the propagation
/// steps; metric recording lives in [`StrategyEngine`].
#[async_trait::async_trait]
pub trait Policy: Send + Sync + 'static {
    fn kind(&self) -> StrategyKind;

    /// Fails with `NotFound` when the key exists in neither layer.
    async fn read(&self, key: ProductId) -> Result<(Product, ReadOutcome)>;

    /// Fails with `StoreUnavailable` when the durable store rejects the
    /// write, except under write-back where persistence is asynchronous.
    async fn write(&self, key: ProductId, value: Product) -> Result<()>;
}

/// Shared plumbing around a policy: times every call and records exactly
/// one metric sample per operation.
pub struct StrategyEngine {
    policy: Arc<dyn Policy>,
    metrics: Arc<MetricsCollector>,
}

impl StrategyEngine {
    pub fn new(policy: Arc<dyn Policy>, metrics: Arc<MetricsCollector>) -> Self {
        Self { policy, metrics }
    }

    pub fn kind(&self) -> StrategyKind {
        self.policy.kind()
    }

    pub async fn read(&self, key: ProductId) -> Result<(Product, ReadOutcome)> {
        let start = Instant::now();
        let result = self.policy.read(key).await;
        let outcome = match &result {
            Ok((_, outcome)) => *outcome,
            Err(_) => ReadOutcome::Miss,
        };
        self.metrics
            .record(self.kind(), Op::Read, Some(outcome), start.elapsed());
        result
    }

    pub async fn write(&self, key: ProductId, value: Product) -> Result<()> {
        let start = Instant::now();
        let result = self.policy.write(key, value).await;
        self.metrics
            .record(self.kind(), Op::Write, None, start.elapsed());
        result
    }
}

/// All five strategy engines built over one shared cache/store pair, plus
/// the pending-write queue the write-back variant shares with its flusher.
pub struct StrategyRegistry {
    engines: Vec<StrategyEngine>,
    metrics: Arc<MetricsCollector>,
    cache: Arc<dyn CacheStore>,
    store: Arc<dyn RecordStore>,
    pending: Arc<PendingWrites>,
}

impl StrategyRegistry {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        store: Arc<dyn RecordStore>,
        metrics: Arc<MetricsCollector>,
        pending: Arc<PendingWrites>,
        ttl: Option<TtlMs>,
    ) -> Self {
        let policies: [Arc<dyn Policy>; 5] = [
            Arc::new(CacheAside::new(cache.clone(), store.clone(), ttl)),
            Arc::new(ReadThrough::new(cache.clone(), store.clone(), ttl)),
            Arc::new(WriteThrough::new(
                cache.clone(),
                store.clone(),
                metrics.clone(),
                ttl,
            )),
            Arc::new(WriteAround::new(cache.clone(), store.clone(), ttl)),
            Arc::new(WriteBack::new(
                cache.clone(),
                store.clone(),
                pending.clone(),
                ttl,
            )),
        ];
        let engines = policies
            .into_iter()
            .map(|policy| StrategyEngine::new(policy, metrics.clone()))
            .collect();

        Self {
            engines,
            metrics,
            cache,
            store,
            pending,
        }
    }

    pub fn engine(&self, kind: StrategyKind) -> &StrategyEngine {
        &self.engines[kind.index()]
    }

    /// Resolve a strategy identifier from the request layer. Unknown names
    /// fail with `InvalidStrategy`.
    pub fn resolve(&self, id: &str) -> Result<&StrategyEngine> {
        Ok(self.engine(id.parse()?))
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    pub fn record_store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn pending(&self) -> &Arc<PendingWrites> {
        &self.pending
    }

    pub fn snapshot(&self, kind: StrategyKind) -> StrategySnapshot {
        let mut snapshot = self.metrics.snapshot(kind);
        if kind == StrategyKind::WriteBack {
            snapshot.pending_writes = self.pending.len() as u64;
        }
        snapshot
    }

    pub fn snapshot_all(&self) -> Vec<StrategySnapshot> {
        StrategyKind::ALL.iter().map(|k| self.snapshot(*k)).collect()
    }
}
