use crate::domain::ReadOutcome;
use crate::strategy::StrategyKind;
use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Read,
    Write,
}

#[derive(Clone, Copy, Debug, Default)]
struct Counters {
    hits: u64,
    misses: u64,
    reads: u64,
    writes: u64,
    read_micros: u64,
    write_micros: u64,
    soft_failures: u64,
    flush_retries: u64,
}

/// Per-strategy operation counters. One lock per strategy keeps `record`
/// O(1) and makes `reset` atomic with respect to concurrent samples: every
/// sample lands in exactly one reset epoch. Locks are never held across I/O.
pub struct MetricsCollector {
    counters: [Mutex<Counters>; StrategyKind::ALL.len()],
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            counters: std::array::from_fn(|_| Mutex::new(Counters::default())),
        }
    }

    fn with_counters<T>(&self, kind: StrategyKind, f: impl FnOnce(&mut Counters) -> T) -> T {
        let mut counters = self.counters[kind.index()]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut counters)
    }

    /// Append one sample to the running aggregates. Reads carry a hit/miss
    /// outcome; writes have no hit/miss notion and only count for latency.
    pub fn record(
        &self,
        kind: StrategyKind,
        op: Op,
        outcome: Option<ReadOutcome>,
        latency: Duration,
    ) {
        let micros = latency.as_micros() as u64;
        self.with_counters(kind, |counters| match op {
            Op::Read => {
                counters.reads += 1;
                counters.read_micros += micros;
                match outcome {
                    Some(ReadOutcome::Hit) => counters.hits += 1,
                    Some(ReadOutcome::Miss) | None => counters.misses += 1,
                }
            }
            Op::Write => {
                counters.writes += 1;
                counters.write_micros += micros;
            }
        });
    }

    /// Count a failure that was absorbed rather than surfaced, e.g. a
    /// write-through cache update that failed after the durable write.
    pub fn record_soft_failure(&self, kind: StrategyKind) {
        self.with_counters(kind, |counters| counters.soft_failures += 1);
    }

    /// Count a pending write that failed to persist and was re-enqueued.
    pub fn record_flush_retry(&self) {
        self.with_counters(StrategyKind::WriteBack, |counters| {
            counters.flush_retries += 1;
        });
    }

    pub fn snapshot(&self, kind: StrategyKind) -> StrategySnapshot {
        let counters = self.with_counters(kind, |counters| *counters);
        StrategySnapshot::from_counters(kind, counters)
    }

    pub fn snapshot_all(&self) -> Vec<StrategySnapshot> {
        StrategyKind::ALL.iter().map(|k| self.snapshot(*k)).collect()
    }

    pub fn reset(&self, kind: StrategyKind) {
        self.with_counters(kind, |counters| *counters = Counters::default());
    }

    pub fn reset_all(&self) {
        for kind in StrategyKind::ALL {
            self.reset(kind);
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct StrategySnapshot {
    pub strategy: StrategyKind,
    pub hits: u64,
    pub misses: u64,
    pub reads: u64,
    pub writes: u64,
    /// hits / (hits + misses) over read operations; 0 when no reads.
    pub hit_rate: f64,
    pub avg_read_latency_us: f64,
    pub avg_write_latency_us: f64,
    pub soft_failures: u64,
    pub flush_retries: u64,
    /// Live pending-write count, populated for write_back only.
    pub pending_writes: u64,
}

impl StrategySnapshot {
    fn from_counters(strategy: StrategyKind, counters: Counters) -> Self {
        let lookups = counters.hits + counters.misses;
        Self {
            strategy,
            hits: counters.hits,
            misses: counters.misses,
            reads: counters.reads,
            writes: counters.writes,
            hit_rate: if lookups > 0 {
                counters.hits as f64 / lookups as f64
            } else {
                0.0
            },
            avg_read_latency_us: if counters.reads > 0 {
                counters.read_micros as f64 / counters.reads as f64
            } else {
                0.0
            },
            avg_write_latency_us: if counters.writes > 0 {
                counters.write_micros as f64 / counters.writes as f64
            } else {
                0.0
            },
            soft_failures: counters.soft_failures,
            flush_retries: counters.flush_retries,
            pending_writes: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_is_hits_over_lookups() {
        let metrics = MetricsCollector::new();
        for _ in 0..7 {
            metrics.record(
                StrategyKind::CacheAside,
                Op::Read,
                Some(ReadOutcome::Hit),
                Duration::from_micros(10),
            );
        }
        for _ in 0..3 {
            metrics.record(
                StrategyKind::CacheAside,
                Op::Read,
                Some(ReadOutcome::Miss),
                Duration::from_micros(10),
            );
        }

        let snapshot = metrics.snapshot(StrategyKind::CacheAside);
        assert_eq!(snapshot.hits, 7);
        assert_eq!(snapshot.misses, 3);
        assert_eq!(snapshot.hit_rate, 0.7);
    }

    #[test]
    fn writes_do_not_affect_hit_rate() {
        let metrics = MetricsCollector::new();
        metrics.record(
            StrategyKind::WriteThrough,
            Op::Write,
            None,
            Duration::from_micros(40),
        );
        metrics.record(
            StrategyKind::WriteThrough,
            Op::Write,
            None,
            Duration::from_micros(60),
        );

        let snapshot = metrics.snapshot(StrategyKind::WriteThrough);
        assert_eq!(snapshot.hit_rate, 0.0);
        assert_eq!(snapshot.writes, 2);
        assert_eq!(snapshot.avg_write_latency_us, 50.0);
    }

    #[test]
    fn reset_zeroes_counters_and_is_idempotent() {
        let metrics = MetricsCollector::new();
        metrics.record(
            StrategyKind::WriteBack,
            Op::Read,
            Some(ReadOutcome::Hit),
            Duration::from_micros(5),
        );
        metrics.record_flush_retry();

        metrics.reset_all();
        metrics.reset_all();

        let snapshot = metrics.snapshot(StrategyKind::WriteBack);
        assert_eq!(snapshot.reads, 0);
        assert_eq!(snapshot.hits, 0);
        assert_eq!(snapshot.flush_retries, 0);
        assert_eq!(snapshot.hit_rate, 0.0);
    }

    #[test]
    fn reset_targets_a_single_strategy() {
        let metrics = MetricsCollector::new();
        for kind in [StrategyKind::CacheAside, StrategyKind::WriteAround] {
            metrics.record(kind, Op::Read, Some(ReadOutcome::Hit), Duration::ZERO);
        }

        metrics.reset(StrategyKind::CacheAside);

        assert_eq!(metrics.snapshot(StrategyKind::CacheAside).reads, 0);
        assert_eq!(metrics.snapshot(StrategyKind::WriteAround).reads, 1);
    }
}
