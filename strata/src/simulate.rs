//! Workload driver used by the `/simulate` and `/compare` endpoints: a
//! shuffled tape of reads and writes against one strategy, reported through
//! the metrics snapshot so the strategies can be compared side by side.

use crate::domain::{Product, ProductId};
use crate::metrics::StrategySnapshot;
use crate::strategy::{StrategyKind, StrategyRegistry};
use crate::writeback::FlusherHandle;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use shared::{Error, Result};
use std::collections::VecDeque;
use tracing::{info, warn};

/// Upper bound on `reads + writes` for one simulation run. Requests above
/// it are rejected rather than letting a JSON body size the op tape.
pub const MAX_SIMULATION_OPS: u64 = 1_000_000;

#[derive(Clone, Debug, Serialize)]
pub struct SimulationReport {
    pub strategy: StrategyKind,
    pub requested_reads: u64,
    pub requested_writes: u64,
    pub successful_reads: u64,
    pub successful_writes: u64,
    pub metrics: StrategySnapshot,
}

#[derive(Clone, Copy)]
enum SimOp {
    Read,
    Write,
}

/// Run `reads` random reads and `writes` writes against one strategy,
/// resetting its metrics first. For write-back the pending queue is flushed
/// at the end so the report reflects durable state.
pub async fn run_simulation(
    registry: &StrategyRegistry,
    flusher: Option<&FlusherHandle>,
    kind: StrategyKind,
    reads: u64,
    writes: u64,
) -> Result<SimulationReport> {
    // `ThreadRng` is !Send, which would make this future !Send; seed a
    // Send-able StdRng from the OS instead.
    let mut rng = rand::rngs::StdRng::from_os_rng();
    run_simulation_with(registry, flusher, kind, reads, writes, &mut rng).await
}

/// Deterministic variant for tests: the caller injects the RNG.
pub async fn run_simulation_with<R: Rng + ?Sized>(
    registry: &StrategyRegistry,
    flusher: Option<&FlusherHandle>,
    kind: StrategyKind,
    reads: u64,
    writes: u64,
    rng: &mut R,
) -> Result<SimulationReport> {
    let total = reads.saturating_add(writes);
    if total > MAX_SIMULATION_OPS {
        return Err(Error::Validation(format!(
            "workload of {reads} reads + {writes} writes exceeds the limit of {MAX_SIMULATION_OPS} operations"
        )));
    }

    info!(strategy = %kind, reads, writes, "starting simulation");
    registry.metrics().reset(kind);

    let mut jobs: VecDeque<Product> = (1..=writes).map(simulated_product).collect();
    // Reads target the same key space the writes populate.
    let key_space = writes.max(1);

    let mut tape: Vec<SimOp> = Vec::with_capacity(total as usize);
    tape.extend(std::iter::repeat_n(SimOp::Write, writes as usize));
    tape.extend(std::iter::repeat_n(SimOp::Read, reads as usize));
    tape.shuffle(rng);

    let engine = registry.engine(kind);
    let mut successful_reads = 0;
    let mut successful_writes = 0;

    for op in tape {
        match op {
            SimOp::Write => {
                let job = jobs.pop_front().expect("one job per scheduled write");
                let key = job.id;
                match engine.write(key, job).await {
                    Ok(()) => successful_writes += 1,
                    Err(err) => warn!(strategy = %kind, key, error = %err, "simulated write failed"),
                }
            }
            SimOp::Read => {
                let key: ProductId = rng.random_range(1..=key_space);
                match engine.read(key).await {
                    Ok(_) => successful_reads += 1,
                    Err(shared::Error::NotFound) => {}
                    Err(err) => warn!(strategy = %kind, key, error = %err, "simulated read failed"),
                }
            }
        }
    }

    // Drain the asynchronous tail instead of sleeping for it.
    if kind == StrategyKind::WriteBack {
        if let Some(flusher) = flusher {
            flusher.flush_now().await;
        }
    }

    info!(
        strategy = %kind,
        successful_reads,
        successful_writes,
        "simulation finished"
    );

    Ok(SimulationReport {
        strategy: kind,
        requested_reads: reads,
        requested_writes: writes,
        successful_reads,
        successful_writes,
        metrics: registry.snapshot(kind),
    })
}

fn simulated_product(id: u64) -> Product {
    Product::new(
        id,
        format!("Simulated Product {id}"),
        100.0 + id as f64 * 10.0,
        format!("Simulated description for product {id}"),
    )
}
