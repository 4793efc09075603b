use crate::metrics::MetricsCollector;
use crate::ports::RecordStore;
use crate::writeback::PendingWrites;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug)]
pub struct FlusherConfig {
    /// Fixed interval between scheduled flush cycles.
    pub interval: Duration,
    /// Per-entry timeout for one durable write. A stuck write is retried
    /// next cycle instead of stalling subsequent flushes.
    pub write_timeout: Duration,
}

impl Default for FlusherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            write_timeout: Duration::from_secs(2),
        }
    }
}

enum Command {
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Background worker that drains the pending-write queue and persists
/// entries to the durable store. Flushes on a fixed schedule, on
/// backpressure, and on demand; a failed persist is re-enqueued and retried
/// on later cycles without bound, since the original writer already
/// received success.
pub struct WriteBackFlusher {
    queue: Arc<PendingWrites>,
    store: Arc<dyn RecordStore>,
    metrics: Arc<MetricsCollector>,
    config: FlusherConfig,
}

impl WriteBackFlusher {
    pub fn spawn(
        queue: Arc<PendingWrites>,
        store: Arc<dyn RecordStore>,
        metrics: Arc<MetricsCollector>,
        config: FlusherConfig,
    ) -> FlusherHandle {
        let (tx, rx) = mpsc::channel(8);
        let flusher = Self {
            queue,
            store,
            metrics,
            config,
        };
        let task = tokio::spawn(flusher.run(rx));
        FlusherHandle {
            tx,
            task: Mutex::new(Some(task)),
        }
    }

    async fn run(self, mut rx: mpsc::Receiver<Command>) {
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.flush_once().await;
                }
                _ = self.queue.under_pressure() => {
                    debug!("backpressure flush triggered");
                    self.flush_once().await;
                }
                cmd = rx.recv() => match cmd {
                    Some(Command::Flush(ack)) => {
                        self.flush_once().await;
                        let _ = ack.send(());
                    }
                    Some(Command::Shutdown(ack)) => {
                        // Final best-effort drain before stopping.
                        self.flush_once().await;
                        let _ = ack.send(());
                        break;
                    }
                    None => {
                        self.flush_once().await;
                        break;
                    }
                },
            }
        }
        info!("write-back flusher stopped");
    }

    async fn flush_once(&self) {
        let batch = self.queue.drain();
        if batch.is_empty() {
            return;
        }
        debug!(entries = batch.len(), "flushing pending writes");

        for entry in batch {
            let write = self.store.put(entry.key, entry.product.clone());
            match tokio::time::timeout(self.config.write_timeout, write).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(key = entry.key, error = %err, "flush failed, retrying next cycle");
                    self.metrics.record_flush_retry();
                    self.queue.restore(entry);
                }
                Err(_) => {
                    warn!(key = entry.key, "flush timed out, retrying next cycle");
                    self.metrics.record_flush_retry();
                    self.queue.restore(entry);
                }
            }
        }
    }
}

/// Control handle for a spawned flusher. Producers never call into the
/// flusher directly; all data flows through the pending-write queue.
pub struct FlusherHandle {
    tx: mpsc::Sender<Command>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl FlusherHandle {
    /// Run one flush cycle now and wait for it to complete.
    pub async fn flush_now(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Command::Flush(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Graceful stop: one final drain-and-persist attempt, then the task
    /// exits. A hard kill before this completes is the write-back data-loss
    /// window.
    pub async fn shutdown(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(Command::Shutdown(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
        let task = self
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}
