use crate::domain::{Product, ProductId};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;
use tokio::sync::Notify;

/// A write accepted into the cache but not yet durably persisted.
#[derive(Clone, Debug)]
pub struct PendingWrite {
    pub key: ProductId,
    pub product: Product,
    pub enqueued_at: Instant,
}

/// The dirty-key map shared between request tasks (producers) and the
/// flusher (consumer). Holds at most one entry per key: a later write for
/// the same key replaces the earlier one (last-write-wins coalescing).
///
/// The mutex is the single mutual-exclusion boundary of the write-back
/// pipeline. It is held only for map operations, never across I/O.
pub struct PendingWrites {
    entries: Mutex<HashMap<ProductId, PendingWrite>>,
    pressure: Notify,
    threshold: usize,
}

impl PendingWrites {
    pub fn new(threshold: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            pressure: Notify::new(),
            threshold: threshold.max(1),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ProductId, PendingWrite>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert or replace the pending write for `key`. Returns the queue
    /// length after the insert and wakes the flusher when it crosses the
    /// backpressure threshold.
    pub fn enqueue(&self, key: ProductId, product: Product) -> usize {
        let len = {
            let mut entries = self.lock();
            entries.insert(
                key,
                PendingWrite {
                    key,
                    product,
                    enqueued_at: Instant::now(),
                },
            );
            entries.len()
        };
        if len >= self.threshold {
            self.pressure.notify_one();
        }
        len
    }

    /// The pending value for `key`, if the key is dirty. Newer than whatever
    /// the durable store holds, so readers must prefer it.
    pub fn peek(&self, key: ProductId) -> Option<Product> {
        self.lock().get(&key).map(|entry| entry.product.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot-and-clear: the flusher takes the whole batch in one step, so
    /// writes arriving during the flush start the next batch instead of
    /// racing with the in-flight one.
    pub fn drain(&self) -> Vec<PendingWrite> {
        std::mem::take(&mut *self.lock()).into_values().collect()
    }

    /// Re-enqueue an entry whose persist failed, unless a newer write for
    /// the same key arrived while the flush was in flight.
    pub fn restore(&self, entry: PendingWrite) {
        self.lock().entry(entry.key).or_insert(entry);
    }

    /// Resolves when the queue crosses the backpressure threshold.
    pub async fn under_pressure(&self) {
        self.pressure.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::product;

    #[test]
    fn enqueue_coalesces_per_key() {
        let queue = PendingWrites::new(100);
        queue.enqueue(1, product(1, "v1"));
        queue.enqueue(1, product(1, "v2"));

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.peek(1).unwrap().name, "v2");
    }

    #[test]
    fn drain_clears_the_queue() {
        let queue = PendingWrites::new(100);
        queue.enqueue(1, product(1, "a"));
        queue.enqueue(2, product(2, "b"));

        let batch = queue.drain();
        assert_eq!(batch.len(), 2);
        assert!(queue.is_empty());
        assert!(queue.peek(1).is_none());
    }

    #[test]
    fn restore_does_not_clobber_a_newer_write() {
        let queue = PendingWrites::new(100);
        queue.enqueue(1, product(1, "old"));
        let batch = queue.drain();

        // A newer write lands while the old batch is being flushed.
        queue.enqueue(1, product(1, "new"));
        for entry in batch {
            queue.restore(entry);
        }

        assert_eq!(queue.peek(1).unwrap().name, "new");
    }

    #[test]
    fn restore_requeues_when_key_is_clean() {
        let queue = PendingWrites::new(100);
        queue.enqueue(1, product(1, "retry-me"));
        let batch = queue.drain();

        for entry in batch {
            queue.restore(entry);
        }

        assert_eq!(queue.peek(1).unwrap().name, "retry-me");
    }

    #[tokio::test]
    async fn crossing_the_threshold_notifies_the_flusher() {
        let queue = PendingWrites::new(2);
        queue.enqueue(1, product(1, "a"));
        queue.enqueue(2, product(2, "b"));

        // The permit was stored by enqueue, so this resolves immediately.
        tokio::time::timeout(std::time::Duration::from_secs(1), queue.under_pressure())
            .await
            .expect("pressure notification expected");
    }
}
