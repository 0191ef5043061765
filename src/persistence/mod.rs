//! Asynchronous batched persistence pipeline.
//!
//! Freshly computed records are appended to a shared buffer; a background
//! daemon drains the buffer on a fixed period and bulk-writes each batch to
//! the overflow store. Appending never blocks on I/O; the drain is an O(1)
//! buffer swap.
//!
//! Durability is at most once: a batch that fails to write is logged and
//! discarded, trading completeness for liveness.

mod daemon;

pub use daemon::FlushDaemon;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::store::PersistedRecord;

/// Shared buffer of records awaiting persistence.
///
/// Append and drain are mutually exclusive; neither performs I/O.
#[derive(Default)]
pub struct PersistenceQueue {
    buffer: Mutex<Vec<PersistedRecord>>,
}

impl PersistenceQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append records to the buffer.
    pub fn append(&self, records: Vec<PersistedRecord>) {
        self.buffer.lock().unwrap().extend(records);
    }

    /// Atomically take the buffered records, leaving the buffer empty.
    pub fn drain(&self) -> Vec<PersistedRecord> {
        std::mem::take(&mut *self.buffer.lock().unwrap())
    }

    /// Number of records awaiting persistence.
    pub fn len(&self) -> usize {
        self.buffer.lock().unwrap().len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.lock().unwrap().is_empty()
    }
}

/// Flush observability counters, updated by the daemon after each batch.
///
/// Relaxed ordering throughout: eventual visibility is sufficient for
/// monitoring.
#[derive(Debug, Default)]
pub struct FlushStats {
    last_insert_duration_ms: AtomicU64,
    last_insert_count: AtomicU64,
}

impl FlushStats {
    /// Create zeroed stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed flush.
    pub fn record_flush(&self, duration: Duration, count: usize) {
        self.last_insert_duration_ms
            .store(duration.as_millis() as u64, Ordering::Relaxed);
        self.last_insert_count.store(count as u64, Ordering::Relaxed);
    }

    /// Wall-clock duration of the last bulk write (ms).
    pub fn last_insert_duration_ms(&self) -> u64 {
        self.last_insert_duration_ms.load(Ordering::Relaxed)
    }

    /// Record count of the last bulk write.
    pub fn last_insert_count(&self) -> u64 {
        self.last_insert_count.load(Ordering::Relaxed)
    }
}
