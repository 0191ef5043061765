//! Background daemon flushing the persistence queue.
//!
//! The daemon runs in a separate thread, drains the queue on a fixed
//! period and bulk-writes each non-empty batch to the overflow store. It
//! can be cleanly shut down by calling `shutdown()` or dropping the
//! `FlushDaemon` instance; an in-flight write completes, and nothing
//! re-queues a failed batch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::persistence::{FlushStats, PersistenceQueue};
use crate::store::OverflowStore;

/// Background daemon flushing buffered records to the overflow store.
pub struct FlushDaemon {
    /// Handle to the daemon thread
    thread_handle: Option<JoinHandle<()>>,
    /// Shutdown signal
    shutdown: Arc<AtomicBool>,
}

impl FlushDaemon {
    /// Start a new flush daemon.
    ///
    /// # Arguments
    ///
    /// * `queue` - Buffer to drain each period
    /// * `store` - Overflow store receiving bulk writes
    /// * `stats` - Counters updated after each successful flush
    /// * `period_secs` - Flush period in seconds
    pub fn start(
        queue: Arc<PersistenceQueue>,
        store: Arc<dyn OverflowStore>,
        stats: Arc<FlushStats>,
        period_secs: u64,
    ) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let thread_handle = thread::Builder::new()
            .name("location-flush".to_string())
            .spawn(move || {
                Self::run_loop(queue, store, stats, period_secs, shutdown_clone);
            })
            .expect("Failed to spawn flush daemon thread");

        info!("Location record flush daemon started (period: {}s)", period_secs);

        Self {
            thread_handle: Some(thread_handle),
            shutdown,
        }
    }

    /// The main daemon loop.
    fn run_loop(
        queue: Arc<PersistenceQueue>,
        store: Arc<dyn OverflowStore>,
        stats: Arc<FlushStats>,
        period_secs: u64,
        shutdown: Arc<AtomicBool>,
    ) {
        let period = Duration::from_secs(period_secs);

        // Sleep in short slices so shutdown stays responsive even with
        // multi-second flush periods.
        let check_interval = Duration::from_millis(100);
        let mut elapsed = Duration::ZERO;

        loop {
            if shutdown.load(Ordering::Relaxed) {
                debug!("Flush daemon received shutdown signal");
                break;
            }

            thread::sleep(check_interval);
            elapsed += check_interval;

            if elapsed >= period {
                elapsed = Duration::ZERO;
                Self::flush_once(&queue, &store, &stats);
            }
        }

        // Final drain so records ingested just before shutdown are not
        // silently dropped.
        Self::flush_once(&queue, &store, &stats);

        debug!("Flush daemon stopped");
    }

    /// Drain the queue and bulk-write the batch, if any.
    ///
    /// Write failures are logged and the batch is discarded; the next
    /// period flushes the next batch (at-most-once durability).
    fn flush_once(queue: &PersistenceQueue, store: &Arc<dyn OverflowStore>, stats: &FlushStats) {
        let batch = queue.drain();
        if batch.is_empty() {
            return;
        }

        let count = batch.len();
        let started = Instant::now();
        match store.save(batch) {
            Ok(()) => {
                let duration = started.elapsed();
                stats.record_flush(duration, count);
                debug!(
                    "Flushed {} location records in {} ms",
                    count,
                    duration.as_millis()
                );
            }
            Err(e) => {
                error!("Failed to flush {} location records: {}", count, e);
            }
        }
    }

    /// Signal the daemon to shut down.
    ///
    /// Non-blocking; the daemon stops at its next check interval. Call
    /// `join()` after this to wait for the thread to finish.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Wait for the daemon thread to finish.
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                warn!("Flush daemon thread panicked: {:?}", e);
            }
        }
    }

    /// Check if the daemon is still running.
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for FlushDaemon {
    fn drop(&mut self) {
        self.shutdown();
        self.join();
    }
}
