//! Windowed cache of fused results.
//!
//! The cache is the fast tier of the two-tier retrieval path: it holds the
//! most recent fused result per vehicle, indexed both by vehicle and by
//! schedule instance, bounded to a trailing time window. Queries that the
//! window cannot satisfy fall through to the durable overflow store.

mod memory;

pub use memory::MemoryWindowedCache;

use crate::model::{EntityId, FusedResult, ScheduleInstance};

/// Narrow contract the engine consumes the windowed cache through.
///
/// Implementations must be internally safe for concurrent access; the
/// engine imposes no additional locking. Per vehicle, the cache reflects
/// only the most recently added record (last-write-wins).
pub trait WindowedCache: Send + Sync {
    /// All cached records for vehicles currently on the given instance.
    fn records_for_instance(&self, instance: &ScheduleInstance) -> Vec<FusedResult>;

    /// The cached record for a vehicle, if any. At most one exists.
    fn record_for_vehicle(&self, vehicle_id: &EntityId) -> Option<FusedResult>;

    /// Add a record, superseding any earlier record for the same vehicle.
    fn add_record(&self, record: FusedResult);

    /// Purge all entries for a vehicle (feed reset / disconnect).
    fn clear_for_vehicle(&self, vehicle_id: &EntityId);
}
