//! Durable overflow store contract and record projection.
//!
//! The store is the slow tier of the two-tier retrieval path. The engine
//! writes [`PersistedRecord`]s in periodic batches and reads them back only
//! when a query's target time falls outside the cache window. The storage
//! engine itself is a black box behind [`OverflowStore`].

mod memory;
mod record;

pub use memory::MemoryOverflowStore;
pub use record::{PersistedRecord, TimepointRow};

use thiserror::Error;

use crate::model::EntityId;

/// Errors surfaced by overflow-store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O failure in the storage backend.
    #[error("overflow store I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific failure.
    #[error("overflow store backend failure: {0}")]
    Backend(String),
}

/// Black-box read/write API of the durable overflow store.
///
/// Implementations must be internally safe for concurrent access. Range
/// bounds are inclusive epoch milliseconds on record time.
pub trait OverflowStore: Send + Sync {
    /// Bulk-insert a batch of records. Records are written once and never
    /// updated in place.
    fn save(&self, records: Vec<PersistedRecord>) -> Result<(), StoreError>;

    /// Records for a group's instance on a service date, within a time
    /// range.
    fn records_for_instance(
        &self,
        group_id: &EntityId,
        service_date: i64,
        from: i64,
        to: i64,
    ) -> Result<Vec<PersistedRecord>, StoreError>;

    /// Records for a vehicle within a time range.
    fn records_for_vehicle(
        &self,
        vehicle_id: &EntityId,
        from: i64,
        to: i64,
    ) -> Result<Vec<PersistedRecord>, StoreError>;
}
