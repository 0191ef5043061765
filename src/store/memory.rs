//! In-memory overflow store implementation.

use std::sync::Mutex;

use crate::model::EntityId;
use crate::store::{OverflowStore, PersistedRecord, StoreError};

/// In-memory overflow store.
///
/// Keeps every saved record in insertion order. Suitable for tests and
/// small embedded deployments; production deployments implement
/// [`OverflowStore`] over a real database.
#[derive(Default)]
pub struct MemoryOverflowStore {
    records: Mutex<Vec<PersistedRecord>>,
}

impl MemoryOverflowStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records stored.
    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl OverflowStore for MemoryOverflowStore {
    fn save(&self, records: Vec<PersistedRecord>) -> Result<(), StoreError> {
        self.records.lock().unwrap().extend(records);
        Ok(())
    }

    fn records_for_instance(
        &self,
        group_id: &EntityId,
        service_date: i64,
        from: i64,
        to: i64,
    ) -> Result<Vec<PersistedRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|r| {
                &r.group_id == group_id
                    && r.service_date == service_date
                    && from <= r.time
                    && r.time <= to
            })
            .cloned()
            .collect())
    }

    fn records_for_vehicle(
        &self,
        vehicle_id: &EntityId,
        from: i64,
        to: i64,
    ) -> Result<Vec<PersistedRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|r| &r.vehicle_id == vehicle_id && from <= r.time && r.time <= to)
            .cloned()
            .collect())
    }
}
