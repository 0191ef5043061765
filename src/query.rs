//! Query strategies over the two-tier retrieval path.
//!
//! Two interchangeable retrieval policies - by schedule instance and by
//! vehicle id - differ only in the keys they use against the windowed
//! cache and the overflow store. The small [`RecordSource`] capability
//! trait captures that difference so the staleness / fallback logic in
//! [`retrieve`] is shared.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::cache::WindowedCache;
use crate::model::{EntityId, FusedResult, ScheduleInstance, TargetTime};
use crate::oracle::ScheduleCalendar;
use crate::service::LocationConfig;
use crate::store::{OverflowStore, PersistedRecord, StoreError};

/// Where candidate records come from, for one concrete query key.
pub trait RecordSource {
    /// Raw candidates from the windowed cache.
    fn from_cache(&self) -> Vec<FusedResult>;

    /// Records from the overflow store within `[from, to]` (epoch ms).
    fn from_store(&self, from: i64, to: i64) -> Result<Vec<PersistedRecord>, StoreError>;
}

/// Record source keyed by schedule instance.
pub struct InstanceRecordSource<'a> {
    pub cache: &'a dyn WindowedCache,
    pub store: &'a dyn OverflowStore,
    pub instance: &'a ScheduleInstance,
}

impl RecordSource for InstanceRecordSource<'_> {
    fn from_cache(&self) -> Vec<FusedResult> {
        self.cache.records_for_instance(self.instance)
    }

    fn from_store(&self, from: i64, to: i64) -> Result<Vec<PersistedRecord>, StoreError> {
        self.store.records_for_instance(
            &self.instance.group_id,
            self.instance.service_date,
            from,
            to,
        )
    }
}

/// Record source keyed by vehicle id.
pub struct VehicleRecordSource<'a> {
    pub cache: &'a dyn WindowedCache,
    pub store: &'a dyn OverflowStore,
    pub vehicle_id: &'a EntityId,
}

impl RecordSource for VehicleRecordSource<'_> {
    fn from_cache(&self) -> Vec<FusedResult> {
        self.cache
            .record_for_vehicle(self.vehicle_id)
            .into_iter()
            .collect()
    }

    fn from_store(&self, from: i64, to: i64) -> Result<Vec<PersistedRecord>, StoreError> {
        self.store.records_for_vehicle(self.vehicle_id, from, to)
    }
}

/// Shared retrieval over the two tiers.
///
/// Cache candidates whose report time lies within the prediction
/// acceptance offset of the query's current time win outright; the
/// overflow store is consulted only when the target time falls outside
/// the live cache window and durable persistence is enabled. A cache miss
/// inside the live window is "no data", not a fallback trigger.
///
/// `store_access_count` is incremented on every overflow fallback.
pub fn retrieve(
    source: &dyn RecordSource,
    time: TargetTime,
    calendar: &dyn ScheduleCalendar,
    config: &LocationConfig,
    store_access_count: &AtomicU64,
) -> Vec<FusedResult> {
    let candidates = source.from_cache();

    if !candidates.is_empty() {
        let offset = i64::from(config.prediction_acceptance_offset_secs) * 1000;
        let in_range: Vec<FusedResult> = candidates
            .into_iter()
            .filter(|record| {
                let t = record.time_of_record();
                t - offset <= time.current && time.current <= t + offset
            })
            .collect();
        if !in_range.is_empty() {
            return in_range;
        }
    }

    let half_window = i64::from(config.cache_window_secs) * 1000 / 2;

    // Persisted records are only consulted when the requested target time
    // is not within the current cache window.
    let out_of_range =
        time.target + half_window < time.current || time.current < time.target - half_window;

    if out_of_range && config.persistence_enabled {
        store_access_count.fetch_add(1, Ordering::Relaxed);

        let from = time.target - half_window;
        let to = time.target + half_window;

        match source.from_store(from, to) {
            Ok(rows) if !rows.is_empty() => return reconstruct(rows, calendar),
            Ok(_) => {}
            Err(e) => {
                // Query-path contract: degraded answers, never errors.
                warn!("overflow store query failed, returning no candidates: {e}");
            }
        }
    }

    Vec::new()
}

/// Rebuild fused results from persisted rows, grouped by (instance,
/// vehicle). Rows whose instance no longer exists in the calendar are
/// dropped.
fn reconstruct(rows: Vec<PersistedRecord>, calendar: &dyn ScheduleCalendar) -> Vec<FusedResult> {
    let mut instances: HashMap<(EntityId, i64), Option<ScheduleInstance>> = HashMap::new();

    let mut results = Vec::with_capacity(rows.len());
    for row in rows {
        let key = (row.group_id.clone(), row.service_date);
        let instance = instances
            .entry(key)
            .or_insert_with(|| calendar.instance(&row.group_id, row.service_date));
        match instance {
            Some(instance) => results.push(row.to_fused(instance.clone())),
            None => {
                debug!(
                    "dropping persisted record for unknown instance {} @ {}",
                    row.group_id, row.service_date
                );
            }
        }
    }
    results
}
