//! In-memory windowed cache implementation.

use std::collections::HashSet;

use dashmap::DashMap;
use tracing::debug;

use crate::cache::WindowedCache;
use crate::model::{EntityId, FusedResult, ScheduleInstance};

/// In-memory windowed cache of fused results.
///
/// One record per vehicle (last-write-wins), plus an instance index for
/// by-instance queries. Entries older than the trailing window, relative
/// to the newest record seen for an instance, are purged when that record
/// is added; the per-vehicle map is bounded by fleet size on its own.
pub struct MemoryWindowedCache {
    window_ms: i64,
    by_vehicle: DashMap<EntityId, FusedResult>,
    by_instance: DashMap<ScheduleInstance, HashSet<EntityId>>,
}

impl MemoryWindowedCache {
    /// Create a cache with the given trailing window (seconds).
    pub fn new(window_secs: u32) -> Self {
        Self {
            window_ms: i64::from(window_secs) * 1000,
            by_vehicle: DashMap::new(),
            by_instance: DashMap::new(),
        }
    }

    /// Number of vehicles currently cached.
    pub fn entry_count(&self) -> usize {
        self.by_vehicle.len()
    }

    /// Drop records for the given instance older than `cutoff_ms`, and
    /// index entries whose vehicle has moved to another instance.
    fn purge_stale(&self, instance: &ScheduleInstance, cutoff_ms: i64) {
        let stale: Vec<EntityId> = match self.by_instance.get(instance) {
            Some(vehicles) => vehicles
                .iter()
                .filter(|vehicle| {
                    self.by_vehicle.get(*vehicle).is_none_or(|record| {
                        record.instance != *instance || record.time_of_record() < cutoff_ms
                    })
                })
                .cloned()
                .collect(),
            None => return,
        };

        if stale.is_empty() {
            return;
        }
        debug!(
            "purging {} stale cache entries for instance {}",
            stale.len(),
            instance.group_id
        );

        if let Some(mut vehicles) = self.by_instance.get_mut(instance) {
            for vehicle in &stale {
                vehicles.remove(vehicle);
            }
        }
        for vehicle in &stale {
            self.by_vehicle.remove_if(vehicle, |_, record| {
                record.instance == *instance && record.time_of_record() < cutoff_ms
            });
        }
    }
}

impl WindowedCache for MemoryWindowedCache {
    fn records_for_instance(&self, instance: &ScheduleInstance) -> Vec<FusedResult> {
        let Some(vehicles) = self.by_instance.get(instance) else {
            return Vec::new();
        };
        vehicles
            .iter()
            .filter_map(|vehicle| self.by_vehicle.get(vehicle))
            .filter(|record| record.instance == *instance)
            .map(|record| record.value().clone())
            .collect()
    }

    fn record_for_vehicle(&self, vehicle_id: &EntityId) -> Option<FusedResult> {
        self.by_vehicle
            .get(vehicle_id)
            .map(|record| record.value().clone())
    }

    fn add_record(&self, record: FusedResult) {
        let vehicle = record.report.vehicle_id.clone();
        let instance = record.instance.clone();
        let record_time = record.time_of_record();

        // If the vehicle moved to another instance, drop it from the old
        // instance's index first.
        let previous_instance = self
            .by_vehicle
            .get(&vehicle)
            .filter(|previous| previous.instance != instance)
            .map(|previous| previous.instance.clone());
        if let Some(previous) = previous_instance {
            if let Some(mut vehicles) = self.by_instance.get_mut(&previous) {
                vehicles.remove(&vehicle);
            }
        }

        self.by_instance
            .entry(instance.clone())
            .or_default()
            .insert(vehicle.clone());
        self.by_vehicle.insert(vehicle, record);

        self.purge_stale(&instance, record_time - self.window_ms);
    }

    fn clear_for_vehicle(&self, vehicle_id: &EntityId) {
        if let Some((_, record)) = self.by_vehicle.remove(vehicle_id) {
            if let Some(mut vehicles) = self.by_instance.get_mut(&record.instance) {
                vehicles.remove(vehicle_id);
            }
        }
    }
}
