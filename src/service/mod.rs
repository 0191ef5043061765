//! Location service facade.
//!
//! [`LocationService`] wires the resolver, synthesizer, windowed cache,
//! overflow store and persistence pipeline together behind the engine's
//! public operations: report ingestion, time-targeted location queries and
//! per-vehicle reset.

mod config;

pub use config::LocationConfig;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::cache::WindowedCache;
use crate::model::{
    EntityId, FusedResult, LocationAnswer, ScheduleInstance, TargetTime, VehicleReport,
};
use crate::oracle::{ScheduleCalendar, ScheduleGraph, ScheduleOracle};
use crate::persistence::{FlushDaemon, FlushStats, PersistenceQueue};
use crate::query::{retrieve, InstanceRecordSource, RecordSource, VehicleRecordSource};
use crate::resolver::{IngestError, InstanceResolver};
use crate::store::{OverflowStore, PersistedRecord};
use crate::synthesizer::PositionSynthesizer;

/// Callback invoked with the answer computed for each successfully
/// ingested report.
pub trait LocationListener: Send + Sync {
    /// Handle a freshly computed location.
    fn on_location(&self, answer: &LocationAnswer);
}

/// Observability snapshot of the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Times a query fell through to the overflow store.
    pub store_access_count: u64,
    /// Wall-clock duration of the last bulk write (ms).
    pub last_flush_duration_ms: u64,
    /// Record count of the last bulk write.
    pub last_flush_count: u64,
    /// Records currently buffered for persistence.
    pub pending_records: usize,
}

/// Real-time vehicle location service.
///
/// Ingestion resolves each report to its schedule instance, synthesizes an
/// effective scheduled position, caches the fused result and buffers its
/// durable projection. Queries retrieve fused results through the
/// two-tier cache/store path and merge them with schedule-derived fields.
pub struct LocationService {
    config: LocationConfig,
    cache: Arc<dyn WindowedCache>,
    store: Arc<dyn OverflowStore>,
    oracle: Arc<dyn ScheduleOracle>,
    graph: Arc<dyn ScheduleGraph>,
    calendar: Arc<dyn ScheduleCalendar>,
    resolver: InstanceResolver,
    synthesizer: PositionSynthesizer,
    listeners: Vec<Arc<dyn LocationListener>>,
    queue: Arc<PersistenceQueue>,
    flush_stats: Arc<FlushStats>,
    store_access_count: AtomicU64,
    flush_daemon: Mutex<Option<FlushDaemon>>,
}

impl LocationService {
    /// Create a service from its configuration and collaborators.
    pub fn new(
        config: LocationConfig,
        cache: Arc<dyn WindowedCache>,
        store: Arc<dyn OverflowStore>,
        oracle: Arc<dyn ScheduleOracle>,
        graph: Arc<dyn ScheduleGraph>,
        calendar: Arc<dyn ScheduleCalendar>,
    ) -> Self {
        let resolver = InstanceResolver::new(
            graph.clone(),
            calendar.clone(),
            config.instance_matching_window_ms,
        );
        let synthesizer = PositionSynthesizer::new(
            oracle.clone(),
            graph.clone(),
            config.distance_interpolation_enabled,
        );
        Self {
            config,
            cache,
            store,
            oracle,
            graph,
            calendar,
            resolver,
            synthesizer,
            listeners: Vec::new(),
            queue: Arc::new(PersistenceQueue::new()),
            flush_stats: Arc::new(FlushStats::new()),
            store_access_count: AtomicU64::new(0),
            flush_daemon: Mutex::new(None),
        }
    }

    /// Register a listener notified on every successful ingestion.
    pub fn add_listener(&mut self, listener: Arc<dyn LocationListener>) {
        self.listeners.push(listener);
    }

    /// Start background work. With persistence enabled this launches the
    /// flush daemon; otherwise it is a no-op.
    pub fn start(&self) {
        if !self.config.persistence_enabled {
            return;
        }
        let mut daemon = self.flush_daemon.lock().unwrap();
        if daemon.is_none() {
            *daemon = Some(FlushDaemon::start(
                self.queue.clone(),
                self.store.clone(),
                self.flush_stats.clone(),
                self.config.flush_period_secs,
            ));
            info!("location service started with persistence enabled");
        }
    }

    /// Stop background work. Safe to call more than once; never hangs.
    pub fn shutdown(&self) {
        if let Some(mut daemon) = self.flush_daemon.lock().unwrap().take() {
            daemon.shutdown();
            daemon.join();
        }
    }

    /// Ingest one vehicle report.
    ///
    /// Resolves the report's schedule instance, synthesizes its position,
    /// caches the fused result, notifies listeners and buffers durable
    /// records. A report matching no active instance is dropped silently.
    ///
    /// # Errors
    ///
    /// [`IngestError`] when the report is malformed or unmappable (§
    /// resolver contract). Dropped reports are not errors.
    pub fn ingest(&self, report: VehicleReport) -> Result<(), IngestError> {
        let Some(instance) = self.resolver.resolve(&report)? else {
            debug!(
                "dropping report from vehicle {}: no active schedule instance",
                report.vehicle_id
            );
            return Ok(());
        };

        let position = self.synthesizer.position_for_report(&instance, &report);
        let samples = self.synthesizer.sample_deviations(&instance, &report);
        let fused = FusedResult::new(instance.clone(), report, position, samples);

        self.cache.add_record(fused.clone());

        if !self.listeners.is_empty() {
            // Listeners get the answer at the report's own observation
            // time.
            if let Some(answer) =
                self.assemble_answer(&instance, Some(&fused), fused.time_of_record())
            {
                for listener in &self.listeners {
                    listener.on_location(&answer);
                }
            }
        }

        if self.config.persistence_enabled {
            let records = PersistedRecord::from_fused(&fused, self.graph.as_ref());
            self.queue.append(records);
        }

        Ok(())
    }

    /// Purge all cache entries for a vehicle (feed reset / disconnect).
    pub fn reset_vehicle(&self, vehicle_id: &EntityId) {
        self.cache.clear_for_vehicle(vehicle_id);
    }

    /// Best single location for a schedule instance at a target time.
    pub fn query_by_instance(
        &self,
        instance: &ScheduleInstance,
        time: TargetTime,
    ) -> Option<LocationAnswer> {
        let source = InstanceRecordSource {
            cache: self.cache.as_ref(),
            store: self.store.as_ref(),
            instance,
        };
        let candidates = self.retrieve_ordered(&source, time);
        candidates
            .iter()
            .find_map(|fused| self.assemble_answer(&fused.instance, Some(fused), time.target))
    }

    /// Best location for a vehicle at a target time.
    pub fn query_by_vehicle(
        &self,
        vehicle_id: &EntityId,
        time: TargetTime,
    ) -> Option<LocationAnswer> {
        let source = VehicleRecordSource {
            cache: self.cache.as_ref(),
            store: self.store.as_ref(),
            vehicle_id,
        };
        let candidates = self.retrieve_ordered(&source, time);
        candidates
            .iter()
            .find_map(|fused| self.assemble_answer(&fused.instance, Some(fused), time.target))
    }

    /// Locations of every vehicle on a schedule instance at a target time.
    pub fn query_all_by_instance(
        &self,
        instance: &ScheduleInstance,
        time: TargetTime,
    ) -> Vec<LocationAnswer> {
        let source = InstanceRecordSource {
            cache: self.cache.as_ref(),
            store: self.store.as_ref(),
            instance,
        };
        self.retrieve_ordered(&source, time)
            .iter()
            .filter_map(|fused| self.assemble_answer(&fused.instance, Some(fused), time.target))
            .collect()
    }

    /// Locations of every vehicle on a schedule instance across several
    /// target times, grouped by vehicle.
    pub fn query_many_by_instance(
        &self,
        instance: &ScheduleInstance,
        target_times: &[i64],
        current_time: i64,
    ) -> HashMap<EntityId, Vec<LocationAnswer>> {
        let mut by_vehicle: HashMap<EntityId, Vec<LocationAnswer>> = HashMap::new();

        for &target in target_times {
            let time = TargetTime::new(target, current_time);
            let source = InstanceRecordSource {
                cache: self.cache.as_ref(),
                store: self.store.as_ref(),
                instance,
            };
            for fused in self.retrieve_ordered(&source, time) {
                if let Some(answer) = self.assemble_answer(&fused.instance, Some(&fused), target) {
                    by_vehicle
                        .entry(fused.report.vehicle_id.clone())
                        .or_default()
                        .push(answer);
                }
            }
        }

        by_vehicle
    }

    /// Pure-schedule location of an instance at a target time, ignoring
    /// all real-time data. `None` when the instance is not scheduled to
    /// be anywhere at that time.
    pub fn scheduled_answer(
        &self,
        instance: &ScheduleInstance,
        target_time: i64,
    ) -> Option<LocationAnswer> {
        self.assemble_answer(instance, None, target_time)
    }

    /// Observability snapshot.
    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            store_access_count: self.store_access_count.load(Ordering::Relaxed),
            last_flush_duration_ms: self.flush_stats.last_insert_duration_ms(),
            last_flush_count: self.flush_stats.last_insert_count(),
            pending_records: self.queue.len(),
        }
    }

    /// Retrieve candidates and order them by how close their report time
    /// lies to the query's current time. The ordering makes the "first
    /// candidate wins" selection of the single-answer queries
    /// deterministic: the freshest observation relative to the querying
    /// clock is preferred.
    fn retrieve_ordered(&self, source: &dyn RecordSource, time: TargetTime) -> Vec<FusedResult> {
        let mut candidates = retrieve(
            source,
            time,
            self.calendar.as_ref(),
            &self.config,
            &self.store_access_count,
        );
        candidates.sort_by_key(|fused| (fused.time_of_record() - time.current).abs());
        candidates
    }

    /// Merge a candidate's real-time signals with the schedule-derived
    /// position into one answer.
    ///
    /// The real-time branch may be undeterminable (offset beyond the
    /// instance end, distance outside its shape); the answer then falls
    /// back to the pure-schedule position at the target time. `None` only
    /// when that too is undeterminable.
    fn assemble_answer(
        &self,
        instance: &ScheduleInstance,
        cache_record: Option<&FusedResult>,
        target_time: i64,
    ) -> Option<LocationAnswer> {
        let mut answer = LocationAnswer::new(instance.clone(), target_time);

        let mut scheduled_position = None;

        if let Some(fused) = cache_record {
            scheduled_position = self.synthesizer.position_for_cached(fused, target_time);

            let report = &fused.report;
            answer.predicted = true;
            answer.vehicle_id = Some(report.vehicle_id.clone());
            answer.last_update_time = report.time_of_record;
            answer.last_location_update_time = report.time_of_location_update;
            answer.schedule_deviation = report.schedule_deviation;
            answer.deviation_samples = fused.deviation_samples.clone();
            answer.last_known_location = report.current_location;
            answer.last_known_orientation = report.current_orientation;
            answer.phase = report.phase.clone();
            answer.status = report.status.clone();

            if let Some(position) = &scheduled_position {
                answer.effective_schedule_time = Some(position.scheduled_time);
                answer.distance_along_instance = Some(position.distance_along_instance);
            }
        }

        if scheduled_position.is_none() {
            // No confident real-time position: pure-schedule fallback at
            // the target time.
            scheduled_position = self
                .oracle
                .position_at_offset(instance, instance.offset_secs(target_time));
        }

        let position = scheduled_position?;
        answer.in_service = position.in_service;
        answer.active_trip = position.active_trip.clone();
        answer.location = Some(position.location);
        answer.orientation = Some(position.orientation);
        answer.scheduled_distance_along_instance = Some(position.distance_along_instance);
        answer.closest_stop = position.closest_stop;
        answer.next_stop = position.next_stop;

        Some(answer)
    }
}

impl Drop for LocationService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
