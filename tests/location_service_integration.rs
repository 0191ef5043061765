//! Integration tests for the location service.
//!
//! These tests verify the complete flows through a fully wired service:
//! - ingest -> windowed cache -> time-targeted query
//! - persistence pipeline -> overflow store -> out-of-window query
//! - staleness and fallback boundaries between the two tiers
//!
//! Run with: `cargo test --test location_service_integration`

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use blocktrack::cache::MemoryWindowedCache;
use blocktrack::model::{
    EntityId, GeoPoint, ScheduleInstance, ScheduledPosition, TargetTime, TimepointPrediction,
    VehicleReport,
};
use blocktrack::oracle::{ScheduleCalendar, ScheduleGraph, ScheduleOracle, ScheduledStop};
use blocktrack::service::{LocationConfig, LocationService};
use blocktrack::store::MemoryOverflowStore;

// ============================================================================
// Test Helpers
// ============================================================================

const SERVICE_DATE: i64 = 1_700_000_000_000;
const DAY_MS: i64 = 86_400_000;

/// Oracle over a straight instance: constant 10 m/s, in service for four
/// hours from the service-date start.
struct LinearOracle;

impl LinearOracle {
    const SPEED: f64 = 10.0;
    const DURATION_SECS: i32 = 14_400;

    fn position(scheduled_time: i32) -> Option<ScheduledPosition> {
        if scheduled_time < 0 || scheduled_time > Self::DURATION_SECS {
            return None;
        }
        Some(ScheduledPosition {
            scheduled_time,
            distance_along_instance: f64::from(scheduled_time) * Self::SPEED,
            location: GeoPoint::new(47.6, -122.3),
            orientation: 90.0,
            in_service: true,
            active_trip: Some(EntityId::new("metro", "trip-7")),
            closest_stop: None,
            next_stop: None,
        })
    }
}

impl ScheduleOracle for LinearOracle {
    fn position_at_offset(
        &self,
        _instance: &ScheduleInstance,
        scheduled_time: i32,
    ) -> Option<ScheduledPosition> {
        Self::position(scheduled_time)
    }

    fn position_at_distance(
        &self,
        _instance: &ScheduleInstance,
        distance: f64,
    ) -> Option<ScheduledPosition> {
        if distance < 0.0 || distance > f64::from(Self::DURATION_SECS) * Self::SPEED {
            return None;
        }
        Self::position((distance / Self::SPEED) as i32)
    }

    fn position_at_offset_from(
        &self,
        instance: &ScheduleInstance,
        _previous: &ScheduledPosition,
        scheduled_time: i32,
    ) -> Option<ScheduledPosition> {
        self.position_at_offset(instance, scheduled_time)
    }

    fn position_at_distance_from(
        &self,
        instance: &ScheduleInstance,
        _previous: &ScheduledPosition,
        distance: f64,
    ) -> Option<ScheduledPosition> {
        self.position_at_distance(instance, distance)
    }
}

struct StaticGraph;

impl ScheduleGraph for StaticGraph {
    fn group_for_trip(&self, trip_id: &EntityId) -> Option<EntityId> {
        (trip_id.id() == "trip-7").then(|| group())
    }

    fn stop_sequence(&self, _group_id: &EntityId) -> Vec<ScheduledStop> {
        vec![
            ScheduledStop {
                stop_id: EntityId::new("metro", "stop-a"),
                arrival_offset: 600,
            },
            ScheduledStop {
                stop_id: EntityId::new("metro", "stop-b"),
                arrival_offset: 1800,
            },
        ]
    }

    fn trip_start_distance(&self, _group_id: &EntityId, _trip_id: &EntityId) -> Option<f64> {
        Some(0.0)
    }
}

struct StaticCalendar {
    instances: Vec<ScheduleInstance>,
}

impl ScheduleCalendar for StaticCalendar {
    fn active_instances(&self, group_id: &EntityId, from: i64, to: i64) -> Vec<ScheduleInstance> {
        self.instances
            .iter()
            .filter(|i| {
                &i.group_id == group_id && i.service_date <= to && from <= i.service_date + DAY_MS
            })
            .cloned()
            .collect()
    }

    fn instance(&self, group_id: &EntityId, service_date: i64) -> Option<ScheduleInstance> {
        self.instances
            .iter()
            .find(|i| &i.group_id == group_id && i.service_date == service_date)
            .cloned()
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_test_writer()
        .try_init();
}

fn group() -> EntityId {
    EntityId::new("metro", "block-1")
}

fn block_instance() -> ScheduleInstance {
    ScheduleInstance::new(group(), SERVICE_DATE)
}

fn create_service(config: LocationConfig) -> (LocationService, Arc<MemoryOverflowStore>) {
    init_tracing();
    let store = Arc::new(MemoryOverflowStore::new());
    let service = LocationService::new(
        config,
        Arc::new(MemoryWindowedCache::new(1200)),
        store.clone(),
        Arc::new(LinearOracle),
        Arc::new(StaticGraph),
        Arc::new(StaticCalendar {
            instances: vec![block_instance()],
        }),
    );
    (service, store)
}

fn report_at_offset(vehicle: &str, offset_secs: i64) -> VehicleReport {
    let mut report = VehicleReport::new(EntityId::new("metro", vehicle));
    report.group_id = Some(group());
    report.service_date = Some(SERVICE_DATE);
    report.time_of_record = Some(SERVICE_DATE + offset_secs * 1000);
    report
}

// ============================================================================
// Live-window flows
// ============================================================================

#[test]
fn test_ingest_and_query_round_trip() {
    let (service, _) = create_service(LocationConfig::default());

    let mut report = report_at_offset("4012", 3700);
    report.schedule_deviation = Some(120.0);
    report.current_location = Some(GeoPoint::new(47.61, -122.33));
    service.ingest(report).unwrap();

    let now = SERVICE_DATE + 3_700_000;
    let answer = service
        .query_by_vehicle(&EntityId::new("metro", "4012"), TargetTime::now(now))
        .expect("cached report should answer");

    assert!(answer.predicted);
    assert_eq!(answer.schedule_deviation, Some(120.0));
    assert_eq!(answer.effective_schedule_time, Some(3580));
    assert_eq!(answer.last_known_location, Some(GeoPoint::new(47.61, -122.33)));
    assert_eq!(answer.active_trip, Some(EntityId::new("metro", "trip-7")));

    let by_instance = service
        .query_by_instance(&block_instance(), TargetTime::now(now))
        .expect("instance query should find the same vehicle");
    assert_eq!(by_instance.vehicle_id, Some(EntityId::new("metro", "4012")));
}

#[test]
fn test_deviation_samples_flow_through_to_answer() {
    let (service, _) = create_service(LocationConfig::default());

    let mut report = report_at_offset("4012", 500);
    report.timepoint_predictions = vec![TimepointPrediction {
        timepoint_id: EntityId::new("metro", "stop-a"),
        scheduled_time: Some(SERVICE_DATE + 600_000),
        predicted_time: Some(SERVICE_DATE + 660_000), // 60 s late
    }];
    service.ingest(report).unwrap();

    let now = SERVICE_DATE + 500_000;
    let answer = service
        .query_by_vehicle(&EntityId::new("metro", "4012"), TargetTime::now(now))
        .unwrap();

    let samples = answer.deviation_samples.expect("samples derived at ingest");
    assert_eq!(samples.schedule_times(), &[600]);
    assert_eq!(samples.deviations(), &[60.0]);
}

#[test]
fn test_stale_cache_inside_window_is_empty_not_error() {
    // Report at T, queried 400 s later: outside the 300 s acceptance
    // offset but inside the live window, so the answer is simply empty.
    let (service, store) = create_service(LocationConfig::default());
    service.ingest(report_at_offset("4012", 3600)).unwrap();

    let current = SERVICE_DATE + 3_600_000 + 400_000;
    let answer = service.query_by_vehicle(
        &EntityId::new("metro", "4012"),
        TargetTime::new(current, current),
    );

    assert!(answer.is_none());
    assert_eq!(store.record_count(), 0);
    assert_eq!(service.stats().store_access_count, 0);
}

#[test]
fn test_out_of_window_query_with_persistence_disabled_is_empty() {
    let (service, _) = create_service(LocationConfig::default());
    service.ingest(report_at_offset("4012", 3600)).unwrap();

    let now = SERVICE_DATE + 10_000_000;
    let answer = service.query_by_vehicle(
        &EntityId::new("metro", "4012"),
        TargetTime::new(SERVICE_DATE + 3_600_000, now),
    );

    assert!(answer.is_none());
    assert_eq!(service.stats().store_access_count, 0);
}

// ============================================================================
// Persistence and overflow flows
// ============================================================================

#[test]
fn test_flush_daemon_persists_ingested_records() {
    let config = LocationConfig {
        persistence_enabled: true,
        ..LocationConfig::default()
    };
    let (service, store) = create_service(config);
    service.start();

    let mut report = report_at_offset("4012", 3700);
    report.schedule_deviation = Some(60.0);
    service.ingest(report).unwrap();
    assert_eq!(service.stats().pending_records, 1);

    thread::sleep(Duration::from_millis(1500));

    assert_eq!(store.record_count(), 1);
    let stats = service.stats();
    assert_eq!(stats.pending_records, 0);
    assert_eq!(stats.last_flush_count, 1);

    service.shutdown();
}

#[test]
fn test_out_of_window_query_falls_back_to_overflow_store() {
    let config = LocationConfig {
        persistence_enabled: true,
        ..LocationConfig::default()
    };
    let (service, store) = create_service(config);
    service.start();

    let mut report = report_at_offset("4012", 3700);
    report.schedule_deviation = Some(120.0);
    service.ingest(report).unwrap();

    thread::sleep(Duration::from_millis(1500));
    assert_eq!(store.record_count(), 1);

    // Hours later, the cached record is long stale: the historical query
    // must be answered from the overflow store.
    let now = SERVICE_DATE + 20_000_000;
    let target = SERVICE_DATE + 3_700_000;
    let answer = service
        .query_by_instance(&block_instance(), TargetTime::new(target, now))
        .expect("overflow store should answer the historical query");

    assert_eq!(answer.vehicle_id, Some(EntityId::new("metro", "4012")));
    assert_eq!(answer.schedule_deviation, Some(120.0));
    assert_eq!(answer.effective_schedule_time, Some(3580));
    assert_eq!(service.stats().store_access_count, 1);

    service.shutdown();
}

#[test]
fn test_overflow_round_trip_by_vehicle() {
    let config = LocationConfig {
        persistence_enabled: true,
        ..LocationConfig::default()
    };
    let (service, _store) = create_service(config);
    service.start();

    let mut report = report_at_offset("4012", 3000);
    report.distance_along_instance = Some(25_000.0);
    service.ingest(report).unwrap();

    thread::sleep(Duration::from_millis(1500));

    let now = SERVICE_DATE + 20_000_000;
    let target = SERVICE_DATE + 3_000_000;
    let answer = service
        .query_by_vehicle(&EntityId::new("metro", "4012"), TargetTime::new(target, now))
        .expect("historical vehicle query should hit the store");

    assert_eq!(answer.vehicle_id, Some(EntityId::new("metro", "4012")));
    // Reconstructed record keeps the raw distance signal.
    assert_eq!(answer.distance_along_instance, Some(25_000.0));

    service.shutdown();
}

#[test]
fn test_query_many_by_instance_across_target_times() {
    let (service, _) = create_service(LocationConfig::default());
    service.ingest(report_at_offset("4012", 3600)).unwrap();
    service.ingest(report_at_offset("4013", 3650)).unwrap();

    let now = SERVICE_DATE + 3_700_000;
    let targets = vec![now, now + 120_000];
    let by_vehicle = service.query_many_by_instance(&block_instance(), &targets, now);

    assert_eq!(by_vehicle.len(), 2);
    for answers in by_vehicle.values() {
        assert_eq!(answers.len(), 2);
        assert!(answers.iter().all(|a| a.predicted));
    }
}

#[test]
fn test_reset_vehicle_then_scheduled_answer_still_available() {
    let (service, _) = create_service(LocationConfig::default());
    service.ingest(report_at_offset("4012", 3600)).unwrap();
    service.reset_vehicle(&EntityId::new("metro", "4012"));

    let now = SERVICE_DATE + 3_600_000;
    assert!(service
        .query_by_vehicle(&EntityId::new("metro", "4012"), TargetTime::now(now))
        .is_none());

    // The pure-schedule view of the instance is unaffected by the reset.
    let scheduled = service.scheduled_answer(&block_instance(), now).unwrap();
    assert!(!scheduled.predicted);
    assert_eq!(scheduled.scheduled_distance_along_instance, Some(36_000.0));
}
