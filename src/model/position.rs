//! Scheduled positions and supporting geometry types.

use super::EntityId;

/// A geographic point in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new geographic point.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A stop referenced from a scheduled position, with the signed offset
/// (seconds) from the position's scheduled time to the stop's arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTimeRef {
    pub stop_id: EntityId,
    pub time_offset: i32,
}

/// A position on an instance's schedule, as answered by the schedule
/// oracle.
///
/// Pure function of static data: recomputed on demand, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledPosition {
    /// Scheduled-time offset (seconds since service-date start).
    pub scheduled_time: i32,
    /// Cumulative path distance from the instance's start (meters).
    pub distance_along_instance: f64,
    /// Geographic position on the instance's shape.
    pub location: GeoPoint,
    /// Orientation in degrees.
    pub orientation: f64,
    /// Whether the instance is actively in revenue service at this point.
    pub in_service: bool,
    /// The trip within the group that is active at this point, if any.
    pub active_trip: Option<EntityId>,
    /// Nearest stop (preceding or following).
    pub closest_stop: Option<StopTimeRef>,
    /// Next stop in the instance's stop sequence.
    pub next_stop: Option<StopTimeRef>,
}
