//! Core data model for the location engine.
//!
//! All time values are epoch milliseconds (`i64`) unless a field name says
//! otherwise; schedule-relative offsets are seconds since the start of an
//! instance's service date (`i32`), matching the static timetable's units.

mod answer;
mod fused;
mod ids;
mod instance;
mod position;
mod report;

pub use answer::LocationAnswer;
pub use fused::{DeviationSamples, FusedResult};
pub use ids::EntityId;
pub use instance::ScheduleInstance;
pub use position::{GeoPoint, ScheduledPosition, StopTimeRef};
pub use report::{TimepointPrediction, VehicleReport};

/// A query target: the time the caller wants a location for, paired with
/// the caller's current wall-clock time.
///
/// The two are distinct so historical queries ("where was the vehicle at
/// 08:15?") can be answered while the cache staleness test still runs
/// against the present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetTime {
    /// The time the location should be computed for (epoch ms).
    pub target: i64,
    /// The caller's current time (epoch ms).
    pub current: i64,
}

impl TargetTime {
    /// Create a new target time.
    pub fn new(target: i64, current: i64) -> Self {
        Self { target, current }
    }

    /// A "now" query: target and current time coincide.
    pub fn now(current: i64) -> Self {
        Self {
            target: current,
            current,
        }
    }
}
