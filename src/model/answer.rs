//! Externally visible query answers.

use super::{DeviationSamples, EntityId, GeoPoint, ScheduleInstance, StopTimeRef};

/// The synthesis result for one location query: schedule-derived fields
/// merged with whatever real-time signals were available.
///
/// Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationAnswer {
    /// The time this answer was computed for (epoch ms).
    pub target_time: i64,
    /// The schedule instance the answer describes.
    pub instance: ScheduleInstance,
    /// The vehicle the answer describes, when real-time data contributed.
    pub vehicle_id: Option<EntityId>,
    /// True when a real-time report contributed to this answer; false for
    /// pure-schedule answers.
    pub predicted: bool,

    // Real-time fields, present only when a report contributed.
    /// Observation time of the contributing report (epoch ms).
    pub last_update_time: Option<i64>,
    /// Location-update time of the contributing report (epoch ms).
    pub last_location_update_time: Option<i64>,
    /// Schedule deviation of the contributing report (seconds).
    pub schedule_deviation: Option<f64>,
    /// Deviation samples from the contributing report's predictions.
    pub deviation_samples: Option<DeviationSamples>,
    /// Raw reported position of the contributing report.
    pub last_known_location: Option<GeoPoint>,
    /// Raw reported orientation of the contributing report.
    pub last_known_orientation: Option<f64>,
    /// Operational phase of the contributing report.
    pub phase: Option<String>,
    /// Status tag of the contributing report.
    pub status: Option<String>,
    /// Effective schedule-relative offset after deviation/interpolation
    /// adjustments (seconds).
    pub effective_schedule_time: Option<i32>,
    /// Effective distance along the instance after adjustments (meters).
    pub distance_along_instance: Option<f64>,

    // Schedule-derived fields, always present on a returned answer.
    /// Whether the instance is in revenue service at the answer position.
    pub in_service: bool,
    /// Active trip at the answer position.
    pub active_trip: Option<EntityId>,
    /// Geographic position on the schedule shape.
    pub location: Option<GeoPoint>,
    /// Orientation on the schedule shape.
    pub orientation: Option<f64>,
    /// Unadjusted scheduled distance along the instance (meters).
    pub scheduled_distance_along_instance: Option<f64>,
    /// Nearest stop at the answer position.
    pub closest_stop: Option<StopTimeRef>,
    /// Next stop at the answer position.
    pub next_stop: Option<StopTimeRef>,
}

impl LocationAnswer {
    /// Create an empty answer skeleton for an instance and target time.
    /// Fields are filled in by the service's answer assembly.
    pub fn new(instance: ScheduleInstance, target_time: i64) -> Self {
        Self {
            target_time,
            instance,
            vehicle_id: None,
            predicted: false,
            last_update_time: None,
            last_location_update_time: None,
            schedule_deviation: None,
            deviation_samples: None,
            last_known_location: None,
            last_known_orientation: None,
            phase: None,
            status: None,
            effective_schedule_time: None,
            distance_along_instance: None,
            in_service: false,
            active_trip: None,
            location: None,
            orientation: None,
            scheduled_distance_along_instance: None,
            closest_stop: None,
            next_stop: None,
        }
    }
}
