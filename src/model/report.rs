//! Raw vehicle observation reports.

use super::{EntityId, GeoPoint};

/// A predicted arrival time at a specific stop ("timepoint"), carried on a
/// vehicle report independently of the primary real-time signal.
#[derive(Debug, Clone, PartialEq)]
pub struct TimepointPrediction {
    /// The stop the prediction applies to.
    pub timepoint_id: EntityId,
    /// Static scheduled arrival time (epoch ms), if the feed supplies it.
    pub scheduled_time: Option<i64>,
    /// Predicted arrival time (epoch ms).
    pub predicted_time: Option<i64>,
}

/// One raw observation of a vehicle, as delivered by a realtime feed.
///
/// Every signal is optional: absence (`None`) is distinct from zero, and
/// only fields that are actually set participate in position synthesis.
/// Reports are transient and never mutated after creation; the next report
/// for the same vehicle supersedes this one in the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleReport {
    /// The observed vehicle.
    pub vehicle_id: EntityId,
    /// When the observation was made (epoch ms). Required for ingestion.
    pub time_of_record: Option<i64>,
    /// When the raw location was last updated, if the feed distinguishes
    /// it from the record time (epoch ms).
    pub time_of_location_update: Option<i64>,
    /// Start of the service date the vehicle is operating on (epoch ms).
    /// Required for ingestion.
    pub service_date: Option<i64>,
    /// Schedule group ("block") the vehicle is running, if known.
    pub group_id: Option<EntityId>,
    /// Trip the vehicle is running; resolvable to a group via the static
    /// schedule graph when `group_id` is absent.
    pub trip_id: Option<EntityId>,
    /// Seconds ahead (negative) or behind (positive) schedule.
    pub schedule_deviation: Option<f64>,
    /// Cumulative distance along the instance's path (meters).
    pub distance_along_instance: Option<f64>,
    /// Raw reported geographic position.
    pub current_location: Option<GeoPoint>,
    /// Raw reported orientation in degrees.
    pub current_orientation: Option<f64>,
    /// Operational phase tag (e.g. "in_progress", "deadhead").
    pub phase: Option<String>,
    /// Free-form status tag from the feed.
    pub status: Option<String>,
    /// Ordered timepoint predictions, possibly empty.
    pub timepoint_predictions: Vec<TimepointPrediction>,
}

impl VehicleReport {
    /// Create an empty report for a vehicle. All signals start unset.
    pub fn new(vehicle_id: EntityId) -> Self {
        Self {
            vehicle_id,
            time_of_record: None,
            time_of_location_update: None,
            service_date: None,
            group_id: None,
            trip_id: None,
            schedule_deviation: None,
            distance_along_instance: None,
            current_location: None,
            current_orientation: None,
            phase: None,
            status: None,
            timepoint_predictions: Vec::new(),
        }
    }
}
