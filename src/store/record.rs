//! Durable record projection of fused results.

use crate::model::{EntityId, FusedResult, GeoPoint, ScheduleInstance, VehicleReport};
use crate::oracle::ScheduleGraph;

/// One timepoint prediction row carried on a persisted record.
#[derive(Debug, Clone, PartialEq)]
pub struct TimepointRow {
    pub timepoint_id: EntityId,
    pub scheduled_time: Option<i64>,
    pub predicted_time: Option<i64>,
}

/// Durable projection of a fused result for one (vehicle, group, service
/// date) tuple. When the source report carries several timepoint
/// predictions, one record per prediction is written; otherwise exactly
/// one.
///
/// Written once, read many times, never updated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRecord {
    pub group_id: EntityId,
    pub trip_id: Option<EntityId>,
    pub vehicle_id: EntityId,
    /// Observation time (epoch ms).
    pub time: i64,
    /// Service date start (epoch ms).
    pub service_date: i64,
    pub schedule_deviation: Option<f64>,
    pub distance_along_instance: Option<f64>,
    pub distance_along_trip: Option<f64>,
    pub location: Option<GeoPoint>,
    pub orientation: Option<f64>,
    pub phase: Option<String>,
    pub status: Option<String>,
    pub timepoint: Option<TimepointRow>,
}

impl PersistedRecord {
    /// Project a fused result into one or more persisted records.
    ///
    /// The synthesized position, when present, contributes the effective
    /// distance along the instance and identifies the active trip; the raw
    /// report's own signals take precedence where both are set, matching
    /// what was actually observed over what was derived.
    pub fn from_fused(fused: &FusedResult, graph: &dyn ScheduleGraph) -> Vec<PersistedRecord> {
        let instance = &fused.instance;
        let report = &fused.report;

        let mut base = PersistedRecord {
            group_id: instance.group_id.clone(),
            trip_id: None,
            vehicle_id: report.vehicle_id.clone(),
            time: report.time_of_record.unwrap_or(0),
            service_date: report.service_date.unwrap_or(instance.service_date),
            schedule_deviation: report.schedule_deviation,
            distance_along_instance: None,
            distance_along_trip: None,
            location: report.current_location,
            orientation: report.current_orientation,
            phase: report.phase.clone(),
            status: report.status.clone(),
            timepoint: None,
        };

        if let Some(position) = &fused.scheduled_position {
            base.distance_along_instance = Some(position.distance_along_instance);
            if let Some(active_trip) = &position.active_trip {
                base.trip_id = Some(active_trip.clone());
                if let Some(start) = graph.trip_start_distance(&instance.group_id, active_trip) {
                    base.distance_along_trip = Some(position.distance_along_instance - start);
                }
            }
        }

        if let Some(trip_id) = &report.trip_id {
            base.trip_id = Some(trip_id.clone());
        }

        if let Some(distance) = report.distance_along_instance {
            base.distance_along_instance = Some(distance);
            if let Some(trip_id) = &report.trip_id {
                if let Some(start) = graph.trip_start_distance(&instance.group_id, trip_id) {
                    base.distance_along_trip = Some(distance - start);
                }
            }
        }

        if report.timepoint_predictions.is_empty() {
            return vec![base];
        }

        report
            .timepoint_predictions
            .iter()
            .map(|prediction| {
                let mut row = base.clone();
                row.timepoint = Some(TimepointRow {
                    timepoint_id: prediction.timepoint_id.clone(),
                    scheduled_time: prediction.scheduled_time,
                    predicted_time: prediction.predicted_time,
                });
                row
            })
            .collect()
    }

    /// Reconstruct the fused-result shape of this record for the overflow
    /// query path. The memoized position and deviation samples are not
    /// persisted; the synthesizer recomputes the position on demand.
    pub fn to_fused(&self, instance: ScheduleInstance) -> FusedResult {
        let mut report = VehicleReport::new(self.vehicle_id.clone());
        report.group_id = Some(instance.group_id.clone());
        report.trip_id = self.trip_id.clone();
        report.time_of_record = Some(self.time);
        report.service_date = Some(self.service_date);
        report.schedule_deviation = self.schedule_deviation;
        report.distance_along_instance = self.distance_along_instance;
        report.current_location = self.location;
        report.current_orientation = self.orientation;
        report.phase = self.phase.clone();
        report.status = self.status.clone();

        FusedResult::new(instance, report, None, None)
    }
}
