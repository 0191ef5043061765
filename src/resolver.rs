//! Resolution of raw vehicle reports to concrete schedule instances.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::model::{EntityId, ScheduleInstance, VehicleReport};
use crate::oracle::{ScheduleCalendar, ScheduleGraph};

/// Errors raised while ingesting a vehicle report.
///
/// Both variants indicate a malformed or unmappable report and reject it;
/// "no active instance" is not an error (the resolver answers `Ok(None)`
/// and the report is dropped).
#[derive(Debug, Error)]
pub enum IngestError {
    /// A required report field is absent. Caller bug; the report is
    /// rejected.
    #[error("vehicle report is missing required field: {0}")]
    MissingField(&'static str),

    /// The report cannot be mapped to a schedule group.
    #[error("vehicle report cannot be resolved to a schedule group: {0}")]
    UnresolvableReport(String),
}

/// Resolves a vehicle report to the schedule instance it belongs to.
///
/// A report identifies either a group directly or a trip that the static
/// graph maps to a group. The resolver then looks for instances of that
/// group active around the observation time and, when several compete,
/// picks the one whose service date is closest to the report's.
pub struct InstanceResolver {
    graph: Arc<dyn ScheduleGraph>,
    calendar: Arc<dyn ScheduleCalendar>,
    matching_window_ms: i64,
}

impl InstanceResolver {
    /// Create a resolver with the given matching window (ms) around the
    /// observation time.
    pub fn new(
        graph: Arc<dyn ScheduleGraph>,
        calendar: Arc<dyn ScheduleCalendar>,
        matching_window_ms: i64,
    ) -> Self {
        Self {
            graph,
            calendar,
            matching_window_ms,
        }
    }

    /// Resolve a report to its schedule instance.
    ///
    /// Returns `Ok(None)` when no instance of the group is active around
    /// the observation time; callers treat such reports as ignorable.
    ///
    /// # Errors
    ///
    /// [`IngestError::MissingField`] when the report lacks a service date
    /// or observation time, [`IngestError::UnresolvableReport`] when it
    /// names neither a group nor a resolvable trip.
    pub fn resolve(&self, report: &VehicleReport) -> Result<Option<ScheduleInstance>, IngestError> {
        let group_id = self.group_for_report(report)?;

        let service_date = report
            .service_date
            .ok_or(IngestError::MissingField("service_date"))?;
        let time_of_record = report
            .time_of_record
            .ok_or(IngestError::MissingField("time_of_record"))?;

        Ok(self.best_instance(&group_id, service_date, time_of_record))
    }

    fn group_for_report(&self, report: &VehicleReport) -> Result<EntityId, IngestError> {
        if let Some(group_id) = &report.group_id {
            return Ok(group_id.clone());
        }
        let trip_id = report.trip_id.as_ref().ok_or_else(|| {
            IngestError::UnresolvableReport(format!(
                "report for vehicle {} names neither a group nor a trip",
                report.vehicle_id
            ))
        })?;
        self.graph.group_for_trip(trip_id).ok_or_else(|| {
            IngestError::UnresolvableReport(format!("no schedule group for trip {trip_id}"))
        })
    }

    fn best_instance(
        &self,
        group_id: &EntityId,
        service_date: i64,
        time_of_record: i64,
    ) -> Option<ScheduleInstance> {
        let from = time_of_record - self.matching_window_ms;
        let to = time_of_record + self.matching_window_ms;

        let candidates = self.calendar.active_instances(group_id, from, to);

        if candidates.is_empty() {
            debug!("no active instance of group {group_id} near t={time_of_record}");
            return None;
        }
        if candidates.len() == 1 {
            return candidates.into_iter().next();
        }

        // Several instances compete (e.g. late-night runs spanning service
        // dates): the one closest to the reported service date wins, first
        // candidate in calendar order on a tie.
        candidates
            .into_iter()
            .min_by_key(|instance| (instance.service_date - service_date).abs())
    }
}
