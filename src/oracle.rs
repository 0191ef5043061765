//! Injected static-schedule collaborators.
//!
//! The engine never owns timetable or shape data. Three narrow traits give
//! it everything it needs:
//!
//! - [`ScheduleOracle`] - scheduled position lookups on an instance
//! - [`ScheduleGraph`] - static graph facts (trip membership, stop times)
//! - [`ScheduleCalendar`] - which instances are active when
//!
//! All lookups that can land outside an instance's temporal or spatial
//! range answer `None`; "undeterminable" is a valid outcome, not an error.

use crate::model::{EntityId, ScheduleInstance, ScheduledPosition};

/// A stop in a group's static stop-time sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledStop {
    /// The stop's id.
    pub stop_id: EntityId,
    /// Static arrival offset (seconds since service-date start).
    pub arrival_offset: i32,
}

/// Scheduled-position lookups against the static timetable and shape data.
///
/// Pure function of static data; implementations hold no mutable state.
/// The `*_from` variants resolve relative to a previously computed position
/// on the same instance, letting implementations skip ahead instead of
/// walking the instance from its start.
pub trait ScheduleOracle: Send + Sync {
    /// Position at a scheduled-time offset, measured from the instance
    /// start. `None` when the offset is beyond the instance's end.
    fn position_at_offset(
        &self,
        instance: &ScheduleInstance,
        scheduled_time: i32,
    ) -> Option<ScheduledPosition>;

    /// Position at a distance along the instance, measured from the
    /// instance start. `None` when the distance falls outside the
    /// instance's spatial range.
    fn position_at_distance(
        &self,
        instance: &ScheduleInstance,
        distance: f64,
    ) -> Option<ScheduledPosition>;

    /// Position at a scheduled-time offset, resolved relative to a
    /// previously computed position at an earlier offset.
    fn position_at_offset_from(
        &self,
        instance: &ScheduleInstance,
        previous: &ScheduledPosition,
        scheduled_time: i32,
    ) -> Option<ScheduledPosition>;

    /// Position at a distance along the instance, resolved relative to a
    /// previously computed position at a smaller distance.
    fn position_at_distance_from(
        &self,
        instance: &ScheduleInstance,
        previous: &ScheduledPosition,
        distance: f64,
    ) -> Option<ScheduledPosition>;
}

/// Static schedule-graph facts.
pub trait ScheduleGraph: Send + Sync {
    /// The schedule group a trip belongs to, or `None` for unknown trips.
    fn group_for_trip(&self, trip_id: &EntityId) -> Option<EntityId>;

    /// The group's stop-time sequence, in schedule order.
    fn stop_sequence(&self, group_id: &EntityId) -> Vec<ScheduledStop>;

    /// Cumulative distance from the group's start to the start of one of
    /// its trips, used to project instance distances onto trip distances.
    fn trip_start_distance(&self, group_id: &EntityId, trip_id: &EntityId) -> Option<f64>;
}

/// Calendar of concrete schedule instances.
pub trait ScheduleCalendar: Send + Sync {
    /// All instances of a group active within `[from, to]` (epoch ms).
    /// Order must be deterministic; ties in downstream disambiguation are
    /// broken by it.
    fn active_instances(&self, group_id: &EntityId, from: i64, to: i64) -> Vec<ScheduleInstance>;

    /// The instance of a group on a specific service date, if one exists.
    fn instance(&self, group_id: &EntityId, service_date: i64) -> Option<ScheduleInstance>;
}
