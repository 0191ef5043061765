//! Concrete schedule instances.

use super::EntityId;

/// One concrete occurrence of a schedule group (a "block"): the group run
/// on a particular service date.
///
/// Identity is the `(group_id, service_date)` pair and is immutable once
/// resolved. The instance is owned by whichever component resolves it and
/// referenced everywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScheduleInstance {
    /// The schedule group this instance belongs to.
    pub group_id: EntityId,
    /// Start of the service date (epoch ms).
    pub service_date: i64,
}

impl ScheduleInstance {
    /// Create a new schedule instance.
    pub fn new(group_id: EntityId, service_date: i64) -> Self {
        Self {
            group_id,
            service_date,
        }
    }

    /// Schedule-relative offset (seconds) of an absolute time on this
    /// instance's service date.
    pub fn offset_secs(&self, time_ms: i64) -> i32 {
        ((time_ms - self.service_date) / 1000) as i32
    }
}
