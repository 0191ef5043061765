//! Fused cache records and schedule-deviation samples.

use std::collections::BTreeMap;

use super::{ScheduleInstance, ScheduledPosition, VehicleReport};

/// Schedule-deviation samples derived from timepoint predictions.
///
/// Parallel arrays of scheduled-time offsets (seconds, ascending, unique)
/// and the deviation observed at each offset. Used for uncertainty
/// reporting downstream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviationSamples {
    schedule_times: Vec<i32>,
    deviations: Vec<f64>,
}

impl DeviationSamples {
    /// Build samples from an offset-keyed map. The map guarantees the
    /// sorted-unique invariant.
    pub fn from_map(samples: BTreeMap<i32, f64>) -> Self {
        let mut schedule_times = Vec::with_capacity(samples.len());
        let mut deviations = Vec::with_capacity(samples.len());
        for (offset, deviation) in samples {
            schedule_times.push(offset);
            deviations.push(deviation);
        }
        Self {
            schedule_times,
            deviations,
        }
    }

    /// Scheduled-time offsets, ascending.
    pub fn schedule_times(&self) -> &[i32] {
        &self.schedule_times
    }

    /// Deviations, parallel to [`Self::schedule_times`].
    pub fn deviations(&self) -> &[f64] {
        &self.deviations
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.schedule_times.len()
    }

    /// Whether the sample set is empty.
    pub fn is_empty(&self) -> bool {
        self.schedule_times.is_empty()
    }
}

/// A fused result: one vehicle report bound to its resolved schedule
/// instance, with the last-computed scheduled position memoized and any
/// deviation samples derived from the report's timepoint predictions.
///
/// Created on each new report and superseded (not mutated) by the next
/// report for the same vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedResult {
    /// The resolved schedule instance the report belongs to.
    pub instance: ScheduleInstance,
    /// The raw report.
    pub report: VehicleReport,
    /// Scheduled position computed at ingestion time, if determinable.
    /// Later queries use it as the starting point for relative lookups.
    pub scheduled_position: Option<ScheduledPosition>,
    /// Deviation samples derived from the report's timepoint predictions.
    pub deviation_samples: Option<DeviationSamples>,
}

impl FusedResult {
    /// Create a new fused result.
    pub fn new(
        instance: ScheduleInstance,
        report: VehicleReport,
        scheduled_position: Option<ScheduledPosition>,
        deviation_samples: Option<DeviationSamples>,
    ) -> Self {
        Self {
            instance,
            report,
            scheduled_position,
            deviation_samples,
        }
    }

    /// The report's observation time, or zero when the report carries none.
    /// Reports reach the cache validated, so zero only occurs for records
    /// reconstructed from malformed durable rows and sorts as maximally
    /// stale.
    pub fn time_of_record(&self) -> i64 {
        self.report.time_of_record.unwrap_or(0)
    }
}
