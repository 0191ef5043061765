//! Position synthesis from partial, noisy real-time signals.
//!
//! Given a report and its resolved instance, the synthesizer computes an
//! effective scheduled position by applying a strict precedence over the
//! report's signals:
//!
//! 1. schedule deviation, when set;
//! 2. distance along the instance, when set;
//! 3. the raw scheduled offset (pure-schedule fallback).
//!
//! A previously memoized position on the same instance is used as a
//! starting point for relative oracle lookups where the precedence rules
//! allow, which never changes the answer, only how fast the oracle can
//! produce it.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::model::{DeviationSamples, FusedResult, ScheduleInstance, ScheduledPosition, VehicleReport};
use crate::oracle::{ScheduleGraph, ScheduleOracle};

/// Synthesizes effective scheduled positions for vehicle reports.
pub struct PositionSynthesizer {
    oracle: Arc<dyn ScheduleOracle>,
    graph: Arc<dyn ScheduleGraph>,
    distance_interpolation: bool,
}

impl PositionSynthesizer {
    /// Create a synthesizer.
    ///
    /// `distance_interpolation` enables the elapsed-time advance of
    /// distance-only reports toward the query's target time; when disabled
    /// such reports always resolve at their raw reported distance.
    pub fn new(
        oracle: Arc<dyn ScheduleOracle>,
        graph: Arc<dyn ScheduleGraph>,
        distance_interpolation: bool,
    ) -> Self {
        Self {
            oracle,
            graph,
            distance_interpolation,
        }
    }

    /// Position for a freshly ingested report, evaluated at the report's
    /// own observation time. `None` when the report has no observation
    /// time or the effective position is undeterminable.
    pub fn position_for_report(
        &self,
        instance: &ScheduleInstance,
        report: &VehicleReport,
    ) -> Option<ScheduledPosition> {
        let time_of_record = report.time_of_record?;
        let scheduled_time = instance.offset_secs(time_of_record);

        if let Some(deviation) = report.schedule_deviation {
            // The effective scheduled time is where the vehicle sits on its
            // schedule once deviation is accounted for: 100 minutes into
            // the service date and running 10 minutes late means the
            // 90-minute point of its scheduled operation.
            let effective = (f64::from(scheduled_time) - deviation) as i32;
            return self.oracle.position_at_offset(instance, effective);
        }

        if let Some(distance) = report.distance_along_instance {
            return self.oracle.position_at_distance(instance, distance);
        }

        self.oracle.position_at_offset(instance, scheduled_time)
    }

    /// Position for a cached fused result, evaluated at an arbitrary
    /// target time. Uses the memoized position as a relative starting
    /// point where the precedence rules allow.
    pub fn position_for_cached(
        &self,
        fused: &FusedResult,
        target_time: i64,
    ) -> Option<ScheduledPosition> {
        let instance = &fused.instance;
        let report = &fused.report;
        let previous = fused.scheduled_position.as_ref();

        let time_of_record = report.time_of_record?;
        let scheduled_time = instance.offset_secs(target_time);

        if let Some(deviation) = report.schedule_deviation {
            let effective = (f64::from(scheduled_time) - deviation) as i32;

            if let Some(prev) = previous {
                if prev.scheduled_time <= effective {
                    return self.oracle.position_at_offset_from(instance, prev, effective);
                }
            }
            return self.oracle.position_at_offset(instance, effective);
        }

        if let Some(distance) = report.distance_along_instance {
            if self.distance_interpolation {
                if let Some(prev) = previous {
                    if prev.distance_along_instance <= distance {
                        let elapsed = ((target_time - time_of_record) / 1000) as i32;

                        if elapsed >= 0 {
                            let effective = prev.scheduled_time + elapsed;
                            return self.oracle.position_at_offset(instance, effective);
                        }
                        return self
                            .oracle
                            .position_at_distance_from(instance, prev, distance);
                    }
                }
            }
            return self.oracle.position_at_distance(instance, distance);
        }

        self.oracle.position_at_offset(instance, scheduled_time)
    }

    /// Derive deviation samples from the report's timepoint predictions.
    ///
    /// For every prediction whose stop appears in the group's static
    /// stop-time sequence, the sample is the static arrival offset paired
    /// with the observed deviation at that offset. `None` when no
    /// prediction matched.
    pub fn sample_deviations(
        &self,
        instance: &ScheduleInstance,
        report: &VehicleReport,
    ) -> Option<DeviationSamples> {
        if report.timepoint_predictions.is_empty() {
            return None;
        }

        let stops = self.graph.stop_sequence(&instance.group_id);
        let mut by_offset: BTreeMap<i32, f64> = BTreeMap::new();

        for prediction in &report.timepoint_predictions {
            let Some(predicted_time) = prediction.predicted_time else {
                continue;
            };
            for stop in &stops {
                if stop.stop_id == prediction.timepoint_id {
                    let predicted_offset = (predicted_time - instance.service_date) / 1000;
                    let deviation = predicted_offset - i64::from(stop.arrival_offset);
                    by_offset.insert(stop.arrival_offset, deviation as f64);
                }
            }
        }

        if by_offset.is_empty() {
            None
        } else {
            Some(DeviationSamples::from_map(by_offset))
        }
    }
}
