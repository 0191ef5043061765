//! Service configuration.

/// Tunables for the location service. All values are externally supplied;
/// the engine owns none of them.
#[derive(Debug, Clone)]
pub struct LocationConfig {
    /// Trailing duration the windowed cache keeps fused results for
    /// (seconds). Default: 20 minutes.
    pub cache_window_secs: u32,
    /// How far a cached record's report time may lie from a query's
    /// current time and still be accepted (seconds). Default: 5 minutes.
    pub prediction_acceptance_offset_secs: u32,
    /// Half-width of the window used to match a report to active schedule
    /// instances (milliseconds). Default: 1 hour.
    pub instance_matching_window_ms: i64,
    /// Period of the persistence flush daemon (seconds). Default: 1.
    pub flush_period_secs: u64,
    /// Whether fused results are persisted to the overflow store, and
    /// whether out-of-window queries may read it back. Default: off.
    pub persistence_enabled: bool,
    /// Whether distance-only reports are advanced by elapsed time toward
    /// the query target. Default: off.
    pub distance_interpolation_enabled: bool,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            cache_window_secs: 20 * 60,
            prediction_acceptance_offset_secs: 5 * 60,
            instance_matching_window_ms: 60 * 60 * 1000,
            flush_period_secs: 1,
            persistence_enabled: false,
            distance_interpolation_enabled: false,
        }
    }
}
